//! Job catalog: categories, positions and the skills attached to positions.
//!
//! Catalog writes that change what a preference lookup would return also
//! invalidate the lookup cache through [`PreferenceLookup`].

use std::collections::HashSet;

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::employee::forms::{NewCategory, NewPosition, NewSkill};
use crate::employee::lookup::PreferenceLookup;
use crate::employee::slug::{Draft, Sluggable};
use crate::employee::validation::Validate;
use crate::errors::{AppError, FieldErrors};
use crate::models::catalog::{CategoryRow, PositionRow, SkillRow};

/// Read side of the catalog used by the cached preference lookups.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn positions_in_category(&self, category_id: Uuid) -> Result<Vec<PositionRow>, AppError>;

    /// Skills linked to any of `position_ids`, each listed once.
    async fn skills_for_positions(&self, position_ids: &[Uuid]) -> Result<Vec<SkillRow>, AppError>;
}

#[async_trait]
impl CatalogSource for PgPool {
    async fn positions_in_category(&self, category_id: Uuid) -> Result<Vec<PositionRow>, AppError> {
        Ok(sqlx::query_as::<_, PositionRow>(
            "SELECT * FROM positions WHERE category_id = $1 ORDER BY position ASC",
        )
        .bind(category_id)
        .fetch_all(self)
        .await?)
    }

    async fn skills_for_positions(&self, position_ids: &[Uuid]) -> Result<Vec<SkillRow>, AppError> {
        Ok(sqlx::query_as::<_, SkillRow>(
            r#"
            SELECT DISTINCT s.id, s.skill
            FROM skills s
            JOIN skill_positions sp ON sp.skill_id = s.id
            WHERE sp.position_id = ANY($1)
            ORDER BY s.skill ASC
            "#,
        )
        .bind(position_ids)
        .fetch_all(self)
        .await?)
    }
}

/// True when every id in `ids` names a row of `table`.
pub async fn all_exist(pool: &PgPool, table: &'static str, ids: &[Uuid]) -> Result<bool, AppError> {
    let unique: HashSet<&Uuid> = ids.iter().collect();
    if unique.is_empty() {
        return Ok(true);
    }
    let query = format!("SELECT COUNT(*) FROM {table} WHERE id = ANY($1)");
    let found: i64 = sqlx::query_scalar(&query).bind(ids).fetch_one(pool).await?;
    Ok(found as usize == unique.len())
}

/// Adds a `field` error for every id in `ids` with no row in `table`.
pub async fn check_references(
    pool: &PgPool,
    errors: &mut FieldErrors,
    field: &str,
    table: &'static str,
    ids: &[Uuid],
) -> Result<(), AppError> {
    if ids.is_empty() {
        return Ok(());
    }
    let query = format!("SELECT id FROM {table} WHERE id = ANY($1)");
    let found: HashSet<Uuid> = sqlx::query_scalar::<_, Uuid>(&query)
        .bind(ids)
        .fetch_all(pool)
        .await?
        .into_iter()
        .collect();
    record_unknown(errors, field, ids, &found);
    Ok(())
}

fn record_unknown(errors: &mut FieldErrors, field: &str, requested: &[Uuid], found: &HashSet<Uuid>) {
    let mut reported = HashSet::new();
    for id in requested {
        if !found.contains(id) && reported.insert(*id) {
            errors.add(
                field,
                format!("Select a valid choice. {id} is not one of the available choices."),
            );
        }
    }
}

pub async fn list_categories(pool: &PgPool) -> Result<Vec<CategoryRow>, AppError> {
    Ok(
        sqlx::query_as::<_, CategoryRow>("SELECT * FROM categories ORDER BY category ASC")
            .fetch_all(pool)
            .await?,
    )
}

pub async fn insert_category(pool: &PgPool, form: NewCategory) -> Result<CategoryRow, AppError> {
    form.validate()?;
    let row = sqlx::query_as::<_, CategoryRow>(
        "INSERT INTO categories (id, category) VALUES ($1, $2) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(form.category.trim())
    .fetch_one(pool)
    .await?;
    info!("Inserted category '{}'", row.category);
    Ok(row)
}

pub async fn insert_position(
    pool: &PgPool,
    lookup: &PreferenceLookup,
    form: NewPosition,
) -> Result<PositionRow, AppError> {
    let mut draft = Draft::new(form, "")?;
    if !all_exist(pool, "categories", &[draft.record.category_id]).await? {
        let mut errors = FieldErrors::new();
        errors.add("category_id", "Select a valid category.");
        return Err(AppError::InvalidFields(errors));
    }
    let slug = draft.assign_slug_if_absent(pool).await?.to_string();
    let f = &draft.record;

    let row = sqlx::query_as::<_, PositionRow>(
        r#"
        INSERT INTO positions (id, position, category_id, skill_test_link, slug)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&f.position)
    .bind(f.category_id)
    .bind(&f.skill_test_link)
    .bind(&slug)
    .fetch_one(pool)
    .await?;

    lookup.invalidate_category(row.category_id).await;
    lookup.invalidate_skills().await;
    info!("Inserted position '{slug}' in category {}", row.category_id);
    Ok(row)
}

/// Deleting a position also drops its skill links, so both lookups go stale.
pub async fn delete_position(
    pool: &PgPool,
    lookup: &PreferenceLookup,
    slug: &str,
) -> Result<(), AppError> {
    let category_id: Option<Uuid> =
        sqlx::query_scalar("DELETE FROM positions WHERE slug = $1 RETURNING category_id")
            .bind(slug)
            .fetch_optional(pool)
            .await?;
    let category_id = category_id.ok_or_else(|| {
        AppError::NotFound(format!("No {} row with slug '{slug}'", NewPosition::TABLE))
    })?;

    lookup.invalidate_category(category_id).await;
    lookup.invalidate_skills().await;
    info!("Deleted position '{slug}'");
    Ok(())
}

pub async fn insert_skill(
    pool: &PgPool,
    lookup: &PreferenceLookup,
    form: NewSkill,
) -> Result<SkillRow, AppError> {
    form.validate()?;
    if !all_exist(pool, "positions", &form.position_ids).await? {
        let mut errors = FieldErrors::new();
        errors.add("position_ids", "Select valid positions.");
        return Err(AppError::InvalidFields(errors));
    }

    let mut tx = pool.begin().await?;
    let row = sqlx::query_as::<_, SkillRow>(
        "INSERT INTO skills (id, skill) VALUES ($1, $2) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(form.skill.trim())
    .fetch_one(&mut *tx)
    .await?;
    sqlx::query(
        r#"
        INSERT INTO skill_positions (skill_id, position_id)
        SELECT $1, UNNEST($2::uuid[])
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(row.id)
    .bind(&form.position_ids)
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;

    if !form.position_ids.is_empty() {
        lookup.invalidate_skills().await;
    }
    info!(
        "Inserted skill '{}' linked to {} positions",
        row.skill,
        form.position_ids.len()
    );
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_unknown_reports_each_missing_id_once() {
        let known = Uuid::new_v4();
        let missing = Uuid::new_v4();
        let found: HashSet<Uuid> = [known].into_iter().collect();
        let mut errors = FieldErrors::new();

        record_unknown(&mut errors, "language_ids", &[known, missing, missing], &found);

        let messages = errors.get("language_ids").unwrap();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains(&missing.to_string()));
    }

    #[test]
    fn test_record_unknown_accepts_known_ids() {
        let known = Uuid::new_v4();
        let found: HashSet<Uuid> = [known].into_iter().collect();
        let mut errors = FieldErrors::new();
        record_unknown(&mut errors, "language_ids", &[known, known], &found);
        assert!(errors.is_empty());
    }
}
