use sqlx::{PgConnection, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::employee::catalog::all_exist;
use crate::employee::forms::NewPreferences;
use crate::employee::profile::{set_section_completed, ProfileSection};
use crate::employee::records::{get_owned, list_owned, prepare};
use crate::employee::slug::Sluggable;
use crate::employee::validation::Validate;
use crate::errors::{AppError, FieldErrors};
use crate::models::preferences::{PreferencesDetail, PreferencesRow};

/// Checks the foreign keys the form refers to, reporting each as a field error.
async fn check_references(pool: &PgPool, form: &NewPreferences) -> Result<(), AppError> {
    let mut errors = FieldErrors::new();
    if !all_exist(pool, "categories", &[form.category_id]).await? {
        errors.add("category_id", "Select a valid category.");
    }
    if !all_exist(pool, "positions", &form.desired_position_ids).await? {
        errors.add("desired_position_ids", "Select valid positions.");
    }
    if !all_exist(pool, "skills", &form.skill_ids).await? {
        errors.add("skill_ids", "Select valid skills.");
    }
    errors.into_result()
}

async fn replace_selections(
    conn: &mut PgConnection,
    preference_id: Uuid,
    form: &NewPreferences,
) -> Result<(), AppError> {
    sqlx::query("DELETE FROM preference_positions WHERE preference_id = $1")
        .bind(preference_id)
        .execute(&mut *conn)
        .await?;
    sqlx::query("DELETE FROM preference_skills WHERE preference_id = $1")
        .bind(preference_id)
        .execute(&mut *conn)
        .await?;
    sqlx::query(
        r#"
        INSERT INTO preference_positions (preference_id, position_id)
        SELECT $1, UNNEST($2::uuid[])
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(preference_id)
    .bind(&form.desired_position_ids)
    .execute(&mut *conn)
    .await?;
    sqlx::query(
        r#"
        INSERT INTO preference_skills (preference_id, skill_id)
        SELECT $1, UNNEST($2::uuid[])
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(preference_id)
    .bind(&form.skill_ids)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn load_detail(
    conn: &mut PgConnection,
    preferences: PreferencesRow,
) -> Result<PreferencesDetail, AppError> {
    let desired_position_ids = sqlx::query_scalar::<_, Uuid>(
        "SELECT position_id FROM preference_positions WHERE preference_id = $1 ORDER BY position_id",
    )
    .bind(preferences.id)
    .fetch_all(&mut *conn)
    .await?;
    let skill_ids = sqlx::query_scalar::<_, Uuid>(
        "SELECT skill_id FROM preference_skills WHERE preference_id = $1 ORDER BY skill_id",
    )
    .bind(preferences.id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(PreferencesDetail {
        preferences,
        desired_position_ids,
        skill_ids,
    })
}

pub async fn insert_preferences(
    pool: &PgPool,
    user_id: Uuid,
    form: NewPreferences,
) -> Result<PreferencesDetail, AppError> {
    form.validate()?;
    check_references(pool, &form).await?;
    let (draft, slug) = prepare(pool, user_id, form).await?;
    let f = &draft.record;

    let mut tx = pool.begin().await?;
    let row = sqlx::query_as::<_, PreferencesRow>(
        r#"
        INSERT INTO employee_preferences
            (id, user_id, minimum_salary, salary_type, location, job_type, can_relocation,
             years_of_experience, category_id, custom_positions, custom_skills, slug)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(f.minimum_salary)
    .bind(&f.salary_type)
    .bind(&f.location)
    .bind(&f.job_type)
    .bind(&f.can_relocation)
    .bind(f.years_of_experience())
    .bind(f.category_id)
    .bind(f.custom_positions.as_deref())
    .bind(f.custom_skills.as_deref())
    .bind(&slug)
    .fetch_one(&mut *tx)
    .await?;
    replace_selections(&mut tx, row.id, f).await?;
    let detail = load_detail(&mut tx, row).await?;
    set_section_completed(&mut *tx, user_id, ProfileSection::Preferences, true).await?;
    tx.commit().await?;

    info!("Inserted preferences '{slug}' for user {user_id}");
    Ok(detail)
}

pub async fn get_preferences(
    pool: &PgPool,
    user_id: Uuid,
    slug: &str,
) -> Result<PreferencesDetail, AppError> {
    let row: PreferencesRow = get_owned(pool, NewPreferences::TABLE, slug, user_id).await?;
    let mut conn = pool.acquire().await?;
    load_detail(&mut conn, row).await
}

pub async fn list_preferences(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<PreferencesDetail>, AppError> {
    let rows: Vec<PreferencesRow> = list_owned(pool, NewPreferences::TABLE, user_id).await?;
    let mut conn = pool.acquire().await?;
    let mut details = Vec::with_capacity(rows.len());
    for row in rows {
        details.push(load_detail(&mut conn, row).await?);
    }
    Ok(details)
}

pub async fn update_preferences(
    pool: &PgPool,
    user_id: Uuid,
    slug: &str,
    form: NewPreferences,
) -> Result<PreferencesDetail, AppError> {
    form.validate()?;
    check_references(pool, &form).await?;

    let mut tx = pool.begin().await?;
    let row = sqlx::query_as::<_, PreferencesRow>(
        r#"
        UPDATE employee_preferences SET
            minimum_salary = $1, salary_type = $2, location = $3, job_type = $4,
            can_relocation = $5, years_of_experience = $6, category_id = $7,
            custom_positions = $8, custom_skills = $9, updated_at = now()
        WHERE slug = $10 AND user_id = $11
        RETURNING *
        "#,
    )
    .bind(form.minimum_salary)
    .bind(&form.salary_type)
    .bind(&form.location)
    .bind(&form.job_type)
    .bind(&form.can_relocation)
    .bind(form.years_of_experience())
    .bind(form.category_id)
    .bind(form.custom_positions.as_deref())
    .bind(form.custom_skills.as_deref())
    .bind(slug)
    .bind(user_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| {
        AppError::NotFound(format!(
            "No {} row with slug '{slug}'",
            NewPreferences::TABLE
        ))
    })?;
    replace_selections(&mut tx, row.id, &form).await?;
    let detail = load_detail(&mut tx, row).await?;
    tx.commit().await?;

    Ok(detail)
}
