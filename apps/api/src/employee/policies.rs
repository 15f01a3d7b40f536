use serde::Deserialize;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::employee::forms::{NewPolicy, PolicyAcceptance};
use crate::employee::profile::{set_section_completed, ProfileSection};
use crate::employee::slug::Draft;
use crate::employee::users::fetch_username;
use crate::errors::AppError;
use crate::models::policies::{AcceptedPolicyRow, PolicyRow};

#[derive(Debug, Deserialize)]
pub struct AcceptPolicyRequest {
    pub user_id: Uuid,
    #[serde(default = "default_accepted")]
    pub accepted: bool,
}

fn default_accepted() -> bool {
    true
}

pub async fn list_policies(pool: &PgPool) -> Result<Vec<PolicyRow>, AppError> {
    Ok(
        sqlx::query_as::<_, PolicyRow>("SELECT * FROM policies ORDER BY created_at ASC")
            .fetch_all(pool)
            .await?,
    )
}

pub async fn insert_policy(pool: &PgPool, form: NewPolicy) -> Result<PolicyRow, AppError> {
    let preset = form.slug.clone();
    let mut draft = Draft::new(form, "")?;
    if let Some(slug) = preset {
        draft = draft.with_slug(slug)?;
    }
    let slug = draft.assign_slug_if_absent(pool).await?.to_string();
    let f = &draft.record;

    let row = sqlx::query_as::<_, PolicyRow>(
        r#"
        INSERT INTO policies (id, title, description, slug)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&f.title)
    .bind(&f.description)
    .bind(&slug)
    .fetch_one(pool)
    .await?;

    info!("Inserted policy '{slug}'");
    Ok(row)
}

/// A repeated answer updates the existing row; its slug is left alone.
const UPSERT_ACCEPTANCE: &str = r#"
    INSERT INTO user_accepted_policies (id, user_id, policy_id, accepted, slug)
    VALUES ($1, $2, $3, $4, $5)
    ON CONFLICT (user_id, policy_id)
    DO UPDATE SET accepted = EXCLUDED.accepted, updated_at = now()
    RETURNING *
"#;

/// Records the user's answer to a policy in a single upsert. Once every
/// policy is accepted the company-policies section is marked complete.
pub async fn accept_policy(
    pool: &PgPool,
    policy_slug: &str,
    req: &AcceptPolicyRequest,
) -> Result<AcceptedPolicyRow, AppError> {
    let policy = sqlx::query_as::<_, PolicyRow>("SELECT * FROM policies WHERE slug = $1")
        .bind(policy_slug)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Policy '{policy_slug}' not found")))?;

    let username = fetch_username(pool, req.user_id).await?;
    let acceptance = PolicyAcceptance {
        policy_id: policy.id,
        policy_title: policy.title.clone(),
        accepted: req.accepted,
    };
    let mut draft = Draft::new(acceptance, username)?;
    let slug = draft.assign_slug_if_absent(pool).await?.to_string();

    let mut tx = pool.begin().await?;
    let row = sqlx::query_as::<_, AcceptedPolicyRow>(UPSERT_ACCEPTANCE)
        .bind(Uuid::new_v4())
        .bind(req.user_id)
        .bind(draft.record.policy_id)
        .bind(draft.record.accepted)
        .bind(&slug)
        .fetch_one(&mut *tx)
        .await?;

    let outstanding: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM policies p
        WHERE NOT EXISTS (
            SELECT 1 FROM user_accepted_policies u
            WHERE u.policy_id = p.id AND u.user_id = $1 AND u.accepted
        )
        "#,
    )
    .bind(req.user_id)
    .fetch_one(&mut *tx)
    .await?;
    set_section_completed(
        &mut *tx,
        req.user_id,
        ProfileSection::CompanyPolicies,
        outstanding == 0,
    )
    .await?;
    tx.commit().await?;

    info!(
        "User {} answered policy '{policy_slug}' (accepted: {}, outstanding: {outstanding})",
        req.user_id, row.accepted
    );
    Ok(row)
}

pub async fn list_accepted(pool: &PgPool, user_id: Uuid) -> Result<Vec<AcceptedPolicyRow>, AppError> {
    Ok(sqlx::query_as::<_, AcceptedPolicyRow>(
        "SELECT * FROM user_accepted_policies WHERE user_id = $1 ORDER BY created_at ASC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?)
}
