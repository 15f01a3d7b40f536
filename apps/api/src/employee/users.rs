use serde::{Deserialize, Serialize};
use sqlx::{Executor, PgPool, Postgres};
use tracing::info;
use uuid::Uuid;

use crate::employee::profile::create_profile;
use crate::employee::validation::{check_email, check_text};
use crate::errors::{AppError, FieldErrors};
use crate::models::profile::ProfileRow;
use crate::models::user::User;

#[derive(Debug, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct UserWithProfile {
    pub user: User,
    pub profile: ProfileRow,
}

/// Creates a user together with its profile row in one transaction.
pub async fn create_user(pool: &PgPool, new_user: &NewUser) -> Result<UserWithProfile, AppError> {
    let mut errors = FieldErrors::new();
    check_text(&mut errors, "username", &new_user.username, 150);
    check_email(&mut errors, "email", &new_user.email);
    errors.into_result()?;

    let mut tx = pool.begin().await?;

    let taken: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
        .bind(&new_user.username)
        .fetch_one(&mut *tx)
        .await?;
    if taken {
        let mut errors = FieldErrors::new();
        errors.add("username", "A user with that username already exists.");
        return Err(AppError::InvalidFields(errors));
    }

    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (id, username, email) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(&new_user.username)
    .bind(&new_user.email)
    .fetch_one(&mut *tx)
    .await?;

    let profile = create_profile(&mut *tx, user.id).await?;
    tx.commit().await?;

    info!("Created user {} ({}) with profile", user.username, user.id);
    Ok(UserWithProfile { user, profile })
}

/// Username of `user_id`; seeds slugs of the user's records.
pub async fn fetch_username<'e, E>(executor: E, user_id: Uuid) -> Result<String, AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar::<_, String>("SELECT username FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {user_id} not found")))
}
