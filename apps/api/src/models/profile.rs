use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One row per user. The `_completed` flags are independent of each other.
#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
pub struct ProfileRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub account_created: bool,
    pub company_policies_completed: bool,
    pub basic_information_completed: bool,
    pub personal_information_completed: bool,
    pub military_completed: bool,
    pub education_completed: bool,
    pub experience_completed: bool,
    pub preferences_completed: bool,
    pub skill_set_test_completed: bool,
    pub video_resume_completed: bool,
    pub resume_uploading_completed: bool,
}
