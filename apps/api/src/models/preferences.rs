use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PreferencesRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub minimum_salary: Decimal,
    pub salary_type: String,
    pub location: String,
    pub job_type: String,
    pub can_relocation: String,
    pub years_of_experience: i32,
    pub category_id: Uuid,
    pub custom_positions: Option<String>,
    pub custom_skills: Option<String>,
    pub slug: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A preferences row together with its many-to-many selections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreferencesDetail {
    #[serde(flatten)]
    pub preferences: PreferencesRow,
    pub desired_position_ids: Vec<Uuid>,
    pub skill_ids: Vec<Uuid>,
}
