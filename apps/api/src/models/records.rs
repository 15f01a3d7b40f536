use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::employee::choices::DocumentType;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BasicInformationRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub address: String,
    pub apartment: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub cell_phone: String,
    pub home_phone: String,
    pub work_phone: String,
    pub email: String,
    pub emergency_contact_number: String,
    pub emergency_contact_name: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LanguageRow {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PersonalRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub nickname: String,
    pub social_security_number: String,
    pub drivers_license_number: String,
    pub drivers_license_state: String,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: String,
    pub e_verify: bool,
    pub slug: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MilitaryRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub branch: String,
    pub rank: String,
    pub discharge_year: NaiveDate,
    pub duty_flag: String,
    pub certification_license: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EducationRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub school_type: String,
    pub school_name: String,
    pub country: String,
    pub city: String,
    pub state: String,
    pub graduated: bool,
    pub graduation_date: Option<NaiveDate>,
    pub degree_type: String,
    pub documentation: bool,
    pub slug: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CertificationLicenseRow {
    pub id: Uuid,
    pub education_id: Uuid,
    pub document_name: String,
    #[sqlx(try_from = "String")]
    pub document_type: DocumentType,
    pub certification_file: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ExperienceRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub company_name: String,
    pub company_phone: String,
    pub job_title: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub is_current: bool,
    pub description: Option<String>,
    pub slug: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A personal row together with the ids of the languages spoken.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonalDetail {
    #[serde(flatten)]
    pub personal: PersonalRow,
    pub language_ids: Vec<Uuid>,
}
