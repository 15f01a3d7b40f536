//! Submitted forms for every onboarding record.
//!
//! A form is validated when wrapped in a [`Draft`](crate::employee::slug::Draft)
//! and carries the seed its slug is derived from.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::employee::choices::{
    Branch, DegreeType, DocumentType, DutyFlag, Gender, JobType, Rank, Relocation, SalaryType,
    SchoolType, UsState,
};
use crate::employee::slug::Sluggable;
use crate::employee::validation::{
    check_choice, check_decimal, check_email, check_non_negative, check_optional_text, check_ssn,
    check_text, check_url, upload_path, Validate,
};
use crate::errors::FieldErrors;

pub const MILITARY_UPLOAD_DIR: &str = "certificationsMilitary/";
pub const EDUCATION_UPLOAD_DIR: &str = "certificationsEducation/";
/// Stored width of a file path column.
const FILE_PATH_MAX_LEN: usize = 100;

#[derive(Debug, Clone, Deserialize)]
pub struct NewPolicy {
    pub title: String,
    pub description: String,
    pub slug: Option<String>,
}

impl Validate for NewPolicy {
    fn field_errors(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        check_text(&mut errors, "title", &self.title, 255);
        if self.description.trim().is_empty() {
            errors.add("description", crate::employee::validation::REQUIRED);
        }
        errors
    }
}

impl Sluggable for NewPolicy {
    const TABLE: &'static str = "policies";
    const NAME: &'static str = "policy";

    fn slug_seed(&self, _owner: &str) -> String {
        self.title.clone()
    }
}

/// A user's answer to one policy.
#[derive(Debug, Clone)]
pub struct PolicyAcceptance {
    pub policy_id: Uuid,
    pub policy_title: String,
    pub accepted: bool,
}

impl Validate for PolicyAcceptance {
    fn field_errors(&self) -> FieldErrors {
        FieldErrors::new()
    }
}

impl Sluggable for PolicyAcceptance {
    const TABLE: &'static str = "user_accepted_policies";
    const NAME: &'static str = "accepted-policy";

    fn slug_seed(&self, _owner: &str) -> String {
        format!("{}-{}", self.policy_title, self.accepted)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewBasicInformation {
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
}

impl Validate for NewBasicInformation {
    fn field_errors(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        check_text(&mut errors, "address", &self.address, 200);
        check_text(&mut errors, "apartment", &self.apartment, 50);
        check_text(&mut errors, "city", &self.city, 100);
        check_choice(&mut errors, "state", &self.state, UsState::parse);
        check_text(&mut errors, "zip_code", &self.zip_code, 10);
        check_text(&mut errors, "cell_phone", &self.cell_phone, 20);
        check_text(&mut errors, "home_phone", &self.home_phone, 20);
        check_text(&mut errors, "work_phone", &self.work_phone, 20);
        check_email(&mut errors, "email", &self.email);
        check_text(
            &mut errors,
            "emergency_contact_number",
            &self.emergency_contact_number,
            20,
        );
        check_text(
            &mut errors,
            "emergency_contact_name",
            &self.emergency_contact_name,
            100,
        );
        errors
    }
}

impl Sluggable for NewBasicInformation {
    const TABLE: &'static str = "basic_information";
    const NAME: &'static str = "basic-information";
    const SLUG_MAX_LEN: usize = 200;

    fn slug_seed(&self, _owner: &str) -> String {
        format!("{} {}", self.email, self.zip_code)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPersonal {
    pub nickname: String,
    pub social_security_number: Option<String>,
    pub drivers_license_number: String,
    pub drivers_license_state: String,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: String,
    #[serde(default)]
    pub language_ids: Vec<Uuid>,
    #[serde(default)]
    pub e_verify: bool,
}

impl Validate for NewPersonal {
    fn field_errors(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        check_text(&mut errors, "nickname", &self.nickname, 50);
        check_ssn(
            &mut errors,
            "social_security_number",
            self.social_security_number.as_deref(),
        );
        check_text(
            &mut errors,
            "drivers_license_number",
            &self.drivers_license_number,
            20,
        );
        check_choice(
            &mut errors,
            "drivers_license_state",
            &self.drivers_license_state,
            UsState::parse,
        );
        check_choice(&mut errors, "gender", &self.gender, Gender::parse);
        errors
    }
}

impl Sluggable for NewPersonal {
    const TABLE: &'static str = "personals";
    const NAME: &'static str = "personal";
    const SLUG_MAX_LEN: usize = 200;

    fn slug_seed(&self, owner: &str) -> String {
        format!("{} {owner}", self.nickname)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMilitary {
    pub branch: String,
    pub rank: String,
    pub discharge_year: NaiveDate,
    pub duty_flag: String,
    /// Name of the uploaded certificate; stored under [`MILITARY_UPLOAD_DIR`].
    pub certification_license: String,
}

impl NewMilitary {
    pub fn certification_license_path(&self) -> String {
        format!("{MILITARY_UPLOAD_DIR}{}", self.certification_license.trim())
    }
}

impl Validate for NewMilitary {
    fn field_errors(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        check_choice(&mut errors, "branch", &self.branch, Branch::parse);
        check_choice(&mut errors, "rank", &self.rank, Rank::parse);
        check_choice(&mut errors, "duty_flag", &self.duty_flag, DutyFlag::parse);
        upload_path(
            &mut errors,
            "certification_license",
            MILITARY_UPLOAD_DIR,
            &self.certification_license,
            FILE_PATH_MAX_LEN,
        );
        errors
    }
}

impl Sluggable for NewMilitary {
    const TABLE: &'static str = "militaries";
    const NAME: &'static str = "military";

    fn slug_seed(&self, owner: &str) -> String {
        format!("{} {owner}", self.branch)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewEducation {
    pub school_type: String,
    pub school_name: String,
    pub country: String,
    pub city: String,
    pub state: String,
    #[serde(default)]
    pub graduated: bool,
    pub graduation_date: Option<NaiveDate>,
    pub degree_type: String,
    #[serde(default)]
    pub documentation: bool,
}

impl Validate for NewEducation {
    fn field_errors(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        check_choice(&mut errors, "school_type", &self.school_type, SchoolType::parse);
        check_text(&mut errors, "school_name", &self.school_name, 100);
        check_text(&mut errors, "country", &self.country, 100);
        check_text(&mut errors, "city", &self.city, 100);
        check_text(&mut errors, "state", &self.state, 100);
        check_choice(&mut errors, "degree_type", &self.degree_type, DegreeType::parse);
        errors
    }
}

impl Sluggable for NewEducation {
    const TABLE: &'static str = "educations";
    const NAME: &'static str = "education";

    fn slug_seed(&self, owner: &str) -> String {
        format!("{} {owner}", self.degree_type)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCertification {
    pub document_name: String,
    #[serde(default)]
    pub document_type: Option<String>,
    /// Name of the uploaded file; stored under [`EDUCATION_UPLOAD_DIR`].
    pub certification_file: String,
}

impl NewCertification {
    pub fn document_type(&self) -> DocumentType {
        self.document_type
            .as_deref()
            .and_then(DocumentType::parse)
            .unwrap_or_default()
    }

    pub fn certification_file_path(&self) -> String {
        format!("{EDUCATION_UPLOAD_DIR}{}", self.certification_file.trim())
    }
}

impl Validate for NewCertification {
    fn field_errors(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        check_text(&mut errors, "document_name", &self.document_name, 100);
        if let Some(document_type) = &self.document_type {
            check_choice(
                &mut errors,
                "document_type",
                document_type,
                DocumentType::parse,
            );
        }
        upload_path(
            &mut errors,
            "certification_file",
            EDUCATION_UPLOAD_DIR,
            &self.certification_file,
            FILE_PATH_MAX_LEN,
        );
        errors
    }
}

impl Sluggable for NewCertification {
    const TABLE: &'static str = "certification_licenses";
    const NAME: &'static str = "certification";

    fn slug_seed(&self, owner: &str) -> String {
        format!("{} {owner}", self.document_name)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewExperience {
    pub company_name: String,
    pub company_phone: String,
    pub job_title: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_current: bool,
    pub description: Option<String>,
}

impl Validate for NewExperience {
    fn field_errors(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        check_text(&mut errors, "company_name", &self.company_name, 100);
        check_text(&mut errors, "company_phone", &self.company_phone, 20);
        check_text(&mut errors, "job_title", &self.job_title, 100);
        check_optional_text(&mut errors, "description", self.description.as_deref(), 500);
        errors
    }
}

impl Sluggable for NewExperience {
    const TABLE: &'static str = "experiences";
    const NAME: &'static str = "experience";

    fn slug_seed(&self, owner: &str) -> String {
        format!("{} {owner}", self.job_title)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewLanguage {
    pub name: String,
}

impl Validate for NewLanguage {
    fn field_errors(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        check_text(&mut errors, "name", &self.name, 50);
        errors
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCategory {
    pub category: String,
}

impl Validate for NewCategory {
    fn field_errors(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        check_text(&mut errors, "category", &self.category, 200);
        errors
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPosition {
    pub position: String,
    pub category_id: Uuid,
    pub skill_test_link: String,
}

impl Validate for NewPosition {
    fn field_errors(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        check_text(&mut errors, "position", &self.position, 200);
        check_url(&mut errors, "skill_test_link", &self.skill_test_link, 200);
        errors
    }
}

impl Sluggable for NewPosition {
    const TABLE: &'static str = "positions";
    const NAME: &'static str = "position";

    // Positions belong to no user, so only the title seeds the slug.
    fn slug_seed(&self, _owner: &str) -> String {
        self.position.clone()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewSkill {
    pub skill: String,
    #[serde(default)]
    pub position_ids: Vec<Uuid>,
}

impl Validate for NewSkill {
    fn field_errors(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        check_text(&mut errors, "skill", &self.skill, 200);
        errors
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPreferences {
    pub minimum_salary: Decimal,
    pub salary_type: String,
    pub location: String,
    pub job_type: String,
    pub can_relocation: String,
    pub years_of_experience: i64,
    pub category_id: Uuid,
    #[serde(default)]
    pub desired_position_ids: Vec<Uuid>,
    #[serde(default)]
    pub skill_ids: Vec<Uuid>,
    pub custom_positions: Option<String>,
    pub custom_skills: Option<String>,
}

impl NewPreferences {
    /// Years of experience as stored; only meaningful once validated.
    pub fn years_of_experience(&self) -> i32 {
        i32::try_from(self.years_of_experience).unwrap_or(i32::MAX)
    }
}

impl Validate for NewPreferences {
    fn field_errors(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        check_decimal(&mut errors, "minimum_salary", &self.minimum_salary, 10, 2);
        check_choice(&mut errors, "salary_type", &self.salary_type, SalaryType::parse);
        check_text(&mut errors, "location", &self.location, 100);
        check_choice(&mut errors, "job_type", &self.job_type, JobType::parse);
        check_choice(
            &mut errors,
            "can_relocation",
            &self.can_relocation,
            Relocation::parse,
        );
        check_non_negative(&mut errors, "years_of_experience", self.years_of_experience);
        if self.years_of_experience > i64::from(i32::MAX) {
            errors.add(
                "years_of_experience",
                format!("Ensure this value is less than or equal to {}.", i32::MAX),
            );
        }
        check_optional_text(
            &mut errors,
            "custom_positions",
            self.custom_positions.as_deref(),
            200,
        );
        errors
    }
}

impl Sluggable for NewPreferences {
    const TABLE: &'static str = "employee_preferences";
    const NAME: &'static str = "preferences";

    fn slug_seed(&self, owner: &str) -> String {
        format!("{} {owner}", self.job_type)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use crate::employee::slug::testing::MemorySlugIndex;
    use crate::employee::slug::Draft;
    use crate::errors::AppError;

    fn experience(job_title: &str) -> NewExperience {
        NewExperience {
            company_name: "Acme".to_string(),
            company_phone: "555-0100".to_string(),
            job_title: job_title.to_string(),
            start_date: NaiveDate::from_ymd_opt(2020, 1, 6).unwrap(),
            end_date: None,
            is_current: true,
            description: None,
        }
    }

    fn personal(ssn: Option<&str>) -> NewPersonal {
        NewPersonal {
            nickname: "Jo".to_string(),
            social_security_number: ssn.map(str::to_string),
            drivers_license_number: "D1234567".to_string(),
            drivers_license_state: "TX".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 5, 17),
            gender: "F".to_string(),
            language_ids: vec![],
            e_verify: false,
        }
    }

    fn field_errors_of(err: AppError) -> FieldErrors {
        match err {
            AppError::InvalidFields(fields) => fields,
            other => panic!("expected field errors, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_identical_experience_seeds_get_distinct_slugs() {
        let index = MemorySlugIndex::default();

        let mut first = Draft::new(experience("Welder"), "jdoe").unwrap();
        let first_slug = first.assign_slug_if_absent(&index).await.unwrap().to_string();
        index.insert(NewExperience::TABLE, &first_slug);

        let mut second = Draft::new(experience("Welder"), "jdoe").unwrap();
        let second_slug = second.assign_slug_if_absent(&index).await.unwrap().to_string();

        assert_eq!(first_slug, "welder-jdoe");
        assert_eq!(second_slug, "welder-jdoe-1");
    }

    #[test]
    fn test_experience_description_limit() {
        let mut form = experience("Welder");
        form.description = Some("x".repeat(501));
        let err = Draft::new(form, "jdoe").unwrap_err();
        assert!(field_errors_of(err).contains("description"));
    }

    #[test]
    fn test_personal_accepts_valid_ssn() {
        assert!(personal(Some("078-05-1120")).validate().is_ok());
    }

    #[test]
    fn test_personal_rejects_missing_ssn() {
        let fields = field_errors_of(personal(None).validate().unwrap_err());
        assert_eq!(
            fields.get("social_security_number").unwrap()[0],
            "Invalid social security number."
        );
    }

    #[test]
    fn test_personal_rejects_excluded_ssn_ranges() {
        for ssn in ["000-12-3456", "123-00-6789", "123-45-0000", "666-01-0001"] {
            assert!(personal(Some(ssn)).validate().is_err(), "{ssn}");
        }
    }

    #[test]
    fn test_overlong_ssn_reports_a_single_error() {
        let fields = field_errors_of(personal(Some("078-05-11200")).validate().unwrap_err());
        assert_eq!(
            fields.get("social_security_number").unwrap().to_vec(),
            vec!["Invalid social security number.".to_string()]
        );
    }

    #[test]
    fn test_personal_seed_uses_nickname_and_username() {
        assert_eq!(personal(None).slug_seed("jdoe"), "Jo jdoe");
    }

    #[test]
    fn test_certification_document_type_defaults_and_choices() {
        let mut form = NewCertification {
            document_name: "CPR".to_string(),
            document_type: None,
            certification_file: "cpr.pdf".to_string(),
        };
        assert!(form.validate().is_ok());
        assert_eq!(form.document_type(), DocumentType::Certification);
        assert_eq!(form.certification_file_path(), "certificationsEducation/cpr.pdf");

        form.document_type = Some("LICENSES".to_string());
        assert_eq!(form.document_type(), DocumentType::Licenses);

        form.document_type = Some("DIPLOMA".to_string());
        assert!(field_errors_of(form.validate().unwrap_err()).contains("document_type"));
    }

    #[test]
    fn test_military_choices_and_upload() {
        let mut form = NewMilitary {
            branch: "NAVY".to_string(),
            rank: "E-4".to_string(),
            discharge_year: NaiveDate::from_ymd_opt(2015, 8, 1).unwrap(),
            duty_flag: "VETERAN".to_string(),
            certification_license: "dd214.pdf".to_string(),
        };
        assert!(form.validate().is_ok());
        assert_eq!(
            form.certification_license_path(),
            "certificationsMilitary/dd214.pdf"
        );

        form.branch = "PIRATES".to_string();
        form.certification_license = "a/b.pdf".to_string();
        let fields = field_errors_of(form.validate().unwrap_err());
        assert!(fields.contains("branch"));
        assert!(fields.contains("certification_license"));
    }

    #[test]
    fn test_basic_information_seed_and_state() {
        let mut form = NewBasicInformation {
            address: "1 Main St".to_string(),
            apartment: "2B".to_string(),
            city: "Austin".to_string(),
            state: "TX".to_string(),
            zip_code: "78701".to_string(),
            cell_phone: "555-0101".to_string(),
            home_phone: "555-0102".to_string(),
            work_phone: "555-0103".to_string(),
            email: "jo@example.com".to_string(),
            emergency_contact_number: "555-0104".to_string(),
            emergency_contact_name: "Sam".to_string(),
        };
        assert!(form.validate().is_ok());
        assert_eq!(form.slug_seed("ignored"), "jo@example.com 78701");

        form.state = "ZZ".to_string();
        assert!(field_errors_of(form.validate().unwrap_err()).contains("state"));
    }

    #[test]
    fn test_preferences_validation() {
        let mut form = NewPreferences {
            minimum_salary: Decimal::from_str("65000.00").unwrap(),
            salary_type: "YEARLY".to_string(),
            location: "Remote".to_string(),
            job_type: "FULL_TIME".to_string(),
            can_relocation: "MAYBE".to_string(),
            years_of_experience: 4,
            category_id: Uuid::new_v4(),
            desired_position_ids: vec![],
            skill_ids: vec![],
            custom_positions: None,
            custom_skills: None,
        };
        assert!(form.validate().is_ok());
        assert_eq!(form.slug_seed("jdoe"), "FULL_TIME jdoe");

        form.years_of_experience = -2;
        form.minimum_salary = Decimal::from_str("1.005").unwrap();
        let fields = field_errors_of(form.validate().unwrap_err());
        assert!(fields.contains("years_of_experience"));
        assert!(fields.contains("minimum_salary"));
    }

    #[test]
    fn test_policy_acceptance_seed() {
        let acceptance = PolicyAcceptance {
            policy_id: Uuid::new_v4(),
            policy_title: "Code of Conduct".to_string(),
            accepted: true,
        };
        assert_eq!(acceptance.slug_seed(""), "Code of Conduct-true");
    }

    #[test]
    fn test_position_requires_valid_link() {
        let form = NewPosition {
            position: "Forklift Operator".to_string(),
            category_id: Uuid::new_v4(),
            skill_test_link: "tests/forklift".to_string(),
        };
        assert!(field_errors_of(form.validate().unwrap_err()).contains("skill_test_link"));
    }
}
