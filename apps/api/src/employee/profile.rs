use serde::{Deserialize, Serialize};
use sqlx::{Executor, Postgres};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::profile::ProfileRow;

/// The onboarding sections a profile tracks. Each maps to one boolean
/// column; marking one never reads or writes another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileSection {
    CompanyPolicies,
    BasicInformation,
    PersonalInformation,
    Military,
    Education,
    Experience,
    Preferences,
    SkillSetTest,
    VideoResume,
    ResumeUploading,
}

impl ProfileSection {
    pub const ALL: [ProfileSection; 10] = [
        ProfileSection::CompanyPolicies,
        ProfileSection::BasicInformation,
        ProfileSection::PersonalInformation,
        ProfileSection::Military,
        ProfileSection::Education,
        ProfileSection::Experience,
        ProfileSection::Preferences,
        ProfileSection::SkillSetTest,
        ProfileSection::VideoResume,
        ProfileSection::ResumeUploading,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileSection::CompanyPolicies => "company_policies",
            ProfileSection::BasicInformation => "basic_information",
            ProfileSection::PersonalInformation => "personal_information",
            ProfileSection::Military => "military",
            ProfileSection::Education => "education",
            ProfileSection::Experience => "experience",
            ProfileSection::Preferences => "preferences",
            ProfileSection::SkillSetTest => "skill_set_test",
            ProfileSection::VideoResume => "video_resume",
            ProfileSection::ResumeUploading => "resume_uploading",
        }
    }

    /// Accepts the snake_case name or its kebab-case URL form.
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.replace('-', "_");
        Self::ALL.into_iter().find(|s| s.as_str() == normalized)
    }

    fn column(&self) -> &'static str {
        match self {
            ProfileSection::CompanyPolicies => "company_policies_completed",
            ProfileSection::BasicInformation => "basic_information_completed",
            ProfileSection::PersonalInformation => "personal_information_completed",
            ProfileSection::Military => "military_completed",
            ProfileSection::Education => "education_completed",
            ProfileSection::Experience => "experience_completed",
            ProfileSection::Preferences => "preferences_completed",
            ProfileSection::SkillSetTest => "skill_set_test_completed",
            ProfileSection::VideoResume => "video_resume_completed",
            ProfileSection::ResumeUploading => "resume_uploading_completed",
        }
    }

    pub fn is_completed(&self, profile: &ProfileRow) -> bool {
        match self {
            ProfileSection::CompanyPolicies => profile.company_policies_completed,
            ProfileSection::BasicInformation => profile.basic_information_completed,
            ProfileSection::PersonalInformation => profile.personal_information_completed,
            ProfileSection::Military => profile.military_completed,
            ProfileSection::Education => profile.education_completed,
            ProfileSection::Experience => profile.experience_completed,
            ProfileSection::Preferences => profile.preferences_completed,
            ProfileSection::SkillSetTest => profile.skill_set_test_completed,
            ProfileSection::VideoResume => profile.video_resume_completed,
            ProfileSection::ResumeUploading => profile.resume_uploading_completed,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionReport {
    pub percent_complete: f64,
    pub completed: Vec<ProfileSection>,
    pub pending: Vec<ProfileSection>,
}

pub fn compute_completion_report(profile: &ProfileRow) -> CompletionReport {
    let (completed, pending): (Vec<_>, Vec<_>) = ProfileSection::ALL
        .into_iter()
        .partition(|section| section.is_completed(profile));

    let percent_complete =
        (completed.len() as f64 / ProfileSection::ALL.len() as f64 * 100.0).round();

    CompletionReport {
        percent_complete,
        completed,
        pending,
    }
}

/// Inserts the profile row that accompanies every user.
pub async fn create_profile<'e, E>(executor: E, user_id: Uuid) -> Result<ProfileRow, AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    let profile = sqlx::query_as::<_, ProfileRow>(
        "INSERT INTO profiles (id, user_id, account_created) VALUES ($1, $2, true) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .fetch_one(executor)
    .await?;
    Ok(profile)
}

pub async fn get_profile<'e, E>(executor: E, user_id: Uuid) -> Result<ProfileRow, AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as::<_, ProfileRow>("SELECT * FROM profiles WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Profile for user {user_id} not found")))
}

/// Sets one section flag. Other flags are left untouched.
pub async fn set_section_completed<'e, E>(
    executor: E,
    user_id: Uuid,
    section: ProfileSection,
    completed: bool,
) -> Result<(), AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    let query = format!(
        "UPDATE profiles SET {} = $1 WHERE user_id = $2",
        section.column()
    );
    let result = sqlx::query(&query)
        .bind(completed)
        .bind(user_id)
        .execute(executor)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!(
            "Profile for user {user_id} not found"
        )));
    }
    info!(
        "Profile section {} set to {completed} for user {user_id}",
        section.as_str()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_profile_has_nothing_completed() {
        let profile = ProfileRow::default();
        assert!(!profile.military_completed);
        let report = compute_completion_report(&profile);
        assert_eq!(report.percent_complete, 0.0);
        assert_eq!(report.pending.len(), 10);
    }

    #[test]
    fn test_military_flag_is_independent() {
        let profile = ProfileRow {
            military_completed: true,
            ..Default::default()
        };
        let report = compute_completion_report(&profile);
        assert_eq!(report.completed, vec![ProfileSection::Military]);
        for section in ProfileSection::ALL {
            if section != ProfileSection::Military {
                assert!(!section.is_completed(&profile), "{}", section.as_str());
            }
        }
    }

    #[test]
    fn test_sections_complete_in_any_order() {
        let profile = ProfileRow {
            resume_uploading_completed: true,
            company_policies_completed: true,
            ..Default::default()
        };
        let report = compute_completion_report(&profile);
        assert_eq!(report.percent_complete, 20.0);
        assert_eq!(report.pending.len(), 8);
    }

    #[test]
    fn test_account_created_is_not_a_section() {
        let profile = ProfileRow {
            account_created: true,
            ..Default::default()
        };
        assert!(compute_completion_report(&profile).completed.is_empty());
    }

    #[test]
    fn test_parse_accepts_url_form() {
        assert_eq!(
            ProfileSection::parse("skill-set-test"),
            Some(ProfileSection::SkillSetTest)
        );
        assert_eq!(
            ProfileSection::parse("video_resume"),
            Some(ProfileSection::VideoResume)
        );
        assert_eq!(ProfileSection::parse("account_created"), None);
    }

    #[test]
    fn test_columns_are_distinct() {
        let mut columns: Vec<_> = ProfileSection::ALL.iter().map(|s| s.column()).collect();
        columns.sort();
        columns.dedup();
        assert_eq!(columns.len(), 10);
    }
}
