use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, FromRow};
use uuid::Uuid;

use crate::employee::catalog;
use crate::employee::forms::{
    NewBasicInformation, NewCategory, NewCertification, NewEducation, NewExperience, NewLanguage,
    NewMilitary, NewPersonal, NewPolicy, NewPosition, NewPreferences, NewSkill,
};
use crate::employee::policies::{self, AcceptPolicyRequest};
use crate::employee::preferences;
use crate::employee::profile::{
    compute_completion_report, get_profile, set_section_completed, CompletionReport,
    ProfileSection,
};
use crate::employee::records::{self, delete_owned, get_owned, list_owned};
use crate::employee::slug::Sluggable;
use crate::employee::users::{self, NewUser, UserWithProfile};
use crate::errors::AppError;
use crate::models::catalog::{CategoryRow, PositionRow, SkillRow};
use crate::models::policies::{AcceptedPolicyRow, PolicyRow};
use crate::models::preferences::PreferencesDetail;
use crate::models::profile::ProfileRow;
use crate::models::records::{
    BasicInformationRow, CertificationLicenseRow, EducationRow, ExperienceRow, LanguageRow,
    MilitaryRow, PersonalDetail,
};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

type Created<T> = (StatusCode, Json<T>);

fn created<T>(value: T) -> Created<T> {
    (StatusCode::CREATED, Json(value))
}

// ────────────────────────────────────────────────────────────────────────────
// Owner-scoped list / get / delete, shared by every section
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/{section}
pub async fn handle_list<F, R>(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<R>>, AppError>
where
    F: Sluggable + 'static,
    R: for<'r> FromRow<'r, PgRow> + Serialize + Send + Unpin + 'static,
{
    Ok(Json(list_owned::<R>(&state.db, F::TABLE, params.user_id).await?))
}

/// GET /api/v1/{section}/:slug
pub async fn handle_get<F, R>(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<R>, AppError>
where
    F: Sluggable + 'static,
    R: for<'r> FromRow<'r, PgRow> + Serialize + Send + Unpin + 'static,
{
    Ok(Json(
        get_owned::<R>(&state.db, F::TABLE, &slug, params.user_id).await?,
    ))
}

/// DELETE /api/v1/{section}/:slug
pub async fn handle_delete<F>(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(params): Query<UserIdQuery>,
) -> Result<StatusCode, AppError>
where
    F: Sluggable + 'static,
{
    delete_owned(&state.db, F::TABLE, &slug, params.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ────────────────────────────────────────────────────────────────────────────
// Users and profile
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/users
pub async fn handle_create_user(
    State(state): State<AppState>,
    Json(req): Json<NewUser>,
) -> Result<Created<UserWithProfile>, AppError> {
    Ok(created(users::create_user(&state.db, &req).await?))
}

#[derive(Serialize)]
pub struct ProfileResponse {
    pub profile: ProfileRow,
    pub completion: CompletionReport,
}

/// GET /api/v1/profile
pub async fn handle_get_profile(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<ProfileResponse>, AppError> {
    let profile = get_profile(&state.db, params.user_id).await?;
    let completion = compute_completion_report(&profile);
    Ok(Json(ProfileResponse {
        profile,
        completion,
    }))
}

#[derive(Deserialize)]
pub struct SectionUpdate {
    pub user_id: Uuid,
    pub completed: bool,
}

/// PATCH /api/v1/profile/sections/:section
pub async fn handle_set_section(
    State(state): State<AppState>,
    Path(section): Path<String>,
    Json(req): Json<SectionUpdate>,
) -> Result<Json<ProfileResponse>, AppError> {
    let section = ProfileSection::parse(&section)
        .ok_or_else(|| AppError::Validation(format!("Unknown profile section '{section}'")))?;
    set_section_completed(&state.db, req.user_id, section, req.completed).await?;
    let profile = get_profile(&state.db, req.user_id).await?;
    let completion = compute_completion_report(&profile);
    Ok(Json(ProfileResponse {
        profile,
        completion,
    }))
}

// ────────────────────────────────────────────────────────────────────────────
// Policies
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/policies
pub async fn handle_list_policies(
    State(state): State<AppState>,
) -> Result<Json<Vec<PolicyRow>>, AppError> {
    Ok(Json(policies::list_policies(&state.db).await?))
}

/// POST /api/v1/policies
pub async fn handle_create_policy(
    State(state): State<AppState>,
    Json(form): Json<NewPolicy>,
) -> Result<Created<PolicyRow>, AppError> {
    Ok(created(policies::insert_policy(&state.db, form).await?))
}

/// POST /api/v1/policies/:slug/accept
pub async fn handle_accept_policy(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(req): Json<AcceptPolicyRequest>,
) -> Result<Json<AcceptedPolicyRow>, AppError> {
    Ok(Json(policies::accept_policy(&state.db, &slug, &req).await?))
}

/// GET /api/v1/policies/accepted
pub async fn handle_list_accepted(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<AcceptedPolicyRow>>, AppError> {
    Ok(Json(policies::list_accepted(&state.db, params.user_id).await?))
}

// ────────────────────────────────────────────────────────────────────────────
// Basic information
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/basic-information
pub async fn handle_create_basic_information(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
    Json(form): Json<NewBasicInformation>,
) -> Result<Created<BasicInformationRow>, AppError> {
    Ok(created(
        records::insert_basic_information(&state.db, params.user_id, form).await?,
    ))
}

/// PUT /api/v1/basic-information/:slug
pub async fn handle_update_basic_information(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(params): Query<UserIdQuery>,
    Json(form): Json<NewBasicInformation>,
) -> Result<Json<BasicInformationRow>, AppError> {
    Ok(Json(
        records::update_basic_information(&state.db, params.user_id, &slug, form).await?,
    ))
}

// ────────────────────────────────────────────────────────────────────────────
// Languages and personal information
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/languages
pub async fn handle_list_languages(
    State(state): State<AppState>,
) -> Result<Json<Vec<LanguageRow>>, AppError> {
    Ok(Json(records::list_languages(&state.db).await?))
}

/// POST /api/v1/languages
pub async fn handle_create_language(
    State(state): State<AppState>,
    Json(form): Json<NewLanguage>,
) -> Result<Created<LanguageRow>, AppError> {
    Ok(created(records::insert_language(&state.db, form).await?))
}

/// POST /api/v1/personal
pub async fn handle_create_personal(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
    Json(form): Json<NewPersonal>,
) -> Result<Created<PersonalDetail>, AppError> {
    Ok(created(
        records::insert_personal(&state.db, params.user_id, form).await?,
    ))
}

/// GET /api/v1/personal
pub async fn handle_list_personal(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<PersonalDetail>>, AppError> {
    Ok(Json(records::list_personal(&state.db, params.user_id).await?))
}

/// GET /api/v1/personal/:slug
pub async fn handle_get_personal(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<PersonalDetail>, AppError> {
    Ok(Json(
        records::get_personal(&state.db, params.user_id, &slug).await?,
    ))
}

/// PUT /api/v1/personal/:slug
pub async fn handle_update_personal(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(params): Query<UserIdQuery>,
    Json(form): Json<NewPersonal>,
) -> Result<Json<PersonalDetail>, AppError> {
    Ok(Json(
        records::update_personal(&state.db, params.user_id, &slug, form).await?,
    ))
}

// ────────────────────────────────────────────────────────────────────────────
// Military
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/military
pub async fn handle_create_military(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
    Json(form): Json<NewMilitary>,
) -> Result<Created<MilitaryRow>, AppError> {
    Ok(created(
        records::insert_military(&state.db, params.user_id, form).await?,
    ))
}

/// PUT /api/v1/military/:slug
pub async fn handle_update_military(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(params): Query<UserIdQuery>,
    Json(form): Json<NewMilitary>,
) -> Result<Json<MilitaryRow>, AppError> {
    Ok(Json(
        records::update_military(&state.db, params.user_id, &slug, form).await?,
    ))
}

// ────────────────────────────────────────────────────────────────────────────
// Education and certifications
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/education
pub async fn handle_create_education(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
    Json(form): Json<NewEducation>,
) -> Result<Created<EducationRow>, AppError> {
    Ok(created(
        records::insert_education(&state.db, params.user_id, form).await?,
    ))
}

/// PUT /api/v1/education/:slug
pub async fn handle_update_education(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(params): Query<UserIdQuery>,
    Json(form): Json<NewEducation>,
) -> Result<Json<EducationRow>, AppError> {
    Ok(Json(
        records::update_education(&state.db, params.user_id, &slug, form).await?,
    ))
}

/// POST /api/v1/education/:slug/certifications
pub async fn handle_create_certification(
    State(state): State<AppState>,
    Path(education_slug): Path<String>,
    Query(params): Query<UserIdQuery>,
    Json(form): Json<NewCertification>,
) -> Result<Created<CertificationLicenseRow>, AppError> {
    Ok(created(
        records::insert_certification(&state.db, params.user_id, &education_slug, form).await?,
    ))
}

/// GET /api/v1/education/:slug/certifications
pub async fn handle_list_certifications(
    State(state): State<AppState>,
    Path(education_slug): Path<String>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<CertificationLicenseRow>>, AppError> {
    Ok(Json(
        records::list_certifications(&state.db, params.user_id, &education_slug).await?,
    ))
}

/// DELETE /api/v1/certifications/:slug
pub async fn handle_delete_certification(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(params): Query<UserIdQuery>,
) -> Result<StatusCode, AppError> {
    records::delete_certification(&state.db, params.user_id, &slug).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ────────────────────────────────────────────────────────────────────────────
// Experience
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/experience
pub async fn handle_create_experience(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
    Json(form): Json<NewExperience>,
) -> Result<Created<ExperienceRow>, AppError> {
    Ok(created(
        records::insert_experience(&state.db, params.user_id, form).await?,
    ))
}

/// PUT /api/v1/experience/:slug
pub async fn handle_update_experience(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(params): Query<UserIdQuery>,
    Json(form): Json<NewExperience>,
) -> Result<Json<ExperienceRow>, AppError> {
    Ok(Json(
        records::update_experience(&state.db, params.user_id, &slug, form).await?,
    ))
}

// ────────────────────────────────────────────────────────────────────────────
// Catalog
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/categories
pub async fn handle_list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<CategoryRow>>, AppError> {
    Ok(Json(catalog::list_categories(&state.db).await?))
}

/// POST /api/v1/categories
pub async fn handle_create_category(
    State(state): State<AppState>,
    Json(form): Json<NewCategory>,
) -> Result<Created<CategoryRow>, AppError> {
    Ok(created(catalog::insert_category(&state.db, form).await?))
}

/// POST /api/v1/positions
pub async fn handle_create_position(
    State(state): State<AppState>,
    Json(form): Json<NewPosition>,
) -> Result<Created<PositionRow>, AppError> {
    Ok(created(
        catalog::insert_position(&state.db, &state.lookup, form).await?,
    ))
}

/// DELETE /api/v1/positions/:slug
pub async fn handle_delete_position(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<StatusCode, AppError> {
    catalog::delete_position(&state.db, &state.lookup, &slug).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/skills
pub async fn handle_create_skill(
    State(state): State<AppState>,
    Json(form): Json<NewSkill>,
) -> Result<Created<SkillRow>, AppError> {
    Ok(created(
        catalog::insert_skill(&state.db, &state.lookup, form).await?,
    ))
}

// ────────────────────────────────────────────────────────────────────────────
// Preferences
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/preferences
pub async fn handle_create_preferences(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
    Json(form): Json<NewPreferences>,
) -> Result<Created<PreferencesDetail>, AppError> {
    Ok(created(
        preferences::insert_preferences(&state.db, params.user_id, form).await?,
    ))
}

/// GET /api/v1/preferences
pub async fn handle_list_preferences(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<PreferencesDetail>>, AppError> {
    Ok(Json(
        preferences::list_preferences(&state.db, params.user_id).await?,
    ))
}

/// GET /api/v1/preferences/:slug
pub async fn handle_get_preferences(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<PreferencesDetail>, AppError> {
    Ok(Json(
        preferences::get_preferences(&state.db, params.user_id, &slug).await?,
    ))
}

/// PUT /api/v1/preferences/:slug
pub async fn handle_update_preferences(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(params): Query<UserIdQuery>,
    Json(form): Json<NewPreferences>,
) -> Result<Json<PreferencesDetail>, AppError> {
    Ok(Json(
        preferences::update_preferences(&state.db, params.user_id, &slug, form).await?,
    ))
}

/// GET /api/v1/preferences/:slug/positions
pub async fn handle_preference_positions(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<PositionRow>>, AppError> {
    let detail = preferences::get_preferences(&state.db, params.user_id, &slug).await?;
    Ok(Json(state.lookup.get_positions(&detail).await?))
}

/// GET /api/v1/preferences/:slug/skills
pub async fn handle_preference_skills(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<SkillRow>>, AppError> {
    let detail = preferences::get_preferences(&state.db, params.user_id, &slug).await?;
    Ok(Json(state.lookup.get_skills(&detail).await?))
}
