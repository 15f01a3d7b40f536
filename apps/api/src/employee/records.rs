//! Persistence for the per-user onboarding sections.
//!
//! Every insert follows the same pipeline: resolve the owner's username,
//! validate the form into a [`Draft`], assign the slug, INSERT, and mark the
//! matching profile section, the last two inside one transaction. Updates
//! and deletes are scoped by `(slug, user_id)`.

use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgConnection, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::employee::catalog::check_references;
use crate::employee::forms::{
    NewBasicInformation, NewCertification, NewEducation, NewExperience, NewLanguage, NewMilitary,
    NewPersonal,
};
use crate::employee::profile::{set_section_completed, ProfileSection};
use crate::employee::slug::{Draft, Sluggable};
use crate::employee::users::fetch_username;
use crate::employee::validation::Validate;
use crate::errors::{AppError, FieldErrors};
use crate::models::records::{
    BasicInformationRow, CertificationLicenseRow, EducationRow, ExperienceRow, LanguageRow,
    MilitaryRow, PersonalDetail, PersonalRow,
};

// ────────────────────────────────────────────────────────────────────────────
// Shared owner-scoped queries
// ────────────────────────────────────────────────────────────────────────────

/// All rows of `table` owned by `user_id`, oldest first.
pub async fn list_owned<T>(pool: &PgPool, table: &'static str, user_id: Uuid) -> Result<Vec<T>, AppError>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    let query = format!("SELECT * FROM {table} WHERE user_id = $1 ORDER BY created_at ASC");
    Ok(sqlx::query_as::<_, T>(&query)
        .bind(user_id)
        .fetch_all(pool)
        .await?)
}

pub async fn get_owned<T>(
    pool: &PgPool,
    table: &'static str,
    slug: &str,
    user_id: Uuid,
) -> Result<T, AppError>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    let query = format!("SELECT * FROM {table} WHERE slug = $1 AND user_id = $2");
    sqlx::query_as::<_, T>(&query)
        .bind(slug)
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No {table} row with slug '{slug}'")))
}

/// Deletes an owned row; dependent rows go with it through ON DELETE CASCADE.
pub async fn delete_owned(
    pool: &PgPool,
    table: &'static str,
    slug: &str,
    user_id: Uuid,
) -> Result<(), AppError> {
    let query = format!("DELETE FROM {table} WHERE slug = $1 AND user_id = $2");
    let result = sqlx::query(&query)
        .bind(slug)
        .bind(user_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!(
            "No {table} row with slug '{slug}'"
        )));
    }
    info!("Deleted {table} row '{slug}' for user {user_id}");
    Ok(())
}

/// Validates `form` and assigns its slug, ready for INSERT.
pub(crate) async fn prepare<T: Sluggable + Validate>(
    pool: &PgPool,
    user_id: Uuid,
    form: T,
) -> Result<(Draft<T>, String), AppError> {
    let username = fetch_username(pool, user_id).await?;
    let mut draft = Draft::new(form, username)?;
    let slug = draft.assign_slug_if_absent(pool).await?.to_string();
    Ok((draft, slug))
}

fn not_found(table: &str, slug: &str) -> AppError {
    AppError::NotFound(format!("No {table} row with slug '{slug}'"))
}

// ────────────────────────────────────────────────────────────────────────────
// Basic information
// ────────────────────────────────────────────────────────────────────────────

pub async fn insert_basic_information(
    pool: &PgPool,
    user_id: Uuid,
    form: NewBasicInformation,
) -> Result<BasicInformationRow, AppError> {
    let (draft, slug) = prepare(pool, user_id, form).await?;
    let f = &draft.record;

    let mut tx = pool.begin().await?;
    let row = sqlx::query_as::<_, BasicInformationRow>(
        r#"
        INSERT INTO basic_information
            (id, user_id, address, apartment, city, state, zip_code, cell_phone,
             home_phone, work_phone, email, emergency_contact_number,
             emergency_contact_name, slug)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(&f.address)
    .bind(&f.apartment)
    .bind(&f.city)
    .bind(&f.state)
    .bind(&f.zip_code)
    .bind(&f.cell_phone)
    .bind(&f.home_phone)
    .bind(&f.work_phone)
    .bind(&f.email)
    .bind(&f.emergency_contact_number)
    .bind(&f.emergency_contact_name)
    .bind(&slug)
    .fetch_one(&mut *tx)
    .await?;
    set_section_completed(&mut *tx, user_id, ProfileSection::BasicInformation, true).await?;
    tx.commit().await?;

    info!("Inserted basic information '{slug}' for user {user_id}");
    Ok(row)
}

pub async fn update_basic_information(
    pool: &PgPool,
    user_id: Uuid,
    slug: &str,
    form: NewBasicInformation,
) -> Result<BasicInformationRow, AppError> {
    form.validate()?;
    sqlx::query_as::<_, BasicInformationRow>(
        r#"
        UPDATE basic_information SET
            address = $1, apartment = $2, city = $3, state = $4, zip_code = $5,
            cell_phone = $6, home_phone = $7, work_phone = $8, email = $9,
            emergency_contact_number = $10, emergency_contact_name = $11,
            updated_at = now()
        WHERE slug = $12 AND user_id = $13
        RETURNING *
        "#,
    )
    .bind(&form.address)
    .bind(&form.apartment)
    .bind(&form.city)
    .bind(&form.state)
    .bind(&form.zip_code)
    .bind(&form.cell_phone)
    .bind(&form.home_phone)
    .bind(&form.work_phone)
    .bind(&form.email)
    .bind(&form.emergency_contact_number)
    .bind(&form.emergency_contact_name)
    .bind(slug)
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| not_found(NewBasicInformation::TABLE, slug))
}

// ────────────────────────────────────────────────────────────────────────────
// Languages and personal information
// ────────────────────────────────────────────────────────────────────────────

pub async fn list_languages(pool: &PgPool) -> Result<Vec<LanguageRow>, AppError> {
    Ok(
        sqlx::query_as::<_, LanguageRow>("SELECT * FROM languages ORDER BY name ASC")
            .fetch_all(pool)
            .await?,
    )
}

pub async fn insert_language(pool: &PgPool, form: NewLanguage) -> Result<LanguageRow, AppError> {
    form.validate()?;
    Ok(sqlx::query_as::<_, LanguageRow>(
        "INSERT INTO languages (id, name) VALUES ($1, $2) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(form.name.trim())
    .fetch_one(pool)
    .await?)
}

async fn check_languages(pool: &PgPool, language_ids: &[Uuid]) -> Result<(), AppError> {
    let mut errors = FieldErrors::new();
    check_references(pool, &mut errors, "language_ids", "languages", language_ids).await?;
    errors.into_result()
}

async fn replace_personal_languages(
    conn: &mut PgConnection,
    personal_id: Uuid,
    language_ids: &[Uuid],
) -> Result<Vec<Uuid>, AppError> {
    sqlx::query("DELETE FROM personal_languages WHERE personal_id = $1")
        .bind(personal_id)
        .execute(&mut *conn)
        .await?;
    sqlx::query(
        r#"
        INSERT INTO personal_languages (personal_id, language_id)
        SELECT $1, UNNEST($2::uuid[])
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(personal_id)
    .bind(language_ids)
    .execute(&mut *conn)
    .await?;
    personal_language_ids(conn, personal_id).await
}

async fn personal_language_ids(
    conn: &mut PgConnection,
    personal_id: Uuid,
) -> Result<Vec<Uuid>, AppError> {
    Ok(sqlx::query_scalar::<_, Uuid>(
        "SELECT language_id FROM personal_languages WHERE personal_id = $1 ORDER BY language_id",
    )
    .bind(personal_id)
    .fetch_all(conn)
    .await?)
}

pub async fn insert_personal(
    pool: &PgPool,
    user_id: Uuid,
    form: NewPersonal,
) -> Result<PersonalDetail, AppError> {
    form.validate()?;
    check_languages(pool, &form.language_ids).await?;
    let (draft, slug) = prepare(pool, user_id, form).await?;
    let f = &draft.record;

    let mut tx = pool.begin().await?;
    let personal = sqlx::query_as::<_, PersonalRow>(
        r#"
        INSERT INTO personals
            (id, user_id, nickname, social_security_number, drivers_license_number,
             drivers_license_state, date_of_birth, gender, e_verify, slug)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(&f.nickname)
    .bind(f.social_security_number.as_deref())
    .bind(&f.drivers_license_number)
    .bind(&f.drivers_license_state)
    .bind(f.date_of_birth)
    .bind(&f.gender)
    .bind(f.e_verify)
    .bind(&slug)
    .fetch_one(&mut *tx)
    .await?;
    let language_ids = replace_personal_languages(&mut tx, personal.id, &f.language_ids).await?;
    set_section_completed(&mut *tx, user_id, ProfileSection::PersonalInformation, true).await?;
    tx.commit().await?;

    info!("Inserted personal information '{slug}' for user {user_id}");
    Ok(PersonalDetail {
        personal,
        language_ids,
    })
}

pub async fn list_personal(pool: &PgPool, user_id: Uuid) -> Result<Vec<PersonalDetail>, AppError> {
    let rows: Vec<PersonalRow> = list_owned(pool, NewPersonal::TABLE, user_id).await?;
    let mut conn = pool.acquire().await?;
    let mut details = Vec::with_capacity(rows.len());
    for personal in rows {
        let language_ids = personal_language_ids(&mut conn, personal.id).await?;
        details.push(PersonalDetail {
            personal,
            language_ids,
        });
    }
    Ok(details)
}

pub async fn get_personal(
    pool: &PgPool,
    user_id: Uuid,
    slug: &str,
) -> Result<PersonalDetail, AppError> {
    let personal: PersonalRow = get_owned(pool, NewPersonal::TABLE, slug, user_id).await?;
    let mut conn = pool.acquire().await?;
    let language_ids = personal_language_ids(&mut conn, personal.id).await?;
    Ok(PersonalDetail {
        personal,
        language_ids,
    })
}

pub async fn update_personal(
    pool: &PgPool,
    user_id: Uuid,
    slug: &str,
    form: NewPersonal,
) -> Result<PersonalDetail, AppError> {
    form.validate()?;
    check_languages(pool, &form.language_ids).await?;

    let mut tx = pool.begin().await?;
    let personal = sqlx::query_as::<_, PersonalRow>(
        r#"
        UPDATE personals SET
            nickname = $1, social_security_number = $2, drivers_license_number = $3,
            drivers_license_state = $4, date_of_birth = $5, gender = $6, e_verify = $7,
            updated_at = now()
        WHERE slug = $8 AND user_id = $9
        RETURNING *
        "#,
    )
    .bind(&form.nickname)
    .bind(form.social_security_number.as_deref())
    .bind(&form.drivers_license_number)
    .bind(&form.drivers_license_state)
    .bind(form.date_of_birth)
    .bind(&form.gender)
    .bind(form.e_verify)
    .bind(slug)
    .bind(user_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| not_found(NewPersonal::TABLE, slug))?;
    let language_ids = replace_personal_languages(&mut tx, personal.id, &form.language_ids).await?;
    tx.commit().await?;

    Ok(PersonalDetail {
        personal,
        language_ids,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Military
// ────────────────────────────────────────────────────────────────────────────

pub async fn insert_military(
    pool: &PgPool,
    user_id: Uuid,
    form: NewMilitary,
) -> Result<MilitaryRow, AppError> {
    let (draft, slug) = prepare(pool, user_id, form).await?;
    let f = &draft.record;

    let mut tx = pool.begin().await?;
    let row = sqlx::query_as::<_, MilitaryRow>(
        r#"
        INSERT INTO militaries
            (id, user_id, branch, rank, discharge_year, duty_flag, certification_license, slug)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(&f.branch)
    .bind(&f.rank)
    .bind(f.discharge_year)
    .bind(&f.duty_flag)
    .bind(f.certification_license_path())
    .bind(&slug)
    .fetch_one(&mut *tx)
    .await?;
    set_section_completed(&mut *tx, user_id, ProfileSection::Military, true).await?;
    tx.commit().await?;

    info!("Inserted military record '{slug}' for user {user_id}");
    Ok(row)
}

pub async fn update_military(
    pool: &PgPool,
    user_id: Uuid,
    slug: &str,
    form: NewMilitary,
) -> Result<MilitaryRow, AppError> {
    form.validate()?;
    sqlx::query_as::<_, MilitaryRow>(
        r#"
        UPDATE militaries SET
            branch = $1, rank = $2, discharge_year = $3, duty_flag = $4,
            certification_license = $5, updated_at = now()
        WHERE slug = $6 AND user_id = $7
        RETURNING *
        "#,
    )
    .bind(&form.branch)
    .bind(&form.rank)
    .bind(form.discharge_year)
    .bind(&form.duty_flag)
    .bind(form.certification_license_path())
    .bind(slug)
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| not_found(NewMilitary::TABLE, slug))
}

// ────────────────────────────────────────────────────────────────────────────
// Education and its certifications
// ────────────────────────────────────────────────────────────────────────────

pub async fn insert_education(
    pool: &PgPool,
    user_id: Uuid,
    form: NewEducation,
) -> Result<EducationRow, AppError> {
    let (draft, slug) = prepare(pool, user_id, form).await?;
    let f = &draft.record;

    let mut tx = pool.begin().await?;
    let row = sqlx::query_as::<_, EducationRow>(
        r#"
        INSERT INTO educations
            (id, user_id, school_type, school_name, country, city, state, graduated,
             graduation_date, degree_type, documentation, slug)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(&f.school_type)
    .bind(&f.school_name)
    .bind(&f.country)
    .bind(&f.city)
    .bind(&f.state)
    .bind(f.graduated)
    .bind(f.graduation_date)
    .bind(&f.degree_type)
    .bind(f.documentation)
    .bind(&slug)
    .fetch_one(&mut *tx)
    .await?;
    set_section_completed(&mut *tx, user_id, ProfileSection::Education, true).await?;
    tx.commit().await?;

    info!("Inserted education '{slug}' for user {user_id}");
    Ok(row)
}

pub async fn update_education(
    pool: &PgPool,
    user_id: Uuid,
    slug: &str,
    form: NewEducation,
) -> Result<EducationRow, AppError> {
    form.validate()?;
    sqlx::query_as::<_, EducationRow>(
        r#"
        UPDATE educations SET
            school_type = $1, school_name = $2, country = $3, city = $4, state = $5,
            graduated = $6, graduation_date = $7, degree_type = $8, documentation = $9,
            updated_at = now()
        WHERE slug = $10 AND user_id = $11
        RETURNING *
        "#,
    )
    .bind(&form.school_type)
    .bind(&form.school_name)
    .bind(&form.country)
    .bind(&form.city)
    .bind(&form.state)
    .bind(form.graduated)
    .bind(form.graduation_date)
    .bind(&form.degree_type)
    .bind(form.documentation)
    .bind(slug)
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| not_found(NewEducation::TABLE, slug))
}

/// Attaches a certification or license to one of the user's education rows
/// and flags that row as documented.
pub async fn insert_certification(
    pool: &PgPool,
    user_id: Uuid,
    education_slug: &str,
    form: NewCertification,
) -> Result<CertificationLicenseRow, AppError> {
    let education: EducationRow =
        get_owned(pool, NewEducation::TABLE, education_slug, user_id).await?;
    let (draft, slug) = prepare(pool, user_id, form).await?;
    let f = &draft.record;

    let mut tx = pool.begin().await?;
    let row = sqlx::query_as::<_, CertificationLicenseRow>(
        r#"
        INSERT INTO certification_licenses
            (id, education_id, document_name, document_type, certification_file, slug)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(education.id)
    .bind(&f.document_name)
    .bind(f.document_type().as_str())
    .bind(f.certification_file_path())
    .bind(&slug)
    .fetch_one(&mut *tx)
    .await?;
    sync_documentation(&mut tx, education.id).await?;
    tx.commit().await?;

    info!("Inserted certification '{slug}' under education '{education_slug}'");
    Ok(row)
}

pub async fn list_certifications(
    pool: &PgPool,
    user_id: Uuid,
    education_slug: &str,
) -> Result<Vec<CertificationLicenseRow>, AppError> {
    let education: EducationRow =
        get_owned(pool, NewEducation::TABLE, education_slug, user_id).await?;
    Ok(sqlx::query_as::<_, CertificationLicenseRow>(
        "SELECT * FROM certification_licenses WHERE education_id = $1 ORDER BY created_at ASC",
    )
    .bind(education.id)
    .fetch_all(pool)
    .await?)
}

/// `educations.documentation` is true exactly while the education has a certification.
const SYNC_DOCUMENTATION: &str = r#"
    UPDATE educations SET
        documentation = EXISTS(SELECT 1 FROM certification_licenses WHERE education_id = $1),
        updated_at = now()
    WHERE id = $1
"#;

async fn sync_documentation(conn: &mut PgConnection, education_id: Uuid) -> Result<(), AppError> {
    sqlx::query(SYNC_DOCUMENTATION)
        .bind(education_id)
        .execute(conn)
        .await?;
    Ok(())
}

/// Certifications are owned through their education row.
pub async fn delete_certification(pool: &PgPool, user_id: Uuid, slug: &str) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;
    let education_id: Uuid = sqlx::query_scalar(
        r#"
        DELETE FROM certification_licenses c
        USING educations e
        WHERE c.education_id = e.id AND c.slug = $1 AND e.user_id = $2
        RETURNING c.education_id
        "#,
    )
    .bind(slug)
    .bind(user_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| not_found(NewCertification::TABLE, slug))?;
    sync_documentation(&mut tx, education_id).await?;
    tx.commit().await?;

    info!("Deleted certification '{slug}' for user {user_id}");
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// Experience
// ────────────────────────────────────────────────────────────────────────────

pub async fn insert_experience(
    pool: &PgPool,
    user_id: Uuid,
    form: NewExperience,
) -> Result<ExperienceRow, AppError> {
    let (draft, slug) = prepare(pool, user_id, form).await?;
    let f = &draft.record;

    let mut tx = pool.begin().await?;
    let row = sqlx::query_as::<_, ExperienceRow>(
        r#"
        INSERT INTO experiences
            (id, user_id, company_name, company_phone, job_title, start_date, end_date,
             is_current, description, slug)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(&f.company_name)
    .bind(&f.company_phone)
    .bind(&f.job_title)
    .bind(f.start_date)
    .bind(f.end_date)
    .bind(f.is_current)
    .bind(f.description.as_deref())
    .bind(&slug)
    .fetch_one(&mut *tx)
    .await?;
    set_section_completed(&mut *tx, user_id, ProfileSection::Experience, true).await?;
    tx.commit().await?;

    info!("Inserted experience '{slug}' for user {user_id}");
    Ok(row)
}

pub async fn update_experience(
    pool: &PgPool,
    user_id: Uuid,
    slug: &str,
    form: NewExperience,
) -> Result<ExperienceRow, AppError> {
    form.validate()?;
    sqlx::query_as::<_, ExperienceRow>(
        r#"
        UPDATE experiences SET
            company_name = $1, company_phone = $2, job_title = $3, start_date = $4,
            end_date = $5, is_current = $6, description = $7, updated_at = now()
        WHERE slug = $8 AND user_id = $9
        RETURNING *
        "#,
    )
    .bind(&form.company_name)
    .bind(&form.company_phone)
    .bind(&form.job_title)
    .bind(form.start_date)
    .bind(form.end_date)
    .bind(form.is_current)
    .bind(form.description.as_deref())
    .bind(slug)
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| not_found(NewExperience::TABLE, slug))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_documentation_flag_follows_remaining_certifications() {
        assert!(SYNC_DOCUMENTATION.contains(
            "documentation = EXISTS(SELECT 1 FROM certification_licenses WHERE education_id = $1)"
        ));
        assert!(!SYNC_DOCUMENTATION.contains("documentation = true"));
    }
}
