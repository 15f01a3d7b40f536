pub mod health;

use axum::{
    routing::{delete, get, patch, post},
    Router,
};

use crate::employee::forms::{
    NewBasicInformation, NewEducation, NewExperience, NewMilitary, NewPersonal, NewPreferences,
};
use crate::employee::handlers::{self, handle_delete, handle_get, handle_list};
use crate::models::records::{BasicInformationRow, EducationRow, ExperienceRow, MilitaryRow};
use crate::pages::handlers as pages;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(pages::home_handler))
        .route("/about-us/", get(pages::about_handler))
        .route("/contact-us/", get(pages::contact_handler))
        .route("/health", get(health::health_handler))
        .nest("/api/v1", api_router())
        .with_state(state)
}

fn api_router() -> Router<AppState> {
    Router::new()
        // Users and profile
        .route("/users", post(handlers::handle_create_user))
        .route("/profile", get(handlers::handle_get_profile))
        .route(
            "/profile/sections/:section",
            patch(handlers::handle_set_section),
        )
        // Policies
        .route(
            "/policies",
            get(handlers::handle_list_policies).post(handlers::handle_create_policy),
        )
        .route("/policies/accepted", get(handlers::handle_list_accepted))
        .route(
            "/policies/:slug/accept",
            post(handlers::handle_accept_policy),
        )
        // Basic information
        .route(
            "/basic-information",
            get(handle_list::<NewBasicInformation, BasicInformationRow>)
                .post(handlers::handle_create_basic_information),
        )
        .route(
            "/basic-information/:slug",
            get(handle_get::<NewBasicInformation, BasicInformationRow>)
                .put(handlers::handle_update_basic_information)
                .delete(handle_delete::<NewBasicInformation>),
        )
        // Languages and personal information
        .route(
            "/languages",
            get(handlers::handle_list_languages).post(handlers::handle_create_language),
        )
        .route(
            "/personal",
            get(handlers::handle_list_personal).post(handlers::handle_create_personal),
        )
        .route(
            "/personal/:slug",
            get(handlers::handle_get_personal)
                .put(handlers::handle_update_personal)
                .delete(handle_delete::<NewPersonal>),
        )
        // Military
        .route(
            "/military",
            get(handle_list::<NewMilitary, MilitaryRow>).post(handlers::handle_create_military),
        )
        .route(
            "/military/:slug",
            get(handle_get::<NewMilitary, MilitaryRow>)
                .put(handlers::handle_update_military)
                .delete(handle_delete::<NewMilitary>),
        )
        // Education and certifications
        .route(
            "/education",
            get(handle_list::<NewEducation, EducationRow>)
                .post(handlers::handle_create_education),
        )
        .route(
            "/education/:slug",
            get(handle_get::<NewEducation, EducationRow>)
                .put(handlers::handle_update_education)
                .delete(handle_delete::<NewEducation>),
        )
        .route(
            "/education/:slug/certifications",
            get(handlers::handle_list_certifications)
                .post(handlers::handle_create_certification),
        )
        .route(
            "/certifications/:slug",
            delete(handlers::handle_delete_certification),
        )
        // Experience
        .route(
            "/experience",
            get(handle_list::<NewExperience, ExperienceRow>)
                .post(handlers::handle_create_experience),
        )
        .route(
            "/experience/:slug",
            get(handle_get::<NewExperience, ExperienceRow>)
                .put(handlers::handle_update_experience)
                .delete(handle_delete::<NewExperience>),
        )
        // Catalog
        .route(
            "/categories",
            get(handlers::handle_list_categories).post(handlers::handle_create_category),
        )
        .route("/positions", post(handlers::handle_create_position))
        .route(
            "/positions/:slug",
            delete(handlers::handle_delete_position),
        )
        .route("/skills", post(handlers::handle_create_skill))
        // Preferences
        .route(
            "/preferences",
            get(handlers::handle_list_preferences).post(handlers::handle_create_preferences),
        )
        .route(
            "/preferences/:slug",
            get(handlers::handle_get_preferences)
                .put(handlers::handle_update_preferences)
                .delete(handle_delete::<NewPreferences>),
        )
        .route(
            "/preferences/:slug/positions",
            get(handlers::handle_preference_positions),
        )
        .route(
            "/preferences/:slug/skills",
            get(handlers::handle_preference_skills),
        )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request, StatusCode};
    use serde_json::Value;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use super::*;
    use crate::cache::MemoryCache;
    use crate::employee::lookup::PreferenceLookup;

    fn test_router() -> Router {
        // Lazy pool: requests below never reach the database.
        let db = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/onboarding_test")
            .unwrap();
        let lookup = PreferenceLookup::new(Arc::new(MemoryCache::new(None)), Arc::new(db.clone()));
        build_router(AppState { db, lookup })
    }

    async fn send(router: Router, method: Method, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = router.oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_health_reports_service() {
        let (status, body) = send(test_router(), Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "onboarding-api");
    }

    #[tokio::test]
    async fn test_static_pages_are_served() {
        for (uri, page) in [("/", "home"), ("/about-us/", "about-us"), ("/contact-us/", "contact-us")] {
            let (status, body) = send(test_router(), Method::GET, uri, None).await;
            assert_eq!(status, StatusCode::OK, "{uri}");
            assert_eq!(body["page"], page);
        }
    }

    #[tokio::test]
    async fn test_unknown_profile_section_is_rejected() {
        let (status, body) = send(
            test_router(),
            Method::PATCH,
            "/api/v1/profile/sections/hobbies",
            Some(r#"{"user_id":"6f1c1a52-5c36-4b5e-9d0e-1f6f3c0b8a11","completed":true}"#),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_owner_routes_require_user_id() {
        let (status, _) = send(test_router(), Method::GET, "/api/v1/experience", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let (status, _) = send(test_router(), Method::GET, "/api/v1/resumes", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
