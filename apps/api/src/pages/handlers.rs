use axum::Json;
use serde_json::{json, Value};

/// GET /
pub async fn home_handler() -> Json<Value> {
    Json(json!({
        "page": "home",
        "title": "Employee Onboarding",
        "links": {
            "about": "/about-us/",
            "contact": "/contact-us/",
            "api": "/api/v1",
        }
    }))
}

/// GET /about-us/
pub async fn about_handler() -> Json<Value> {
    Json(json!({
        "page": "about-us",
        "title": "About Us",
        "body": "We help new employees build a complete profile, from basic \
                 information through service history, education, experience \
                 and job preferences.",
    }))
}

/// GET /contact-us/
pub async fn contact_handler() -> Json<Value> {
    Json(json!({
        "page": "contact-us",
        "title": "Contact Us",
        "body": "Questions about onboarding? Reach the HR team through your \
                 company's usual support channel.",
    }))
}
