use sqlx::PgPool;

use crate::employee::lookup::PreferenceLookup;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Cache-aside catalog lookups. Shared with the catalog writers for invalidation.
    pub lookup: PreferenceLookup,
}
