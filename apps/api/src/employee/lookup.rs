//! Cache-aside lookups of the positions and skills a preference record can
//! choose from.
//!
//! Positions are keyed by category. Skill keys embed a generation counter so
//! one `INCR` retires every cached skill list after an association change,
//! even for readers still holding the old generation. The retired entries
//! are then swept by prefix.
//!
//! Cache failures never fail a lookup: they are logged and the catalog is
//! queried directly.

use std::future::Future;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::cache::Cache;
use crate::employee::catalog::CatalogSource;
use crate::errors::AppError;
use crate::models::catalog::{PositionRow, SkillRow};
use crate::models::preferences::PreferencesDetail;

const SKILLS_GENERATION_KEY: &str = "employee_skills_generation";
const SKILLS_KEY_PREFIX: &str = "employee_skills_v";

pub fn positions_cache_key(category_id: Uuid) -> String {
    format!("employee_positions_{category_id}")
}

/// Order-independent key for a set of desired positions.
pub fn skills_cache_key(generation: i64, position_ids: &[Uuid]) -> String {
    let mut ids: Vec<Uuid> = position_ids.to_vec();
    ids.sort();
    ids.dedup();
    let joined = ids
        .iter()
        .map(Uuid::to_string)
        .collect::<Vec<_>>()
        .join(",");
    format!("{SKILLS_KEY_PREFIX}{generation}_[{joined}]")
}

#[derive(Clone)]
pub struct PreferenceLookup {
    cache: Arc<dyn Cache>,
    source: Arc<dyn CatalogSource>,
}

impl PreferenceLookup {
    pub fn new(cache: Arc<dyn Cache>, source: Arc<dyn CatalogSource>) -> Self {
        Self { cache, source }
    }

    /// Positions in the preference's category.
    pub async fn get_positions(
        &self,
        preferences: &PreferencesDetail,
    ) -> Result<Vec<PositionRow>, AppError> {
        let category_id = preferences.preferences.category_id;
        let key = positions_cache_key(category_id);
        self.cached(&key, || self.source.positions_in_category(category_id))
            .await
    }

    /// Skills attached to any of the preference's desired positions.
    pub async fn get_skills(
        &self,
        preferences: &PreferencesDetail,
    ) -> Result<Vec<SkillRow>, AppError> {
        let position_ids = &preferences.desired_position_ids;
        if position_ids.is_empty() {
            return Ok(vec![]);
        }
        let key = skills_cache_key(self.skills_generation().await, position_ids);
        self.cached(&key, || self.source.skills_for_positions(position_ids))
            .await
    }

    /// Drops the cached position list of one category.
    pub async fn invalidate_category(&self, category_id: Uuid) {
        let key = positions_cache_key(category_id);
        match self.cache.delete(&key).await {
            Ok(()) => debug!("Invalidated '{key}'"),
            Err(e) => warn!("Failed to invalidate '{key}': {e}"),
        }
    }

    /// Retires every cached skill list.
    pub async fn invalidate_skills(&self) {
        match self.cache.incr(SKILLS_GENERATION_KEY).await {
            Ok(generation) => debug!("Skills cache generation now {generation}"),
            Err(e) => warn!("Failed to bump skills cache generation: {e}"),
        }
        match self.cache.delete_prefix(SKILLS_KEY_PREFIX).await {
            Ok(removed) => debug!("Swept {removed} retired skill lists"),
            Err(e) => warn!("Failed to sweep retired skill lists: {e}"),
        }
    }

    async fn skills_generation(&self) -> i64 {
        match self.cache.get(SKILLS_GENERATION_KEY).await {
            Ok(Some(raw)) => raw.parse().unwrap_or(0),
            Ok(None) => 0,
            Err(e) => {
                warn!("Failed to read skills cache generation: {e}");
                0
            }
        }
    }

    /// An empty cached list counts as a miss, so empty results are re-queried.
    async fn cached<T, F, Fut>(&self, key: &str, load: F) -> Result<Vec<T>, AppError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>, AppError>>,
    {
        match self.cache.get(key).await {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<T>>(&raw) {
                Ok(values) if !values.is_empty() => {
                    debug!("Cache hit for '{key}'");
                    return Ok(values);
                }
                Ok(_) => {}
                Err(e) => warn!("Discarding unreadable cache entry '{key}': {e}"),
            },
            Ok(None) => {}
            Err(e) => warn!("Cache read failed for '{key}': {e}"),
        }

        debug!("Cache miss for '{key}'");
        let values = load().await?;
        match serde_json::to_string(&values) {
            Ok(raw) => {
                if let Err(e) = self.cache.set(key, &raw).await {
                    warn!("Cache write failed for '{key}': {e}");
                }
            }
            Err(e) => warn!("Failed to serialize '{key}' for caching: {e}"),
        }
        Ok(values)
    }
}
