//! Slug derivation for onboarding records.
//!
//! Records are built as a validated [`Draft`] and the storage layer calls
//! [`Draft::assign_slug_if_absent`] before the first INSERT. Once a slug is
//! set it is never recomputed; UPDATE statements do not touch the column.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;
use unicode_normalization::UnicodeNormalization;

use crate::employee::validation::Validate;
use crate::errors::{AppError, FieldErrors};

/// Default width of a `slug` column.
pub const DEFAULT_SLUG_MAX_LEN: usize = 50;

/// A record type that owns a unique slug column.
pub trait Sluggable {
    /// Table holding the slug column. Only ever a compile-time constant.
    const TABLE: &'static str;
    /// Fallback base when the seed slugifies to nothing.
    const NAME: &'static str;
    const SLUG_MAX_LEN: usize = DEFAULT_SLUG_MAX_LEN;

    /// Human-readable value the slug is derived from. `owner` is the
    /// username of the user the record belongs to.
    fn slug_seed(&self, owner: &str) -> String;
}

/// Answers whether a slug is already used in a table.
#[async_trait]
pub trait SlugIndex: Send + Sync {
    async fn slug_taken(&self, table: &'static str, slug: &str) -> Result<bool, AppError>;
}

#[async_trait]
impl SlugIndex for PgPool {
    async fn slug_taken(&self, table: &'static str, slug: &str) -> Result<bool, AppError> {
        let query = format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE slug = $1)");
        let taken: bool = sqlx::query_scalar(&query)
            .bind(slug)
            .fetch_one(self)
            .await?;
        Ok(taken)
    }
}

/// Lowercases `value` and reduces it to ASCII letters, digits, `_` and `-`.
///
/// Runs of whitespace and hyphens become one `-`; leading and trailing
/// `-`/`_` are removed. Text is NFKD-decomposed first so accented letters
/// keep their ASCII base; whatever is still non-ASCII is dropped.
pub fn slugify(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut pending_dash = false;

    for c in value.nfkd() {
        if c.is_ascii_alphanumeric() || c == '_' {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(c.to_ascii_lowercase());
        } else if c == '-' || c.is_whitespace() {
            pending_dash = true;
        }
    }

    out.trim_matches(|c| c == '-' || c == '_').to_string()
}

/// Cuts an ASCII slug to `max_len` bytes without leaving a dangling separator.
fn truncate_slug(slug: &str, max_len: usize) -> &str {
    if slug.len() <= max_len {
        return slug;
    }
    slug[..max_len].trim_end_matches(|c| c == '-' || c == '_')
}

/// True when `slug` is exactly what [`slugify`] would produce for it.
pub fn is_slug(slug: &str) -> bool {
    !slug.is_empty() && slugify(slug) == slug
}

/// Derives a slug from `seed` that is not yet used in `T::TABLE`.
///
/// Collisions get `-1`, `-2`, ... appended, with the base shortened so the
/// result still fits the column.
pub async fn unique_slug<T: Sluggable>(
    seed: &str,
    index: &dyn SlugIndex,
) -> Result<String, AppError> {
    let mut base = slugify(seed);
    if base.is_empty() {
        base = T::NAME.to_string();
    }
    let base = truncate_slug(&base, T::SLUG_MAX_LEN);

    if !index.slug_taken(T::TABLE, base).await? {
        return Ok(base.to_string());
    }

    let mut counter: u32 = 1;
    loop {
        let suffix = format!("-{counter}");
        let room = T::SLUG_MAX_LEN.saturating_sub(suffix.len());
        let candidate = format!("{}{suffix}", truncate_slug(base, room));
        if !index.slug_taken(T::TABLE, &candidate).await? {
            debug!("Slug '{base}' taken in {}; using '{candidate}'", T::TABLE);
            return Ok(candidate);
        }
        counter += 1;
    }
}

/// A validated record waiting to be inserted.
#[derive(Debug)]
pub struct Draft<T> {
    pub record: T,
    owner: String,
    slug: Option<String>,
}

impl<T: Sluggable + Validate> Draft<T> {
    /// Validates `record`; `owner` is the username used in the slug seed.
    pub fn new(record: T, owner: impl Into<String>) -> Result<Self, AppError> {
        record.validate()?;
        Ok(Self {
            record,
            owner: owner.into(),
            slug: None,
        })
    }

    /// Presets the slug. It must already be in slug form and fit the column.
    pub fn with_slug(mut self, slug: impl Into<String>) -> Result<Self, AppError> {
        let slug = slug.into();
        let mut errors = FieldErrors::new();
        if !is_slug(&slug) {
            errors.add(
                "slug",
                "Enter a valid slug consisting of letters, numbers, underscores or hyphens.",
            );
        } else if slug.len() > T::SLUG_MAX_LEN {
            errors.add(
                "slug",
                format!("Ensure this value has at most {} characters.", T::SLUG_MAX_LEN),
            );
        }
        errors.into_result()?;
        self.slug = Some(slug);
        Ok(self)
    }

    /// Derives and stores a unique slug unless one is already set.
    pub async fn assign_slug_if_absent(&mut self, index: &dyn SlugIndex) -> Result<&str, AppError> {
        if self.slug.is_none() {
            let seed = self.record.slug_seed(&self.owner);
            let slug = unique_slug::<T>(&seed, index).await?;
            debug!("Assigned slug '{slug}' for new {} row", T::TABLE);
            self.slug = Some(slug);
        }
        Ok(self.slug.as_deref().unwrap_or_default())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    use super::*;

    /// Slug index backed by a set per table. `insert` plays the INSERT.
    #[derive(Default)]
    pub struct MemorySlugIndex {
        taken: Mutex<HashMap<&'static str, HashSet<String>>>,
    }

    impl MemorySlugIndex {
        pub fn insert(&self, table: &'static str, slug: &str) {
            self.taken
                .lock()
                .unwrap()
                .entry(table)
                .or_default()
                .insert(slug.to_string());
        }
    }

    #[async_trait]
    impl SlugIndex for MemorySlugIndex {
        async fn slug_taken(&self, table: &'static str, slug: &str) -> Result<bool, AppError> {
            Ok(self
                .taken
                .lock()
                .unwrap()
                .get(table)
                .map(|set| set.contains(slug))
                .unwrap_or(false))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::MemorySlugIndex;
    use super::*;

    #[derive(Debug)]
    struct Note {
        title: String,
    }

    impl Sluggable for Note {
        const TABLE: &'static str = "notes";
        const NAME: &'static str = "note";
        const SLUG_MAX_LEN: usize = 20;

        fn slug_seed(&self, owner: &str) -> String {
            format!("{} {owner}", self.title)
        }
    }

    impl Validate for Note {
        fn field_errors(&self) -> FieldErrors {
            let mut errors = FieldErrors::new();
            if self.title.is_empty() {
                errors.add("title", "This field is required.");
            }
            errors
        }
    }

    fn note(title: &str) -> Note {
        Note {
            title: title.to_string(),
        }
    }

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Software Engineer jdoe"), "software-engineer-jdoe");
    }

    #[test]
    fn test_slugify_collapses_separators() {
        assert_eq!(slugify("  a -- b\t\nc  "), "a-b-c");
    }

    #[test]
    fn test_slugify_strips_punctuation() {
        assert_eq!(slugify("jane@example.com 90210"), "janeexamplecom-90210");
        assert_eq!(slugify("C++ / Rust!"), "c-rust");
    }

    #[test]
    fn test_slugify_keeps_underscores_inside() {
        assert_eq!(slugify("_FULL_TIME bob_"), "full_time-bob");
    }

    #[test]
    fn test_slugify_transliterates_accents() {
        assert_eq!(slugify("Técnico José Núñez"), "tecnico-jose-nunez");
        assert_eq!(slugify("Café Zoë"), "cafe-zoe");
        assert_eq!(slugify("ﬁtter"), "fitter");
    }

    #[test]
    fn test_slugify_drops_characters_without_ascii_base() {
        assert_eq!(slugify("日本語"), "");
        assert_eq!(slugify("Straße 5"), "strae-5");
    }

    #[test]
    fn test_is_slug() {
        assert!(is_slug("code-of-conduct"));
        assert!(!is_slug("Code of Conduct"));
        assert!(!is_slug(""));
    }

    #[tokio::test]
    async fn test_unique_slug_free_base() {
        let index = MemorySlugIndex::default();
        assert_eq!(
            unique_slug::<Note>("Hello World", &index).await.unwrap(),
            "hello-world"
        );
    }

    #[tokio::test]
    async fn test_unique_slug_appends_counter() {
        let index = MemorySlugIndex::default();
        index.insert("notes", "hello");
        index.insert("notes", "hello-1");
        assert_eq!(unique_slug::<Note>("hello", &index).await.unwrap(), "hello-2");
    }

    #[tokio::test]
    async fn test_unique_slug_scoped_per_table() {
        let index = MemorySlugIndex::default();
        index.insert("other", "hello");
        assert_eq!(unique_slug::<Note>("hello", &index).await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_unique_slug_respects_max_len_with_suffix() {
        let index = MemorySlugIndex::default();
        let seed = "a very long title that overflows";
        let first = unique_slug::<Note>(seed, &index).await.unwrap();
        assert!(first.len() <= 20);
        index.insert("notes", &first);
        let second = unique_slug::<Note>(seed, &index).await.unwrap();
        assert!(second.len() <= 20);
        assert!(second.ends_with("-1"));
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_unique_slug_empty_seed_uses_name() {
        let index = MemorySlugIndex::default();
        assert_eq!(unique_slug::<Note>("!!!", &index).await.unwrap(), "note");
    }

    #[tokio::test]
    async fn test_draft_assigns_once() {
        let index = MemorySlugIndex::default();
        let mut draft = Draft::new(note("Weekly Sync"), "amy").unwrap();
        let first = draft.assign_slug_if_absent(&index).await.unwrap().to_string();
        assert_eq!(first, "weekly-sync-amy");

        // The same slug now exists; re-saving must not derive a new one.
        index.insert("notes", &first);
        let again = draft.assign_slug_if_absent(&index).await.unwrap();
        assert_eq!(again, first);
    }

    #[tokio::test]
    async fn test_draft_keeps_preset_slug() {
        let index = MemorySlugIndex::default();
        let mut draft = Draft::new(note("Weekly Sync"), "amy")
            .unwrap()
            .with_slug("custom")
            .unwrap();
        assert_eq!(draft.assign_slug_if_absent(&index).await.unwrap(), "custom");
    }

    #[test]
    fn test_draft_rejects_malformed_preset_slug() {
        let draft = Draft::new(note("Weekly Sync"), "amy").unwrap();
        assert!(draft.with_slug("Not A Slug").is_err());
    }

    #[test]
    fn test_draft_rejects_overlong_preset_slug() {
        let draft = Draft::new(note("Weekly Sync"), "amy").unwrap();
        assert!(draft.with_slug("x".repeat(21)).is_err());
    }

    #[test]
    fn test_draft_validates_on_construction() {
        assert!(matches!(
            Draft::new(note(""), "amy"),
            Err(AppError::InvalidFields(_))
        ));
    }
}
