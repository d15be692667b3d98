//! Journal and story entries.
//!
//! An entry is created from a validated [`JournalDraft`] and later changed
//! through a [`JournalUpdate`]. Tags and collections are normalised on write
//! so reads and tag queries never have to repeat that work.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::JournalId;
use super::slug::Slug;
use super::user::UserId;

/// Maximum title length in characters.
pub const TITLE_MAX: usize = 200;
/// Maximum content length in characters.
pub const CONTENT_MAX: usize = 100_000;
/// Maximum length of one tag or collection name.
pub const LABEL_MAX: usize = 50;
/// Maximum number of tags or collections on one entry.
pub const LABELS_MAX: usize = 20;
/// Maximum length of a story's meta description.
pub const META_DESCRIPTION_MAX: usize = 300;
/// Collection every entry belongs to.
pub const DEFAULT_COLLECTION: &str = "All";

/// Validation errors raised while building or updating entries.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JournalValidationError {
    #[error("title must not be empty")]
    EmptyTitle,
    #[error("title must be at most {max} characters")]
    TitleTooLong { max: usize },
    #[error("content must be at most {max} characters")]
    ContentTooLong { max: usize },
    #[error("category must be `journal` or `story`")]
    UnknownCategory,
    #[error("{field} entries must be at most {max} characters")]
    LabelTooLong { field: &'static str, max: usize },
    #[error("at most {max} {field} are allowed")]
    TooManyLabels { field: &'static str, max: usize },
    #[error("meta description must be at most {max} characters")]
    MetaDescriptionTooLong { max: usize },
    #[error("meta description is only allowed on stories")]
    MetaDescriptionOnJournal,
    #[error("sort must be one of `newest`, `oldest` or `popular`")]
    UnknownSort,
}

impl JournalValidationError {
    /// Request field the error refers to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::EmptyTitle | Self::TitleTooLong { .. } => "title",
            Self::ContentTooLong { .. } => "content",
            Self::UnknownCategory => "category",
            Self::LabelTooLong { field, .. } | Self::TooManyLabels { field, .. } => *field,
            Self::MetaDescriptionTooLong { .. } | Self::MetaDescriptionOnJournal => {
                "metaDescription"
            }
            Self::UnknownSort => "sort",
        }
    }
}

/// Kind of entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Journal,
    Story,
}

impl Category {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Journal => "journal",
            Self::Story => "story",
        }
    }
}

impl FromStr for Category {
    type Err = JournalValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "journal" => Ok(Self::Journal),
            "story" => Ok(Self::Story),
            _ => Err(JournalValidationError::UnknownCategory),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordering for public listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JournalSort {
    #[default]
    Newest,
    Oldest,
    /// Like count descending, newest first among equals.
    Popular,
}

impl FromStr for JournalSort {
    type Err = JournalValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "newest" => Ok(Self::Newest),
            "oldest" => Ok(Self::Oldest),
            "popular" => Ok(Self::Popular),
            _ => Err(JournalValidationError::UnknownSort),
        }
    }
}

/// Entry title, trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Title(String);

impl Title {
    pub fn new(value: impl AsRef<str>) -> Result<Self, JournalValidationError> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            return Err(JournalValidationError::EmptyTitle);
        }
        if trimmed.chars().count() > TITLE_MAX {
            return Err(JournalValidationError::TitleTooLong { max: TITLE_MAX });
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Entry body. Opaque HTML produced by the editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Content(String);

impl Content {
    pub fn new(value: impl Into<String>) -> Result<Self, JournalValidationError> {
        let value = value.into();
        if value.chars().count() > CONTENT_MAX {
            return Err(JournalValidationError::ContentTooLong { max: CONTENT_MAX });
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Normalise one tag the way it is stored and queried.
///
/// # Examples
/// ```
/// use backend::domain::normalize_tag;
///
/// assert_eq!(normalize_tag("  Fantasy "), "fantasy");
/// ```
pub fn normalize_tag(raw: &str) -> String {
    raw.trim().to_lowercase()
}

fn dedupe_labels<I>(
    raw: I,
    field: &'static str,
    normalise: fn(&str) -> String,
) -> Result<Vec<String>, JournalValidationError>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut labels = Vec::new();
    for item in raw {
        let label = normalise(item.as_ref());
        if label.is_empty() {
            continue;
        }
        if label.chars().count() > LABEL_MAX {
            return Err(JournalValidationError::LabelTooLong {
                field,
                max: LABEL_MAX,
            });
        }
        if seen.insert(label.clone()) {
            labels.push(label);
        }
    }
    if labels.len() > LABELS_MAX {
        return Err(JournalValidationError::TooManyLabels {
            field,
            max: LABELS_MAX,
        });
    }
    Ok(labels)
}

/// Normalised tag set: trimmed, lowercased, deduplicated, order preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tags(Vec<String>);

impl Tags {
    /// Normalise raw tags.
    ///
    /// # Examples
    /// ```
    /// use backend::domain::Tags;
    ///
    /// let tags = Tags::new(["Life", " life ", "", "Travel"]).expect("valid tags");
    /// assert_eq!(tags.as_slice(), ["life", "travel"]);
    /// ```
    pub fn new<I>(raw: I) -> Result<Self, JournalValidationError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        dedupe_labels(raw, "tags", normalize_tag).map(Self)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.iter().any(|existing| existing == tag)
    }

    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}

/// Collection names. [`DEFAULT_COLLECTION`] is always present and first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collections(Vec<String>);

impl Collections {
    pub fn new<I>(raw: I) -> Result<Self, JournalValidationError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let named = dedupe_labels(raw, "collections", |value| value.trim().to_owned())?;
        let mut collections = vec![DEFAULT_COLLECTION.to_owned()];
        collections.extend(
            named
                .into_iter()
                .filter(|name| name.as_str() != DEFAULT_COLLECTION),
        );
        if collections.len() > LABELS_MAX {
            return Err(JournalValidationError::TooManyLabels {
                field: "collections",
                max: LABELS_MAX,
            });
        }
        Ok(Self(collections))
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|existing| existing == name)
    }

    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}

impl Default for Collections {
    fn default() -> Self {
        Self(vec![DEFAULT_COLLECTION.to_owned()])
    }
}

/// SEO blurb for stories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaDescription(String);

impl MetaDescription {
    pub fn new(value: impl AsRef<str>) -> Result<Self, JournalValidationError> {
        let trimmed = value.as_ref().trim();
        if trimmed.chars().count() > META_DESCRIPTION_MAX {
            return Err(JournalValidationError::MetaDescriptionTooLong {
                max: META_DESCRIPTION_MAX,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Stored entry.
///
/// ## Invariants
/// - `slug` is unique and never changes.
/// - `author_name` is `Some` exactly when the entry is public.
/// - `meta_description` is `None` for [`Category::Journal`].
#[derive(Debug, Clone, PartialEq)]
pub struct Journal {
    pub id: JournalId,
    pub author_id: UserId,
    pub title: Title,
    pub slug: Slug,
    pub content: Content,
    pub category: Category,
    pub tags: Tags,
    pub collections: Collections,
    pub is_public: bool,
    pub author_name: Option<String>,
    pub thumbnail: Option<String>,
    pub meta_description: Option<MetaDescription>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Journal {
    /// Whether `viewer` may read this entry.
    pub fn is_visible_to(&self, viewer: Option<&UserId>) -> bool {
        self.is_public || viewer == Some(&self.author_id)
    }
}

/// Validated input for publishing a new entry.
#[derive(Debug, Clone, PartialEq)]
pub struct JournalDraft {
    pub title: Title,
    pub content: Content,
    pub category: Category,
    pub tags: Tags,
    pub collections: Collections,
    pub is_public: bool,
    pub thumbnail: Option<String>,
    pub meta_description: Option<MetaDescription>,
}

impl JournalDraft {
    /// Check cross-field rules.
    pub fn validate(self) -> Result<Self, JournalValidationError> {
        check_meta_description(self.category, self.meta_description.as_ref())?;
        Ok(self)
    }

    /// Build the stored entry for `author`.
    pub fn into_journal(
        self,
        author_id: UserId,
        author_anonymous_name: &str,
        slug: Slug,
        now: DateTime<Utc>,
    ) -> Journal {
        Journal {
            id: JournalId::random(),
            author_id,
            title: self.title,
            slug,
            content: self.content,
            category: self.category,
            tags: self.tags,
            collections: self.collections,
            is_public: self.is_public,
            author_name: self.is_public.then(|| author_anonymous_name.to_owned()),
            thumbnail: self.thumbnail,
            meta_description: self.meta_description,
            created_at: now,
            updated_at: now,
        }
    }
}

fn check_meta_description(
    category: Category,
    meta: Option<&MetaDescription>,
) -> Result<(), JournalValidationError> {
    if category == Category::Journal && meta.is_some_and(|value| !value.as_str().is_empty()) {
        return Err(JournalValidationError::MetaDescriptionOnJournal);
    }
    Ok(())
}

/// Partial update. `None` leaves the stored value untouched.
///
/// `thumbnail: Some(None)` clears the thumbnail.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JournalUpdate {
    pub title: Option<Title>,
    pub content: Option<Content>,
    pub category: Option<Category>,
    pub tags: Option<Tags>,
    pub collections: Option<Collections>,
    pub is_public: Option<bool>,
    pub thumbnail: Option<Option<String>>,
    pub meta_description: Option<MetaDescription>,
}

impl JournalUpdate {
    /// Apply the update, refreshing `author_name` to match visibility.
    pub fn apply(
        self,
        journal: &mut Journal,
        author_anonymous_name: &str,
        now: DateTime<Utc>,
    ) -> Result<(), JournalValidationError> {
        let category = self.category.unwrap_or(journal.category);
        let meta = match (self.meta_description, category) {
            (Some(meta), _) => Some(meta),
            (None, Category::Story) => journal.meta_description.clone(),
            (None, Category::Journal) => None,
        };
        check_meta_description(category, meta.as_ref())?;

        if let Some(title) = self.title {
            journal.title = title;
        }
        if let Some(content) = self.content {
            journal.content = content;
        }
        if let Some(tags) = self.tags {
            journal.tags = tags;
        }
        if let Some(collections) = self.collections {
            journal.collections = collections;
        }
        if let Some(is_public) = self.is_public {
            journal.is_public = is_public;
        }
        if let Some(thumbnail) = self.thumbnail {
            journal.thumbnail = thumbnail;
        }
        journal.category = category;
        journal.meta_description = meta;
        journal.author_name = journal
            .is_public
            .then(|| author_anonymous_name.to_owned());
        journal.updated_at = now;
        Ok(())
    }
}

/// Filter for public listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublicJournalFilter {
    pub category: Option<Category>,
    /// Already normalised with [`normalize_tag`].
    pub tag: Option<String>,
    pub sort: JournalSort,
}

/// Per-viewer engagement figures for one entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Engagement {
    pub like_count: u64,
    pub is_liked: bool,
    pub is_saved: bool,
}

/// Entry together with derived engagement for the viewer.
#[derive(Debug, Clone, PartialEq)]
pub struct JournalView {
    pub journal: Journal,
    pub engagement: Engagement,
}

/// Entry detail including the ids of users who like it.
#[derive(Debug, Clone, PartialEq)]
pub struct JournalDetail {
    pub view: JournalView,
    pub likes: Vec<UserId>,
}

/// Feed item: an entry plus whether it came from a followed author.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedItem {
    pub view: JournalView,
    pub from_subscription: bool,
}
