//! URL slugs for journal entries.
//!
//! Slugs are trimmed, non-empty identifiers composed of lowercase ASCII
//! letters, digits, and single hyphens. They are derived from the title once
//! and never change afterwards.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Longest base slug derived from a title, before any collision suffix.
pub const SLUG_BASE_MAX: usize = 80;

const FALLBACK_SLUG: &str = "entry";

/// Raised when a path segment is not a well-formed slug.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("slug may only contain lowercase letters, digits and single hyphens")]
pub struct InvalidSlug;

/// Unique, immutable entry slug.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Slug(String);

impl Slug {
    /// Validate an existing slug, e.g. one taken from a request path.
    pub fn parse(value: impl Into<String>) -> Result<Self, InvalidSlug> {
        let value = value.into();
        if !is_valid_slug(&value) {
            return Err(InvalidSlug);
        }
        Ok(Self(value))
    }

    /// Derive the base slug for a title.
    ///
    /// # Examples
    /// ```
    /// use backend::domain::Slug;
    ///
    /// assert_eq!(Slug::from_title("Hello, World!").as_str(), "hello-world");
    /// assert_eq!(Slug::from_title("¿¡!?").as_str(), "entry");
    /// ```
    pub fn from_title(title: &str) -> Self {
        let mut slug = String::with_capacity(title.len());
        let mut pending_hyphen = false;
        for ch in title.chars() {
            if ch.is_ascii_alphanumeric() {
                if pending_hyphen && !slug.is_empty() {
                    slug.push('-');
                }
                pending_hyphen = false;
                slug.push(ch.to_ascii_lowercase());
                if slug.len() >= SLUG_BASE_MAX {
                    break;
                }
            } else {
                pending_hyphen = true;
            }
        }
        if slug.is_empty() {
            slug.push_str(FALLBACK_SLUG);
        }
        Self(slug)
    }

    /// First free variant of this slug: the slug itself, then `-2`, `-3`, ...
    ///
    /// `taken` holds every existing slug that starts with this base.
    pub fn first_free<'a>(&self, taken: impl IntoIterator<Item = &'a str>) -> Self {
        let taken: HashSet<&str> = taken.into_iter().collect();
        if !taken.contains(self.0.as_str()) {
            return self.clone();
        }
        let mut suffix: u64 = 2;
        loop {
            let candidate = format!("{}-{suffix}", self.0);
            if !taken.contains(candidate.as_str()) {
                return Self(candidate);
            }
            suffix += 1;
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Slug {
    type Error = InvalidSlug;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Slug> for String {
    fn from(value: Slug) -> Self {
        value.0
    }
}

impl std::fmt::Display for Slug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Return `true` when `value` is a valid slug.
pub(crate) fn is_valid_slug(value: &str) -> bool {
    !value.is_empty()
        && !value.starts_with('-')
        && !value.ends_with('-')
        && !value.contains("--")
        && value
            .chars()
            .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-')
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("My First Story", "my-first-story")]
    #[case("  --Rain   on  the roof--  ", "rain-on-the-roof")]
    #[case("Café au lait", "caf-au-lait")]
    #[case("2024 in review", "2024-in-review")]
    #[case("!!!", "entry")]
    fn from_title_derives_hyphenated_slugs(#[case] title: &str, #[case] expected: &str) {
        assert_eq!(Slug::from_title(title).as_str(), expected);
    }

    #[rstest]
    fn from_title_truncates_long_titles() {
        let slug = Slug::from_title(&"a".repeat(300));
        assert_eq!(slug.as_str().len(), SLUG_BASE_MAX);
    }

    #[rstest]
    fn first_free_appends_lowest_unused_suffix() {
        let base = Slug::from_title("Diary");
        assert_eq!(base.first_free([]).as_str(), "diary");
        assert_eq!(base.first_free(["diary"]).as_str(), "diary-2");
        assert_eq!(
            base.first_free(["diary", "diary-2", "diary-4"]).as_str(),
            "diary-3"
        );
    }

    #[rstest]
    #[case("ok-slug", true)]
    #[case("a1", true)]
    #[case("", false)]
    #[case("-lead", false)]
    #[case("trail-", false)]
    #[case("dou--ble", false)]
    #[case("Upper", false)]
    #[case("sp ace", false)]
    fn parse_checks_shape(#[case] raw: &str, #[case] valid: bool) {
        assert_eq!(Slug::parse(raw).is_ok(), valid);
    }
}
