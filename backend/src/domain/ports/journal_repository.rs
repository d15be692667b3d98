//! Port for journal entry storage and listing queries.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pagination::{Page, PageRequest};

use crate::domain::{Error, Journal, JournalId, PublicJournalFilter, Slug, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by journal repository adapters.
    pub enum JournalRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "journal repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "journal repository query failed: {message}",
        /// The slug was taken between the lookup and the insert.
        DuplicateSlug { slug: String } => "slug already taken: {slug}",
    }
}

impl From<JournalRepositoryError> for Error {
    fn from(value: JournalRepositoryError) -> Self {
        match value {
            JournalRepositoryError::Connection { message } => {
                Self::service_unavailable(format!("journal repository unavailable: {message}"))
            }
            JournalRepositoryError::Query { message } => {
                Self::internal(format!("journal repository error: {message}"))
            }
            JournalRepositoryError::DuplicateSlug { slug } => {
                Self::conflict(format!("slug already taken: {slug}"))
            }
        }
    }
}

/// Ordered slice of entries plus the size of the full result set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JournalWindow {
    pub journals: Vec<Journal>,
    pub total: u64,
}

/// Storage and listing queries for entries.
///
/// Every "newest first" ordering sorts by `created_at` descending and then by
/// id, so pages are stable between requests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JournalRepository: Send + Sync {
    /// Insert a new entry. Fails with `DuplicateSlug` if the slug is taken.
    async fn insert(&self, journal: &Journal) -> Result<(), JournalRepositoryError>;

    /// Overwrite the mutable fields of an entry.
    async fn update(&self, journal: &Journal) -> Result<(), JournalRepositoryError>;

    /// Delete an entry with its comments, likes and saves.
    async fn delete(&self, id: &JournalId) -> Result<bool, JournalRepositoryError>;

    async fn find_by_id(&self, id: &JournalId) -> Result<Option<Journal>, JournalRepositoryError>;

    /// Fetch several entries; missing ids are skipped. Order is unspecified.
    async fn find_many(&self, ids: &[JournalId]) -> Result<Vec<Journal>, JournalRepositoryError>;

    async fn find_by_slug(&self, slug: &Slug) -> Result<Option<Journal>, JournalRepositoryError>;

    /// All stored slugs that start with `prefix`.
    async fn slugs_with_prefix(&self, prefix: &str) -> Result<Vec<String>, JournalRepositoryError>;

    /// Public entries matching `filter`.
    async fn list_public(
        &self,
        filter: &PublicJournalFilter,
        page: PageRequest,
    ) -> Result<Page<Journal>, JournalRepositoryError>;

    /// Every entry by `author`, public or private, newest first.
    async fn list_by_author(
        &self,
        author: &UserId,
        collection: Option<String>,
        page: PageRequest,
    ) -> Result<Page<Journal>, JournalRepositoryError>;

    /// Public entries written by any of `authors`, newest first.
    async fn list_public_by_authors(
        &self,
        authors: &[UserId],
        skip: u64,
        limit: u32,
    ) -> Result<JournalWindow, JournalRepositoryError>;

    /// Public entries written by anyone outside `authors`, newest first.
    async fn list_public_excluding_authors(
        &self,
        authors: &[UserId],
        skip: u64,
        limit: u32,
    ) -> Result<JournalWindow, JournalRepositoryError>;

    /// Number of public entries per author created after `since`.
    ///
    /// Authors without new entries are absent from the map.
    async fn count_public_since(
        &self,
        authors: &[UserId],
        since: DateTime<Utc>,
    ) -> Result<HashMap<UserId, u64>, JournalRepositoryError>;

    /// Distinct collection names used by `author`, unsorted.
    async fn collections(&self, author: &UserId) -> Result<Vec<String>, JournalRepositoryError>;
}
