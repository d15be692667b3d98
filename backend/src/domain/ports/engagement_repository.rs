//! Port for entry likes and saves.
//!
//! Likes and saves are join rows keyed by `(entry, user)`. Counts are always
//! computed from those rows, so a count can never drift from the list of
//! likers.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Engagement, Error, JournalId, LikeToggle, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by engagement repository adapters.
    pub enum EngagementRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "engagement repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "engagement repository query failed: {message}",
        /// The row being engaged with disappeared.
        Missing { message: String } => "{message}",
    }
}

impl From<EngagementRepositoryError> for Error {
    fn from(value: EngagementRepositoryError) -> Self {
        match value {
            EngagementRepositoryError::Connection { message } => {
                Self::service_unavailable(format!("engagement repository unavailable: {message}"))
            }
            EngagementRepositoryError::Query { message } => {
                Self::internal(format!("engagement repository error: {message}"))
            }
            EngagementRepositoryError::Missing { message } => Self::not_found(message),
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EngagementRepository: Send + Sync {
    /// Add or remove the like row and return the resulting count, atomically.
    async fn toggle_journal_like(
        &self,
        journal_id: &JournalId,
        user_id: &UserId,
        now: DateTime<Utc>,
    ) -> Result<LikeToggle, EngagementRepositoryError>;

    /// Add or remove the save row. Returns whether the entry is now saved.
    async fn toggle_save(
        &self,
        journal_id: &JournalId,
        user_id: &UserId,
        now: DateTime<Utc>,
    ) -> Result<bool, EngagementRepositoryError>;

    /// Like counts and viewer flags for each id. Every requested id is present.
    async fn engagement_for(
        &self,
        journal_ids: &[JournalId],
        viewer: Option<UserId>,
    ) -> Result<HashMap<JournalId, Engagement>, EngagementRepositoryError>;

    /// Users who like the entry, oldest like first.
    async fn likers(&self, journal_id: &JournalId) -> Result<Vec<UserId>, EngagementRepositoryError>;

    /// Entries the user saved, newest save first.
    async fn saved_journal_ids(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<JournalId>, EngagementRepositoryError>;
}
