//! Port for comment storage and comment likes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pagination::{Page, PageRequest};

use crate::domain::{Comment, CommentId, CommentView, Error, JournalId, LikeToggle, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by comment repository adapters.
    pub enum CommentRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "comment repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "comment repository query failed: {message}",
        /// The row being engaged with disappeared.
        Missing { message: String } => "{message}",
    }
}

impl From<CommentRepositoryError> for Error {
    fn from(value: CommentRepositoryError) -> Self {
        match value {
            CommentRepositoryError::Connection { message } => {
                Self::service_unavailable(format!("comment repository unavailable: {message}"))
            }
            CommentRepositoryError::Query { message } => {
                Self::internal(format!("comment repository error: {message}"))
            }
            CommentRepositoryError::Missing { message } => Self::not_found(message),
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn insert(&self, comment: &Comment) -> Result<(), CommentRepositoryError>;

    async fn find_by_id(&self, id: &CommentId) -> Result<Option<Comment>, CommentRepositoryError>;

    /// Comments on an entry, newest first, with like figures for `viewer`.
    async fn list_for_journal(
        &self,
        journal_id: &JournalId,
        viewer: Option<UserId>,
        page: PageRequest,
    ) -> Result<Page<CommentView>, CommentRepositoryError>;

    /// Delete a comment and its direct replies in one transaction.
    ///
    /// Returns the number of comments removed; zero when the comment is gone.
    async fn delete_with_replies(&self, id: &CommentId) -> Result<u64, CommentRepositoryError>;

    /// Add or remove a comment like and return the resulting count.
    async fn toggle_like(
        &self,
        id: &CommentId,
        user_id: &UserId,
        now: DateTime<Utc>,
    ) -> Result<LikeToggle, CommentRepositoryError>;
}
