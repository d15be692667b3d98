//! Comments on public entries.
//!
//! Threads are one level deep: a comment may reply to a top-level comment,
//! never to another reply.

use chrono::{DateTime, Utc};

use super::ids::{CommentId, JournalId};
use super::user::{ProfileTheme, UserId};

/// Maximum comment length in characters, after trimming.
pub const COMMENT_MAX: usize = 2_000;

/// Validation errors raised while building a comment body.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommentValidationError {
    #[error("comment must not be empty")]
    Empty,
    #[error("comment must be at most {max} characters")]
    TooLong { max: usize },
}

/// Trimmed comment text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentBody(String);

impl CommentBody {
    /// # Examples
    /// ```
    /// use backend::domain::CommentBody;
    ///
    /// assert_eq!(CommentBody::new("  nice  ").unwrap().as_str(), "nice");
    /// assert!(CommentBody::new("   ").is_err());
    /// ```
    pub fn new(value: impl AsRef<str>) -> Result<Self, CommentValidationError> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            return Err(CommentValidationError::Empty);
        }
        if trimmed.chars().count() > COMMENT_MAX {
            return Err(CommentValidationError::TooLong { max: COMMENT_MAX });
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Stored comment. `author_name` and `profile_theme` are snapshots taken when
/// the comment was written.
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub id: CommentId,
    pub journal_id: JournalId,
    pub user_id: UserId,
    pub parent_id: Option<CommentId>,
    pub content: CommentBody,
    pub author_name: String,
    pub profile_theme: ProfileTheme,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn is_reply(&self) -> bool {
        self.parent_id.is_some()
    }
}

/// Comment with its like figures for the viewer.
#[derive(Debug, Clone, PartialEq)]
pub struct CommentView {
    pub comment: Comment,
    pub like_count: u64,
    pub is_liked: bool,
}

/// Outcome of a like toggle on an entry or a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeToggle {
    pub liked: bool,
    pub like_count: u64,
}
