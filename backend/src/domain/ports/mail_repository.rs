//! Port for mail messages and per-recipient state.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{ClaimOutcome, Error, Mail, MailId, MailboxEntry, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by mail repository adapters.
    pub enum MailRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "mail repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "mail repository query failed: {message}",
    }
}

impl From<MailRepositoryError> for Error {
    fn from(value: MailRepositoryError) -> Self {
        match value {
            MailRepositoryError::Connection { message } => {
                Self::service_unavailable(format!("mail repository unavailable: {message}"))
            }
            MailRepositoryError::Query { message } => {
                Self::internal(format!("mail repository error: {message}"))
            }
        }
    }
}

/// Mail storage.
///
/// Visibility follows [`Mail::is_visible`]: adapters may pre-filter in their
/// query language but must agree with it.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MailRepository: Send + Sync {
    /// Store a mail and one unread recipient row per entry in `recipients`.
    async fn insert(&self, mail: &Mail, recipients: &[UserId]) -> Result<(), MailRepositoryError>;

    /// Mail visible to `user` at `now`, newest first.
    async fn mailbox(
        &self,
        user: &UserId,
        now: DateTime<Utc>,
    ) -> Result<Vec<MailboxEntry>, MailRepositoryError>;

    /// Mark a mail read, creating the recipient row for broadcasts.
    ///
    /// Returns `false` when the mail is not in the user's mailbox.
    async fn mark_read(
        &self,
        id: &MailId,
        user: &UserId,
        now: DateTime<Utc>,
    ) -> Result<bool, MailRepositoryError>;

    /// Claim the mail's reward: mark it claimed and read and credit the
    /// user's coins in one transaction.
    async fn claim_reward(
        &self,
        id: &MailId,
        user: &UserId,
        now: DateTime<Utc>,
    ) -> Result<ClaimOutcome, MailRepositoryError>;

    /// Hide a mail for one user. Returns `false` when it was not visible.
    async fn hide(
        &self,
        id: &MailId,
        user: &UserId,
        now: DateTime<Utc>,
    ) -> Result<bool, MailRepositoryError>;
}
