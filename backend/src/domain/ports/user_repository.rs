//! Port abstraction for user persistence adapters and their errors.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;

use crate::domain::{Email, Error, User, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
        /// Another account already uses the email address.
        DuplicateEmail { email: String } => "email already registered: {email}",
    }
}

impl From<UserPersistenceError> for Error {
    fn from(value: UserPersistenceError) -> Self {
        match value {
            UserPersistenceError::Connection { message } => {
                Self::service_unavailable(format!("user repository unavailable: {message}"))
            }
            UserPersistenceError::Query { message } => {
                Self::internal(format!("user repository error: {message}"))
            }
            UserPersistenceError::DuplicateEmail { .. } => Self::conflict("email already registered")
                .with_details(json!({ "field": "email", "code": "duplicate_email" })),
        }
    }
}

/// Storage for user accounts.
///
/// Deleting a user removes everything that references them: entries,
/// comments, likes, saves, follow edges and mail recipient rows.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user, failing with `DuplicateEmail` on a taken address.
    async fn insert(&self, user: &User) -> Result<(), UserPersistenceError>;

    /// Persist the mutable profile fields of an existing user.
    async fn update_profile(&self, user: &User) -> Result<(), UserPersistenceError>;

    /// Fetch a user by identifier.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError>;

    /// Fetch a user by normalised email.
    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, UserPersistenceError>;

    /// Fetch several users; missing ids are skipped. Order is unspecified.
    async fn find_many(&self, ids: &[UserId]) -> Result<Vec<User>, UserPersistenceError>;

    /// Delete a user and their dependent records. Returns `false` when absent.
    async fn delete(&self, id: &UserId) -> Result<bool, UserPersistenceError>;

    /// Record when the user last looked at their followed authors.
    async fn set_last_notification_check(
        &self,
        id: &UserId,
        at: DateTime<Utc>,
    ) -> Result<(), UserPersistenceError>;
}
