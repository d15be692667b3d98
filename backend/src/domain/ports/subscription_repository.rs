//! Port for the follow graph.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Error, SubscriptionToggle, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by subscription repository adapters.
    pub enum SubscriptionRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "subscription repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "subscription repository query failed: {message}",
    }
}

impl From<SubscriptionRepositoryError> for Error {
    fn from(value: SubscriptionRepositoryError) -> Self {
        match value {
            SubscriptionRepositoryError::Connection { message } => Self::service_unavailable(
                format!("subscription repository unavailable: {message}"),
            ),
            SubscriptionRepositoryError::Query { message } => {
                Self::internal(format!("subscription repository error: {message}"))
            }
        }
    }
}

/// Follow edges `(subscriber, target)`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Create or remove the edge atomically and return the target's new
    /// follower count.
    async fn toggle(
        &self,
        subscriber: &UserId,
        target: &UserId,
        now: DateTime<Utc>,
    ) -> Result<SubscriptionToggle, SubscriptionRepositoryError>;

    /// Authors `user` follows, most recent follow first.
    async fn subscribed_to(&self, user: &UserId) -> Result<Vec<UserId>, SubscriptionRepositoryError>;

    /// Users following `user`, most recent follow first.
    async fn subscribers(&self, user: &UserId) -> Result<Vec<UserId>, SubscriptionRepositoryError>;

    async fn subscriber_count(&self, user: &UserId) -> Result<u64, SubscriptionRepositoryError>;

    async fn is_subscribed(
        &self,
        subscriber: &UserId,
        target: &UserId,
    ) -> Result<bool, SubscriptionRepositoryError>;
}
