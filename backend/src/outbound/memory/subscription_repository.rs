use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::ports::{SubscriptionRepository, SubscriptionRepositoryError};
use crate::domain::{SubscriptionToggle, UserId};

use super::{Edge, MemoryStore, count};

#[async_trait]
impl SubscriptionRepository for MemoryStore {
    async fn toggle(
        &self,
        subscriber: &UserId,
        target: &UserId,
        _now: DateTime<Utc>,
    ) -> Result<SubscriptionToggle, SubscriptionRepositoryError> {
        let mut state = self.lock();
        let existing = state
            .subscriptions
            .iter()
            .position(|edge| edge.subscriber == *subscriber && edge.target == *target);
        let subscribed = if let Some(pos) = existing {
            state.subscriptions.remove(pos);
            false
        } else {
            state.subscriptions.push(Edge {
                subscriber: *subscriber,
                target: *target,
            });
            true
        };
        let subscriber_count = count(state.subscriptions.iter().filter(|edge| edge.target == *target));
        Ok(SubscriptionToggle {
            subscribed,
            subscriber_count,
        })
    }

    async fn subscribed_to(&self, user: &UserId) -> Result<Vec<UserId>, SubscriptionRepositoryError> {
        Ok(self
            .lock()
            .subscriptions
            .iter()
            .rev()
            .filter(|edge| edge.subscriber == *user)
            .map(|edge| edge.target)
            .collect())
    }

    async fn subscribers(&self, user: &UserId) -> Result<Vec<UserId>, SubscriptionRepositoryError> {
        Ok(self
            .lock()
            .subscriptions
            .iter()
            .rev()
            .filter(|edge| edge.target == *user)
            .map(|edge| edge.subscriber)
            .collect())
    }

    async fn subscriber_count(&self, user: &UserId) -> Result<u64, SubscriptionRepositoryError> {
        Ok(count(
            self.lock()
                .subscriptions
                .iter()
                .filter(|edge| edge.target == *user),
        ))
    }

    async fn is_subscribed(
        &self,
        subscriber: &UserId,
        target: &UserId,
    ) -> Result<bool, SubscriptionRepositoryError> {
        Ok(self
            .lock()
            .subscriptions
            .iter()
            .any(|edge| edge.subscriber == *subscriber && edge.target == *target))
    }
}
