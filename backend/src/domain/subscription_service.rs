//! Follow graph use-cases and the per-author "new content" view.

use std::sync::Arc;

use mockable::Clock;
use serde_json::json;
use tracing::debug;

use super::ports::{JournalRepository, SubscriptionRepository, UserRepository};
use super::{
    Error, FollowedAuthor, NotificationEvent, Notifier, SubscriptionToggle, User, UserId,
    UserSummary,
};

/// Subscription use-cases.
#[derive(Clone)]
pub struct SubscriptionService {
    subscriptions: Arc<dyn SubscriptionRepository>,
    users: Arc<dyn UserRepository>,
    journals: Arc<dyn JournalRepository>,
    notifier: Notifier,
    clock: Arc<dyn Clock>,
}

/// Users in the order of `ids`, skipping ids with no account.
fn in_order(ids: &[UserId], mut users: Vec<User>) -> Vec<User> {
    ids.iter()
        .filter_map(|id| {
            let pos = users.iter().position(|user| user.id == *id)?;
            Some(users.swap_remove(pos))
        })
        .collect()
}

impl SubscriptionService {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepository>,
        users: Arc<dyn UserRepository>,
        journals: Arc<dyn JournalRepository>,
        notifier: Notifier,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            subscriptions,
            users,
            journals,
            notifier,
            clock,
        }
    }

    /// Follow or unfollow `target`.
    ///
    /// Following yourself is rejected before any state changes. A new
    /// follow sends the target a `new_follower` mail.
    pub async fn toggle(
        &self,
        subscriber: &UserId,
        target: &UserId,
    ) -> Result<SubscriptionToggle, Error> {
        if subscriber == target {
            return Err(Error::invalid_request("cannot subscribe to yourself").with_details(
                json!({ "field": "targetUserId", "code": "self_subscription" }),
            ));
        }
        if self.users.find_by_id(target).await?.is_none() {
            return Err(Error::not_found("user not found"));
        }
        let follower = self
            .users
            .find_by_id(subscriber)
            .await?
            .ok_or_else(|| Error::not_found("user not found"))?;

        let toggle = self
            .subscriptions
            .toggle(subscriber, target, self.clock.utc())
            .await?;
        debug!(%subscriber, %target, subscribed = toggle.subscribed, "subscription toggled");

        if toggle.subscribed {
            self.notifier
                .notify(NotificationEvent::NewFollower {
                    recipient: *target,
                    sender: follower.id,
                    sender_name: follower.anonymous_name,
                })
                .await;
        }
        Ok(toggle)
    }

    /// Followed authors with how many public entries they published since
    /// the user last checked.
    pub async fn subscriptions_with_notifications(
        &self,
        user: &UserId,
    ) -> Result<Vec<FollowedAuthor>, Error> {
        let me = self
            .users
            .find_by_id(user)
            .await?
            .ok_or_else(|| Error::not_found("user not found"))?;
        let followed = self.subscriptions.subscribed_to(user).await?;
        if followed.is_empty() {
            return Ok(Vec::new());
        }
        let authors = in_order(&followed, self.users.find_many(&followed).await?);
        let counts = self
            .journals
            .count_public_since(&followed, me.last_notification_check)
            .await?;

        Ok(authors
            .into_iter()
            .map(|author| FollowedAuthor {
                new_journals_count: counts.get(&author.id).copied().unwrap_or(0),
                user_id: author.id,
                anonymous_name: author.anonymous_name,
                profile_theme: author.profile_theme,
            })
            .collect())
    }

    /// Reset the "new content" window to now.
    pub async fn mark_notifications_checked(&self, user: &UserId) -> Result<(), Error> {
        self.users
            .set_last_notification_check(user, self.clock.utc())
            .await?;
        Ok(())
    }

    /// Followers of `user`, most recent first.
    pub async fn subscribers(&self, user: &UserId) -> Result<Vec<UserSummary>, Error> {
        if self.users.find_by_id(user).await?.is_none() {
            return Err(Error::not_found("user not found"));
        }
        let ids = self.subscriptions.subscribers(user).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let users = in_order(&ids, self.users.find_many(&ids).await?);
        Ok(users.iter().map(UserSummary::from).collect())
    }
}
