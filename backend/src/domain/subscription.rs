//! Follow graph values.
//!
//! One stored edge `(subscriber, target)` backs both views of the graph:
//! the subscriber's followed list and the target's follower list.

use super::user::{ProfileTheme, UserId};

/// Outcome of a follow toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionToggle {
    pub subscribed: bool,
    /// Follower count of the target after the toggle.
    pub subscriber_count: u64,
}

impl SubscriptionToggle {
    /// Human-readable confirmation for clients.
    pub const fn message(&self) -> &'static str {
        if self.subscribed {
            "Subscribed successfully"
        } else {
            "Unsubscribed successfully"
        }
    }
}

/// A followed author with their unseen-content figures.
#[derive(Debug, Clone, PartialEq)]
pub struct FollowedAuthor {
    pub user_id: UserId,
    pub anonymous_name: String,
    pub profile_theme: ProfileTheme,
    pub new_journals_count: u64,
}

impl FollowedAuthor {
    pub const fn has_new_content(&self) -> bool {
        self.new_journals_count > 0
    }
}
