//! Personal feed assembly.
//!
//! The feed is one ordered sequence: public entries by followed authors,
//! newest first, followed by every other public entry, newest first. A page
//! is a plain offset window over that sequence, so paging is stable and an
//! entry can only appear once. The window is served with at most two range
//! queries, one per segment.

use std::sync::Arc;

use pagination::{Page, PageRequest};
use tracing::debug;

use super::journal_service::attach_engagement;
use super::ports::{EngagementRepository, JournalRepository, SubscriptionRepository};
use super::{Error, FeedItem, UserId};

/// Feed use-cases.
#[derive(Clone)]
pub struct FeedService {
    journals: Arc<dyn JournalRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    engagement: Arc<dyn EngagementRepository>,
}

impl FeedService {
    pub fn new(
        journals: Arc<dyn JournalRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        engagement: Arc<dyn EngagementRepository>,
    ) -> Self {
        Self {
            journals,
            subscriptions,
            engagement,
        }
    }

    pub async fn get_feed(&self, user: &UserId, page: PageRequest) -> Result<Page<FeedItem>, Error> {
        let followed = self.subscriptions.subscribed_to(user).await?;
        let skip = page.skip();
        let limit = page.limit();

        let head = self
            .journals
            .list_public_by_authors(&followed, skip, limit)
            .await?;
        let taken = u32::try_from(head.journals.len()).unwrap_or(limit);
        let rest = self
            .journals
            .list_public_excluding_authors(
                &followed,
                skip.saturating_sub(head.total),
                limit.saturating_sub(taken),
            )
            .await?;
        let total = head.total.saturating_add(rest.total);
        debug!(
            %user,
            followed = followed.len(),
            from_subscriptions = head.journals.len(),
            others = rest.journals.len(),
            total,
            "feed assembled"
        );

        let from_subscription = head.journals.len();
        let journals = head.journals.into_iter().chain(rest.journals).collect();
        let views = attach_engagement(self.engagement.as_ref(), journals, Some(*user)).await?;
        let items = views
            .into_iter()
            .enumerate()
            .map(|(index, view)| FeedItem {
                view,
                from_subscription: index < from_subscription,
            })
            .collect();
        Ok(Page::new(items, page, total))
    }
}
