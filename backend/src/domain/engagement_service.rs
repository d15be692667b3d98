//! Likes and saves on entries.

use std::collections::HashMap;
use std::sync::Arc;

use mockable::Clock;
use pagination::{Page, PageRequest};
use tracing::debug;

use super::journal_service::attach_engagement;
use super::ports::{EngagementRepository, JournalRepository, UserRepository};
use super::{
    Error, Journal, JournalId, JournalView, LikeToggle, NotificationEvent, Notifier, UserId,
};

/// Engagement use-cases.
#[derive(Clone)]
pub struct EngagementService {
    journals: Arc<dyn JournalRepository>,
    engagement: Arc<dyn EngagementRepository>,
    users: Arc<dyn UserRepository>,
    notifier: Notifier,
    clock: Arc<dyn Clock>,
}

impl EngagementService {
    pub fn new(
        journals: Arc<dyn JournalRepository>,
        engagement: Arc<dyn EngagementRepository>,
        users: Arc<dyn UserRepository>,
        notifier: Notifier,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            journals,
            engagement,
            users,
            notifier,
            clock,
        }
    }

    async fn visible_journal(&self, id: &JournalId, viewer: &UserId) -> Result<Journal, Error> {
        self.journals
            .find_by_id(id)
            .await?
            .filter(|journal| journal.is_visible_to(Some(viewer)))
            .ok_or_else(|| Error::not_found("journal not found"))
    }

    /// Like or unlike an entry.
    ///
    /// A new like notifies the author unless the author liked their own
    /// entry. Unliking leaves earlier notification mail in place.
    pub async fn toggle_like(&self, id: &JournalId, user: &UserId) -> Result<LikeToggle, Error> {
        let journal = self.visible_journal(id, user).await?;
        let toggle = self
            .engagement
            .toggle_journal_like(id, user, self.clock.utc())
            .await?;
        debug!(journal_id = %id, %user, liked = toggle.liked, like_count = toggle.like_count, "like toggled");

        if toggle.liked && journal.author_id != *user {
            if let Some(liker) = self.users.find_by_id(user).await? {
                self.notifier
                    .notify(NotificationEvent::NewLike {
                        recipient: journal.author_id,
                        sender: *user,
                        sender_name: liker.anonymous_name,
                        journal_id: journal.id,
                        journal_title: journal.title.as_str().to_owned(),
                    })
                    .await;
            }
        }
        Ok(toggle)
    }

    /// Save or unsave an entry. Returns whether it is saved afterwards.
    pub async fn toggle_save(&self, id: &JournalId, user: &UserId) -> Result<bool, Error> {
        self.visible_journal(id, user).await?;
        let saved = self
            .engagement
            .toggle_save(id, user, self.clock.utc())
            .await?;
        debug!(journal_id = %id, %user, saved, "save toggled");
        Ok(saved)
    }

    /// Entries the user saved and can still see, newest save first.
    pub async fn saved_entries(
        &self,
        user: &UserId,
        page: PageRequest,
    ) -> Result<Page<JournalView>, Error> {
        let ids = self.engagement.saved_journal_ids(user).await?;
        let mut by_id: HashMap<JournalId, Journal> = self
            .journals
            .find_many(&ids)
            .await?
            .into_iter()
            .filter(|journal| journal.is_visible_to(Some(user)))
            .map(|journal| (journal.id, journal))
            .collect();
        let ordered: Vec<Journal> = ids.iter().filter_map(|id| by_id.remove(id)).collect();
        let total = u64::try_from(ordered.len()).unwrap_or(u64::MAX);
        let window = page.window(&ordered);
        let views = attach_engagement(self.engagement.as_ref(), window, Some(*user)).await?;
        Ok(Page::new(views, page, total))
    }

    /// Users who like the entry, oldest like first.
    pub async fn likers(&self, id: &JournalId, viewer: Option<UserId>) -> Result<Vec<UserId>, Error> {
        let visible = self
            .journals
            .find_by_id(id)
            .await?
            .is_some_and(|journal| journal.is_visible_to(viewer.as_ref()));
        if !visible {
            return Err(Error::not_found("journal not found"));
        }
        Ok(self.engagement.likers(id).await?)
    }
}
