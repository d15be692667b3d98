use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::ports::{EngagementRepository, EngagementRepositoryError};
use crate::domain::{Engagement, JournalId, LikeToggle, UserId};

use super::{JoinRow, MemoryStore, toggle_row};

#[async_trait]
impl EngagementRepository for MemoryStore {
    async fn toggle_journal_like(
        &self,
        journal_id: &JournalId,
        user_id: &UserId,
        now: DateTime<Utc>,
    ) -> Result<LikeToggle, EngagementRepositoryError> {
        let mut state = self.lock();
        if state.journal(journal_id).is_none() {
            return Err(EngagementRepositoryError::missing("journal not found"));
        }
        let liked = toggle_row(&mut state.journal_likes, *journal_id, *user_id, now);
        Ok(LikeToggle {
            liked,
            like_count: state.journal_like_count(journal_id),
        })
    }

    async fn toggle_save(
        &self,
        journal_id: &JournalId,
        user_id: &UserId,
        now: DateTime<Utc>,
    ) -> Result<bool, EngagementRepositoryError> {
        let mut state = self.lock();
        if state.journal(journal_id).is_none() {
            return Err(EngagementRepositoryError::missing("journal not found"));
        }
        Ok(toggle_row(&mut state.saves, *journal_id, *user_id, now))
    }

    async fn engagement_for(
        &self,
        journal_ids: &[JournalId],
        viewer: Option<UserId>,
    ) -> Result<HashMap<JournalId, Engagement>, EngagementRepositoryError> {
        let state = self.lock();
        let by_viewer = |rows: &[JoinRow<JournalId>], id: &JournalId| {
            viewer.is_some_and(|viewer| {
                rows.iter()
                    .any(|row| row.target == *id && row.user == viewer)
            })
        };
        Ok(journal_ids
            .iter()
            .map(|id| {
                let figures = Engagement {
                    like_count: state.journal_like_count(id),
                    is_liked: by_viewer(&state.journal_likes, id),
                    is_saved: by_viewer(&state.saves, id),
                };
                (*id, figures)
            })
            .collect())
    }

    async fn likers(&self, journal_id: &JournalId) -> Result<Vec<UserId>, EngagementRepositoryError> {
        Ok(self
            .lock()
            .journal_likes
            .iter()
            .filter(|row| row.target == *journal_id)
            .map(|row| row.user)
            .collect())
    }

    async fn saved_journal_ids(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<JournalId>, EngagementRepositoryError> {
        let state = self.lock();
        let mut saves: Vec<_> = state
            .saves
            .iter()
            .rev()
            .filter(|row| row.user == *user_id)
            .collect();
        saves.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(saves.into_iter().map(|row| row.target).collect())
    }
}
