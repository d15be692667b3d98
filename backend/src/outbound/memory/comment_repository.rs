use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pagination::{Page, PageRequest};

use crate::domain::ports::{CommentRepository, CommentRepositoryError};
use crate::domain::{Comment, CommentId, CommentView, JournalId, LikeToggle, UserId};

use super::{MemoryStore, newest_first, page_of, toggle_row};

#[async_trait]
impl CommentRepository for MemoryStore {
    async fn insert(&self, comment: &Comment) -> Result<(), CommentRepositoryError> {
        let mut state = self.lock();
        if state.journal(&comment.journal_id).is_none() {
            return Err(CommentRepositoryError::missing("journal not found"));
        }
        state.comments.push(comment.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &CommentId) -> Result<Option<Comment>, CommentRepositoryError> {
        Ok(self.lock().comment(id).cloned())
    }

    async fn list_for_journal(
        &self,
        journal_id: &JournalId,
        viewer: Option<UserId>,
        page: PageRequest,
    ) -> Result<Page<CommentView>, CommentRepositoryError> {
        let state = self.lock();
        let views: Vec<CommentView> = newest_first(state.comments.iter(), |c| c.created_at)
            .into_iter()
            .filter(|comment| comment.journal_id == *journal_id)
            .map(|comment| CommentView {
                like_count: state.comment_like_count(&comment.id),
                is_liked: viewer.is_some_and(|viewer| {
                    state
                        .comment_likes
                        .iter()
                        .any(|row| row.target == comment.id && row.user == viewer)
                }),
                comment: comment.clone(),
            })
            .collect();
        Ok(page_of(&views, page))
    }

    async fn delete_with_replies(&self, id: &CommentId) -> Result<u64, CommentRepositoryError> {
        let mut state = self.lock();
        if state.comment(id).is_none() {
            return Ok(0);
        }
        let mut doomed = vec![*id];
        doomed.extend(
            state
                .comments
                .iter()
                .filter(|comment| comment.parent_id == Some(*id))
                .map(|comment| comment.id),
        );
        Ok(state.remove_comments(&doomed))
    }

    async fn toggle_like(
        &self,
        id: &CommentId,
        user_id: &UserId,
        now: DateTime<Utc>,
    ) -> Result<LikeToggle, CommentRepositoryError> {
        let mut state = self.lock();
        if state.comment(id).is_none() {
            return Err(CommentRepositoryError::missing("comment not found"));
        }
        let liked = toggle_row(&mut state.comment_likes, *id, *user_id, now);
        Ok(LikeToggle {
            liked,
            like_count: state.comment_like_count(id),
        })
    }
}
