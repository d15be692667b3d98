use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::ports::{UserPersistenceError, UserRepository};
use crate::domain::{Email, JournalId, User, UserId};

use super::MemoryStore;

#[async_trait]
impl UserRepository for MemoryStore {
    async fn insert(&self, user: &User) -> Result<(), UserPersistenceError> {
        let mut state = self.lock();
        if state.users.iter().any(|existing| existing.email == user.email) {
            return Err(UserPersistenceError::duplicate_email(user.email.as_str()));
        }
        state.users.push(user.clone());
        Ok(())
    }

    async fn update_profile(&self, user: &User) -> Result<(), UserPersistenceError> {
        let mut state = self.lock();
        let stored = state
            .user_mut(&user.id)
            .ok_or_else(|| UserPersistenceError::query(format!("user {} not found", user.id)))?;
        stored.bio = user.bio.clone();
        stored.profile_theme = user.profile_theme.clone();
        stored.age = user.age;
        stored.gender = user.gender.clone();
        Ok(())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        Ok(self.lock().users.iter().find(|user| user.id == *id).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, UserPersistenceError> {
        Ok(self
            .lock()
            .users
            .iter()
            .find(|user| user.email == *email)
            .cloned())
    }

    async fn find_many(&self, ids: &[UserId]) -> Result<Vec<User>, UserPersistenceError> {
        Ok(self
            .lock()
            .users
            .iter()
            .filter(|user| ids.contains(&user.id))
            .cloned()
            .collect())
    }

    async fn delete(&self, id: &UserId) -> Result<bool, UserPersistenceError> {
        let mut state = self.lock();
        let before = state.users.len();
        state.users.retain(|user| user.id != *id);
        if state.users.len() == before {
            return Ok(false);
        }

        let authored: Vec<JournalId> = state
            .journals
            .iter()
            .filter(|journal| journal.author_id == *id)
            .map(|journal| journal.id)
            .collect();
        state.remove_journals(&authored);
        let comments: Vec<_> = state
            .comments
            .iter()
            .filter(|comment| comment.user_id == *id)
            .map(|comment| comment.id)
            .collect();
        state.remove_comments(&comments);
        state.journal_likes.retain(|row| row.user != *id);
        state.saves.retain(|row| row.user != *id);
        state.comment_likes.retain(|row| row.user != *id);
        state
            .subscriptions
            .retain(|edge| edge.subscriber != *id && edge.target != *id);
        state.recipients.retain(|row| row.user != *id);
        for mail in &mut state.mails {
            if mail.sender_id == Some(*id) {
                mail.sender_id = None;
            }
        }
        Ok(true)
    }

    async fn set_last_notification_check(
        &self,
        id: &UserId,
        at: DateTime<Utc>,
    ) -> Result<(), UserPersistenceError> {
        let mut state = self.lock();
        let user = state
            .user_mut(id)
            .ok_or_else(|| UserPersistenceError::query(format!("user {id} not found")))?;
        user.last_notification_check = at;
        Ok(())
    }
}
