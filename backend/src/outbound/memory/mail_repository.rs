use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::ports::{MailRepository, MailRepositoryError};
use crate::domain::{ClaimOutcome, Mail, MailId, MailboxEntry, RecipientState, UserId};

use super::{MemoryStore, RecipientRow, State, newest_first};

impl State {
    fn recipient(&self, mail: &MailId, user: &UserId) -> Option<RecipientState> {
        self.recipients
            .iter()
            .find(|row| row.mail == *mail && row.user == *user)
            .map(|row| row.state)
    }

    fn visible_mail(&self, id: &MailId, user: &UserId, now: DateTime<Utc>) -> Option<Mail> {
        let mail = self.mails.iter().find(|mail| mail.id == *id)?;
        mail.is_visible(self.recipient(id, user).as_ref(), now)
            .then(|| mail.clone())
    }

    /// Apply `change` to the user's recipient row, creating it first for
    /// broadcasts the user has not touched yet.
    fn upsert_recipient(
        &mut self,
        mail: &MailId,
        user: &UserId,
        now: DateTime<Utc>,
        change: impl FnOnce(&mut RecipientState),
    ) {
        if let Some(row) = self
            .recipients
            .iter_mut()
            .find(|row| row.mail == *mail && row.user == *user)
        {
            change(&mut row.state);
            return;
        }
        let mut state = RecipientState::unread(now);
        change(&mut state);
        self.recipients.push(RecipientRow {
            mail: *mail,
            user: *user,
            state,
        });
    }
}

#[async_trait]
impl MailRepository for MemoryStore {
    async fn insert(&self, mail: &Mail, recipients: &[UserId]) -> Result<(), MailRepositoryError> {
        let mut state = self.lock();
        state.mails.push(mail.clone());
        for user in recipients {
            state.recipients.push(RecipientRow {
                mail: mail.id,
                user: *user,
                state: RecipientState::unread(mail.created_at),
            });
        }
        Ok(())
    }

    async fn mailbox(
        &self,
        user: &UserId,
        now: DateTime<Utc>,
    ) -> Result<Vec<MailboxEntry>, MailRepositoryError> {
        let state = self.lock();
        Ok(newest_first(state.mails.iter(), |mail| mail.created_at)
            .into_iter()
            .filter_map(|mail| {
                let recipient = state.recipient(&mail.id, user);
                mail.is_visible(recipient.as_ref(), now)
                    .then(|| MailboxEntry::from_parts(mail.clone(), recipient))
            })
            .collect())
    }

    async fn mark_read(
        &self,
        id: &MailId,
        user: &UserId,
        now: DateTime<Utc>,
    ) -> Result<bool, MailRepositoryError> {
        let mut state = self.lock();
        if state.visible_mail(id, user, now).is_none() {
            return Ok(false);
        }
        state.upsert_recipient(id, user, now, |row| row.read = true);
        Ok(true)
    }

    async fn claim_reward(
        &self,
        id: &MailId,
        user: &UserId,
        now: DateTime<Utc>,
    ) -> Result<ClaimOutcome, MailRepositoryError> {
        let mut state = self.lock();
        let Some(mail) = state.visible_mail(id, user, now) else {
            return Ok(ClaimOutcome::NotFound);
        };
        if mail.reward_coins <= 0 {
            return Ok(ClaimOutcome::NoReward);
        }
        if state
            .recipient(id, user)
            .is_some_and(|recipient| recipient.reward_claimed)
        {
            return Ok(ClaimOutcome::AlreadyClaimed);
        }
        let Some(account) = state.user_mut(user) else {
            return Err(MailRepositoryError::query(format!("user {user} not found")));
        };
        account.coins = account.coins.saturating_add(mail.reward_coins);
        let coins = account.coins;
        state.upsert_recipient(id, user, now, |row| {
            row.read = true;
            row.reward_claimed = true;
        });
        Ok(ClaimOutcome::Claimed { coins })
    }

    async fn hide(
        &self,
        id: &MailId,
        user: &UserId,
        now: DateTime<Utc>,
    ) -> Result<bool, MailRepositoryError> {
        let mut state = self.lock();
        if state.visible_mail(id, user, now).is_none() {
            return Ok(false);
        }
        state.upsert_recipient(id, user, now, |row| row.deleted = true);
        Ok(true)
    }
}
