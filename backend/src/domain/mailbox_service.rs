//! Mailbox reads and per-user mail state, plus admin system mail.

use std::collections::HashSet;
use std::sync::Arc;

use mockable::Clock;
use tracing::{debug, info};

use super::ports::{MailRepository, UserRepository};
use super::{ClaimOutcome, Error, Mail, MailAudience, MailId, MailboxEntry, SystemMailDraft, UserId};

/// Mailbox use-cases.
#[derive(Clone)]
pub struct MailboxService {
    mails: Arc<dyn MailRepository>,
    users: Arc<dyn UserRepository>,
    clock: Arc<dyn Clock>,
    admins: Arc<HashSet<UserId>>,
}

impl MailboxService {
    pub fn new(
        mails: Arc<dyn MailRepository>,
        users: Arc<dyn UserRepository>,
        clock: Arc<dyn Clock>,
        admins: Arc<HashSet<UserId>>,
    ) -> Self {
        Self {
            mails,
            users,
            clock,
            admins,
        }
    }

    pub async fn mailbox(&self, user: &UserId) -> Result<Vec<MailboxEntry>, Error> {
        Ok(self.mails.mailbox(user, self.clock.utc()).await?)
    }

    pub async fn mark_read(&self, id: &MailId, user: &UserId) -> Result<(), Error> {
        if !self.mails.mark_read(id, user, self.clock.utc()).await? {
            return Err(Error::not_found("mail not found"));
        }
        Ok(())
    }

    /// Claim a mail's coin reward and return the new balance.
    pub async fn claim_reward(&self, id: &MailId, user: &UserId) -> Result<i64, Error> {
        match self.mails.claim_reward(id, user, self.clock.utc()).await? {
            ClaimOutcome::Claimed { coins } => {
                debug!(mail_id = %id, %user, coins, "reward claimed");
                Ok(coins)
            }
            ClaimOutcome::AlreadyClaimed => Err(Error::conflict("reward already claimed")),
            ClaimOutcome::NoReward => Err(Error::invalid_request("mail carries no reward")),
            ClaimOutcome::NotFound => Err(Error::not_found("mail not found")),
        }
    }

    /// Hide a mail for this user only.
    pub async fn delete_mail(&self, id: &MailId, user: &UserId) -> Result<(), Error> {
        if !self.mails.hide(id, user, self.clock.utc()).await? {
            return Err(Error::not_found("mail not found"));
        }
        Ok(())
    }

    /// Send a system mail. Restricted to configured administrators.
    pub async fn send_system_mail(
        &self,
        sender: &UserId,
        draft: SystemMailDraft,
    ) -> Result<Mail, Error> {
        if !self.admins.contains(sender) {
            return Err(Error::forbidden("only administrators may send system mail"));
        }
        if let MailAudience::Users(recipients) = draft.audience() {
            let known = self.users.find_many(recipients).await?;
            if let Some(missing) = recipients
                .iter()
                .find(|id| !known.iter().any(|user| user.id == **id))
            {
                return Err(Error::not_found(format!("recipient {missing} not found")));
            }
        }

        let (mail, recipients) = draft.into_mail(self.clock.utc());
        self.mails.insert(&mail, &recipients).await?;
        info!(
            mail_id = %mail.id,
            broadcast = mail.send_to_all_users,
            recipients = recipients.len(),
            "system mail sent"
        );
        Ok(mail)
    }
}
