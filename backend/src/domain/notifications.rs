//! Mail fan-out for engagement events.
//!
//! Notifications are best effort. A failed insert is logged at `warn` and
//! swallowed so the like, comment or follow that triggered it still
//! succeeds.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use mockable::Clock;
use tracing::{debug, warn};

use super::ports::MailRepository;
use super::{JournalId, Mail, MailId, MailKind, UserId};

const EXCERPT_MAX: usize = 80;

/// Something happened that the recipient should hear about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationEvent {
    NewLike {
        recipient: UserId,
        sender: UserId,
        sender_name: String,
        journal_id: JournalId,
        journal_title: String,
    },
    NewComment {
        recipient: UserId,
        sender: UserId,
        sender_name: String,
        journal_id: JournalId,
        journal_title: String,
        excerpt: String,
    },
    NewCommentLike {
        recipient: UserId,
        sender: UserId,
        sender_name: String,
        journal_id: JournalId,
        excerpt: String,
    },
    NewFollower {
        recipient: UserId,
        sender: UserId,
        sender_name: String,
    },
}

impl NotificationEvent {
    fn recipient(&self) -> UserId {
        match self {
            Self::NewLike { recipient, .. }
            | Self::NewComment { recipient, .. }
            | Self::NewCommentLike { recipient, .. }
            | Self::NewFollower { recipient, .. } => *recipient,
        }
    }

    fn sender(&self) -> UserId {
        match self {
            Self::NewLike { sender, .. }
            | Self::NewComment { sender, .. }
            | Self::NewCommentLike { sender, .. }
            | Self::NewFollower { sender, .. } => *sender,
        }
    }

    fn into_mail(self, now: DateTime<Utc>) -> Mail {
        let sender_id = Some(self.sender());
        let (kind, title, content, journal_id) = match self {
            Self::NewLike {
                sender_name,
                journal_id,
                journal_title,
                ..
            } => (
                MailKind::NewLike,
                "New like".to_owned(),
                format!("{sender_name} liked your entry \"{journal_title}\"."),
                Some(journal_id),
            ),
            Self::NewComment {
                sender_name,
                journal_id,
                journal_title,
                excerpt,
                ..
            } => (
                MailKind::NewComment,
                "New comment".to_owned(),
                format!(
                    "{sender_name} commented on \"{journal_title}\": {}",
                    truncate(&excerpt)
                ),
                Some(journal_id),
            ),
            Self::NewCommentLike {
                sender_name,
                journal_id,
                excerpt,
                ..
            } => (
                MailKind::NewCommentLike,
                "New comment like".to_owned(),
                format!("{sender_name} liked your comment: {}", truncate(&excerpt)),
                Some(journal_id),
            ),
            Self::NewFollower { sender_name, .. } => (
                MailKind::NewFollower,
                "New follower".to_owned(),
                format!("{sender_name} subscribed to your writing."),
                None,
            ),
        };
        Mail {
            id: MailId::random(),
            kind,
            title,
            content,
            sender_id,
            journal_id,
            is_system_mail: false,
            send_to_all_users: false,
            reward_coins: 0,
            expiry_date: None,
            created_at: now,
        }
    }
}

fn truncate(text: &str) -> String {
    if text.chars().count() <= EXCERPT_MAX {
        return text.to_owned();
    }
    let mut cut: String = text.chars().take(EXCERPT_MAX).collect();
    cut.push('…');
    cut
}

/// Delivers notification mail for engagement events.
#[derive(Clone)]
pub struct Notifier {
    mails: Arc<dyn MailRepository>,
    clock: Arc<dyn Clock>,
}

impl Notifier {
    pub fn new(mails: Arc<dyn MailRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { mails, clock }
    }

    /// Deliver one mail for `event`. Never fails.
    ///
    /// Events where the sender is also the recipient are dropped.
    pub async fn notify(&self, event: NotificationEvent) {
        let recipient = event.recipient();
        if recipient == event.sender() {
            return;
        }
        let mail = event.into_mail(self.clock.utc());
        let kind = mail.kind;
        match self.mails.insert(&mail, &[recipient]).await {
            Ok(()) => debug!(%recipient, %kind, mail_id = %mail.id, "notification delivered"),
            Err(error) => warn!(%recipient, %kind, %error, "notification delivery failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ports::{MailRepositoryError, MockMailRepository};
    use mockable::DefaultClock;
    use rstest::rstest;

    fn like_event(recipient: UserId, sender: UserId) -> NotificationEvent {
        NotificationEvent::NewLike {
            recipient,
            sender,
            sender_name: "SilverOtter1234".to_owned(),
            journal_id: JournalId::random(),
            journal_title: "Rainy day".to_owned(),
        }
    }

    #[tokio::test]
    async fn notify_inserts_one_mail_for_the_recipient() {
        let recipient = UserId::random();
        let sender = UserId::random();
        let mut mails = MockMailRepository::new();
        mails
            .expect_insert()
            .withf(move |mail, recipients| {
                mail.kind == MailKind::NewLike
                    && mail.sender_id == Some(sender)
                    && mail.content.contains("Rainy day")
                    && recipients == [recipient]
            })
            .times(1)
            .return_once(|_, _| Ok(()));

        let notifier = Notifier::new(Arc::new(mails), Arc::new(DefaultClock));
        notifier.notify(like_event(recipient, sender)).await;
    }

    #[tokio::test]
    async fn notify_swallows_repository_failures() {
        let mut mails = MockMailRepository::new();
        mails
            .expect_insert()
            .times(1)
            .return_once(|_, _| Err(MailRepositoryError::connection("database offline")));

        let notifier = Notifier::new(Arc::new(mails), Arc::new(DefaultClock));
        notifier
            .notify(like_event(UserId::random(), UserId::random()))
            .await;
    }

    #[tokio::test]
    async fn notify_skips_self_notifications() {
        let mut mails = MockMailRepository::new();
        mails.expect_insert().never();
        let user = UserId::random();

        let notifier = Notifier::new(Arc::new(mails), Arc::new(DefaultClock));
        notifier.notify(like_event(user, user)).await;
    }

    #[rstest]
    fn long_excerpts_are_truncated() {
        let long = "x".repeat(EXCERPT_MAX + 10);
        let cut = truncate(&long);
        assert_eq!(cut.chars().count(), EXCERPT_MAX + 1);
        assert!(cut.ends_with('…'));
    }
}
