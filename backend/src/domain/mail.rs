//! In-app mail: personal notifications and broadcast system messages.
//!
//! A mail message is stored once. Per-user state (read, claimed, hidden)
//! lives in a [`RecipientState`]. Personal mail gets its recipient rows when
//! it is sent; broadcasts get a row lazily the first time a user acts on one.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{JournalId, MailId};
use super::user::UserId;

/// Maximum system mail title length.
pub const MAIL_TITLE_MAX: usize = 200;
/// Maximum system mail body length.
pub const MAIL_CONTENT_MAX: usize = 5_000;

/// Category of a mail message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MailKind {
    NewLike,
    NewComment,
    NewCommentLike,
    NewFollower,
    System,
}

impl MailKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NewLike => "new_like",
            Self::NewComment => "new_comment",
            Self::NewCommentLike => "new_comment_like",
            Self::NewFollower => "new_follower",
            Self::System => "system",
        }
    }
}

/// Raised when a stored mail kind is unknown.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown mail kind `{0}`")]
pub struct UnknownMailKind(pub String);

impl FromStr for MailKind {
    type Err = UnknownMailKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new_like" => Ok(Self::NewLike),
            "new_comment" => Ok(Self::NewComment),
            "new_comment_like" => Ok(Self::NewCommentLike),
            "new_follower" => Ok(Self::NewFollower),
            "system" => Ok(Self::System),
            other => Err(UnknownMailKind(other.to_owned())),
        }
    }
}

impl fmt::Display for MailKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored mail message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mail {
    pub id: MailId,
    pub kind: MailKind,
    pub title: String,
    pub content: String,
    pub sender_id: Option<UserId>,
    pub journal_id: Option<JournalId>,
    pub is_system_mail: bool,
    pub send_to_all_users: bool,
    pub reward_coins: i64,
    pub expiry_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Mail {
    /// Broadcast system mail reaches every user without recipient rows.
    pub fn is_broadcast(&self) -> bool {
        self.is_system_mail && self.send_to_all_users
    }

    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiry_date.is_some_and(|expiry| expiry <= now)
    }

    /// Whether the mail belongs in a user's mailbox at `now`.
    ///
    /// A broadcast must carry an expiry in the future. Any other mail needs a
    /// recipient row and must not be expired. Hidden rows never show.
    ///
    /// # Examples
    /// ```
    /// use backend::domain::{Mail, MailId, MailKind};
    /// use chrono::{Duration, Utc};
    ///
    /// let now = Utc::now();
    /// let broadcast = Mail {
    ///     id: MailId::random(),
    ///     kind: MailKind::System,
    ///     title: "Welcome".into(),
    ///     content: "Hello".into(),
    ///     sender_id: None,
    ///     journal_id: None,
    ///     is_system_mail: true,
    ///     send_to_all_users: true,
    ///     reward_coins: 0,
    ///     expiry_date: Some(now + Duration::days(1)),
    ///     created_at: now,
    /// };
    /// assert!(broadcast.is_visible(None, now));
    /// assert!(!broadcast.is_visible(None, now + Duration::days(2)));
    /// ```
    pub fn is_visible(&self, recipient: Option<&RecipientState>, now: DateTime<Utc>) -> bool {
        if recipient.is_some_and(|state| state.deleted) {
            return false;
        }
        let broadcast_live = self.is_broadcast() && self.expiry_date.is_some_and(|e| e > now);
        let personal_live = recipient.is_some() && !self.is_expired(now);
        broadcast_live || personal_live
    }
}

/// Per-recipient mail state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecipientState {
    pub read: bool,
    pub reward_claimed: bool,
    pub received_at: DateTime<Utc>,
    pub deleted: bool,
}

impl RecipientState {
    /// Fresh state for a mail delivered at `now`.
    pub const fn unread(now: DateTime<Utc>) -> Self {
        Self {
            read: false,
            reward_claimed: false,
            received_at: now,
            deleted: false,
        }
    }
}

/// Mail as it appears in one user's mailbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailboxEntry {
    pub mail: Mail,
    pub read: bool,
    pub reward_claimed: bool,
    pub received_at: DateTime<Utc>,
}

impl MailboxEntry {
    /// Combine a mail with the user's state, defaulting broadcasts the user
    /// has not touched yet.
    pub fn from_parts(mail: Mail, recipient: Option<RecipientState>) -> Self {
        let state = recipient.unwrap_or_else(|| RecipientState::unread(mail.created_at));
        Self {
            mail,
            read: state.read,
            reward_claimed: state.reward_claimed,
            received_at: state.received_at,
        }
    }
}

/// Who receives a system mail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MailAudience {
    AllUsers,
    Users(Vec<UserId>),
}

/// Validation errors for system mail drafts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MailValidationError {
    #[error("title must be between 1 and {max} characters")]
    InvalidTitle { max: usize },
    #[error("content must be between 1 and {max} characters")]
    InvalidContent { max: usize },
    #[error("reward coins must not be negative")]
    NegativeReward,
    #[error("broadcast mail requires an expiry date")]
    BroadcastWithoutExpiry,
    #[error("at least one recipient is required")]
    NoRecipients,
}

impl MailValidationError {
    /// Request field the error refers to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::InvalidTitle { .. } => "title",
            Self::InvalidContent { .. } => "content",
            Self::NegativeReward => "rewardCoins",
            Self::BroadcastWithoutExpiry => "expiryDate",
            Self::NoRecipients => "recipients",
        }
    }
}

/// Validated system mail draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemMailDraft {
    title: String,
    content: String,
    reward_coins: i64,
    expiry_date: Option<DateTime<Utc>>,
    audience: MailAudience,
}

impl SystemMailDraft {
    /// Validate a draft.
    ///
    /// Broadcasts must expire so they eventually leave every mailbox.
    pub fn new(
        title: &str,
        content: &str,
        reward_coins: i64,
        expiry_date: Option<DateTime<Utc>>,
        audience: MailAudience,
    ) -> Result<Self, MailValidationError> {
        let title = title.trim();
        if title.is_empty() || title.chars().count() > MAIL_TITLE_MAX {
            return Err(MailValidationError::InvalidTitle {
                max: MAIL_TITLE_MAX,
            });
        }
        let content = content.trim();
        if content.is_empty() || content.chars().count() > MAIL_CONTENT_MAX {
            return Err(MailValidationError::InvalidContent {
                max: MAIL_CONTENT_MAX,
            });
        }
        if reward_coins < 0 {
            return Err(MailValidationError::NegativeReward);
        }
        match &audience {
            MailAudience::AllUsers if expiry_date.is_none() => {
                return Err(MailValidationError::BroadcastWithoutExpiry);
            }
            MailAudience::Users(users) if users.is_empty() => {
                return Err(MailValidationError::NoRecipients);
            }
            _ => {}
        }
        Ok(Self {
            title: title.to_owned(),
            content: content.to_owned(),
            reward_coins,
            expiry_date,
            audience,
        })
    }

    pub fn audience(&self) -> &MailAudience {
        &self.audience
    }

    /// Build the stored mail and the recipient list (empty for broadcasts).
    pub fn into_mail(self, now: DateTime<Utc>) -> (Mail, Vec<UserId>) {
        let (send_to_all_users, recipients) = match self.audience {
            MailAudience::AllUsers => (true, Vec::new()),
            MailAudience::Users(users) => (false, users),
        };
        let mail = Mail {
            id: MailId::random(),
            kind: MailKind::System,
            title: self.title,
            content: self.content,
            sender_id: None,
            journal_id: None,
            is_system_mail: true,
            send_to_all_users,
            reward_coins: self.reward_coins,
            expiry_date: self.expiry_date,
            created_at: now,
        };
        (mail, recipients)
    }
}

/// Result of a reward claim attempt, decided inside one transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// Reward credited; carries the new coin balance.
    Claimed { coins: i64 },
    AlreadyClaimed,
    NoReward,
    /// The mail is not in the user's mailbox.
    NotFound,
}
