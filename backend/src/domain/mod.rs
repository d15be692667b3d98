//! Domain primitives, aggregates and services.
//!
//! Purpose: define strongly typed entities for the journaling platform and
//! the services that implement its use-cases. Nothing here depends on the
//! HTTP framework or the database driver; services talk to storage through
//! the traits in [`ports`].
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic failure payload.
//! - User, Journal, Comment, Mail and their validated value objects.
//! - Services: accounts, journals, engagement, comments, subscriptions,
//!   feed, mailbox, and the notification fan-out they share.

pub mod anonymous_name;
pub mod auth;
pub mod comment;
pub mod error;
pub mod ids;
pub mod journal;
pub mod mail;
pub mod ports;
pub mod slug;
pub mod subscription;
pub mod trace_id;
pub mod user;
mod validation;

mod accounts_service;
mod comment_service;
mod engagement_service;
mod feed_service;
mod journal_service;
mod mailbox_service;
mod notifications;
mod subscription_service;

pub use self::accounts_service::{AccountService, NewAccount};
pub use self::anonymous_name::derive_anonymous_name;
pub use self::auth::{
    LoginCredentials, LoginValidationError, PASSWORD_MIN, Password, PasswordHash,
    PasswordHashError,
};
pub use self::comment::{
    COMMENT_MAX, Comment, CommentBody, CommentValidationError, CommentView, LikeToggle,
};
pub use self::comment_service::{CommentService, NewComment};
pub use self::engagement_service::EngagementService;
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::feed_service::FeedService;
pub use self::ids::{CommentId, InvalidId, JournalId, MailId};
pub use self::journal::{
    Category, Collections, Content, DEFAULT_COLLECTION, Engagement, FeedItem, Journal,
    JournalDetail, JournalDraft, JournalSort, JournalUpdate, JournalValidationError,
    JournalView, MetaDescription, PublicJournalFilter, Tags, Title, normalize_tag,
};
pub use self::journal_service::JournalService;
pub use self::mail::{
    ClaimOutcome, Mail, MailAudience, MailKind, MailValidationError, MailboxEntry,
    RecipientState, SystemMailDraft, UnknownMailKind,
};
pub use self::mailbox_service::MailboxService;
pub use self::notifications::{NotificationEvent, Notifier};
pub use self::slug::{InvalidSlug, Slug};
pub use self::subscription::{FollowedAuthor, SubscriptionToggle};
pub use self::subscription_service::SubscriptionService;
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{
    Age, Bio, Email, Gender, Nickname, PrivateProfile, ProfileTheme, ProfileUpdate,
    PublicProfile, User, UserId, UserSummary, UserValidationError,
};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use backend::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
