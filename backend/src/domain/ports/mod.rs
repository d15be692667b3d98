//! Domain ports defining the edges of the hexagon.
//!
//! Ports describe how the domain expects to interact with driven adapters.
//! Each trait exposes strongly typed errors so adapters map their failures
//! into predictable variants, and each error converts into the domain
//! [`Error`](crate::domain::Error) with `Connection` as 503 and `Query` as
//! 500.

mod macros;
pub(crate) use macros::define_port_error;

mod comment_repository;
mod engagement_repository;
mod journal_repository;
mod mail_repository;
mod subscription_repository;
mod user_repository;

#[cfg(test)]
pub use comment_repository::MockCommentRepository;
pub use comment_repository::{CommentRepository, CommentRepositoryError};
#[cfg(test)]
pub use engagement_repository::MockEngagementRepository;
pub use engagement_repository::{EngagementRepository, EngagementRepositoryError};
#[cfg(test)]
pub use journal_repository::MockJournalRepository;
pub use journal_repository::{JournalRepository, JournalRepositoryError, JournalWindow};
#[cfg(test)]
pub use mail_repository::MockMailRepository;
pub use mail_repository::{MailRepository, MailRepositoryError};
#[cfg(test)]
pub use subscription_repository::MockSubscriptionRepository;
pub use subscription_repository::{SubscriptionRepository, SubscriptionRepositoryError};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserPersistenceError, UserRepository};
