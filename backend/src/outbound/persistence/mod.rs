//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the domain repository ports backed by
//! PostgreSQL through `diesel-async` with `bb8` connection pooling.
//!
//! # Architecture
//!
//! - **Thin adapters**: repositories only translate between Diesel rows and
//!   domain types. Business rules live in the domain services.
//! - **Internal models**: row structs (`models.rs`) and the schema
//!   (`schema.rs`) never leave this module.
//! - **Atomic toggles**: likes, saves, follows, reward claims and comment
//!   deletion each run in a single transaction.
//! - **Strongly typed errors**: Diesel and pool failures map onto each
//!   port's `Connection` / `Query` variants.
//!
//! # Example
//!
//! ```no_run
//! use backend::outbound::persistence::{DbPool, DieselUserRepository, PoolConfig};
//!
//! # async fn wire() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/journal")).await?;
//! let users = DieselUserRepository::new(pool);
//! # let _ = users;
//! # Ok(())
//! # }
//! ```

mod diesel_basic_error_mapping;
mod diesel_comment_repository;
mod diesel_engagement_repository;
mod diesel_journal_repository;
mod diesel_mail_repository;
mod diesel_subscription_repository;
mod diesel_user_repository;
mod migrations;
mod models;
mod pool;
mod row_conversion;
mod schema;

pub use diesel_comment_repository::DieselCommentRepository;
pub use diesel_engagement_repository::DieselEngagementRepository;
pub use diesel_journal_repository::DieselJournalRepository;
pub use diesel_mail_repository::DieselMailRepository;
pub use diesel_subscription_repository::DieselSubscriptionRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use migrations::{MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
