//! Outbound adapters implementing the domain repository ports.
//!
//! - **memory**: process-local store used without a database and in tests
//! - **persistence**: PostgreSQL repositories using Diesel
//!
//! Adapters translate between domain types and storage rows. They contain no
//! business rules.

pub mod memory;
pub mod persistence;
