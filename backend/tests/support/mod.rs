//! Embedded PostgreSQL harness shared by the Diesel adapter suites.
//!
//! Each suite compiles as its own crate, so helpers a given suite does not
//! call are expected to be dead there.
#![allow(dead_code)]

pub mod atexit_cleanup;
pub mod cluster_skip;
pub mod diesel_context;
pub mod embedded_postgres;

pub use cluster_skip::handle_cluster_setup_failure;
pub use diesel_context::DieselContext;
pub use embedded_postgres::provision_template_database;
