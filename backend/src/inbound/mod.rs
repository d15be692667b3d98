//! Inbound adapters that translate external requests into domain service
//! calls while keeping framework details at the edge.
//!
//! The REST surface lives under [`http`].

pub mod http;
