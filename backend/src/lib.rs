//! Journal backend: domain services, HTTP adapter and persistence.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use middleware::Trace;

#[cfg(test)]
mod test_support;
