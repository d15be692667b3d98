//! Builders for HTTP state ports and the database readiness probe.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::DefaultClock;
use tracing::info;

use backend::inbound::http::health::ReadinessProbe;
use backend::inbound::http::state::{HttpState, HttpStatePorts};
use backend::outbound::memory::MemoryStore;
use backend::outbound::persistence::{
    DbPool, DieselCommentRepository, DieselEngagementRepository, DieselJournalRepository,
    DieselMailRepository, DieselSubscriptionRepository, DieselUserRepository,
};

use super::ServerConfig;

/// Diesel repositories sharing one pool.
fn diesel_ports(pool: &DbPool) -> HttpStatePorts {
    HttpStatePorts {
        users: Arc::new(DieselUserRepository::new(pool.clone())),
        journals: Arc::new(DieselJournalRepository::new(pool.clone())),
        engagement: Arc::new(DieselEngagementRepository::new(pool.clone())),
        comments: Arc::new(DieselCommentRepository::new(pool.clone())),
        subscriptions: Arc::new(DieselSubscriptionRepository::new(pool.clone())),
        mails: Arc::new(DieselMailRepository::new(pool.clone())),
    }
}

/// One in-memory store behind every port.
fn memory_ports(store: &MemoryStore) -> HttpStatePorts {
    HttpStatePorts {
        users: Arc::new(store.clone()),
        journals: Arc::new(store.clone()),
        engagement: Arc::new(store.clone()),
        comments: Arc::new(store.clone()),
        subscriptions: Arc::new(store.clone()),
        mails: Arc::new(store.clone()),
    }
}

fn build_ports(pool: Option<&DbPool>) -> HttpStatePorts {
    match pool {
        Some(pool) => diesel_ports(pool),
        None => {
            info!("no database configured; data lives in memory for this process");
            memory_ports(&MemoryStore::new())
        }
    }
}

pub(super) fn build_http_state(config: &ServerConfig) -> HttpState {
    HttpState::new(
        build_ports(config.db_pool.as_ref()),
        Arc::new(DefaultClock),
        config.admins.clone(),
    )
}

/// Readiness fails while the database cannot answer `SELECT 1`.
pub(super) struct DbReadiness(pub(super) DbPool);

#[async_trait]
impl ReadinessProbe for DbReadiness {
    async fn check(&self) -> Result<(), String> {
        self.0.ping().await.map_err(|err| err.to_string())
    }
}
