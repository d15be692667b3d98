//! PostgreSQL-backed `SubscriptionRepository` implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::dsl::exists;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::ports::{SubscriptionRepository, SubscriptionRepositoryError};
use crate::domain::{SubscriptionToggle, UserId};

use super::diesel_basic_error_mapping::{count_to_u64, map_basic_diesel_error, map_basic_pool_error};
use super::models::NewSubscriptionRow;
use super::pool::{DbPool, PoolError};
use super::schema::subscriptions;

/// Diesel-backed implementation of the subscription repository port.
#[derive(Clone)]
pub struct DieselSubscriptionRepository {
    pool: DbPool,
}

impl DieselSubscriptionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> SubscriptionRepositoryError {
    map_basic_pool_error(error, SubscriptionRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> SubscriptionRepositoryError {
    map_basic_diesel_error(
        error,
        SubscriptionRepositoryError::query,
        SubscriptionRepositoryError::connection,
    )
}

fn to_count(count: i64) -> Result<u64, SubscriptionRepositoryError> {
    count_to_u64(count, SubscriptionRepositoryError::query)
}

fn to_user_ids(ids: Vec<Uuid>) -> Vec<UserId> {
    ids.into_iter().map(UserId::from_uuid).collect()
}

#[async_trait]
impl SubscriptionRepository for DieselSubscriptionRepository {
    async fn toggle(
        &self,
        subscriber: &UserId,
        target: &UserId,
        now: DateTime<Utc>,
    ) -> Result<SubscriptionToggle, SubscriptionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewSubscriptionRow {
            subscriber_id: *subscriber.as_uuid(),
            target_id: *target.as_uuid(),
            created_at: now,
        };

        let (subscribed, count) = conn
            .transaction(|conn| {
                async move {
                    let removed = diesel::delete(
                        subscriptions::table.find((row.subscriber_id, row.target_id)),
                    )
                    .execute(conn)
                    .await?;
                    if removed == 0 {
                        diesel::insert_into(subscriptions::table)
                            .values(&row)
                            .on_conflict_do_nothing()
                            .execute(conn)
                            .await?;
                    }
                    let count: i64 = subscriptions::table
                        .filter(subscriptions::target_id.eq(row.target_id))
                        .count()
                        .get_result(conn)
                        .await?;
                    Ok::<_, diesel::result::Error>((removed == 0, count))
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;

        Ok(SubscriptionToggle {
            subscribed,
            subscriber_count: to_count(count)?,
        })
    }

    async fn subscribed_to(&self, user: &UserId) -> Result<Vec<UserId>, SubscriptionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let targets = subscriptions::table
            .filter(subscriptions::subscriber_id.eq(*user.as_uuid()))
            .order((subscriptions::created_at.desc(), subscriptions::target_id.desc()))
            .select(subscriptions::target_id)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(to_user_ids(targets))
    }

    async fn subscribers(&self, user: &UserId) -> Result<Vec<UserId>, SubscriptionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let followers = subscriptions::table
            .filter(subscriptions::target_id.eq(*user.as_uuid()))
            .order((
                subscriptions::created_at.desc(),
                subscriptions::subscriber_id.desc(),
            ))
            .select(subscriptions::subscriber_id)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(to_user_ids(followers))
    }

    async fn subscriber_count(&self, user: &UserId) -> Result<u64, SubscriptionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let count: i64 = subscriptions::table
            .filter(subscriptions::target_id.eq(*user.as_uuid()))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        to_count(count)
    }

    async fn is_subscribed(
        &self,
        subscriber: &UserId,
        target: &UserId,
    ) -> Result<bool, SubscriptionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::select(exists(
            subscriptions::table.find((*subscriber.as_uuid(), *target.as_uuid())),
        ))
        .get_result(&mut conn)
        .await
        .map_err(map_diesel_error)
    }
}
