//! PostgreSQL-backed `EngagementRepository` implementation.
//!
//! Each toggle deletes the join row and inserts it only when nothing was
//! deleted, then recounts, all inside one transaction.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::ports::{EngagementRepository, EngagementRepositoryError};
use crate::domain::{Engagement, JournalId, LikeToggle, UserId};

use super::diesel_basic_error_mapping::{
    count_to_u64, foreign_key_violation, map_basic_diesel_error, map_basic_pool_error,
};
use super::models::{NewJournalLikeRow, NewSavedEntryRow};
use super::pool::{DbPool, PoolError};
use super::schema::{journal_likes, saved_entries};

/// Diesel-backed implementation of the engagement repository port.
#[derive(Clone)]
pub struct DieselEngagementRepository {
    pool: DbPool,
}

impl DieselEngagementRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> EngagementRepositoryError {
    map_basic_pool_error(error, EngagementRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> EngagementRepositoryError {
    map_basic_diesel_error(
        error,
        EngagementRepositoryError::query,
        EngagementRepositoryError::connection,
    )
}

fn to_count(count: i64) -> Result<u64, EngagementRepositoryError> {
    count_to_u64(count, EngagementRepositoryError::query)
}

/// A toggle racing with the entry's deletion reports it as missing.
fn map_toggle_error(error: diesel::result::Error) -> EngagementRepositoryError {
    if foreign_key_violation(&error) {
        EngagementRepositoryError::missing("journal not found")
    } else {
        map_diesel_error(error)
    }
}

#[async_trait]
impl EngagementRepository for DieselEngagementRepository {
    async fn toggle_journal_like(
        &self,
        journal_id: &JournalId,
        user_id: &UserId,
        now: DateTime<Utc>,
    ) -> Result<LikeToggle, EngagementRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewJournalLikeRow {
            journal_id: *journal_id.as_uuid(),
            user_id: *user_id.as_uuid(),
            created_at: now,
        };

        let (liked, count) = conn
            .transaction(|conn| {
                async move {
                    let removed = diesel::delete(
                        journal_likes::table.find((row.journal_id, row.user_id)),
                    )
                    .execute(conn)
                    .await?;
                    if removed == 0 {
                        diesel::insert_into(journal_likes::table)
                            .values(&row)
                            .on_conflict_do_nothing()
                            .execute(conn)
                            .await?;
                    }
                    let count: i64 = journal_likes::table
                        .filter(journal_likes::journal_id.eq(row.journal_id))
                        .count()
                        .get_result(conn)
                        .await?;
                    Ok::<_, diesel::result::Error>((removed == 0, count))
                }
                .scope_boxed()
            })
            .await
            .map_err(map_toggle_error)?;

        Ok(LikeToggle {
            liked,
            like_count: to_count(count)?,
        })
    }

    async fn toggle_save(
        &self,
        journal_id: &JournalId,
        user_id: &UserId,
        now: DateTime<Utc>,
    ) -> Result<bool, EngagementRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewSavedEntryRow {
            user_id: *user_id.as_uuid(),
            journal_id: *journal_id.as_uuid(),
            created_at: now,
        };

        conn.transaction(|conn| {
            async move {
                let removed =
                    diesel::delete(saved_entries::table.find((row.user_id, row.journal_id)))
                        .execute(conn)
                        .await?;
                if removed == 0 {
                    diesel::insert_into(saved_entries::table)
                        .values(&row)
                        .on_conflict_do_nothing()
                        .execute(conn)
                        .await?;
                }
                Ok::<_, diesel::result::Error>(removed == 0)
            }
            .scope_boxed()
        })
        .await
        .map_err(map_toggle_error)
    }

    async fn engagement_for(
        &self,
        journal_ids: &[JournalId],
        viewer: Option<UserId>,
    ) -> Result<HashMap<JournalId, Engagement>, EngagementRepositoryError> {
        if journal_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let ids: Vec<Uuid> = journal_ids.iter().map(|id| *id.as_uuid()).collect();

        let counts: HashMap<Uuid, i64> = journal_likes::table
            .filter(journal_likes::journal_id.eq_any(&ids))
            .group_by(journal_likes::journal_id)
            .select((journal_likes::journal_id, count_star()))
            .load::<(Uuid, i64)>(&mut conn)
            .await
            .map_err(map_diesel_error)?
            .into_iter()
            .collect();

        let (liked, saved): (HashSet<Uuid>, HashSet<Uuid>) = match viewer {
            None => (HashSet::new(), HashSet::new()),
            Some(viewer) => {
                let liked = journal_likes::table
                    .filter(journal_likes::journal_id.eq_any(&ids))
                    .filter(journal_likes::user_id.eq(*viewer.as_uuid()))
                    .select(journal_likes::journal_id)
                    .load::<Uuid>(&mut conn)
                    .await
                    .map_err(map_diesel_error)?;
                let saved = saved_entries::table
                    .filter(saved_entries::journal_id.eq_any(&ids))
                    .filter(saved_entries::user_id.eq(*viewer.as_uuid()))
                    .select(saved_entries::journal_id)
                    .load::<Uuid>(&mut conn)
                    .await
                    .map_err(map_diesel_error)?;
                (liked.into_iter().collect(), saved.into_iter().collect())
            }
        };

        journal_ids
            .iter()
            .map(|id| {
                let uuid = id.as_uuid();
                let figures = Engagement {
                    like_count: to_count(counts.get(uuid).copied().unwrap_or_default())?,
                    is_liked: liked.contains(uuid),
                    is_saved: saved.contains(uuid),
                };
                Ok((*id, figures))
            })
            .collect()
    }

    async fn likers(&self, journal_id: &JournalId) -> Result<Vec<UserId>, EngagementRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let users: Vec<Uuid> = journal_likes::table
            .filter(journal_likes::journal_id.eq(*journal_id.as_uuid()))
            .order((journal_likes::created_at.asc(), journal_likes::user_id.asc()))
            .select(journal_likes::user_id)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(users.into_iter().map(UserId::from_uuid).collect())
    }

    async fn saved_journal_ids(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<JournalId>, EngagementRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let journals: Vec<Uuid> = saved_entries::table
            .filter(saved_entries::user_id.eq(*user_id.as_uuid()))
            .order((saved_entries::created_at.desc(), saved_entries::journal_id.desc()))
            .select(saved_entries::journal_id)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(journals.into_iter().map(JournalId::from_uuid).collect())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for error mapping.
    use diesel::result::{DatabaseErrorKind, Error as DieselError};
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn pool_error_maps_to_connection_error() {
        let repo_err = map_pool_error(PoolError::checkout("connection refused"));
        assert!(matches!(
            repo_err,
            EngagementRepositoryError::Connection { .. }
        ));
    }

    #[rstest]
    fn toggle_on_deleted_journal_is_missing() {
        let diesel_err = DieselError::DatabaseError(
            DatabaseErrorKind::ForeignKeyViolation,
            Box::new("journal_likes_journal_id_fkey".to_owned()),
        );
        assert_eq!(
            map_toggle_error(diesel_err),
            EngagementRepositoryError::missing("journal not found")
        );
    }

    #[rstest]
    fn other_toggle_failures_stay_query_errors() {
        assert!(matches!(
            map_toggle_error(DieselError::RollbackTransaction),
            EngagementRepositoryError::Query { .. }
        ));
    }

    #[rstest]
    fn negative_counts_are_rejected() {
        assert!(to_count(-1).is_err());
    }
}
