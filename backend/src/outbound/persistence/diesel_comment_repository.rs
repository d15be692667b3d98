//! PostgreSQL-backed `CommentRepository` implementation.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use pagination::{Page, PageRequest};
use uuid::Uuid;

use crate::domain::ports::{CommentRepository, CommentRepositoryError};
use crate::domain::{Comment, CommentId, CommentView, JournalId, LikeToggle, UserId};

use super::diesel_basic_error_mapping::{
    count_to_u64, foreign_key_violation, map_basic_diesel_error, map_basic_pool_error,
};
use super::models::{CommentRow, NewCommentLikeRow, NewCommentRow};
use super::pool::{DbPool, PoolError};
use super::row_conversion::comment_from_row;
use super::schema::{comment_likes, comments};

/// Diesel-backed implementation of the comment repository port.
#[derive(Clone)]
pub struct DieselCommentRepository {
    pool: DbPool,
}

impl DieselCommentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> CommentRepositoryError {
    map_basic_pool_error(error, CommentRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> CommentRepositoryError {
    map_basic_diesel_error(
        error,
        CommentRepositoryError::query,
        CommentRepositoryError::connection,
    )
}

/// Writes that lose a race with a delete report the missing row.
fn map_write_error(error: diesel::result::Error, missing: &str) -> CommentRepositoryError {
    if foreign_key_violation(&error) {
        CommentRepositoryError::missing(missing)
    } else {
        map_diesel_error(error)
    }
}

fn to_count(count: i64) -> Result<u64, CommentRepositoryError> {
    count_to_u64(count, CommentRepositoryError::query)
}

fn to_domain(row: CommentRow) -> Result<Comment, CommentRepositoryError> {
    comment_from_row(row).map_err(CommentRepositoryError::query)
}

#[async_trait]
impl CommentRepository for DieselCommentRepository {
    async fn insert(&self, comment: &Comment) -> Result<(), CommentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewCommentRow {
            id: *comment.id.as_uuid(),
            journal_id: *comment.journal_id.as_uuid(),
            user_id: *comment.user_id.as_uuid(),
            parent_id: comment.parent_id.map(|parent| *parent.as_uuid()),
            content: comment.content.as_str(),
            author_name: &comment.author_name,
            profile_theme: comment.profile_theme.as_value(),
            created_at: comment.created_at,
        };

        diesel::insert_into(comments::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|error| map_write_error(error, "journal or parent comment not found"))
    }

    async fn find_by_id(&self, id: &CommentId) -> Result<Option<Comment>, CommentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = comments::table
            .find(*id.as_uuid())
            .select(CommentRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(to_domain).transpose()
    }

    async fn list_for_journal(
        &self,
        journal_id: &JournalId,
        viewer: Option<UserId>,
        page: PageRequest,
    ) -> Result<Page<CommentView>, CommentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let journal = *journal_id.as_uuid();

        let total: i64 = comments::table
            .filter(comments::journal_id.eq(journal))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let rows: Vec<CommentRow> = comments::table
            .filter(comments::journal_id.eq(journal))
            .order((comments::created_at.desc(), comments::id.desc()))
            .offset(i64::try_from(page.skip()).unwrap_or(i64::MAX))
            .limit(i64::from(page.limit()))
            .select(CommentRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
        let counts: HashMap<Uuid, i64> = comment_likes::table
            .filter(comment_likes::comment_id.eq_any(&ids))
            .group_by(comment_likes::comment_id)
            .select((comment_likes::comment_id, count_star()))
            .load::<(Uuid, i64)>(&mut conn)
            .await
            .map_err(map_diesel_error)?
            .into_iter()
            .collect();
        let liked: HashSet<Uuid> = match viewer {
            None => HashSet::new(),
            Some(viewer) => comment_likes::table
                .filter(comment_likes::comment_id.eq_any(&ids))
                .filter(comment_likes::user_id.eq(*viewer.as_uuid()))
                .select(comment_likes::comment_id)
                .load::<Uuid>(&mut conn)
                .await
                .map_err(map_diesel_error)?
                .into_iter()
                .collect(),
        };

        let views = rows
            .into_iter()
            .map(|row| {
                let id = row.id;
                Ok(CommentView {
                    comment: to_domain(row)?,
                    like_count: to_count(counts.get(&id).copied().unwrap_or_default())?,
                    is_liked: liked.contains(&id),
                })
            })
            .collect::<Result<Vec<_>, CommentRepositoryError>>()?;

        Ok(Page::new(views, page, to_count(total)?))
    }

    async fn delete_with_replies(&self, id: &CommentId) -> Result<u64, CommentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let target = *id.as_uuid();

        // Replies and likes cascade too; collecting replies keeps the count exact.
        let removed = conn
            .transaction(|conn| {
                async move {
                    let exists = comments::table
                        .find(target)
                        .select(comments::id)
                        .for_update()
                        .first::<Uuid>(conn)
                        .await
                        .optional()?
                        .is_some();
                    if !exists {
                        return Ok(0);
                    }
                    let mut doomed: Vec<Uuid> = comments::table
                        .filter(comments::parent_id.eq(target))
                        .select(comments::id)
                        .load(conn)
                        .await?;
                    doomed.push(target);
                    diesel::delete(comments::table.filter(comments::id.eq_any(&doomed)))
                        .execute(conn)
                        .await
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;

        Ok(u64::try_from(removed).unwrap_or(u64::MAX))
    }

    async fn toggle_like(
        &self,
        id: &CommentId,
        user_id: &UserId,
        now: DateTime<Utc>,
    ) -> Result<LikeToggle, CommentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewCommentLikeRow {
            comment_id: *id.as_uuid(),
            user_id: *user_id.as_uuid(),
            created_at: now,
        };

        let (liked, count) = conn
            .transaction(|conn| {
                async move {
                    let removed =
                        diesel::delete(comment_likes::table.find((row.comment_id, row.user_id)))
                            .execute(conn)
                            .await?;
                    if removed == 0 {
                        diesel::insert_into(comment_likes::table)
                            .values(&row)
                            .on_conflict_do_nothing()
                            .execute(conn)
                            .await?;
                    }
                    let count: i64 = comment_likes::table
                        .filter(comment_likes::comment_id.eq(row.comment_id))
                        .count()
                        .get_result(conn)
                        .await?;
                    Ok::<_, diesel::result::Error>((removed == 0, count))
                }
                .scope_boxed()
            })
            .await
            .map_err(|error| map_write_error(error, "comment not found"))?;

        Ok(LikeToggle {
            liked,
            like_count: to_count(count)?,
        })
    }
}
