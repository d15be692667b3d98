//! PostgreSQL-backed `JournalRepository` implementation using Diesel ORM.
//!
//! Listings order by `created_at` then `id` so pages stay stable between
//! requests. The popular ordering ranks by a correlated like count; there is
//! no stored counter to drift.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::dsl::{count_star, sql};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::sql_types::BigInt;
use diesel_async::RunQueryDsl;
use pagination::{Page, PageRequest};
use uuid::Uuid;

use crate::domain::ports::{JournalRepository, JournalRepositoryError, JournalWindow};
use crate::domain::{
    Journal, JournalId, JournalSort, PublicJournalFilter, Slug, UserId, normalize_tag,
};

use super::diesel_basic_error_mapping::{
    count_to_u64, map_basic_diesel_error, map_basic_pool_error, unique_violation,
};
use super::models::{JournalRow, JournalUpdateRow, NewJournalRow};
use super::pool::{DbPool, PoolError};
use super::row_conversion::journal_from_row;
use super::schema::journals;

const SLUG_CONSTRAINT: &str = "journals_slug_key";
const LIKE_COUNT_SQL: &str =
    "(SELECT COUNT(*) FROM journal_likes jl WHERE jl.journal_id = journals.id)";

/// Diesel-backed implementation of the journal repository port.
#[derive(Clone)]
pub struct DieselJournalRepository {
    pool: DbPool,
}

impl DieselJournalRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> JournalRepositoryError {
    map_basic_pool_error(error, JournalRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> JournalRepositoryError {
    map_basic_diesel_error(
        error,
        JournalRepositoryError::query,
        JournalRepositoryError::connection,
    )
}

fn map_insert_error(error: diesel::result::Error, slug: &Slug) -> JournalRepositoryError {
    match unique_violation(&error) {
        Some(name) if name.is_empty() || name == SLUG_CONSTRAINT => {
            JournalRepositoryError::duplicate_slug(slug.as_str())
        }
        _ => map_diesel_error(error),
    }
}

fn to_domain(rows: Vec<JournalRow>) -> Result<Vec<Journal>, JournalRepositoryError> {
    rows.into_iter()
        .map(|row| journal_from_row(row).map_err(JournalRepositoryError::query))
        .collect()
}

fn to_count(count: i64) -> Result<u64, JournalRepositoryError> {
    count_to_u64(count, JournalRepositoryError::query)
}

/// Offsets beyond `i64::MAX` cannot match any row anyway.
fn to_offset(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn uuids(ids: &[UserId]) -> Vec<Uuid> {
    ids.iter().map(|id| *id.as_uuid()).collect()
}

fn public_query(filter: &PublicJournalFilter) -> journals::BoxedQuery<'static, Pg> {
    let mut query = journals::table
        .filter(journals::is_public.eq(true))
        .into_boxed();
    if let Some(category) = filter.category {
        query = query.filter(journals::category.eq(category.as_str()));
    }
    if let Some(tag) = filter.tag.as_deref() {
        query = query.filter(journals::tags.contains(vec![normalize_tag(tag)]));
    }
    query
}

fn author_query(author: Uuid, collection: Option<&str>) -> journals::BoxedQuery<'static, Pg> {
    let mut query = journals::table
        .filter(journals::author_id.eq(author))
        .into_boxed();
    if let Some(name) = collection {
        query = query.filter(journals::collections.contains(vec![name.to_owned()]));
    }
    query
}

/// Which side of the author set a feed window reads from.
#[derive(Clone, Copy)]
enum AuthorScope {
    Within,
    Outside,
}

fn scoped_public_query(scope: AuthorScope, authors: Vec<Uuid>) -> journals::BoxedQuery<'static, Pg> {
    let query = journals::table
        .filter(journals::is_public.eq(true))
        .into_boxed();
    match scope {
        AuthorScope::Within => query.filter(journals::author_id.eq_any(authors)),
        AuthorScope::Outside => query.filter(journals::author_id.ne_all(authors)),
    }
}

impl DieselJournalRepository {
    async fn public_window(
        &self,
        scope: AuthorScope,
        authors: &[UserId],
        skip: u64,
        limit: u32,
    ) -> Result<JournalWindow, JournalRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let ids = uuids(authors);

        let total: i64 = scoped_public_query(scope, ids.clone())
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        if limit == 0 {
            return Ok(JournalWindow {
                journals: Vec::new(),
                total: to_count(total)?,
            });
        }

        let rows: Vec<JournalRow> = scoped_public_query(scope, ids)
            .order((journals::created_at.desc(), journals::id.desc()))
            .offset(to_offset(skip))
            .limit(i64::from(limit))
            .select(JournalRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(JournalWindow {
            journals: to_domain(rows)?,
            total: to_count(total)?,
        })
    }
}

#[async_trait]
impl JournalRepository for DieselJournalRepository {
    async fn insert(&self, journal: &Journal) -> Result<(), JournalRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewJournalRow {
            id: *journal.id.as_uuid(),
            author_id: *journal.author_id.as_uuid(),
            title: journal.title.as_str(),
            slug: journal.slug.as_str(),
            content: journal.content.as_str(),
            category: journal.category.as_str(),
            tags: journal.tags.as_slice(),
            collections: journal.collections.as_slice(),
            is_public: journal.is_public,
            author_name: journal.author_name.as_deref(),
            thumbnail: journal.thumbnail.as_deref(),
            meta_description: journal.meta_description.as_ref().map(|m| m.as_str()),
            created_at: journal.created_at,
            updated_at: journal.updated_at,
        };

        diesel::insert_into(journals::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| map_insert_error(err, &journal.slug))
    }

    async fn update(&self, journal: &Journal) -> Result<(), JournalRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let changes = JournalUpdateRow {
            title: journal.title.as_str(),
            content: journal.content.as_str(),
            category: journal.category.as_str(),
            tags: journal.tags.as_slice(),
            collections: journal.collections.as_slice(),
            is_public: journal.is_public,
            author_name: journal.author_name.as_deref(),
            thumbnail: journal.thumbnail.as_deref(),
            meta_description: journal.meta_description.as_ref().map(|m| m.as_str()),
            updated_at: journal.updated_at,
        };

        let updated = diesel::update(journals::table.find(*journal.id.as_uuid()))
            .set(&changes)
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        if updated == 0 {
            return Err(JournalRepositoryError::query(format!(
                "journal {} not found",
                journal.id
            )));
        }
        Ok(())
    }

    async fn delete(&self, id: &JournalId) -> Result<bool, JournalRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let removed = diesel::delete(journals::table.find(*id.as_uuid()))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(removed > 0)
    }

    async fn find_by_id(&self, id: &JournalId) -> Result<Option<Journal>, JournalRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = journals::table
            .find(*id.as_uuid())
            .select(JournalRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(|row| journal_from_row(row).map_err(JournalRepositoryError::query))
            .transpose()
    }

    async fn find_many(&self, ids: &[JournalId]) -> Result<Vec<Journal>, JournalRepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let ids: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
        let rows = journals::table
            .filter(journals::id.eq_any(ids))
            .select(JournalRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        to_domain(rows)
    }

    async fn find_by_slug(&self, slug: &Slug) -> Result<Option<Journal>, JournalRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = journals::table
            .filter(journals::slug.eq(slug.as_str()))
            .select(JournalRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(|row| journal_from_row(row).map_err(JournalRepositoryError::query))
            .transpose()
    }

    async fn slugs_with_prefix(&self, prefix: &str) -> Result<Vec<String>, JournalRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        // Slugs are `[a-z0-9-]`, so the prefix carries no LIKE wildcards.
        journals::table
            .filter(
                journals::slug
                    .eq(prefix)
                    .or(journals::slug.like(format!("{prefix}-%"))),
            )
            .select(journals::slug)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)
    }

    async fn list_public(
        &self,
        filter: &PublicJournalFilter,
        page: PageRequest,
    ) -> Result<Page<Journal>, JournalRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let total: i64 = public_query(filter)
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let query = public_query(filter);
        let query = match filter.sort {
            JournalSort::Newest => query.order((journals::created_at.desc(), journals::id.desc())),
            JournalSort::Oldest => query.order((journals::created_at.asc(), journals::id.asc())),
            JournalSort::Popular => query.order((
                sql::<BigInt>(LIKE_COUNT_SQL).desc(),
                journals::created_at.desc(),
                journals::id.desc(),
            )),
        };
        let rows = query
            .offset(to_offset(page.skip()))
            .limit(i64::from(page.limit()))
            .select(JournalRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(Page::new(to_domain(rows)?, page, to_count(total)?))
    }

    async fn list_by_author(
        &self,
        author: &UserId,
        collection: Option<String>,
        page: PageRequest,
    ) -> Result<Page<Journal>, JournalRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let author = *author.as_uuid();
        let total: i64 = author_query(author, collection.as_deref())
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let rows = author_query(author, collection.as_deref())
            .order((journals::created_at.desc(), journals::id.desc()))
            .offset(to_offset(page.skip()))
            .limit(i64::from(page.limit()))
            .select(JournalRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(Page::new(to_domain(rows)?, page, to_count(total)?))
    }

    async fn list_public_by_authors(
        &self,
        authors: &[UserId],
        skip: u64,
        limit: u32,
    ) -> Result<JournalWindow, JournalRepositoryError> {
        self.public_window(AuthorScope::Within, authors, skip, limit)
            .await
    }

    async fn list_public_excluding_authors(
        &self,
        authors: &[UserId],
        skip: u64,
        limit: u32,
    ) -> Result<JournalWindow, JournalRepositoryError> {
        self.public_window(AuthorScope::Outside, authors, skip, limit)
            .await
    }

    async fn count_public_since(
        &self,
        authors: &[UserId],
        since: DateTime<Utc>,
    ) -> Result<HashMap<UserId, u64>, JournalRepositoryError> {
        if authors.is_empty() {
            return Ok(HashMap::new());
        }
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<(Uuid, i64)> = journals::table
            .filter(journals::is_public.eq(true))
            .filter(journals::author_id.eq_any(uuids(authors)))
            .filter(journals::created_at.gt(since))
            .group_by(journals::author_id)
            .select((journals::author_id, count_star()))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter()
            .map(|(author, count)| Ok((UserId::from_uuid(author), to_count(count)?)))
            .collect()
    }

    async fn collections(&self, author: &UserId) -> Result<Vec<String>, JournalRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let sets: Vec<Vec<String>> = journals::table
            .filter(journals::author_id.eq(*author.as_uuid()))
            .select(journals::collections)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let mut names: Vec<String> = sets.into_iter().flatten().collect();
        names.sort_unstable();
        names.dedup();
        Ok(names)
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

        assert!(matches!(repo_err, JournalRepositoryError::Connection { .. }));
        assert!(repo_err.to_string().contains("connection refused"));
    }

    #[rstest]
    fn unique_violation_on_insert_maps_to_duplicate_slug() {
        let slug = Slug::parse("my-day").expect("slug");
        let diesel_err = DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new("duplicate key".to_owned()),
        );

        assert_eq!(
            map_insert_error(diesel_err, &slug),
            JournalRepositoryError::duplicate_slug("my-day")
        );
    }

    #[rstest]
    fn foreign_key_failures_stay_query_errors() {
        let slug = Slug::parse("my-day").expect("slug");
        let diesel_err = DieselError::DatabaseError(
            DatabaseErrorKind::ForeignKeyViolation,
            Box::new("author missing".to_owned()),
        );

        assert!(matches!(
            map_insert_error(diesel_err, &slug),
            JournalRepositoryError::Query { .. }
        ));
    }

    #[rstest]
    #[case(0, 0)]
    #[case(u64::MAX, i64::MAX)]
    fn offsets_saturate(#[case] skip: u64, #[case] expected: i64) {
        assert_eq!(to_offset(skip), expected);
    }
}
