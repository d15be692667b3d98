//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.
//!
//! Foreign keys cascade from `users`, so deleting the row removes entries,
//! comments, likes, saves, follow edges and recipient rows in one statement.
//! Mail the user sent keeps its row with a null sender.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{UserPersistenceError, UserRepository};
use crate::domain::{Email, User, UserId};

use super::diesel_basic_error_mapping::{
    map_basic_diesel_error, map_basic_pool_error, unique_violation,
};
use super::models::{NewUserRow, UserProfileUpdate, UserRow};
use super::pool::{DbPool, PoolError};
use super::row_conversion::user_from_row;
use super::schema::users;

/// Diesel-backed implementation of the user repository port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> UserPersistenceError {
    map_basic_pool_error(error, UserPersistenceError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> UserPersistenceError {
    map_basic_diesel_error(
        error,
        UserPersistenceError::query,
        UserPersistenceError::connection,
    )
}

/// Inserts only collide on the email constraint.
fn map_insert_error(error: diesel::result::Error, email: &Email) -> UserPersistenceError {
    if unique_violation(&error).is_some() {
        return UserPersistenceError::duplicate_email(email.as_str());
    }
    map_diesel_error(error)
}

fn to_domain(row: UserRow) -> Result<User, UserPersistenceError> {
    user_from_row(row).map_err(UserPersistenceError::query)
}

fn stored_age(user: &User) -> Option<i16> {
    user.age.map(|age| i16::from(age.value()))
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn insert(&self, user: &User) -> Result<(), UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewUserRow {
            id: *user.id.as_uuid(),
            nickname: user.nickname.as_str(),
            email: user.email.as_str(),
            password_hash: user.password_hash.as_str(),
            age: stored_age(user),
            gender: user.gender.as_ref().map(|gender| gender.as_str()),
            anonymous_name: &user.anonymous_name,
            profile_theme: user.profile_theme.as_value(),
            coins: user.coins,
            bio: user.bio.as_str(),
            last_notification_check: user.last_notification_check,
            created_at: user.created_at,
        };

        diesel::insert_into(users::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| map_insert_error(err, &user.email))
    }

    async fn update_profile(&self, user: &User) -> Result<(), UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let changes = UserProfileUpdate {
            age: stored_age(user),
            gender: user.gender.as_ref().map(|gender| gender.as_str()),
            profile_theme: user.profile_theme.as_value(),
            bio: user.bio.as_str(),
        };

        let updated = diesel::update(users::table.find(*user.id.as_uuid()))
            .set(&changes)
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        if updated == 0 {
            return Err(UserPersistenceError::query(format!(
                "user {} not found",
                user.id
            )));
        }
        Ok(())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = users::table
            .find(*id.as_uuid())
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(to_domain).transpose()
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = users::table
            .filter(users::email.eq(email.as_str()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(to_domain).transpose()
    }

    async fn find_many(&self, ids: &[UserId]) -> Result<Vec<User>, UserPersistenceError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let uuids: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
        let rows: Vec<UserRow> = users::table
            .filter(users::id.eq_any(&uuids))
            .select(UserRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(to_domain).collect()
    }

    async fn delete(&self, id: &UserId) -> Result<bool, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let removed = diesel::delete(users::table.find(*id.as_uuid()))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(removed > 0)
    }

    async fn set_last_notification_check(
        &self,
        id: &UserId,
        at: DateTime<Utc>,
    ) -> Result<(), UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::update(users::table.find(*id.as_uuid()))
            .set(users::last_notification_check.eq(at))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }
}
