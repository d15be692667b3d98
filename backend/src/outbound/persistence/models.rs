//! Internal Diesel row types.
//!
//! These structs mirror the tables in [`super::schema`] and never leave the
//! persistence module; repositories convert them into validated domain types.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{
    comment_likes, comments, journal_likes, journals, mail_recipients, mails, saved_entries,
    subscriptions, users,
};

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub nickname: String,
    pub email: String,
    pub password_hash: String,
    pub age: Option<i16>,
    pub gender: Option<String>,
    pub anonymous_name: String,
    pub profile_theme: serde_json::Value,
    pub coins: i64,
    pub bio: String,
    pub last_notification_check: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for creating user records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: Uuid,
    pub nickname: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub age: Option<i16>,
    pub gender: Option<&'a str>,
    pub anonymous_name: &'a str,
    pub profile_theme: &'a serde_json::Value,
    pub coins: i64,
    pub bio: &'a str,
    pub last_notification_check: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Changeset for the editable profile fields.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = users)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct UserProfileUpdate<'a> {
    pub age: Option<i16>,
    pub gender: Option<&'a str>,
    pub profile_theme: &'a serde_json::Value,
    pub bio: &'a str,
}

// ---------------------------------------------------------------------------
// Journals
// ---------------------------------------------------------------------------

/// Row struct for reading from the journals table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = journals)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct JournalRow {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub category: String,
    pub tags: Vec<String>,
    pub collections: Vec<String>,
    pub is_public: bool,
    pub author_name: Option<String>,
    pub thumbnail: Option<String>,
    pub meta_description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = journals)]
pub(crate) struct NewJournalRow<'a> {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: &'a str,
    pub slug: &'a str,
    pub content: &'a str,
    pub category: &'a str,
    pub tags: &'a [String],
    pub collections: &'a [String],
    pub is_public: bool,
    pub author_name: Option<&'a str>,
    pub thumbnail: Option<&'a str>,
    pub meta_description: Option<&'a str>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Changeset for edits. The slug, author and creation time never change.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = journals)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct JournalUpdateRow<'a> {
    pub title: &'a str,
    pub content: &'a str,
    pub category: &'a str,
    pub tags: &'a [String],
    pub collections: &'a [String],
    pub is_public: bool,
    pub author_name: Option<&'a str>,
    pub thumbnail: Option<&'a str>,
    pub meta_description: Option<&'a str>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Engagement join rows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = journal_likes)]
pub(crate) struct NewJournalLikeRow {
    pub journal_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = saved_entries)]
pub(crate) struct NewSavedEntryRow {
    pub user_id: Uuid,
    pub journal_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = comment_likes)]
pub(crate) struct NewCommentLikeRow {
    pub comment_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = subscriptions)]
pub(crate) struct NewSubscriptionRow {
    pub subscriber_id: Uuid,
    pub target_id: Uuid,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Comments
// ---------------------------------------------------------------------------

/// Row struct for reading from the comments table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = comments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CommentRow {
    pub id: Uuid,
    pub journal_id: Uuid,
    pub user_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub content: String,
    pub author_name: String,
    pub profile_theme: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = comments)]
pub(crate) struct NewCommentRow<'a> {
    pub id: Uuid,
    pub journal_id: Uuid,
    pub user_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub content: &'a str,
    pub author_name: &'a str,
    pub profile_theme: &'a serde_json::Value,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Mail
// ---------------------------------------------------------------------------

/// Row struct for reading from the mails table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = mails)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct MailRow {
    pub id: Uuid,
    pub kind: String,
    pub title: String,
    pub content: String,
    pub sender_id: Option<Uuid>,
    pub journal_id: Option<Uuid>,
    pub is_system_mail: bool,
    pub send_to_all_users: bool,
    pub reward_coins: i64,
    pub expiry_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = mails)]
pub(crate) struct NewMailRow<'a> {
    pub id: Uuid,
    pub kind: &'a str,
    pub title: &'a str,
    pub content: &'a str,
    pub sender_id: Option<Uuid>,
    pub journal_id: Option<Uuid>,
    pub is_system_mail: bool,
    pub send_to_all_users: bool,
    pub reward_coins: i64,
    pub expiry_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Row struct for per-user mail state.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = mail_recipients)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct RecipientRow {
    pub mail_id: Uuid,
    pub user_id: Uuid,
    pub read: bool,
    pub reward_claimed: bool,
    pub received_at: DateTime<Utc>,
    pub deleted: bool,
}
