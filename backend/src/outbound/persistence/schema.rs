//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. When the
//! migrations change, regenerate with `diesel print-schema` or edit by hand.

diesel::table! {
    /// Registered accounts. `email` is unique and stored lowercased.
    users (id) {
        id -> Uuid,
        nickname -> Varchar,
        email -> Varchar,
        password_hash -> Text,
        age -> Nullable<Int2>,
        gender -> Nullable<Varchar>,
        anonymous_name -> Varchar,
        profile_theme -> Jsonb,
        coins -> Int8,
        bio -> Text,
        last_notification_check -> Timestamptz,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Journal and story entries. `slug` is unique and immutable.
    journals (id) {
        id -> Uuid,
        author_id -> Uuid,
        title -> Varchar,
        slug -> Varchar,
        content -> Text,
        category -> Varchar,
        tags -> Array<Text>,
        collections -> Array<Text>,
        is_public -> Bool,
        author_name -> Nullable<Varchar>,
        thumbnail -> Nullable<Text>,
        meta_description -> Nullable<Varchar>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    journal_likes (journal_id, user_id) {
        journal_id -> Uuid,
        user_id -> Uuid,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    saved_entries (user_id, journal_id) {
        user_id -> Uuid,
        journal_id -> Uuid,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Comments. `parent_id` is a plain column without a foreign key.
    comments (id) {
        id -> Uuid,
        journal_id -> Uuid,
        user_id -> Uuid,
        parent_id -> Nullable<Uuid>,
        content -> Varchar,
        author_name -> Varchar,
        profile_theme -> Jsonb,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    comment_likes (comment_id, user_id) {
        comment_id -> Uuid,
        user_id -> Uuid,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Follow edges: `subscriber_id` follows `target_id`.
    subscriptions (subscriber_id, target_id) {
        subscriber_id -> Uuid,
        target_id -> Uuid,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    mails (id) {
        id -> Uuid,
        kind -> Varchar,
        title -> Varchar,
        content -> Text,
        sender_id -> Nullable<Uuid>,
        journal_id -> Nullable<Uuid>,
        is_system_mail -> Bool,
        send_to_all_users -> Bool,
        reward_coins -> Int8,
        expiry_date -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Per-user mail state. Broadcast rows are created on first interaction.
    mail_recipients (mail_id, user_id) {
        mail_id -> Uuid,
        user_id -> Uuid,
        read -> Bool,
        reward_claimed -> Bool,
        received_at -> Timestamptz,
        deleted -> Bool,
    }
}

diesel::joinable!(journals -> users (author_id));
diesel::joinable!(journal_likes -> journals (journal_id));
diesel::joinable!(saved_entries -> journals (journal_id));
diesel::joinable!(comments -> journals (journal_id));
diesel::joinable!(comment_likes -> comments (comment_id));
diesel::joinable!(mail_recipients -> mails (mail_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    journals,
    journal_likes,
    saved_entries,
    comments,
    comment_likes,
    subscriptions,
    mails,
    mail_recipients,
);
