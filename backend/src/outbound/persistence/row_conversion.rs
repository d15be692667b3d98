//! Row to domain conversions shared by the Diesel repositories.
//!
//! Stored values pass through the same validating constructors as request
//! input, so a row that no longer satisfies the domain rules surfaces as a
//! query error instead of leaking into a response. Errors are plain strings;
//! each repository wraps them in its own `Query` variant.

use std::str::FromStr;

use crate::domain::{
    Age, Bio, Category, Collections, Comment, CommentBody, CommentId, Content, Email, Gender,
    Journal, JournalId, Mail, MailId, MailKind, MetaDescription, Nickname, PasswordHash,
    ProfileTheme, RecipientState, Slug, Tags, Title, User, UserId,
};

use super::models::{CommentRow, JournalRow, MailRow, RecipientRow, UserRow};

fn field_error(table: &str, field: &str, err: impl std::fmt::Display) -> String {
    format!("invalid {table}.{field}: {err}")
}

pub(crate) fn user_from_row(row: UserRow) -> Result<User, String> {
    let UserRow {
        id,
        nickname,
        email,
        password_hash,
        age,
        gender,
        anonymous_name,
        profile_theme,
        coins,
        bio,
        last_notification_check,
        created_at,
    } = row;

    let age = age
        .map(|value| {
            u8::try_from(value)
                .map_err(|err| field_error("users", "age", err))
                .and_then(|value| Age::new(value).map_err(|err| field_error("users", "age", err)))
        })
        .transpose()?;

    Ok(User {
        id: UserId::from_uuid(id),
        nickname: Nickname::new(nickname).map_err(|err| field_error("users", "nickname", err))?,
        email: Email::new(email).map_err(|err| field_error("users", "email", err))?,
        password_hash: PasswordHash::from_phc(password_hash),
        age,
        gender: gender
            .map(Gender::new)
            .transpose()
            .map_err(|err| field_error("users", "gender", err))?,
        anonymous_name,
        profile_theme: ProfileTheme::new(profile_theme)
            .map_err(|err| field_error("users", "profile_theme", err))?,
        coins,
        bio: Bio::new(bio).map_err(|err| field_error("users", "bio", err))?,
        last_notification_check,
        created_at,
    })
}

pub(crate) fn journal_from_row(row: JournalRow) -> Result<Journal, String> {
    let JournalRow {
        id,
        author_id,
        title,
        slug,
        content,
        category,
        tags,
        collections,
        is_public,
        author_name,
        thumbnail,
        meta_description,
        created_at,
        updated_at,
    } = row;

    Ok(Journal {
        id: JournalId::from_uuid(id),
        author_id: UserId::from_uuid(author_id),
        title: Title::new(title).map_err(|err| field_error("journals", "title", err))?,
        slug: Slug::parse(slug).map_err(|err| field_error("journals", "slug", err))?,
        content: Content::new(content).map_err(|err| field_error("journals", "content", err))?,
        category: Category::from_str(&category)
            .map_err(|err| field_error("journals", "category", err))?,
        tags: Tags::new(tags).map_err(|err| field_error("journals", "tags", err))?,
        collections: Collections::new(collections)
            .map_err(|err| field_error("journals", "collections", err))?,
        is_public,
        author_name,
        thumbnail,
        meta_description: meta_description
            .map(MetaDescription::new)
            .transpose()
            .map_err(|err| field_error("journals", "meta_description", err))?,
        created_at,
        updated_at,
    })
}

pub(crate) fn comment_from_row(row: CommentRow) -> Result<Comment, String> {
    Ok(Comment {
        id: CommentId::from_uuid(row.id),
        journal_id: JournalId::from_uuid(row.journal_id),
        user_id: UserId::from_uuid(row.user_id),
        parent_id: row.parent_id.map(CommentId::from_uuid),
        content: CommentBody::new(row.content)
            .map_err(|err| field_error("comments", "content", err))?,
        author_name: row.author_name,
        profile_theme: ProfileTheme::new(row.profile_theme)
            .map_err(|err| field_error("comments", "profile_theme", err))?,
        created_at: row.created_at,
    })
}

pub(crate) fn mail_from_row(row: MailRow) -> Result<Mail, String> {
    Ok(Mail {
        id: MailId::from_uuid(row.id),
        kind: MailKind::from_str(&row.kind).map_err(|err| field_error("mails", "kind", err))?,
        title: row.title,
        content: row.content,
        sender_id: row.sender_id.map(UserId::from_uuid),
        journal_id: row.journal_id.map(JournalId::from_uuid),
        is_system_mail: row.is_system_mail,
        send_to_all_users: row.send_to_all_users,
        reward_coins: row.reward_coins,
        expiry_date: row.expiry_date,
        created_at: row.created_at,
    })
}

pub(crate) fn recipient_state(row: &RecipientRow) -> RecipientState {
    RecipientState {
        read: row.read,
        reward_claimed: row.reward_claimed,
        received_at: row.received_at,
        deleted: row.deleted,
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for row validation.
    use chrono::Utc;
    use rstest::{fixture, rstest};
    use serde_json::json;
    use uuid::Uuid;

    use super::*;

    #[fixture]
    fn user_row() -> UserRow {
        let now = Utc::now();
        UserRow {
            id: Uuid::new_v4(),
            nickname: "Ada Lovelace".to_owned(),
            email: "ada@example.com".to_owned(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_owned(),
            age: Some(36),
            gender: None,
            anonymous_name: "QuietOwl0001".to_owned(),
            profile_theme: json!({ "color": "teal" }),
            coins: 0,
            bio: String::new(),
            last_notification_check: now,
            created_at: now,
        }
    }

    #[fixture]
    fn journal_row() -> JournalRow {
        let now = Utc::now();
        JournalRow {
            id: Uuid::new_v4(),
            author_id: Uuid::new_v4(),
            title: "Morning pages".to_owned(),
            slug: "morning-pages".to_owned(),
            content: "Woke early.".to_owned(),
            category: "journal".to_owned(),
            tags: vec!["life".to_owned()],
            collections: vec!["All".to_owned()],
            is_public: false,
            author_name: None,
            thumbnail: None,
            meta_description: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[rstest]
    fn valid_user_rows_convert(user_row: UserRow) {
        let id = user_row.id;
        let user = user_from_row(user_row).expect("valid row");
        assert_eq!(user.id, UserId::from_uuid(id));
        assert_eq!(user.age.map(Age::value), Some(36));
    }

    #[rstest]
    #[case(-4)]
    #[case(7)]
    fn out_of_range_ages_are_rejected(mut user_row: UserRow, #[case] age: i16) {
        user_row.age = Some(age);
        let err = user_from_row(user_row).expect_err("bad age");
        assert!(err.contains("users.age"), "unexpected error: {err}");
    }

    #[rstest]
    fn non_object_themes_are_rejected(mut user_row: UserRow) {
        user_row.profile_theme = json!([1, 2]);
        let err = user_from_row(user_row).expect_err("bad theme");
        assert!(err.contains("users.profile_theme"));
    }

    #[rstest]
    fn journal_rows_convert(journal_row: JournalRow) {
        let journal = journal_from_row(journal_row).expect("valid row");
        assert_eq!(journal.slug.as_str(), "morning-pages");
        assert_eq!(journal.category, Category::Journal);
    }

    #[rstest]
    fn unknown_categories_are_rejected(mut journal_row: JournalRow) {
        journal_row.category = "poem".to_owned();
        let err = journal_from_row(journal_row).expect_err("bad category");
        assert!(err.contains("journals.category"));
    }

    #[rstest]
    fn unknown_mail_kinds_are_rejected() {
        let row = MailRow {
            id: Uuid::new_v4(),
            kind: "carrier_pigeon".to_owned(),
            title: "Hi".to_owned(),
            content: "Body".to_owned(),
            sender_id: None,
            journal_id: None,
            is_system_mail: true,
            send_to_all_users: false,
            reward_coins: 0,
            expiry_date: None,
            created_at: Utc::now(),
        };
        let err = mail_from_row(row).expect_err("bad kind");
        assert!(err.contains("carrier_pigeon"));
    }
}
