//! Shared builders and test doubles for unit tests.

use std::sync::Mutex;

use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;

use crate::domain::{
    Bio, Category, Collections, Content, Email, Journal, JournalDraft, Nickname, PasswordHash,
    ProfileTheme, Slug, Tags, Title, User, UserId,
};

/// Clock whose time only moves when a test says so.
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn advance_seconds(&self, seconds: i64) {
        *self.lock_clock() += TimeDelta::seconds(seconds);
    }

    fn lock_clock(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("clock mutex"),
        }
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}

/// Fixed instant used as "now" across unit tests.
pub fn fixed_now() -> DateTime<Utc> {
    match Utc.with_ymd_and_hms(2026, 4, 1, 8, 30, 0).single() {
        Some(now) => now,
        None => panic!("valid fixed timestamp"),
    }
}

/// A user with a placeholder hash; never used for password checks.
pub fn sample_user(nickname: &str) -> User {
    let id = UserId::random();
    let now = fixed_now();
    User {
        id,
        nickname: Nickname::new(nickname).unwrap_or_else(|err| panic!("nickname: {err}")),
        email: Email::new(format!("{}@example.com", id.as_uuid().simple()))
            .unwrap_or_else(|err| panic!("email: {err}")),
        password_hash: PasswordHash::from_phc("$argon2id$v=19$placeholder"),
        age: None,
        gender: None,
        anonymous_name: format!("Quiet{}", nickname.replace(' ', "")),
        profile_theme: ProfileTheme::default(),
        coins: 0,
        bio: Bio::default(),
        last_notification_check: now,
        created_at: now,
    }
}

/// A draft with the given title, tags and visibility.
pub fn sample_draft(title: &str, tags: &[&str], is_public: bool) -> JournalDraft {
    JournalDraft {
        title: Title::new(title).unwrap_or_else(|err| panic!("title: {err}")),
        content: Content::new("<p>Dear diary</p>").unwrap_or_else(|err| panic!("content: {err}")),
        category: Category::Journal,
        tags: Tags::new(tags.iter().copied()).unwrap_or_else(|err| panic!("tags: {err}")),
        collections: Collections::default(),
        is_public,
        thumbnail: None,
        meta_description: None,
    }
}

/// A stored entry written by `author` at `created_at`.
pub fn sample_journal(
    author: &User,
    title: &str,
    is_public: bool,
    created_at: DateTime<Utc>,
) -> Journal {
    sample_draft(title, &[], is_public).into_journal(
        author.id,
        &author.anonymous_name,
        Slug::from_title(title),
        created_at,
    )
}
