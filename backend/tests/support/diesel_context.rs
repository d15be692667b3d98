//! A migrated database, a runtime and row builders for adapter suites.

use std::future::Future;

use backend::domain::ports::{JournalRepository, UserRepository};
use backend::domain::{
    Bio, Category, Collections, Content, Email, Journal, JournalDraft, Nickname, PasswordHash,
    ProfileTheme, Slug, Tags, Title, User, UserId,
};
use backend::outbound::persistence::{
    DbPool, DieselCommentRepository, DieselEngagementRepository, DieselJournalRepository,
    DieselMailRepository, DieselSubscriptionRepository, DieselUserRepository, PoolConfig,
};
use chrono::{DateTime, DurationRound, TimeDelta, Utc};
use pg_embedded_setup_unpriv::TemporaryDatabase;
use rstest::fixture;
use tokio::runtime::Runtime;
use uuid::Uuid;

use super::atexit_cleanup::shared_cluster_handle;
use super::{handle_cluster_setup_failure, provision_template_database};

/// Fields drop in order: runtime and pool go before the database.
pub struct DieselContext {
    runtime: Runtime,
    pool: DbPool,
    _database: TemporaryDatabase,
}

fn setup() -> Result<DieselContext, String> {
    let runtime = Runtime::new().map_err(|err| err.to_string())?;
    let cluster = shared_cluster_handle().map_err(|err| err.to_string())?;
    let database = provision_template_database(cluster)?;
    let config = PoolConfig::new(database.url())
        .with_max_size(2)
        .with_min_idle(Some(1));
    let pool = runtime
        .block_on(DbPool::new(config))
        .map_err(|err| err.to_string())?;
    Ok(DieselContext {
        runtime,
        pool,
        _database: database,
    })
}

/// `None` only when `SKIP_TEST_CLUSTER` allows skipping.
#[fixture]
pub fn diesel_context() -> Option<DieselContext> {
    match setup() {
        Ok(context) => Some(context),
        Err(reason) => handle_cluster_setup_failure(reason),
    }
}

/// Postgres keeps microseconds; round so stored values compare equal.
pub fn now() -> DateTime<Utc> {
    Utc::now()
        .duration_trunc(TimeDelta::microseconds(1))
        .unwrap_or_else(|err| panic!("truncate timestamp: {err}"))
}

impl DieselContext {
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    pub fn users(&self) -> DieselUserRepository {
        DieselUserRepository::new(self.pool.clone())
    }

    pub fn journals(&self) -> DieselJournalRepository {
        DieselJournalRepository::new(self.pool.clone())
    }

    pub fn engagement(&self) -> DieselEngagementRepository {
        DieselEngagementRepository::new(self.pool.clone())
    }

    pub fn comments(&self) -> DieselCommentRepository {
        DieselCommentRepository::new(self.pool.clone())
    }

    pub fn subscriptions(&self) -> DieselSubscriptionRepository {
        DieselSubscriptionRepository::new(self.pool.clone())
    }

    pub fn mails(&self) -> DieselMailRepository {
        DieselMailRepository::new(self.pool.clone())
    }

    /// Store a user with a placeholder hash.
    pub fn add_user(&self, nickname: &str) -> User {
        let id = UserId::random();
        let created_at = now();
        let user = User {
            id,
            nickname: Nickname::new(nickname).expect("nickname"),
            email: Email::new(format!("{}@example.com", id.as_uuid().simple())).expect("email"),
            password_hash: PasswordHash::from_phc("$argon2id$v=19$placeholder"),
            age: None,
            gender: None,
            anonymous_name: format!("Quiet{}", nickname.replace(' ', "")),
            profile_theme: ProfileTheme::default(),
            coins: 0,
            bio: Bio::default(),
            last_notification_check: created_at,
            created_at,
        };
        self.block_on(self.users().insert(&user)).expect("insert user");
        user
    }

    /// Store a public or private entry by `author` created at `created_at`.
    pub fn add_journal(
        &self,
        author: &User,
        title: &str,
        tags: &[&str],
        is_public: bool,
        created_at: DateTime<Utc>,
    ) -> Journal {
        let draft = JournalDraft {
            title: Title::new(title).expect("title"),
            content: Content::new("<p>Dear diary</p>").expect("content"),
            category: Category::Journal,
            tags: Tags::new(tags.iter().copied()).expect("tags"),
            collections: Collections::default(),
            is_public,
            thumbnail: None,
            meta_description: None,
        };
        let slug = Slug::from_title(&format!("{title} {}", Uuid::new_v4().simple()));
        let journal = draft.into_journal(author.id, &author.anonymous_name, slug, created_at);
        self.block_on(self.journals().insert(&journal))
            .expect("insert journal");
        journal
    }
}
