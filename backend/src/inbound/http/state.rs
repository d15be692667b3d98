//! Shared HTTP adapter state.
//!
//! Handlers accept this state via `actix_web::web::Data` so they only depend
//! on domain services and remain testable over the in-memory adapter.

use std::collections::HashSet;
use std::sync::Arc;

use mockable::Clock;

use crate::domain::ports::{
    CommentRepository, EngagementRepository, JournalRepository, MailRepository,
    SubscriptionRepository, UserRepository,
};
use crate::domain::{
    AccountService, CommentService, EngagementService, FeedService, JournalService,
    MailboxService, Notifier, SubscriptionService, UserId,
};

/// Parameter object bundling every repository port the services need.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub users: Arc<dyn UserRepository>,
    pub journals: Arc<dyn JournalRepository>,
    pub engagement: Arc<dyn EngagementRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub subscriptions: Arc<dyn SubscriptionRepository>,
    pub mails: Arc<dyn MailRepository>,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub accounts: AccountService,
    pub journals: JournalService,
    pub engagement: EngagementService,
    pub comments: CommentService,
    pub subscriptions: SubscriptionService,
    pub feed: FeedService,
    pub mailbox: MailboxService,
}

impl HttpState {
    /// Wire every service from one set of ports.
    ///
    /// `admins` lists the users allowed to send system mail.
    ///
    /// # Examples
    /// ```
    /// use std::collections::HashSet;
    /// use std::sync::Arc;
    ///
    /// use backend::inbound::http::state::{HttpState, HttpStatePorts};
    /// use backend::outbound::memory::MemoryStore;
    /// use mockable::DefaultClock;
    ///
    /// let store = MemoryStore::new();
    /// let ports = HttpStatePorts {
    ///     users: Arc::new(store.clone()),
    ///     journals: Arc::new(store.clone()),
    ///     engagement: Arc::new(store.clone()),
    ///     comments: Arc::new(store.clone()),
    ///     subscriptions: Arc::new(store.clone()),
    ///     mails: Arc::new(store),
    /// };
    /// let state = HttpState::new(ports, Arc::new(DefaultClock), HashSet::new());
    /// let _feed = state.feed.clone();
    /// ```
    pub fn new(ports: HttpStatePorts, clock: Arc<dyn Clock>, admins: HashSet<UserId>) -> Self {
        let HttpStatePorts {
            users,
            journals,
            engagement,
            comments,
            subscriptions,
            mails,
        } = ports;
        let notifier = Notifier::new(mails.clone(), clock.clone());

        Self {
            accounts: AccountService::new(users.clone(), subscriptions.clone(), clock.clone()),
            journals: JournalService::new(
                journals.clone(),
                engagement.clone(),
                users.clone(),
                clock.clone(),
            ),
            engagement: EngagementService::new(
                journals.clone(),
                engagement.clone(),
                users.clone(),
                notifier.clone(),
                clock.clone(),
            ),
            comments: CommentService::new(
                journals.clone(),
                comments,
                users.clone(),
                notifier.clone(),
                clock.clone(),
            ),
            subscriptions: SubscriptionService::new(
                subscriptions.clone(),
                users.clone(),
                journals.clone(),
                notifier,
                clock.clone(),
            ),
            feed: FeedService::new(journals, subscriptions, engagement),
            mailbox: MailboxService::new(mails, users, clock, Arc::new(admins)),
        }
    }
}
