//! Account lifecycle: signup, login, profile reads and updates, deletion.

use std::sync::Arc;

use mockable::Clock;
use tracing::debug;

use super::auth::verify_against_decoy;
use super::ports::{SubscriptionRepository, UserPersistenceError, UserRepository};
use super::{
    Age, Bio, Email, Error, Gender, LoginCredentials, Nickname, Password, PasswordHash,
    PrivateProfile, ProfileTheme, ProfileUpdate, PublicProfile, User, UserId,
    derive_anonymous_name,
};

/// Run Argon2 work on the blocking pool so request workers keep serving.
async fn off_worker<T, F>(work: F) -> Result<T, Error>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|err| Error::internal(format!("password task failed: {err}")))
}

async fn hash_password(password: Password) -> Result<PasswordHash, Error> {
    off_worker(move || password.hash())
        .await?
        .map_err(|err| Error::internal(err.to_string()))
}

/// Check `credentials` against `stored`, or against the decoy when no
/// account matched.
async fn verify_password(
    stored: Option<PasswordHash>,
    credentials: LoginCredentials,
) -> Result<bool, Error> {
    off_worker(move || match stored {
        Some(hash) => hash.verify(credentials.password()),
        None => {
            verify_against_decoy(credentials.password());
            false
        }
    })
    .await
}

/// Validated signup input.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub nickname: Nickname,
    pub email: Email,
    pub password: Password,
    pub age: Option<Age>,
    pub gender: Option<Gender>,
}

/// Account use-cases.
#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    clock: Arc<dyn Clock>,
}

impl AccountService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            subscriptions,
            clock,
        }
    }

    /// Register a new account.
    ///
    /// Fails with `conflict` when the email is already registered.
    pub async fn signup(&self, account: NewAccount) -> Result<User, Error> {
        if self.users.find_by_email(&account.email).await?.is_some() {
            return Err(UserPersistenceError::duplicate_email(account.email.as_str()).into());
        }

        let password_hash = hash_password(account.password).await?;
        let anonymous_name = derive_anonymous_name(&account.nickname, &password_hash);
        let now = self.clock.utc();
        let user = User {
            id: UserId::random(),
            nickname: account.nickname,
            email: account.email,
            password_hash,
            age: account.age,
            gender: account.gender,
            anonymous_name,
            profile_theme: ProfileTheme::default(),
            coins: 0,
            bio: Bio::default(),
            last_notification_check: now,
            created_at: now,
        };

        self.users.insert(&user).await?;
        debug!(user_id = %user.id, "account created");
        Ok(user)
    }

    /// Check credentials and return the matching user id.
    ///
    /// Unknown emails and wrong passwords produce the same error and cost
    /// the same hashing work.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<UserId, Error> {
        let user = self.users.find_by_email(credentials.email()).await?;
        let stored = user.as_ref().map(|user| user.password_hash.clone());
        let matched = verify_password(stored, credentials.clone()).await?;
        let Some(user) = user.filter(|_| matched) else {
            return Err(Error::unauthorized("invalid credentials"));
        };
        debug!(user_id = %user.id, "login succeeded");
        Ok(user.id)
    }

    async fn require_user(&self, user_id: &UserId) -> Result<User, Error> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| Error::not_found("user not found"))
    }

    /// Profile of the signed-in user.
    pub async fn current_user(&self, user_id: &UserId) -> Result<PrivateProfile, Error> {
        let user = self.require_user(user_id).await?;
        let subscriber_count = self.subscriptions.subscriber_count(user_id).await?;
        Ok(PrivateProfile {
            user,
            subscriber_count,
        })
    }

    pub async fn update_profile(
        &self,
        user_id: &UserId,
        update: ProfileUpdate,
    ) -> Result<PrivateProfile, Error> {
        let mut user = self.require_user(user_id).await?;
        update.apply(&mut user);
        self.users.update_profile(&user).await?;
        debug!(user_id = %user.id, "profile updated");
        let subscriber_count = self.subscriptions.subscriber_count(user_id).await?;
        Ok(PrivateProfile {
            user,
            subscriber_count,
        })
    }

    /// Profile of `user_id` as seen by `viewer`.
    pub async fn public_profile(
        &self,
        user_id: &UserId,
        viewer: Option<UserId>,
    ) -> Result<PublicProfile, Error> {
        let user = self.require_user(user_id).await?;
        let subscriber_count = self.subscriptions.subscriber_count(user_id).await?;
        let is_subscribed = match viewer {
            Some(viewer) if viewer != *user_id => {
                self.subscriptions.is_subscribed(&viewer, user_id).await?
            }
            _ => false,
        };
        Ok(PublicProfile {
            user_id: user.id,
            anonymous_name: user.anonymous_name,
            bio: user.bio,
            profile_theme: user.profile_theme,
            subscriber_count,
            is_subscribed,
        })
    }

    /// Delete the account and everything that references it.
    pub async fn delete_account(&self, user_id: &UserId) -> Result<(), Error> {
        if !self.users.delete(user_id).await? {
            return Err(Error::not_found("user not found"));
        }
        debug!(%user_id, "account deleted");
        Ok(())
    }
}
