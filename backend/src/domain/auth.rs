//! Authentication primitives: passwords, stored hashes and login credentials.
//!
//! Passwords are hashed with Argon2id and a per-user random salt. The PHC
//! string produced by the hasher is the only form that reaches persistence.

use std::sync::OnceLock;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{self, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use zeroize::Zeroizing;

use super::user::{Email, UserValidationError};

/// Minimum number of characters accepted for a new password.
pub const PASSWORD_MIN: usize = 8;

/// Raised when a password cannot be hashed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("password hashing failed: {message}")]
pub struct PasswordHashError {
    message: String,
}

impl From<password_hash::Error> for PasswordHashError {
    fn from(value: password_hash::Error) -> Self {
        Self {
            message: value.to_string(),
        }
    }
}

/// Plain-text password supplied at signup, wiped from memory on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(Zeroizing<String>);

impl Password {
    /// Validate a new password.
    ///
    /// Whitespace is preserved; only the length is checked.
    pub fn new(value: &str) -> Result<Self, UserValidationError> {
        if value.chars().count() < PASSWORD_MIN {
            return Err(UserValidationError::PasswordTooShort { min: PASSWORD_MIN });
        }
        Ok(Self(Zeroizing::new(value.to_owned())))
    }

    pub fn expose(&self) -> &str {
        self.0.as_str()
    }

    /// Hash the password with Argon2id and a fresh salt.
    ///
    /// # Examples
    /// ```
    /// use backend::domain::Password;
    ///
    /// let password = Password::new("correct horse").expect("long enough");
    /// let hash = password.hash().expect("hashing succeeds");
    /// assert!(hash.verify("correct horse"));
    /// assert!(!hash.verify("wrong horse"));
    /// ```
    pub fn hash(&self) -> Result<PasswordHash, PasswordHashError> {
        hash_raw(self.expose())
    }
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Password(***)")
    }
}

fn hash_raw(raw: &str) -> Result<PasswordHash, PasswordHashError> {
    let salt = SaltString::generate(&mut OsRng);
    let phc = Argon2::default().hash_password(raw.as_bytes(), &salt)?;
    Ok(PasswordHash(phc.to_string()))
}

/// Argon2 PHC string as stored in the `users` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Wrap a PHC string loaded from storage.
    pub fn from_phc(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check `candidate` against the stored hash.
    ///
    /// Malformed stored hashes never verify.
    pub fn verify(&self, candidate: &str) -> bool {
        password_hash::PasswordHash::new(&self.0)
            .map(|parsed| {
                Argon2::default()
                    .verify_password(candidate.as_bytes(), &parsed)
                    .is_ok()
            })
            .unwrap_or(false)
    }
}

static DECOY_HASH: OnceLock<Option<PasswordHash>> = OnceLock::new();

/// Spend the same Argon2 work as a real verification.
///
/// Used when no account matches an email so response timing does not reveal
/// which addresses are registered.
pub fn verify_against_decoy(candidate: &str) {
    let decoy = DECOY_HASH.get_or_init(|| hash_raw("decoy-password-never-matches").ok());
    if let Some(hash) = decoy {
        let _matched = hash.verify(candidate);
    }
}

/// Validated login credentials.
///
/// ## Invariants
/// - `email` is normalised the same way as at signup.
/// - `password` is non-empty but otherwise unchecked, so old accounts with
///   shorter passwords can still log in.
#[derive(Debug, Clone)]
pub struct LoginCredentials {
    email: Email,
    password: Zeroizing<String>,
}

/// Domain error returned when login payload values are invalid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoginValidationError {
    /// Email was malformed.
    #[error("email address is not valid")]
    InvalidEmail,
    /// Password was blank.
    #[error("password must not be empty")]
    EmptyPassword,
}

impl LoginCredentials {
    /// Construct credentials from raw inputs.
    ///
    /// # Examples
    /// ```
    /// use backend::domain::LoginCredentials;
    ///
    /// let creds = LoginCredentials::try_from_parts("Ada@Example.com", "secret").unwrap();
    /// assert_eq!(creds.email().as_str(), "ada@example.com");
    /// ```
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, LoginValidationError> {
        let email = Email::new(email).map_err(|_| LoginValidationError::InvalidEmail)?;
        if password.is_empty() {
            return Err(LoginValidationError::EmptyPassword);
        }
        Ok(Self {
            email,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}
