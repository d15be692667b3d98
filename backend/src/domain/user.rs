//! User data model.
//!
//! Each profile field is a validated newtype so services and adapters never
//! see an out-of-range nickname, age or bio.

use std::fmt;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::auth::PasswordHash;
use super::ids::uuid_id;

uuid_id!(
    /// Stable user identifier stored as a UUID.
    UserId
);

/// Validation errors raised while building user profile values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    #[error("nickname must not be empty")]
    EmptyNickname,
    #[error("nickname must be at least {min} characters")]
    NicknameTooShort { min: usize },
    #[error("nickname must be at most {max} characters")]
    NicknameTooLong { max: usize },
    #[error("nickname may only contain letters, numbers, spaces, or underscores")]
    NicknameInvalidCharacters,
    #[error("email address is not valid")]
    InvalidEmail,
    #[error("password must be at least {min} characters")]
    PasswordTooShort { min: usize },
    #[error("age must be between {min} and {max}")]
    AgeOutOfRange { min: u8, max: u8 },
    #[error("gender must be at most {max} characters")]
    GenderTooLong { max: usize },
    #[error("bio must be at most {max} characters")]
    BioTooLong { max: usize },
    #[error("profile theme must be a JSON object")]
    ProfileThemeNotObject,
}

impl UserValidationError {
    /// Request field the error refers to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::EmptyNickname
            | Self::NicknameTooShort { .. }
            | Self::NicknameTooLong { .. }
            | Self::NicknameInvalidCharacters => "nickname",
            Self::InvalidEmail => "email",
            Self::PasswordTooShort { .. } => "password",
            Self::AgeOutOfRange { .. } => "age",
            Self::GenderTooLong { .. } => "gender",
            Self::BioTooLong { .. } => "bio",
            Self::ProfileThemeNotObject => "profileTheme",
        }
    }
}

/// Minimum allowed length for a nickname.
pub const NICKNAME_MIN: usize = 3;
/// Maximum allowed length for a nickname.
pub const NICKNAME_MAX: usize = 32;
/// Youngest permitted age.
pub const AGE_MIN: u8 = 13;
/// Oldest permitted age.
pub const AGE_MAX: u8 = 120;
/// Maximum length of the free-text gender field.
pub const GENDER_MAX: usize = 32;
/// Maximum length of a profile bio.
pub const BIO_MAX: usize = 500;

static NICKNAME_RE: OnceLock<Regex> = OnceLock::new();

fn nickname_regex() -> &'static Regex {
    NICKNAME_RE.get_or_init(|| {
        // Length is enforced separately; this regex constrains allowed characters.
        Regex::new("^[A-Za-z0-9_ ]+$")
            .unwrap_or_else(|error| panic!("nickname regex failed to compile: {error}"))
    })
}

/// Private nickname chosen at signup. Never shown on public surfaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Nickname(String);

impl Nickname {
    /// Validate and construct a [`Nickname`].
    ///
    /// # Examples
    /// ```
    /// use backend::domain::Nickname;
    ///
    /// assert!(Nickname::new("Ada Lovelace").is_ok());
    /// assert!(Nickname::new("x!").is_err());
    /// ```
    pub fn new(value: impl Into<String>) -> Result<Self, UserValidationError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(UserValidationError::EmptyNickname);
        }
        let length = value.chars().count();
        if length < NICKNAME_MIN {
            return Err(UserValidationError::NicknameTooShort { min: NICKNAME_MIN });
        }
        if length > NICKNAME_MAX {
            return Err(UserValidationError::NicknameTooLong { max: NICKNAME_MAX });
        }
        if !nickname_regex().is_match(&value) {
            return Err(UserValidationError::NicknameInvalidCharacters);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Nickname {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Nickname> for String {
    fn from(value: Nickname) -> Self {
        value.0
    }
}

/// Login email, stored trimmed and lowercased so lookups are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Normalise and validate an email address.
    ///
    /// Exactly one `@` with non-empty local and domain parts is required.
    pub fn new(value: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let normalised = value.as_ref().trim().to_lowercase();
        let mut parts = normalised.split('@');
        let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(UserValidationError::InvalidEmail);
        };
        if local.is_empty() || domain.is_empty() || normalised.chars().any(char::is_whitespace) {
            return Err(UserValidationError::InvalidEmail);
        }
        Ok(Self(normalised))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Email {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Self-reported age in years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Age(u8);

impl Age {
    pub fn new(value: u8) -> Result<Self, UserValidationError> {
        if !(AGE_MIN..=AGE_MAX).contains(&value) {
            return Err(UserValidationError::AgeOutOfRange {
                min: AGE_MIN,
                max: AGE_MAX,
            });
        }
        Ok(Self(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Age {
    type Error = UserValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Age> for u8 {
    fn from(value: Age) -> Self {
        value.0
    }
}

/// Free-text gender, trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Gender(String);

impl Gender {
    pub fn new(value: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let trimmed = value.as_ref().trim();
        if trimmed.chars().count() > GENDER_MAX {
            return Err(UserValidationError::GenderTooLong { max: GENDER_MAX });
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Gender {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Gender> for String {
    fn from(value: Gender) -> Self {
        value.0
    }
}

/// Public profile blurb.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Bio(String);

impl Bio {
    pub fn new(value: impl Into<String>) -> Result<Self, UserValidationError> {
        let value = value.into();
        if value.chars().count() > BIO_MAX {
            return Err(UserValidationError::BioTooLong { max: BIO_MAX });
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Bio {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Bio> for String {
    fn from(value: Bio) -> Self {
        value.0
    }
}

/// Opaque avatar/theme descriptor owned by the frontend.
///
/// The backend only requires a JSON object; the contents are passed through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct ProfileTheme(Value);

impl ProfileTheme {
    pub fn new(value: Value) -> Result<Self, UserValidationError> {
        if !value.is_object() {
            return Err(UserValidationError::ProfileThemeNotObject);
        }
        Ok(Self(value))
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl Default for ProfileTheme {
    fn default() -> Self {
        Self(Value::Object(serde_json::Map::new()))
    }
}

impl TryFrom<Value> for ProfileTheme {
    type Error = UserValidationError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ProfileTheme> for Value {
    fn from(value: ProfileTheme) -> Self {
        value.0
    }
}

/// Application user.
///
/// ## Invariants
/// - `email` is unique across users.
/// - `anonymous_name` is derived once at signup and never changes.
/// - Follower counts are derived from subscription edges, never stored here.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: UserId,
    pub nickname: Nickname,
    pub email: Email,
    pub password_hash: PasswordHash,
    pub age: Option<Age>,
    pub gender: Option<Gender>,
    pub anonymous_name: String,
    pub profile_theme: ProfileTheme,
    pub coins: i64,
    pub bio: Bio,
    pub last_notification_check: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Partial profile update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileUpdate {
    pub bio: Option<Bio>,
    pub profile_theme: Option<ProfileTheme>,
    pub age: Option<Age>,
    pub gender: Option<Gender>,
}

impl ProfileUpdate {
    /// Apply the update to `user` in place.
    pub fn apply(self, user: &mut User) {
        if let Some(bio) = self.bio {
            user.bio = bio;
        }
        if let Some(theme) = self.profile_theme {
            user.profile_theme = theme;
        }
        if let Some(age) = self.age {
            user.age = Some(age);
        }
        if let Some(gender) = self.gender {
            user.gender = Some(gender);
        }
    }
}

/// Profile visible to other users. Carries no nickname or email.
#[derive(Debug, Clone, PartialEq)]
pub struct PublicProfile {
    pub user_id: UserId,
    pub anonymous_name: String,
    pub bio: Bio,
    pub profile_theme: ProfileTheme,
    pub subscriber_count: u64,
    pub is_subscribed: bool,
}

/// Minimal public card used in follower lists.
#[derive(Debug, Clone, PartialEq)]
pub struct UserSummary {
    pub user_id: UserId,
    pub anonymous_name: String,
    pub profile_theme: ProfileTheme,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            anonymous_name: user.anonymous_name.clone(),
            profile_theme: user.profile_theme.clone(),
        }
    }
}

/// Profile returned to the account owner.
#[derive(Debug, Clone, PartialEq)]
pub struct PrivateProfile {
    pub user: User,
    pub subscriber_count: u64,
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;
    use crate::domain::InvalidId;
    use serde_json::json;

    #[rstest]
    #[case("", UserValidationError::EmptyNickname)]
    #[case("ab", UserValidationError::NicknameTooShort { min: NICKNAME_MIN })]
    #[case("bad-name", UserValidationError::NicknameInvalidCharacters)]
    fn nickname_rejects_invalid_values(#[case] raw: &str, #[case] expected: UserValidationError) {
        assert_eq!(Nickname::new(raw), Err(expected));
    }

    #[rstest]
    fn nickname_rejects_long_values() {
        let raw = "a".repeat(NICKNAME_MAX + 1);
        assert_eq!(
            Nickname::new(raw),
            Err(UserValidationError::NicknameTooLong { max: NICKNAME_MAX })
        );
    }

    #[rstest]
    #[case("  Writer@Example.COM ", "writer@example.com")]
    #[case("a@b", "a@b")]
    fn email_is_normalised(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(Email::new(raw).expect("valid email").as_str(), expected);
    }

    #[rstest]
    #[case("no-at-sign")]
    #[case("@example.com")]
    #[case("writer@")]
    #[case("a@b@c")]
    #[case("a b@c")]
    fn email_rejects_malformed_values(#[case] raw: &str) {
        assert_eq!(Email::new(raw), Err(UserValidationError::InvalidEmail));
    }

    #[rstest]
    #[case(12, false)]
    #[case(13, true)]
    #[case(120, true)]
    #[case(121, false)]
    fn age_bounds(#[case] raw: u8, #[case] valid: bool) {
        assert_eq!(Age::new(raw).is_ok(), valid);
    }

    #[rstest]
    fn bio_rejects_long_values() {
        let raw = "b".repeat(BIO_MAX + 1);
        assert_eq!(
            Bio::new(raw),
            Err(UserValidationError::BioTooLong { max: BIO_MAX })
        );
    }

    #[rstest]
    fn profile_theme_requires_object() {
        assert!(ProfileTheme::new(json!({ "hue": 200 })).is_ok());
        assert_eq!(
            ProfileTheme::new(json!([1, 2])),
            Err(UserValidationError::ProfileThemeNotObject)
        );
    }

    #[rstest]
    fn user_id_parses_uuid_strings() {
        let id = UserId::random();
        let parsed: UserId = id.to_string().parse().expect("round trip");
        assert_eq!(parsed, id);
        assert_eq!("nope".parse::<UserId>(), Err(InvalidId));
    }

    #[rstest]
    fn validation_errors_name_their_field() {
        assert_eq!(UserValidationError::InvalidEmail.field(), "email");
        assert_eq!(
            UserValidationError::AgeOutOfRange { min: 1, max: 2 }.field(),
            "age"
        );
    }
}
