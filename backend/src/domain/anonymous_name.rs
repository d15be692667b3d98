//! Deterministic pseudonyms shown instead of nicknames.
//!
//! The name is a pure function of the nickname and the stored password hash,
//! so it is stable for the lifetime of an account and cannot be reversed into
//! the nickname without the salted hash.

use sha2::{Digest, Sha256};

use super::auth::PasswordHash;
use super::user::Nickname;

const ADJECTIVES: [&str; 32] = [
    "Quiet", "Amber", "Brave", "Calm", "Clever", "Cosmic", "Crimson", "Curious", "Dusky",
    "Eager", "Faded", "Gentle", "Golden", "Hidden", "Hollow", "Idle", "Jolly", "Lucky",
    "Misty", "Nimble", "Olive", "Pale", "Patient", "Rustic", "Silent", "Silver", "Sleepy",
    "Swift", "Velvet", "Wandering", "Wild", "Young",
];

const NOUNS: [&str; 32] = [
    "Heron", "Badger", "Birch", "Brook", "Cedar", "Comet", "Crane", "Falcon", "Fern", "Finch",
    "Fox", "Harbor", "Hare", "Lantern", "Lark", "Maple", "Meadow", "Moth", "Otter", "Owl",
    "Pebble", "Pine", "Quill", "Raven", "Reed", "River", "Sparrow", "Thistle", "Tide",
    "Willow", "Wren", "Yarrow",
];

/// Derive the public pseudonym for an account.
///
/// # Examples
/// ```
/// use backend::domain::{Nickname, PasswordHash, derive_anonymous_name};
///
/// let nickname = Nickname::new("Ada").expect("valid nickname");
/// let hash = PasswordHash::from_phc("$argon2id$v=19$example");
/// let name = derive_anonymous_name(&nickname, &hash);
/// assert_eq!(name, derive_anonymous_name(&nickname, &hash));
/// ```
pub fn derive_anonymous_name(nickname: &Nickname, password_hash: &PasswordHash) -> String {
    let mut hasher = Sha256::new();
    hasher.update(nickname.as_str().as_bytes());
    hasher.update(b":");
    hasher.update(password_hash.as_str().as_bytes());
    let digest = hasher.finalize();

    let byte = |index: usize| digest.get(index).copied().unwrap_or_default();
    let adjective = pick(&ADJECTIVES, byte(0));
    let noun = pick(&NOUNS, byte(1));
    let number = 1000 + (u16::from(byte(2)) << 8 | u16::from(byte(3))) % 9000;
    format!("{adjective}{noun}{number}")
}

fn pick(words: &[&'static str], byte: u8) -> &'static str {
    words
        .get(usize::from(byte) % words.len())
        .copied()
        .unwrap_or("Anonymous")
}
