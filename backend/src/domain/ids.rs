//! UUID-backed identifier newtypes for entries, comments and mail.
//!
//! [`UserId`](crate::domain::UserId) lives beside the user model; the
//! remaining aggregates share this macro so they cannot be mixed up.

/// Raised when a path or body value is not a UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("identifier must be a valid UUID")]
pub struct InvalidId;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
            ::serde::Serialize, ::serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(::uuid::Uuid);

        impl $name {
            /// Generate a fresh random identifier.
            #[must_use]
            pub fn random() -> Self {
                Self(::uuid::Uuid::new_v4())
            }

            /// Wrap an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: ::uuid::Uuid) -> Self {
                Self(uuid)
            }

            /// Access the underlying UUID.
            #[must_use]
            pub const fn as_uuid(&self) -> &::uuid::Uuid {
                &self.0
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                ::std::fmt::Display::fmt(&self.0, f)
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::domain::InvalidId;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                if s.trim() != s {
                    return Err($crate::domain::InvalidId);
                }
                ::uuid::Uuid::parse_str(s)
                    .map(Self)
                    .map_err(|_| $crate::domain::InvalidId)
            }
        }

        impl From<::uuid::Uuid> for $name {
            fn from(value: ::uuid::Uuid) -> Self {
                Self(value)
            }
        }
    };
}

pub(crate) use uuid_id;

uuid_id!(
    /// Identifier of a journal or story entry.
    JournalId
);
uuid_id!(
    /// Identifier of a comment.
    CommentId
);
uuid_id!(
    /// Identifier of a mail message.
    MailId
);
