//! UUID-backed identifiers for stored records.
//!
//! Each record kind gets its own newtype so a post id can never be passed
//! where a user id is expected. Identifiers serialise as their canonical
//! string form.

use std::fmt;

/// Validation errors returned by identifier constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdValidationError {
    /// Returned when the provided id is empty.
    Empty {
        /// Kind of identifier, e.g. `user`.
        kind: &'static str,
    },
    /// Returned when the id is not a UUID or carries whitespace padding.
    Invalid {
        /// Kind of identifier, e.g. `user`.
        kind: &'static str,
    },
}

impl fmt::Display for IdValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty { kind } => write!(f, "{kind} id must not be empty"),
            Self::Invalid { kind } => write!(f, "{kind} id must be a valid UUID"),
        }
    }
}

impl std::error::Error for IdValidationError {}

macro_rules! define_uuid_id {
    ($(#[$meta:meta])* $name:ident => $kind:literal) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize,
        )]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(::uuid::Uuid, String);

        impl $name {
            /// Validate and construct the identifier from borrowed input.
            pub fn new(id: impl AsRef<str>) -> Result<Self, IdValidationError> {
                let raw = id.as_ref();
                let parsed = Self::validate_and_parse(raw)?;
                Ok(Self(parsed, raw.to_owned()))
            }

            /// Generate a fresh random identifier.
            pub fn random() -> Self {
                Self::from_uuid(::uuid::Uuid::new_v4())
            }

            /// Construct the identifier directly from a UUID.
            pub fn from_uuid(uuid: ::uuid::Uuid) -> Self {
                Self(uuid, uuid.to_string())
            }

            /// Access the underlying UUID.
            #[rustfmt::skip]
            pub fn as_uuid(&self) -> &::uuid::Uuid { &self.0 }

            fn validate_and_parse(id: &str) -> Result<::uuid::Uuid, IdValidationError> {
                if id.is_empty() {
                    return Err(IdValidationError::Empty { kind: $kind });
                }
                if id.trim() != id {
                    return Err(IdValidationError::Invalid { kind: $kind });
                }
                ::uuid::Uuid::parse_str(id).map_err(|_| IdValidationError::Invalid { kind: $kind })
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.1.as_str()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_ref())
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                let $name(_, raw) = value;
                raw
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                let parsed = Self::validate_and_parse(&value)?;
                Ok(Self(parsed, value))
            }
        }
    };
}

define_uuid_id! {
    /// Stable user identifier.
    UserId => "user"
}

define_uuid_id! {
    /// Post identifier.
    PostId => "post"
}

define_uuid_id! {
    /// Comment identifier, unique within the whole store.
    CommentId => "comment"
}

define_uuid_id! {
    /// Notification identifier.
    NotificationId => "notification"
}

define_uuid_id! {
    /// Live stream identifier, allocated when a stream draft is prepared.
    StreamId => "stream"
}
