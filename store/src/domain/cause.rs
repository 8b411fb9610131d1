//! Static catalogue of causes that posts, streams and follows refer to.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::slug::is_valid_slug;

/// Validation errors returned by [`CauseId::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CauseIdValidationError {
    /// The id was empty.
    Empty,
    /// The id was not a lowercase slug.
    InvalidSlug,
}

impl fmt::Display for CauseIdValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "cause id must not be empty"),
            Self::InvalidSlug => write!(
                f,
                "cause id must contain only lowercase letters, digits, or hyphens",
            ),
        }
    }
}

impl std::error::Error for CauseIdValidationError {}

/// Slug identifying a cause, e.g. `climate`.
///
/// A well-formed id is not necessarily a catalogued one; use
/// [`find_cause`] to check membership.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CauseId(String);

impl CauseId {
    /// Id of the catch-all cause that every home feed includes.
    pub const GENERAL: &'static str = "general";

    /// Validate and construct a [`CauseId`].
    pub fn new(id: impl Into<String>) -> Result<Self, CauseIdValidationError> {
        Self::from_owned(id.into())
    }

    fn from_owned(id: String) -> Result<Self, CauseIdValidationError> {
        if id.is_empty() {
            return Err(CauseIdValidationError::Empty);
        }
        if !is_valid_slug(&id) {
            return Err(CauseIdValidationError::InvalidSlug);
        }
        Ok(Self(id))
    }

    /// The `general` cause id.
    pub fn general() -> Self {
        Self(Self::GENERAL.to_owned())
    }
}

impl AsRef<str> for CauseId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for CauseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<CauseId> for String {
    fn from(value: CauseId) -> Self {
        value.0
    }
}

impl TryFrom<String> for CauseId {
    type Error = CauseIdValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Catalogue entry describing one cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cause {
    id: &'static str,
    name: &'static str,
    icon: &'static str,
    color: &'static str,
    description: &'static str,
}

impl Cause {
    /// Slug identifier.
    pub fn id(&self) -> &'static str {
        self.id
    }

    /// Display name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Icon glyph shown next to the name.
    pub fn icon(&self) -> &'static str {
        self.icon
    }

    /// Accent colour as a CSS hex string.
    pub fn color(&self) -> &'static str {
        self.color
    }

    /// One-line description.
    pub fn description(&self) -> &'static str {
        self.description
    }

    /// Typed id for this entry.
    pub fn cause_id(&self) -> CauseId {
        CauseId(self.id.to_owned())
    }
}

const fn cause(
    id: &'static str,
    name: &'static str,
    icon: &'static str,
    color: &'static str,
    description: &'static str,
) -> Cause {
    Cause {
        id,
        name,
        icon,
        color,
        description,
    }
}

static CATALOGUE: [Cause; 10] = [
    cause(
        "climate",
        "Climate Action",
        "🌍",
        "#22c55e",
        "Fighting climate change and protecting the planet",
    ),
    cause(
        "education",
        "Education",
        "📚",
        "#3b82f6",
        "Access to quality learning for everyone",
    ),
    cause(
        "health",
        "Health",
        "🏥",
        "#ef4444",
        "Healthcare access and public health",
    ),
    cause(
        "animals",
        "Animal Welfare",
        "🐾",
        "#f59e0b",
        "Protecting animals and their habitats",
    ),
    cause(
        "equality",
        "Equality",
        "⚖️",
        "#a855f7",
        "Equal rights and opportunities for all",
    ),
    cause(
        "poverty",
        "Poverty Relief",
        "🤝",
        "#f97316",
        "Ending hunger and poverty",
    ),
    cause(
        "ocean",
        "Ocean Conservation",
        "🌊",
        "#06b6d4",
        "Clean seas and healthy marine life",
    ),
    cause(
        "mental-health",
        "Mental Health",
        "🧠",
        "#ec4899",
        "Mental health awareness and support",
    ),
    cause(
        "community",
        "Community",
        "🏘️",
        "#84cc16",
        "Local action and neighbourhood projects",
    ),
    cause(
        "general",
        "General",
        "✨",
        "#6b7280",
        "Everything else worth sharing",
    ),
];

/// Every catalogued cause, in display order.
///
/// # Examples
/// ```
/// use causeway_store::domain::list_causes;
///
/// assert!(list_causes().iter().any(|cause| cause.id() == "climate"));
/// ```
pub fn list_causes() -> &'static [Cause] {
    &CATALOGUE
}

/// Look up a catalogued cause by id.
pub fn find_cause(id: &str) -> Option<&'static Cause> {
    CATALOGUE.iter().find(|cause| cause.id == id)
}

/// Return `true` when `id` names a catalogued cause.
pub fn is_known_cause(id: &CauseId) -> bool {
    find_cause(id.as_ref()).is_some()
}
