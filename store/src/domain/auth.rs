//! Credential payloads for login and registration.
//!
//! Constructors validate raw string input before the identity service
//! touches the store. Passwords are held in [`Zeroizing`] buffers while in
//! flight.

use std::fmt;

use zeroize::Zeroizing;

use super::user::{Username, UsernameValidationError};

/// Domain error returned when login payload values are invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginValidationError {
    /// Username was missing or blank.
    EmptyUsername,
    /// Password was blank.
    EmptyPassword,
}

impl fmt::Display for LoginValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyUsername => write!(f, "username must not be empty"),
            Self::EmptyPassword => write!(f, "password must not be empty"),
        }
    }
}

impl std::error::Error for LoginValidationError {}

/// Validated login credentials.
///
/// ## Invariants
/// - `username` is non-empty. It is matched exactly, so no trimming
///   happens here.
/// - `password` is non-empty and keeps caller-provided whitespace.
///
/// # Examples
/// ```
/// use causeway_store::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts("alice", "secret").unwrap();
/// assert_eq!(creds.username(), "alice");
/// assert_eq!(creds.password(), "secret");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    username: String,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw username/password inputs.
    pub fn try_from_parts(username: &str, password: &str) -> Result<Self, LoginValidationError> {
        if username.trim().is_empty() {
            return Err(LoginValidationError::EmptyUsername);
        }
        if password.is_empty() {
            return Err(LoginValidationError::EmptyPassword);
        }

        Ok(Self {
            username: username.to_owned(),
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Username string suitable for user lookups.
    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    /// Password string provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Domain error returned when a registration payload is invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationValidationError {
    /// The username failed validation.
    Username(UsernameValidationError),
    /// The display name was blank.
    EmptyName,
    /// The password was blank.
    EmptyPassword,
}

impl fmt::Display for RegistrationValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Username(inner) => inner.fmt(f),
            Self::EmptyName => write!(f, "name must not be empty"),
            Self::EmptyPassword => write!(f, "password must not be empty"),
        }
    }
}

impl std::error::Error for RegistrationValidationError {}

impl From<UsernameValidationError> for RegistrationValidationError {
    fn from(value: UsernameValidationError) -> Self {
        Self::Username(value)
    }
}

/// Validated sign-up request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    username: Username,
    name: String,
    password: Zeroizing<String>,
}

impl Registration {
    /// Validate raw sign-up inputs. The display name is trimmed.
    pub fn try_from_parts(
        username: &str,
        name: &str,
        password: &str,
    ) -> Result<Self, RegistrationValidationError> {
        let username = Username::new(username)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(RegistrationValidationError::EmptyName);
        }
        if password.is_empty() {
            return Err(RegistrationValidationError::EmptyPassword);
        }
        Ok(Self {
            username,
            name: name.to_owned(),
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Requested username.
    pub fn username(&self) -> &Username {
        &self.username
    }

    /// Display name.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Chosen password.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}
