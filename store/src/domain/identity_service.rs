//! Identity and session domain service.
//!
//! Registration, login, logout and the profile/settings edits the signed-in
//! user makes to their own record. Every write goes to the `users`
//! collection first and is then mirrored into the [`Session`] snapshot.

use std::sync::Arc;

use mockable::Clock;
use tracing::{debug, info, warn};

use super::Error;
use super::auth::{LoginCredentials, Registration};
use super::ids::UserId;
use super::record_store::{Mutation, RecordStore};
use super::session::Session;
use super::user::{ProfileUpdate, SettingsUpdate, User, UserRecord, Username};

/// Number of digits in an email verification code.
pub const VERIFICATION_CODE_LEN: usize = 6;

/// Identity service backed by the `users` collection.
#[derive(Clone)]
pub struct IdentityService {
    store: Arc<RecordStore>,
    clock: Arc<dyn Clock>,
}

impl IdentityService {
    /// Create a new service over `store`.
    pub fn new(store: Arc<RecordStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Register a new user and sign them in.
    ///
    /// Fails with `InvalidRequest` for malformed input and `AlreadyExists`
    /// when the username is taken; in both cases nothing is written.
    pub fn register(
        &self,
        session: &mut Session,
        username: &str,
        name: &str,
        password: &str,
    ) -> Result<User, Error> {
        let registration = Registration::try_from_parts(username, name, password)
            .map_err(|err| Error::invalid_request(err.to_string()))?;

        let user = User::new(
            UserId::random(),
            registration.username().clone(),
            registration.name(),
            self.clock.utc(),
        );
        let record = UserRecord::new(user.clone(), registration.password());

        self.store.update::<UserRecord, _, Error, _>(|users| {
            if users
                .iter()
                .any(|existing| existing.user().username() == registration.username())
            {
                warn!(username = %registration.username(), "username already registered");
                return Err(Error::already_exists(format!(
                    "username {} is already taken",
                    registration.username()
                )));
            }
            users.push(record);
            Ok(Mutation::Changed(()))
        })?;

        info!(user_id = %user.id(), username = %user.username(), "registered user");
        session.establish(&self.store, user.clone())?;
        Ok(user)
    }

    /// Sign in with an exact username and password match.
    pub fn login(
        &self,
        session: &mut Session,
        username: &str,
        password: &str,
    ) -> Result<User, Error> {
        let credentials = LoginCredentials::try_from_parts(username, password)
            .map_err(|err| Error::invalid_request(err.to_string()))?;

        let record = self
            .store
            .get_all::<UserRecord>()?
            .into_iter()
            .find(|record| {
                record.user().username().as_ref() == credentials.username()
                    && record.password_matches(credentials.password())
            });

        let Some(record) = record else {
            warn!(username = credentials.username(), "login rejected");
            return Err(Error::invalid_credentials("invalid username or password"));
        };

        let user = record.into_user();
        info!(user_id = %user.id(), "signed in");
        session.establish(&self.store, user.clone())?;
        Ok(user)
    }

    /// Sign out and forget the persisted snapshot.
    pub fn logout(&self, session: &mut Session) -> Result<(), Error> {
        if let Some(user) = session.active() {
            info!(user_id = %user.id(), "signed out");
        }
        session.end(&self.store)
    }

    /// The signed-in user, if any.
    pub fn current_session(&self, session: &Session) -> Option<User> {
        session.active().cloned()
    }

    /// Merge `update` onto the signed-in user.
    ///
    /// Returns `Ok(None)` without writing when nobody is signed in.
    pub fn update_profile(
        &self,
        session: &mut Session,
        update: ProfileUpdate,
    ) -> Result<Option<User>, Error> {
        let Some(active_id) = session.active().map(|user| user.id().clone()) else {
            debug!("profile update without a session ignored");
            return Ok(None);
        };

        let ProfileUpdate {
            name,
            username,
            bio,
            avatar,
            interests,
        } = update;
        let username = username
            .map(Username::new)
            .transpose()
            .map_err(|err| Error::invalid_request(err.to_string()))?;
        if name.as_ref().is_some_and(|value| value.trim().is_empty()) {
            return Err(Error::invalid_request("name must not be empty"));
        }

        let updated = self.store.update::<UserRecord, _, Error, _>(|users| {
            if let Some(wanted) = &username {
                let taken = users
                    .iter()
                    .any(|other| other.user().username() == wanted && other.user().id() != &active_id);
                if taken {
                    warn!(username = %wanted, "username already registered");
                    return Err(Error::already_exists(format!(
                        "username {wanted} is already taken"
                    )));
                }
            }

            let user = find_user_mut(users, &active_id)?;
            if let Some(name) = name {
                user.set_name(name);
            }
            if let Some(username) = username {
                user.set_username(username);
            }
            if let Some(bio) = bio {
                user.set_bio(bio);
            }
            if let Some(avatar) = avatar {
                user.set_avatar(avatar);
            }
            if let Some(interests) = interests {
                user.set_interests(interests);
            }
            Ok(Mutation::Changed(user.clone()))
        })?;

        info!(user_id = %active_id, "updated profile");
        session.establish(&self.store, updated.clone())?;
        Ok(Some(updated))
    }

    /// Merge `update` onto the signed-in user's settings.
    ///
    /// Returns `Ok(None)` without writing when nobody is signed in.
    pub fn update_settings(
        &self,
        session: &mut Session,
        update: SettingsUpdate,
    ) -> Result<Option<User>, Error> {
        self.modify_active(session, "updated settings", |user| {
            user.settings_mut().apply(update);
            Ok(())
        })
    }

    /// Record that the signed-in user finished onboarding.
    pub fn complete_tutorial(&self, session: &mut Session) -> Result<Option<User>, Error> {
        self.modify_active(session, "completed tutorial", |user| {
            user.mark_tutorial_completed();
            Ok(())
        })
    }

    /// Accept any six-digit code and mark the signed-in user's email as
    /// verified.
    pub fn verify_email(&self, session: &mut Session, code: &str) -> Result<Option<User>, Error> {
        if !is_verification_code(code) {
            return Err(Error::invalid_request(format!(
                "verification code must be {VERIFICATION_CODE_LEN} digits"
            )));
        }
        self.modify_active(session, "verified email", |user| {
            user.mark_email_verified();
            Ok(())
        })
    }

    /// Apply `f` to the stored user `id` and refresh the session when it is
    /// the signed-in user.
    ///
    /// `f` only sees the public profile setters of [`User`]; relationship
    /// sets cannot be changed through this path.
    pub fn mutate_user<F>(&self, session: &mut Session, id: &UserId, f: F) -> Result<User, Error>
    where
        F: FnOnce(&mut User),
    {
        let updated = self.store.update::<UserRecord, _, Error, _>(|users| {
            let user = find_user_mut(users, id)?;
            f(user);
            Ok(Mutation::Changed(user.clone()))
        })?;
        debug!(user_id = %id, "mutated user");
        session.refresh(&self.store, &updated)?;
        Ok(updated)
    }

    /// Look up a user by id.
    pub fn find_user(&self, id: &UserId) -> Result<Option<User>, Error> {
        Ok(self
            .store
            .find_by_id::<UserRecord>(id)?
            .map(UserRecord::into_user))
    }

    /// Look up a user by exact username.
    pub fn find_by_username(&self, username: &str) -> Result<Option<User>, Error> {
        Ok(self
            .store
            .get_all::<UserRecord>()?
            .into_iter()
            .map(UserRecord::into_user)
            .find(|user| user.username().as_ref() == username))
    }

    /// Every registered user, in registration order.
    pub fn list_users(&self) -> Result<Vec<User>, Error> {
        Ok(self
            .store
            .get_all::<UserRecord>()?
            .into_iter()
            .map(UserRecord::into_user)
            .collect())
    }

    fn modify_active<F>(
        &self,
        session: &mut Session,
        action: &'static str,
        f: F,
    ) -> Result<Option<User>, Error>
    where
        F: FnOnce(&mut User) -> Result<(), Error>,
    {
        let Some(active_id) = session.active().map(|user| user.id().clone()) else {
            debug!(action = action, "ignored without a session");
            return Ok(None);
        };
        let updated = self.store.update::<UserRecord, _, Error, _>(|users| {
            let user = find_user_mut(users, &active_id)?;
            f(user)?;
            Ok(Mutation::Changed(user.clone()))
        })?;
        info!(user_id = %active_id, action = action, "updated user");
        session.establish(&self.store, updated.clone())?;
        Ok(Some(updated))
    }
}

pub(crate) fn find_user_mut<'a>(
    users: &'a mut [UserRecord],
    id: &UserId,
) -> Result<&'a mut User, Error> {
    users
        .iter_mut()
        .find(|record| record.user().id() == id)
        .map(UserRecord::user_mut)
        .ok_or_else(|| Error::not_found(format!("user {id} not found")))
}

fn is_verification_code(code: &str) -> bool {
    code.len() == VERIFICATION_CODE_LEN && code.bytes().all(|byte| byte.is_ascii_digit())
}

#[cfg(test)]
#[path = "identity_service_tests.rs"]
mod tests;
