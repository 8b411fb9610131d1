//! The active session: which user, if any, is signed in.
//!
//! Callers own a [`Session`] and pass it to every operation that reads or
//! changes the signed-in user. The snapshot is mirrored to the
//! `currentUser` document so a restarted process can pick it up again.

use tracing::{debug, info};

use super::Error;
use super::ports::StorageKey;
use super::record_store::RecordStore;
use super::user::{User, UserRecord};

/// Signed-in user snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    active: Option<User>,
}

impl Session {
    /// A session with nobody signed in.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Rehydrate from the persisted `currentUser` document.
    ///
    /// The snapshot is refreshed from the `users` collection so relationship
    /// changes made by other users since it was written are visible. A
    /// snapshot whose user no longer exists is discarded.
    pub fn restore(store: &RecordStore) -> Result<Self, Error> {
        let Some(snapshot) = store.get_document::<User>(StorageKey::CurrentUser)? else {
            debug!("no persisted session");
            return Ok(Self::anonymous());
        };
        let stored = store.find_by_id::<UserRecord>(snapshot.id())?;
        let mut session = Self::anonymous();
        match stored {
            Some(record) => {
                info!(user_id = %snapshot.id(), "restored session");
                session.establish(store, record.into_user())?;
            }
            None => {
                info!(user_id = %snapshot.id(), "discarding session for unknown user");
                store.remove_document(StorageKey::CurrentUser)?;
            }
        }
        Ok(session)
    }

    /// The signed-in user, if any.
    pub fn active(&self) -> Option<&User> {
        self.active.as_ref()
    }

    /// Return `true` when someone is signed in.
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Return `true` when `user` is the signed-in user.
    pub(crate) fn is_user(&self, user: &User) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| active.id() == user.id())
    }

    pub(crate) fn establish(&mut self, store: &RecordStore, user: User) -> Result<(), Error> {
        store.put_document(StorageKey::CurrentUser, &user)?;
        self.active = Some(user);
        Ok(())
    }

    pub(crate) fn end(&mut self, store: &RecordStore) -> Result<(), Error> {
        store.remove_document(StorageKey::CurrentUser)?;
        self.active = None;
        Ok(())
    }

    /// Replace the snapshot with `user` when it is the signed-in user.
    pub(crate) fn refresh(&mut self, store: &RecordStore, user: &User) -> Result<(), Error> {
        if self.is_user(user) {
            self.establish(store, user.clone())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use std::sync::Arc;

    use super::*;
    use crate::domain::ids::UserId;
    use crate::domain::user::Username;
    use crate::outbound::persistence::InMemoryMedium;
    use chrono::Utc;
    use rstest::{fixture, rstest};

    #[fixture]
    fn store() -> RecordStore {
        RecordStore::new(Arc::new(InMemoryMedium::default()))
    }

    fn user(username: &str) -> User {
        User::new(
            UserId::random(),
            Username::new(username).expect("valid username"),
            "Someone",
            Utc::now(),
        )
    }

    #[rstest]
    fn restore_without_snapshot_is_anonymous(store: RecordStore) {
        let session = Session::restore(&store).expect("restore");
        assert!(!session.is_active());
    }

    #[rstest]
    fn restore_refreshes_from_users_collection(store: RecordStore) {
        let stale = user("alice");
        let mut fresh = stale.clone();
        fresh.set_bio("updated elsewhere");
        store
            .put_document(StorageKey::CurrentUser, &stale)
            .expect("seed snapshot");
        store
            .put_all(&[UserRecord::new(fresh.clone(), "pw")])
            .expect("seed users");

        let session = Session::restore(&store).expect("restore");
        assert_eq!(session.active(), Some(&fresh));
        let persisted: Option<User> = store
            .get_document(StorageKey::CurrentUser)
            .expect("read snapshot");
        assert_eq!(persisted, Some(fresh));
    }

    #[rstest]
    fn restore_discards_unknown_user(store: RecordStore) {
        store
            .put_document(StorageKey::CurrentUser, &user("ghost"))
            .expect("seed snapshot");
        let session = Session::restore(&store).expect("restore");
        assert!(!session.is_active());
        let persisted: Option<User> = store
            .get_document(StorageKey::CurrentUser)
            .expect("read snapshot");
        assert!(persisted.is_none());
    }

    #[rstest]
    fn refresh_ignores_other_users(store: RecordStore) {
        let alice = user("alice");
        let bob = user("bob");
        let mut session = Session::anonymous();
        session.establish(&store, alice.clone()).expect("sign in");
        session.refresh(&store, &bob).expect("refresh");
        assert_eq!(session.active(), Some(&alice));
    }
}
