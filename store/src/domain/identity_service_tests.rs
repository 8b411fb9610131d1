//! Tests for the identity service.

use std::collections::BTreeSet;
use std::sync::Arc;

use super::*;
use crate::domain::ErrorCode;
use crate::domain::ports::{StorageKey, StorageMedium};
use crate::test_support::{MutableClock, fixture_timestamp, in_memory_store};
use rstest::{fixture, rstest};

struct Harness {
    store: Arc<RecordStore>,
    service: IdentityService,
}

#[fixture]
fn harness() -> Harness {
    let store = in_memory_store();
    let clock = Arc::new(MutableClock::new(fixture_timestamp()));
    let service = IdentityService::new(Arc::clone(&store), clock);
    Harness { store, service }
}

fn stored_users(harness: &Harness) -> Vec<UserRecord> {
    harness.store.get_all().expect("read users")
}

#[rstest]
fn register_persists_and_signs_in(harness: Harness) {
    let mut session = Session::anonymous();
    let user = harness
        .service
        .register(&mut session, "alice", "Alice Walker", "pw")
        .expect("register");

    assert_eq!(session.active(), Some(&user));
    assert_eq!(user.created_at(), Some(fixture_timestamp()));
    let users = stored_users(&harness);
    assert_eq!(users.len(), 1);
    let snapshot: Option<User> = harness
        .store
        .get_document(StorageKey::CurrentUser)
        .expect("read snapshot");
    assert_eq!(snapshot, Some(user));
}

#[rstest]
fn snapshot_never_contains_password(harness: Harness) {
    let mut session = Session::anonymous();
    harness
        .service
        .register(&mut session, "alice", "Alice", "hunter2")
        .expect("register");
    let raw = harness
        .store
        .medium()
        .read(StorageKey::CurrentUser)
        .expect("read raw")
        .expect("snapshot written");
    assert!(!raw.contains("hunter2"));
}

#[rstest]
fn duplicate_username_appends_nothing(harness: Harness) {
    let mut session = Session::anonymous();
    harness
        .service
        .register(&mut session, "alice", "Alice", "pw")
        .expect("first registration");
    let mut other = Session::anonymous();
    let error = harness
        .service
        .register(&mut other, "alice", "Another Alice", "pw2")
        .expect_err("duplicate must fail");

    assert_eq!(error.code(), ErrorCode::AlreadyExists);
    assert_eq!(stored_users(&harness).len(), 1);
    assert!(!other.is_active());
}

#[rstest]
fn usernames_are_case_sensitive(harness: Harness) {
    let mut session = Session::anonymous();
    harness
        .service
        .register(&mut session, "alice", "Alice", "pw")
        .expect("register alice");
    harness
        .service
        .register(&mut session, "Alice", "Other Alice", "pw")
        .expect("register Alice");
    assert_eq!(stored_users(&harness).len(), 2);
}

#[rstest]
#[case("alice-smith")]
#[case("Ana María")]
#[case("o'brien")]
fn register_accepts_any_non_blank_username(harness: Harness, #[case] username: &str) {
    let mut session = Session::anonymous();
    let user = harness
        .service
        .register(&mut session, username, "Someone", "pw")
        .expect("register");

    assert_eq!(user.username().as_ref(), username);
    let users = stored_users(&harness);
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].user().username().as_ref(), username);
    assert!(
        harness
            .service
            .find_by_username(username)
            .expect("lookup")
            .is_some()
    );
}

#[rstest]
#[case("", "Alice", "pw")]
#[case("   ", "Alice", "pw")]
#[case("alice", " ", "pw")]
#[case("alice", "Alice", "")]
fn register_rejects_invalid_input(
    harness: Harness,
    #[case] username: &str,
    #[case] name: &str,
    #[case] password: &str,
) {
    let mut session = Session::anonymous();
    let error = harness
        .service
        .register(&mut session, username, name, password)
        .expect_err("invalid input");
    assert_eq!(error.code(), ErrorCode::InvalidRequest);
    assert!(stored_users(&harness).is_empty());
}

#[rstest]
fn login_requires_exact_match(harness: Harness) {
    let mut session = Session::anonymous();
    harness
        .service
        .register(&mut session, "alice", "Alice", "pw")
        .expect("register");
    harness.service.logout(&mut session).expect("logout");
    assert!(!session.is_active());

    let error = harness
        .service
        .login(&mut session, "alice", "PW")
        .expect_err("wrong password");
    assert_eq!(error.code(), ErrorCode::InvalidCredentials);
    assert!(!session.is_active());

    let user = harness
        .service
        .login(&mut session, "alice", "pw")
        .expect("login");
    assert_eq!(session.active(), Some(&user));
}

#[rstest]
fn logout_removes_persisted_snapshot(harness: Harness) {
    let mut session = Session::anonymous();
    harness
        .service
        .register(&mut session, "alice", "Alice", "pw")
        .expect("register");
    harness.service.logout(&mut session).expect("logout");
    let snapshot: Option<User> = harness
        .store
        .get_document(StorageKey::CurrentUser)
        .expect("read snapshot");
    assert!(snapshot.is_none());
}

#[rstest]
fn update_profile_without_session_is_a_no_op(harness: Harness) {
    let mut session = Session::anonymous();
    let result = harness
        .service
        .update_profile(
            &mut session,
            ProfileUpdate {
                bio: Some("hello".to_owned()),
                ..ProfileUpdate::default()
            },
        )
        .expect("no-op succeeds");
    assert!(result.is_none());
    assert!(stored_users(&harness).is_empty());
}

#[rstest]
fn update_profile_merges_into_store_and_session(harness: Harness) {
    let mut session = Session::anonymous();
    harness
        .service
        .register(&mut session, "alice", "Alice", "pw")
        .expect("register");
    let interests: BTreeSet<String> = ["ocean".to_owned()].into_iter().collect();
    let updated = harness
        .service
        .update_profile(
            &mut session,
            ProfileUpdate {
                bio: Some("Sea lover".to_owned()),
                interests: Some(interests.clone()),
                ..ProfileUpdate::default()
            },
        )
        .expect("update")
        .expect("session active");

    assert_eq!(updated.bio(), "Sea lover");
    assert_eq!(updated.name(), "Alice");
    assert_eq!(updated.interests(), &interests);
    assert_eq!(session.active(), Some(&updated));
    let stored = harness
        .service
        .find_by_username("alice")
        .expect("lookup")
        .expect("stored user");
    assert_eq!(stored, updated);
}

#[rstest]
fn username_change_cannot_collide(harness: Harness) {
    let mut bob_session = Session::anonymous();
    harness
        .service
        .register(&mut bob_session, "bob", "Bob", "pw")
        .expect("register bob");
    let mut session = Session::anonymous();
    harness
        .service
        .register(&mut session, "alice", "Alice", "pw")
        .expect("register alice");

    let error = harness
        .service
        .update_profile(
            &mut session,
            ProfileUpdate {
                username: Some("bob".to_owned()),
                ..ProfileUpdate::default()
            },
        )
        .expect_err("collision");
    assert_eq!(error.code(), ErrorCode::AlreadyExists);
    assert_eq!(
        session.active().map(|user| user.username().to_string()),
        Some("alice".to_owned())
    );
}

#[rstest]
fn update_settings_is_shallow(harness: Harness) {
    let mut session = Session::anonymous();
    harness
        .service
        .register(&mut session, "alice", "Alice", "pw")
        .expect("register");
    let updated = harness
        .service
        .update_settings(
            &mut session,
            SettingsUpdate {
                theme: Some("ocean".to_owned()),
                ..SettingsUpdate::default()
            },
        )
        .expect("update")
        .expect("session active");
    assert_eq!(updated.settings().theme, "ocean");
    assert_eq!(updated.settings().language, "en");
}

#[rstest]
#[case("123456", true)]
#[case("12345", false)]
#[case("12345a", false)]
fn verify_email_accepts_six_digits(harness: Harness, #[case] code: &str, #[case] ok: bool) {
    let mut session = Session::anonymous();
    harness
        .service
        .register(&mut session, "alice", "Alice", "pw")
        .expect("register");
    let result = harness.service.verify_email(&mut session, code);
    assert_eq!(result.is_ok(), ok);
    let verified = session.active().is_some_and(User::email_verified);
    assert_eq!(verified, ok);
}

#[rstest]
fn complete_tutorial_sets_flag(harness: Harness) {
    let mut session = Session::anonymous();
    harness
        .service
        .register(&mut session, "alice", "Alice", "pw")
        .expect("register");
    let user = harness
        .service
        .complete_tutorial(&mut session)
        .expect("complete")
        .expect("session active");
    assert!(user.completed_tutorial());
}

#[rstest]
fn mutate_user_refreshes_session_for_active_user(harness: Harness) {
    let mut session = Session::anonymous();
    let alice = harness
        .service
        .register(&mut session, "alice", "Alice", "pw")
        .expect("register");
    let updated = harness
        .service
        .mutate_user(&mut session, alice.id(), |user| {
            user.set_avatar("https://example.test/new.png");
        })
        .expect("mutate");
    assert_eq!(updated.avatar(), "https://example.test/new.png");
    assert_eq!(session.active(), Some(&updated));
}

#[rstest]
fn mutate_unknown_user_is_not_found(harness: Harness) {
    let mut session = Session::anonymous();
    let error = harness
        .service
        .mutate_user(&mut session, &UserId::random(), |user| user.set_bio("x"))
        .expect_err("unknown user");
    assert_eq!(error.code(), ErrorCode::NotFound);
}
