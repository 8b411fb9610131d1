//! Behaviour tests for following users and auditing the follow graph.

use std::collections::HashMap;

use causeway_store::domain::ports::StorageKey;
use causeway_store::domain::{
    ErrorCode, FollowOutcome, NotificationKind, ReconcileReport, Session, User,
};
use causeway_store::test_support::TestApp;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::Value;

struct FollowGraphWorld {
    harness: TestApp,
    session: Session,
    users: HashMap<String, User>,
    outcome: Option<Result<FollowOutcome, ErrorCode>>,
    report: Option<ReconcileReport>,
}

impl FollowGraphWorld {
    fn user(&self, username: &str) -> User {
        let id = self
            .users
            .get(username)
            .unwrap_or_else(|| panic!("{username} should be registered"))
            .id()
            .clone();
        self.harness
            .app
            .identity()
            .find_user(&id)
            .expect("user lookup")
            .expect("user should exist")
    }

    fn follow(&mut self, actor: &str, target: &str) -> Result<FollowOutcome, ErrorCode> {
        let actor = self.user(actor);
        let target = self.user(target);
        self.harness
            .app
            .social_graph()
            .follow_user(&mut self.session, actor.id(), target.id())
            .map_err(|error| error.code())
    }
}

#[fixture]
fn world() -> FollowGraphWorld {
    FollowGraphWorld {
        harness: TestApp::new(),
        session: Session::anonymous(),
        users: HashMap::new(),
        outcome: None,
        report: None,
    }
}

#[given("registered users \"{first}\" and \"{second}\"")]
fn registered_users(world: &mut FollowGraphWorld, first: String, second: String) {
    for username in [first, second] {
        let mut session = Session::anonymous();
        let user = world
            .harness
            .app
            .identity()
            .register(&mut session, &username, &username, "pw")
            .expect("registration should succeed");
        world.users.insert(username, user);
    }
}

#[given("{actor} already follows {target}")]
fn already_follows(world: &mut FollowGraphWorld, actor: String, target: String) {
    let outcome = world.follow(&actor, &target).expect("follow should succeed");
    assert_eq!(outcome, FollowOutcome::Followed);
}

#[given("{followee} lists {follower} as a subscriber without a matching follow")]
fn half_written_edge(world: &mut FollowGraphWorld, followee: String, follower: String) {
    let follower_id = world.user(&follower).id().to_string();
    let followee_id = world.user(&followee).id().to_string();
    let medium = world.harness.app.store().medium();
    let raw = medium
        .read(StorageKey::Users)
        .expect("read users")
        .expect("users written");
    let mut users: Vec<Value> = serde_json::from_str(&raw).expect("users json");
    let entry = users
        .iter_mut()
        .find(|user| user.get("id").and_then(Value::as_str) == Some(followee_id.as_str()))
        .expect("followee stored");
    let subscribers = entry
        .get_mut("subscribers")
        .and_then(Value::as_array_mut)
        .expect("subscribers array");
    subscribers.push(Value::String(follower_id));
    let rewritten = serde_json::to_string(&users).expect("serialise users");
    medium
        .write(StorageKey::Users, &rewritten)
        .expect("write users");
}

#[when("{actor} follows {target}")]
fn follows(world: &mut FollowGraphWorld, actor: String, target: String) {
    let outcome = world.follow(&actor, &target);
    world.outcome = Some(outcome);
}

#[when("{actor} unfollows {target}")]
fn unfollows(world: &mut FollowGraphWorld, actor: String, target: String) {
    let actor = world.user(&actor);
    let target = world.user(&target);
    world
        .harness
        .app
        .social_graph()
        .unfollow_user(&mut world.session, actor.id(), target.id())
        .expect("unfollow should succeed");
}

#[when("the follow graph is reconciled")]
fn the_follow_graph_is_reconciled(world: &mut FollowGraphWorld) {
    let report = world
        .harness
        .app
        .graph_audit()
        .reconcile()
        .expect("reconcile should succeed");
    world.report = Some(report);
}

#[then("{actor} lists {target} as followed")]
fn lists_as_followed(world: &mut FollowGraphWorld, actor: String, target: String) {
    let actor = world.user(&actor);
    let target = world.user(&target);
    assert_eq!(
        actor.following_users().iter().collect::<Vec<_>>(),
        vec![target.id()]
    );
}

#[then("{followee} lists {follower} as a subscriber")]
fn lists_as_subscriber(world: &mut FollowGraphWorld, followee: String, follower: String) {
    let followee = world.user(&followee);
    let follower = world.user(&follower);
    assert_eq!(
        followee.subscribers().iter().collect::<Vec<_>>(),
        vec![follower.id()]
    );
}

#[then("{recipient} has a follow notification from {sender}")]
fn has_follow_notification(world: &mut FollowGraphWorld, recipient: String, sender: String) {
    let recipient = world.user(&recipient);
    let sender = world.user(&sender);
    let notifications = world
        .harness
        .app
        .notifications()
        .list_notifications(recipient.id())
        .expect("list notifications");
    let notification = notifications.first().expect("one notification");
    assert_eq!(notifications.len(), 1);
    assert_eq!(notification.kind(), NotificationKind::Follow);
    assert_eq!(notification.from_user_id(), sender.id());
    assert!(!notification.is_read());
}

#[then("{recipient} has {count} notification")]
fn has_notification_count(world: &mut FollowGraphWorld, recipient: String, count: usize) {
    let recipient = world.user(&recipient);
    let notifications = world
        .harness
        .app
        .notifications()
        .list_notifications(recipient.id())
        .expect("list notifications");
    assert_eq!(notifications.len(), count);
}

#[then("the follow reports an existing edge")]
fn the_follow_reports_an_existing_edge(world: &mut FollowGraphWorld) {
    assert_eq!(world.outcome, Some(Ok(FollowOutcome::AlreadyFollowing)));
}

#[then("the follow is rejected as a self-follow")]
fn the_follow_is_rejected_as_a_self_follow(world: &mut FollowGraphWorld) {
    assert_eq!(world.outcome, Some(Err(ErrorCode::SelfFollowRejected)));
}

#[then("{username} follows nobody")]
fn follows_nobody(world: &mut FollowGraphWorld, username: String) {
    assert!(world.user(&username).following_users().is_empty());
}

#[then("{username} has no subscribers")]
fn has_no_subscribers(world: &mut FollowGraphWorld, username: String) {
    assert!(world.user(&username).subscribers().is_empty());
}

#[then("the reconciliation repaired {count} violation")]
fn the_reconciliation_repaired(world: &mut FollowGraphWorld, count: usize) {
    let report = world.report.as_ref().expect("reconcile should have run");
    assert_eq!(report.violations.len(), count);
}

#[then("the follow graph audit is clean")]
fn the_follow_graph_audit_is_clean(world: &mut FollowGraphWorld) {
    let violations = world.harness.app.graph_audit().audit().expect("audit");
    assert!(violations.is_empty(), "unexpected violations: {violations:?}");
}

#[scenario(path = "tests/features/follow_graph.feature")]
fn follow_graph_scenarios(world: FollowGraphWorld) {
    drop(world);
}
