//! Tests for the content service.

use std::sync::Arc;

use super::*;
use crate::domain::ErrorCode;
use crate::domain::identity_service::IdentityService;
use crate::domain::notification::Notification;
use crate::domain::ports::{FixtureMediaUploader, MockMediaUploader};
use crate::domain::session::Session;
use crate::domain::user::{NotificationPreferences, ProfileUpdate, SettingsUpdate};
use crate::test_support::{MutableClock, fixture_timestamp, in_memory_store};
use rstest::{fixture, rstest};

struct Harness {
    store: Arc<RecordStore>,
    clock: Arc<MutableClock>,
    identity: IdentityService,
    content: ContentService,
    notifications: NotificationService,
}

#[fixture]
fn harness() -> Harness {
    let store = in_memory_store();
    let clock = Arc::new(MutableClock::new(fixture_timestamp()));
    let notifications = NotificationService::new(Arc::clone(&store), clock.clone());
    let identity = IdentityService::new(Arc::clone(&store), clock.clone());
    let content = ContentService::new(Arc::clone(&store), clock.clone(), notifications.clone());
    Harness {
        store,
        clock,
        identity,
        content,
        notifications,
    }
}

impl Harness {
    fn register(&self, username: &str) -> (Session, User) {
        let mut session = Session::anonymous();
        let user = self
            .identity
            .register(&mut session, username, username, "pw")
            .expect("register");
        (session, user)
    }

    fn post(&self, author: &User, content: &str, cause: &str) -> Post {
        let post = self
            .content
            .create_post(author.id(), content, cause, None)
            .expect("create post");
        self.clock.advance_seconds(60);
        post
    }

    fn stored_notifications(&self) -> Vec<Notification> {
        self.store.get_all().expect("notifications")
    }
}

fn upload(content_type: &str, bytes: Vec<u8>) -> MediaUpload {
    MediaUpload {
        bucket: "posts".to_owned(),
        path: "alice".to_owned(),
        file_name: "clip".to_owned(),
        content_type: content_type.to_owned(),
        bytes,
    }
}

#[rstest]
fn create_post_trims_and_snapshots_author(harness: Harness) {
    let (_, alice) = harness.register("alice");
    let post = harness
        .content
        .create_post(alice.id(), "  hello  ", "climate", None)
        .expect("create post");
    assert_eq!(post.content(), "hello");
    assert_eq!(post.username(), "alice");
    assert_eq!(post.avatar(), alice.avatar());
    assert_eq!(post.created_at(), fixture_timestamp());
    assert_eq!(
        harness.content.get_post(post.id()).expect("lookup"),
        Some(post)
    );
}

#[rstest]
#[case("   ", "climate")]
#[case("hello", "knitting")]
#[case("hello", "")]
fn create_post_rejects_invalid_input(harness: Harness, #[case] content: &str, #[case] cause: &str) {
    let (_, alice) = harness.register("alice");
    let error = harness
        .content
        .create_post(alice.id(), content, cause, None)
        .expect_err("invalid post");
    assert_eq!(error.code(), ErrorCode::InvalidRequest);
    assert!(harness.content.list_posts(&PostFilter::default()).expect("list").is_empty());
}

#[rstest]
fn create_post_requires_known_author(harness: Harness) {
    let error = harness
        .content
        .create_post(&UserId::random(), "hello", "climate", None)
        .expect_err("unknown author");
    assert_eq!(error.code(), ErrorCode::NotFound);
}

#[rstest]
fn profile_edits_do_not_rewrite_old_posts(harness: Harness) {
    let (mut session, alice) = harness.register("alice");
    let post = harness.post(&alice, "hello", "climate");
    harness
        .identity
        .update_profile(
            &mut session,
            ProfileUpdate {
                name: Some("Alice Renamed".to_owned()),
                username: Some("alice2".to_owned()),
                ..ProfileUpdate::default()
            },
        )
        .expect("update profile");

    let stored = harness
        .content
        .get_post(post.id())
        .expect("lookup")
        .expect("post exists");
    assert_eq!(stored.username(), "alice");
    assert_eq!(stored.name(), "alice");
}

#[rstest]
fn list_posts_filters_and_orders_newest_first(harness: Harness) {
    let (_, alice) = harness.register("alice");
    let (_, bob) = harness.register("bob");
    let first = harness.post(&alice, "one", "climate");
    let second = harness.post(&bob, "two", "ocean");
    let third = harness.post(&alice, "three", "climate");

    let all = harness.content.list_posts(&PostFilter::default()).expect("list");
    let ids: Vec<&PostId> = all.iter().map(Post::id).collect();
    assert_eq!(ids, vec![third.id(), second.id(), first.id()]);

    let climate = harness
        .content
        .list_posts(&PostFilter::by_cause(CauseId::new("climate").expect("slug")))
        .expect("list climate");
    assert_eq!(climate.len(), 2);

    let by_bob = harness
        .content
        .list_posts(&PostFilter::by_author("bob"))
        .expect("list bob");
    assert_eq!(by_bob.iter().map(Post::id).collect::<Vec<_>>(), vec![second.id()]);
}

#[rstest]
fn home_feed_prefers_followed_causes(harness: Harness) {
    let (mut session, alice) = harness.register("alice");
    let (_, bob) = harness.register("bob");
    harness.post(&bob, "waves", "ocean");
    harness.post(&bob, "trees", "climate");
    harness.post(&bob, "hi all", "general");

    let fallback = harness.content.home_feed(alice.id()).expect("feed");
    assert_eq!(fallback.len(), 3, "no followed cause shows everything");

    let graph = crate::domain::social_graph_service::SocialGraphService::new(
        Arc::clone(&harness.store),
        harness.notifications.clone(),
    );
    graph
        .follow_cause(&mut session, alice.id(), "ocean")
        .expect("follow cause");
    let feed = harness.content.home_feed(alice.id()).expect("feed");
    let contents: Vec<&str> = feed.iter().map(Post::content).collect();
    assert_eq!(contents, vec!["hi all", "waves"]);
}

#[rstest]
fn home_feed_falls_back_when_nothing_matches(harness: Harness) {
    let (mut session, alice) = harness.register("alice");
    let (_, bob) = harness.register("bob");
    harness.post(&bob, "trees", "climate");
    let graph = crate::domain::social_graph_service::SocialGraphService::new(
        Arc::clone(&harness.store),
        harness.notifications.clone(),
    );
    graph
        .follow_cause(&mut session, alice.id(), "animals")
        .expect("follow cause");
    let feed = harness.content.home_feed(alice.id()).expect("feed");
    assert_eq!(feed.len(), 1);
}

#[rstest]
fn like_notifies_author_once(harness: Harness) {
    let (_, alice) = harness.register("alice");
    let (_, bob) = harness.register("bob");
    let post = harness.post(&alice, "hello", "climate");

    let liked = harness.content.toggle_like(post.id(), bob.id()).expect("like");
    assert_eq!(liked, LikeState { liked: true, like_count: 1 });
    let unliked = harness.content.toggle_like(post.id(), bob.id()).expect("unlike");
    assert_eq!(unliked, LikeState { liked: false, like_count: 0 });

    let inbox = harness
        .notifications
        .list_notifications(alice.id())
        .expect("inbox");
    assert_eq!(inbox.len(), 1);
    let notification = inbox.first().expect("one notification");
    assert_eq!(notification.kind(), NotificationKind::Like);
    assert_eq!(notification.related_post_id(), Some(post.id()));
}

#[rstest]
fn own_like_and_comment_never_notify(harness: Harness) {
    let (_, alice) = harness.register("alice");
    let post = harness.post(&alice, "hello", "climate");
    harness.content.toggle_like(post.id(), alice.id()).expect("like");
    harness
        .content
        .add_comment(post.id(), alice.id(), "me again")
        .expect("comment");
    assert!(harness.stored_notifications().is_empty());
}

#[rstest]
fn like_unknown_post_is_not_found(harness: Harness) {
    let (_, alice) = harness.register("alice");
    let error = harness
        .content
        .toggle_like(&PostId::random(), alice.id())
        .expect_err("unknown post");
    assert_eq!(error.code(), ErrorCode::NotFound);
}

#[rstest]
fn comment_appends_and_notifies(harness: Harness) {
    let (_, alice) = harness.register("alice");
    let (_, bob) = harness.register("bob");
    let post = harness.post(&alice, "hello", "climate");

    let comment = harness
        .content
        .add_comment(post.id(), bob.id(), "  great  ")
        .expect("comment");
    assert_eq!(comment.text(), "great");
    let stored = harness
        .content
        .get_post(post.id())
        .expect("lookup")
        .expect("post exists");
    assert_eq!(stored.comments(), std::slice::from_ref(&comment));

    let inbox = harness
        .notifications
        .list_notifications(alice.id())
        .expect("inbox");
    assert_eq!(inbox.first().map(Notification::kind), Some(NotificationKind::Comment));
}

#[rstest]
fn blank_comment_is_rejected(harness: Harness) {
    let (_, alice) = harness.register("alice");
    let post = harness.post(&alice, "hello", "climate");
    let error = harness
        .content
        .add_comment(post.id(), alice.id(), "  ")
        .expect_err("blank comment");
    assert_eq!(error.code(), ErrorCode::InvalidRequest);
}

#[rstest]
fn comment_preference_suppresses_notification(harness: Harness) {
    let (mut alice_session, alice) = harness.register("alice");
    let (_, bob) = harness.register("bob");
    harness
        .identity
        .update_settings(
            &mut alice_session,
            SettingsUpdate {
                notification_preferences: Some(NotificationPreferences {
                    comments: false,
                    ..NotificationPreferences::default()
                }),
                ..SettingsUpdate::default()
            },
        )
        .expect("update settings");
    let post = harness.post(&alice, "hello", "climate");
    harness
        .content
        .add_comment(post.id(), bob.id(), "hi")
        .expect("comment");
    harness.content.toggle_like(post.id(), bob.id()).expect("like");

    let kinds: Vec<NotificationKind> = harness
        .stored_notifications()
        .iter()
        .map(Notification::kind)
        .collect();
    assert_eq!(kinds, vec![NotificationKind::Like]);
}

#[rstest]
fn upload_becomes_post_media(harness: Harness) {
    let (_, alice) = harness.register("alice");
    let post = harness
        .content
        .create_post_with_upload(
            alice.id(),
            "look",
            "ocean",
            &FixtureMediaUploader,
            &upload("video/mp4", vec![1, 2, 3]),
        )
        .expect("create post");
    let media = post.media().expect("media attached");
    assert_eq!(media.kind, MediaType::Video);
    assert_eq!(media.url, "fixture://posts/alice/clip");
}

#[rstest]
fn invalid_post_skips_upload(harness: Harness) {
    let (_, alice) = harness.register("alice");
    let mut uploader = MockMediaUploader::new();
    uploader.expect_upload().never();
    let error = harness
        .content
        .create_post_with_upload(
            alice.id(),
            " ",
            "ocean",
            &uploader,
            &upload("image/png", vec![1]),
        )
        .expect_err("blank content");
    assert_eq!(error.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[case(UploadError::empty_file("clip"), ErrorCode::InvalidRequest)]
#[case(UploadError::storage("disk full"), ErrorCode::InternalError)]
fn upload_failures_map_to_domain_codes(
    harness: Harness,
    #[case] failure: UploadError,
    #[case] expected: ErrorCode,
) {
    let (_, alice) = harness.register("alice");
    let mut uploader = MockMediaUploader::new();
    uploader
        .expect_upload()
        .times(1)
        .return_once(move |_| Err(failure));
    let error = harness
        .content
        .create_post_with_upload(
            alice.id(),
            "look",
            "ocean",
            &uploader,
            &upload("image/png", vec![1]),
        )
        .expect_err("upload failure");
    assert_eq!(error.code(), expected);
    assert!(harness.content.list_posts(&PostFilter::default()).expect("list").is_empty());
}

#[rstest]
fn creator_stats_reflect_activity(harness: Harness) {
    let (_, alice) = harness.register("alice");
    let (_, bob) = harness.register("bob");
    let post = harness.post(&alice, "hello", "climate");
    harness.post(&alice, "again", "climate");
    harness.content.toggle_like(post.id(), bob.id()).expect("like");
    harness
        .content
        .add_comment(post.id(), bob.id(), "nice")
        .expect("comment");
    let graph = crate::domain::social_graph_service::SocialGraphService::new(
        Arc::clone(&harness.store),
        harness.notifications.clone(),
    );
    let mut bob_session = Session::anonymous();
    graph
        .follow_user(&mut bob_session, bob.id(), alice.id())
        .expect("follow");

    let stats = harness.content.creator_stats(alice.id()).expect("stats");
    assert_eq!(stats.posts, 2);
    assert_eq!(stats.followers, 1);
    assert_eq!(stats.total_likes, 1);
    assert_eq!(stats.total_comments, 1);
    assert_eq!(stats.live_streams, 0);
}
