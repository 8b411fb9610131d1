//! Aggregate numbers shown on a creator's dashboard.

use serde::Serialize;

use super::live_stream::LiveStream;
use super::post::Post;
use super::user::User;

/// Totals over a creator's published content.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatorStats {
    /// Posts authored.
    pub posts: usize,
    /// Live streams hosted, live or ended.
    pub live_streams: usize,
    /// Current subscriber count.
    pub followers: usize,
    /// Likes across every post.
    pub total_likes: usize,
    /// Comments across every post.
    pub total_comments: usize,
    /// Likes plus comments per post; zero without posts.
    pub average_engagement: f64,
}

impl CreatorStats {
    pub(crate) fn tally(creator: &User, posts: &[Post], streams: &[LiveStream]) -> Self {
        let mine = posts.iter().filter(|post| post.author_id() == creator.id());
        let (post_count, total_likes, total_comments) =
            mine.fold((0_usize, 0_usize, 0_usize), |(count, likes, comments), post| {
                (
                    count.saturating_add(1),
                    likes.saturating_add(post.likes().len()),
                    comments.saturating_add(post.comments().len()),
                )
            });
        let live_streams = streams
            .iter()
            .filter(|stream| stream.host_user_id() == creator.id())
            .count();

        Self {
            posts: post_count,
            live_streams,
            followers: creator.subscribers().len(),
            total_likes,
            total_comments,
            average_engagement: ratio(total_likes.saturating_add(total_comments), post_count),
        }
    }
}

#[expect(
    clippy::float_arithmetic,
    reason = "engagement is a display ratio, not an exact quantity"
)]
fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    let to_f64 = |value: usize| f64::from(u32::try_from(value).unwrap_or(u32::MAX));
    to_f64(numerator) / to_f64(denominator)
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::cause::CauseId;
    use crate::domain::ids::UserId;
    use crate::domain::post::AuthorSnapshot;
    use crate::domain::user::Username;
    use crate::test_support::fixture_timestamp;
    use rstest::rstest;

    fn creator() -> User {
        User::new(
            UserId::random(),
            Username::new("alice").expect("valid username"),
            "Alice",
            fixture_timestamp(),
        )
    }

    fn post_by(author: &User, likers: usize) -> Post {
        let mut post = Post::new(
            AuthorSnapshot::of(author),
            "hello".to_owned(),
            CauseId::general(),
            None,
            fixture_timestamp(),
        );
        for _ in 0..likers {
            post.toggle_like(&UserId::random());
        }
        post
    }

    #[rstest]
    fn no_posts_means_zero_engagement() {
        let stats = CreatorStats::tally(&creator(), &[], &[]);
        assert_eq!(stats.posts, 0);
        assert!(stats.average_engagement.abs() < f64::EPSILON);
    }

    #[rstest]
    fn counts_only_the_creators_posts() {
        let alice = creator();
        let someone_else = User::new(
            UserId::random(),
            Username::new("bob").expect("valid username"),
            "Bob",
            fixture_timestamp(),
        );
        let mut commented = post_by(&alice, 1);
        commented.push_comment(crate::domain::post::Comment::new(
            AuthorSnapshot::of(&someone_else),
            "nice".to_owned(),
            fixture_timestamp(),
        ));
        let posts = vec![post_by(&alice, 3), commented, post_by(&someone_else, 5)];

        let stats = CreatorStats::tally(&alice, &posts, &[]);
        assert_eq!(stats.posts, 2);
        assert_eq!(stats.total_likes, 4);
        assert_eq!(stats.total_comments, 1);
        assert!((stats.average_engagement - 2.5).abs() < f64::EPSILON);
    }
}
