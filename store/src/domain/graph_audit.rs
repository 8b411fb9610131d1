//! Consistency audit for the follow graph.
//!
//! Data written before follows were transactional can hold one-sided
//! edges, self-follows or edges to users that no longer exist. The audit
//! reports them; reconciliation repairs them in one write of the `users`
//! collection.
//!
//! `followingUsers` is treated as the source of truth: after pruning
//! self-references and unknown ids, every user's `subscribers` set is
//! rebuilt from the other users' `followingUsers`.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use tracing::info;

use super::Error;
use super::ids::UserId;
use super::record_store::{Mutation, RecordStore};
use super::user::{User, UserRecord};

/// One inconsistency in the follow graph.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum GraphViolation {
    /// A user lists themselves in `followingUsers`.
    SelfFollow {
        /// Affected user.
        user: UserId,
    },
    /// A user lists themselves in `subscribers`.
    SelfSubscriber {
        /// Affected user.
        user: UserId,
    },
    /// `follower` follows `followee`, but is missing from its subscribers.
    MissingSubscriber {
        /// User holding the following edge.
        follower: UserId,
        /// User lacking the subscriber entry.
        followee: UserId,
    },
    /// `subscriber` is listed as a subscriber of `user` without following
    /// them.
    OrphanSubscriber {
        /// User holding the stray subscriber entry.
        user: UserId,
        /// Listed subscriber.
        subscriber: UserId,
    },
    /// `user` follows an id that no stored user has.
    DanglingFollow {
        /// User holding the edge.
        user: UserId,
        /// Unknown id.
        target: UserId,
    },
    /// `user` lists a subscriber id that no stored user has.
    DanglingSubscriber {
        /// User holding the entry.
        user: UserId,
        /// Unknown id.
        subscriber: UserId,
    },
}

impl fmt::Display for GraphViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SelfFollow { user } => write!(f, "{user} follows themselves"),
            Self::SelfSubscriber { user } => write!(f, "{user} subscribes to themselves"),
            Self::MissingSubscriber { follower, followee } => {
                write!(f, "{follower} follows {followee} but is not a subscriber")
            }
            Self::OrphanSubscriber { user, subscriber } => write!(
                f,
                "{subscriber} is a subscriber of {user} without following them"
            ),
            Self::DanglingFollow { user, target } => {
                write!(f, "{user} follows unknown user {target}")
            }
            Self::DanglingSubscriber { user, subscriber } => {
                write!(f, "{user} lists unknown subscriber {subscriber}")
            }
        }
    }
}

/// Outcome of [`GraphAudit::reconcile`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Violations found before repair.
    pub violations: Vec<GraphViolation>,
    /// Number of user records rewritten.
    pub users_changed: usize,
}

impl ReconcileReport {
    /// Return `true` when the graph was already consistent.
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Audits and repairs the follow graph.
#[derive(Clone)]
pub struct GraphAudit {
    store: Arc<RecordStore>,
}

impl GraphAudit {
    /// Create an audit over `store`.
    pub fn new(store: Arc<RecordStore>) -> Self {
        Self { store }
    }

    /// Report every violation, sorted, without changing anything.
    pub fn audit(&self) -> Result<Vec<GraphViolation>, Error> {
        let users = self.store.get_all::<UserRecord>()?;
        Ok(detect_violations(&users))
    }

    /// Repair every violation in one write.
    pub fn reconcile(&self) -> Result<ReconcileReport, Error> {
        let report = self.store.update::<UserRecord, _, Error, _>(|users| {
            let violations = detect_violations(users);
            if violations.is_empty() {
                return Ok(Mutation::Unchanged(ReconcileReport::default()));
            }
            let users_changed = heal(users);
            Ok(Mutation::Changed(ReconcileReport {
                violations,
                users_changed,
            }))
        })?;
        if !report.is_clean() {
            info!(
                violations = report.violations.len(),
                users_changed = report.users_changed,
                "reconciled follow graph"
            );
        }
        Ok(report)
    }
}

fn index_users(users: &[UserRecord]) -> BTreeMap<&UserId, &User> {
    users
        .iter()
        .map(|record| (record.user().id(), record.user()))
        .collect()
}

fn detect_violations(users: &[UserRecord]) -> Vec<GraphViolation> {
    let by_id = index_users(users);
    let mut violations = Vec::new();

    for user in by_id.values() {
        let id = user.id();
        for target in user.following_users() {
            if target == id {
                violations.push(GraphViolation::SelfFollow { user: id.clone() });
                continue;
            }
            match by_id.get(target) {
                None => violations.push(GraphViolation::DanglingFollow {
                    user: id.clone(),
                    target: target.clone(),
                }),
                Some(followee) if !followee.subscribers().contains(id) => {
                    violations.push(GraphViolation::MissingSubscriber {
                        follower: id.clone(),
                        followee: target.clone(),
                    });
                }
                Some(_) => {}
            }
        }
        for subscriber in user.subscribers() {
            if subscriber == id {
                violations.push(GraphViolation::SelfSubscriber { user: id.clone() });
                continue;
            }
            match by_id.get(subscriber) {
                None => violations.push(GraphViolation::DanglingSubscriber {
                    user: id.clone(),
                    subscriber: subscriber.clone(),
                }),
                Some(follower) if !follower.following_users().contains(id) => {
                    violations.push(GraphViolation::OrphanSubscriber {
                        user: id.clone(),
                        subscriber: subscriber.clone(),
                    });
                }
                Some(_) => {}
            }
        }
    }

    violations.sort();
    violations
}

/// Prune invalid following edges, then rebuild subscribers from them.
/// Returns the number of records that changed.
fn heal(users: &mut [UserRecord]) -> usize {
    let known: BTreeSet<UserId> = users
        .iter()
        .map(|record| record.user().id().clone())
        .collect();
    let mut changed: BTreeSet<UserId> = BTreeSet::new();

    for record in users.iter_mut() {
        let user = record.user_mut();
        let own = user.id().clone();
        let following = user.following_users_mut();
        let before = following.len();
        following.retain(|target| *target != own && known.contains(target));
        if following.len() != before {
            changed.insert(own);
        }
    }

    let mut rebuilt: BTreeMap<UserId, BTreeSet<UserId>> = BTreeMap::new();
    for record in users.iter() {
        let user = record.user();
        for target in user.following_users() {
            rebuilt
                .entry(target.clone())
                .or_default()
                .insert(user.id().clone());
        }
    }

    for record in users.iter_mut() {
        let user = record.user_mut();
        let expected = rebuilt.remove(user.id()).unwrap_or_default();
        if *user.subscribers() != expected {
            changed.insert(user.id().clone());
            *user.subscribers_mut() = expected;
        }
    }

    changed.len()
}
