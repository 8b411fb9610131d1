//! Embedded record store and social-graph consistency layer.
//!
//! The crate persists users, posts, notifications, live streams and uploaded
//! media for the Causeway client, and keeps the bidirectional
//! `followingUsers` / `subscribers` relationship consistent without a server
//! enforcing referential integrity.
//!
//! Layout follows a ports-and-adapters split:
//! - [`domain`] holds entities, the typed [`domain::RecordStore`], and the
//!   services (identity, social graph, content, notifications, live
//!   sessions).
//! - [`domain::ports`] declares the seams to the outside world: the storage
//!   medium, media uploads, and device capture.
//! - [`outbound`] provides the JSON-directory and in-memory media plus the
//!   local blob uploader.

pub mod app;
pub mod config;
pub mod domain;
pub mod outbound;
pub mod telemetry;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use app::Causeway;
