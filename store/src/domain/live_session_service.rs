//! Live session domain service.
//!
//! Drives a stream through `setup -> live -> ended`. Setup produces an
//! in-memory [`StreamDraft`]; only going live writes a record, and only after
//! the [`DeviceCapture`] port grants camera and microphone access.

use std::sync::Arc;

use mockable::Clock;
use tracing::{debug, info, warn};

use super::Error;
use super::cause::{CauseId, is_known_cause};
use super::ids::{StreamId, UserId};
use super::live_stream::{DEFAULT_THUMBNAIL_URL, LiveStream, StreamDraft, StreamSetup};
use super::ports::{CaptureAccess, DeviceCapture};
use super::post::AuthorSnapshot;
use super::record_store::{Mutation, RecordStore};
use super::user::UserRecord;

/// Starts, ends and tracks live streams.
#[derive(Clone)]
pub struct LiveSessionService {
    store: Arc<RecordStore>,
    clock: Arc<dyn Clock>,
    capture: Arc<dyn DeviceCapture>,
}

impl LiveSessionService {
    /// Create a service that asks `capture` before any stream goes live.
    pub fn new(
        store: Arc<RecordStore>,
        clock: Arc<dyn Clock>,
        capture: Arc<dyn DeviceCapture>,
    ) -> Self {
        Self {
            store,
            clock,
            capture,
        }
    }

    /// Validate `setup` for `host` without persisting anything.
    ///
    /// Fails with `InvalidRequest` for a blank title or unknown cause, and
    /// `NotFound` for an unknown host.
    pub fn prepare_stream(&self, host: &UserId, setup: StreamSetup) -> Result<StreamDraft, Error> {
        let StreamSetup {
            title,
            description,
            cause,
            thumbnail_url,
        } = setup;

        let title = title.trim();
        if title.is_empty() {
            return Err(Error::invalid_request("stream title must not be empty"));
        }
        let cause = non_blank(cause)
            .map(|raw| {
                CauseId::new(raw.as_str())
                    .ok()
                    .filter(is_known_cause)
                    .ok_or_else(|| Error::invalid_request(format!("unknown cause: {raw}")))
            })
            .transpose()?;
        let host = self
            .store
            .find_by_id::<UserRecord>(host)?
            .map(|record| AuthorSnapshot::of(record.user()))
            .ok_or_else(|| Error::not_found(format!("user {host} not found")))?;

        Ok(StreamDraft {
            id: StreamId::random(),
            host,
            title: title.to_owned(),
            description: non_blank(description),
            cause,
            thumbnail_url: non_blank(thumbnail_url)
                .unwrap_or_else(|| DEFAULT_THUMBNAIL_URL.to_owned()),
        })
    }

    /// Ask for capture access and, when granted, persist `draft` as live.
    ///
    /// Fails with `Conflict` when a stream with the draft's id is already
    /// stored; nothing is written in that case.
    pub fn go_live(&self, draft: StreamDraft) -> Result<LiveStream, Error> {
        if let CaptureAccess::Denied(reason) = self.capture.request_access() {
            warn!(
                stream_id = %draft.id(),
                user_id = %draft.host_id(),
                reason = %reason,
                "device capture denied"
            );
            return Err(Error::capture_denied(reason.to_string()));
        }

        let stream = LiveStream::go_live(draft, self.clock.utc());
        let stored = stream.clone();
        self.store.update::<LiveStream, _, Error, _>(|streams| {
            if streams.iter().any(|existing| existing.id() == stored.id()) {
                warn!(stream_id = %stored.id(), "stream already live");
                return Err(Error::conflict(format!(
                    "stream {} has already gone live",
                    stored.id()
                )));
            }
            streams.push(stored);
            Ok(Mutation::Changed(()))
        })?;
        info!(
            stream_id = %stream.id(),
            user_id = %stream.host_user_id(),
            "stream went live"
        );
        Ok(stream)
    }

    /// [`Self::prepare_stream`] followed by [`Self::go_live`].
    pub fn start_stream(&self, host: &UserId, setup: StreamSetup) -> Result<LiveStream, Error> {
        let draft = self.prepare_stream(host, setup)?;
        self.go_live(draft)
    }

    /// End `stream` on behalf of `host`.
    ///
    /// Fails with `NotFound` for an unknown stream and `Forbidden` when
    /// `host` is not its host. Ending an ended stream returns it unchanged.
    pub fn end_stream(&self, host: &UserId, stream: &StreamId) -> Result<LiveStream, Error> {
        let now = self.clock.utc();
        let (ended, changed) = self.store.update::<LiveStream, _, Error, _>(|streams| {
            let entry = find_stream_mut(streams, stream)?;
            if entry.host_user_id() != host {
                warn!(stream_id = %stream, user_id = %host, "only the host may end a stream");
                return Err(Error::forbidden("only the host may end this stream"));
            }
            if entry.end(now) {
                Ok(Mutation::Changed((entry.clone(), true)))
            } else {
                Ok(Mutation::Unchanged((entry.clone(), false)))
            }
        })?;
        if changed {
            info!(stream_id = %stream, user_id = %host, "stream ended");
        } else {
            debug!(stream_id = %stream, "stream already ended");
        }
        Ok(ended)
    }

    /// Count a viewer in. Fails with `Conflict` once the stream has ended.
    pub fn viewer_joined(&self, stream: &StreamId) -> Result<LiveStream, Error> {
        self.adjust_viewers(stream, LiveStream::viewer_joined)
    }

    /// Count a viewer out; never drops below zero. Fails with `Conflict`
    /// once the stream has ended.
    pub fn viewer_left(&self, stream: &StreamId) -> Result<LiveStream, Error> {
        self.adjust_viewers(stream, LiveStream::viewer_left)
    }

    /// Live streams, optionally limited to `cause`, newest first.
    pub fn list_live(&self, cause: Option<&CauseId>) -> Result<Vec<LiveStream>, Error> {
        let mut live: Vec<LiveStream> = self
            .store
            .get_all::<LiveStream>()?
            .into_iter()
            .filter(LiveStream::is_live)
            .filter(|stream| cause.is_none_or(|wanted| stream.cause() == Some(wanted)))
            .collect();
        newest_first(&mut live);
        Ok(live)
    }

    /// Every stream `host` has run, live or ended, newest first.
    pub fn streams_by_host(&self, host: &UserId) -> Result<Vec<LiveStream>, Error> {
        let mut hosted: Vec<LiveStream> = self
            .store
            .get_all::<LiveStream>()?
            .into_iter()
            .filter(|stream| stream.host_user_id() == host)
            .collect();
        newest_first(&mut hosted);
        Ok(hosted)
    }

    fn adjust_viewers(
        &self,
        stream: &StreamId,
        adjust: fn(&mut LiveStream),
    ) -> Result<LiveStream, Error> {
        self.store.update::<LiveStream, _, Error, _>(|streams| {
            let entry = find_stream_mut(streams, stream)?;
            if !entry.is_live() {
                return Err(Error::conflict(format!("stream {stream} has ended")));
            }
            adjust(entry);
            Ok(Mutation::Changed(entry.clone()))
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_owned())
        .filter(|trimmed| !trimmed.is_empty())
}

fn find_stream_mut<'a>(
    streams: &'a mut [LiveStream],
    id: &StreamId,
) -> Result<&'a mut LiveStream, Error> {
    streams
        .iter_mut()
        .find(|stream| stream.id() == id)
        .ok_or_else(|| Error::not_found(format!("stream {id} not found")))
}

fn newest_first(streams: &mut [LiveStream]) {
    streams.sort_by(|a, b| b.started_at().cmp(&a.started_at()));
}

#[cfg(test)]
#[path = "live_session_service_tests.rs"]
mod tests;
