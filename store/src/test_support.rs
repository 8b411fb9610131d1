//! Test utilities for the store crate.
//!
//! Shared by unit tests (in `src/`) and integration tests (in `tests/`).
//! Compiled only for tests or with the `test-support` feature.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;

use crate::app::Causeway;
use crate::domain::RecordStore;
use crate::domain::ports::{DeviceCapture, FixtureDeviceCapture};
use crate::outbound::persistence::InMemoryMedium;

/// Fixed instant used as the starting point of test clocks.
pub fn fixture_timestamp() -> DateTime<Utc> {
    match Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).single() {
        Some(timestamp) => timestamp,
        None => panic!("fixture timestamp must be unambiguous"),
    }
}

/// Clock that only moves when told to.
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    /// Start the clock at `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    /// Move the clock forward.
    pub fn advance_seconds(&self, seconds: i64) {
        *self.lock_clock() += TimeDelta::seconds(seconds);
    }

    fn lock_clock(&self) -> MutexGuard<'_, DateTime<Utc>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}

/// Record store over a fresh in-memory medium.
pub fn in_memory_store() -> Arc<RecordStore> {
    Arc::new(RecordStore::new(Arc::new(InMemoryMedium::default())))
}

/// A wired [`Causeway`] over process memory plus the clock driving it.
pub struct TestApp {
    /// The services.
    pub app: Causeway,
    /// Clock shared by every service.
    pub clock: Arc<MutableClock>,
}

impl TestApp {
    /// Ephemeral app whose device capture always grants access.
    pub fn new() -> Self {
        Self::with_capture(Arc::new(FixtureDeviceCapture::granted()))
    }

    /// Ephemeral app with a custom capture port.
    pub fn with_capture(capture: Arc<dyn DeviceCapture>) -> Self {
        let clock = Arc::new(MutableClock::new(fixture_timestamp()));
        let app = Causeway::builder(Arc::new(InMemoryMedium::default()))
            .clock(clock.clone())
            .device_capture(capture)
            .build();
        Self { app, clock }
    }

    /// Advance the shared clock by `seconds`.
    pub fn tick(&self, seconds: i64) {
        self.clock.advance_seconds(seconds);
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// Temporary directory for file-backed medium tests.
pub fn temp_data_dir() -> tempfile::TempDir {
    match tempfile::tempdir() {
        Ok(dir) => dir,
        Err(error) => panic!("failed to create temporary directory: {error}"),
    }
}
