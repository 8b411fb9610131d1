//! Wiring of the store: one medium, one record store, every service.
//!
//! [`Causeway`] is the composition root the CLI and integration tests use.
//! All services share the same [`RecordStore`], so they share its
//! per-collection locks.

use std::sync::Arc;

use mockable::{Clock, DefaultClock};
use tracing::info;

use crate::config::StoreSettings;
use crate::domain::ports::{DeviceCapture, FixtureDeviceCapture, MediaUploader, StorageMedium};
use crate::domain::{
    ContentService, Error, GraphAudit, IdentityService, LiveSessionService,
    NotificationService, RecordStore, Session, SocialGraphService,
};
use crate::outbound::persistence::{InMemoryMedium, JsonDirectoryMedium, LocalBlobUploader};

/// The assembled store and its services.
#[derive(Clone)]
pub struct Causeway {
    store: Arc<RecordStore>,
    identity: IdentityService,
    social_graph: SocialGraphService,
    graph_audit: GraphAudit,
    content: ContentService,
    notifications: NotificationService,
    live_sessions: LiveSessionService,
    media: Arc<dyn MediaUploader>,
}

impl Causeway {
    /// Start configuring an app over `medium`.
    pub fn builder(medium: Arc<dyn StorageMedium>) -> CausewayBuilder {
        CausewayBuilder::new(medium)
    }

    /// Build an app from loaded settings, with the system clock.
    ///
    /// `capture` answers camera and microphone requests when going live.
    ///
    /// # Errors
    ///
    /// Fails with `InternalError` when the data directory cannot be opened.
    pub fn from_settings(
        settings: &StoreSettings,
        capture: Arc<dyn DeviceCapture>,
    ) -> Result<Self, Error> {
        let medium: Arc<dyn StorageMedium> = if settings.ephemeral {
            info!("using in-memory storage");
            Arc::new(InMemoryMedium::default())
        } else {
            let dir = settings.data_dir();
            info!(data_dir = %dir, "using JSON directory storage");
            Arc::new(
                JsonDirectoryMedium::open(&dir)
                    .map_err(|err| Error::internal(err.to_string()))?,
            )
        };
        Ok(Self::builder(medium).device_capture(capture).build())
    }

    /// Rehydrate the persisted session, if any.
    pub fn restore_session(&self) -> Result<Session, Error> {
        Session::restore(&self.store)
    }

    /// Shared record store.
    pub fn store(&self) -> &Arc<RecordStore> {
        &self.store
    }

    /// Registration, login and profile edits.
    pub fn identity(&self) -> &IdentityService {
        &self.identity
    }

    /// Follow relationships and cause follows.
    pub fn social_graph(&self) -> &SocialGraphService {
        &self.social_graph
    }

    /// Follow graph audit and repair.
    pub fn graph_audit(&self) -> &GraphAudit {
        &self.graph_audit
    }

    /// Posts, reactions and feeds.
    pub fn content(&self) -> &ContentService {
        &self.content
    }

    /// Notification inbox.
    pub fn notifications(&self) -> &NotificationService {
        &self.notifications
    }

    /// Live streams.
    pub fn live_sessions(&self) -> &LiveSessionService {
        &self.live_sessions
    }

    /// Uploader for avatars, post media and thumbnails.
    pub fn media(&self) -> &Arc<dyn MediaUploader> {
        &self.media
    }
}

impl std::fmt::Debug for Causeway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Causeway")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Causeway`]; unset collaborators get production defaults.
pub struct CausewayBuilder {
    medium: Arc<dyn StorageMedium>,
    clock: Option<Arc<dyn Clock>>,
    capture: Option<Arc<dyn DeviceCapture>>,
    media: Option<Arc<dyn MediaUploader>>,
}

impl CausewayBuilder {
    fn new(medium: Arc<dyn StorageMedium>) -> Self {
        Self {
            medium,
            clock: None,
            capture: None,
            media: None,
        }
    }

    /// Use `clock` for every timestamp.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Ask `capture` before streams go live. Defaults to always granting.
    pub fn device_capture(mut self, capture: Arc<dyn DeviceCapture>) -> Self {
        self.capture = Some(capture);
        self
    }

    /// Upload media through `media`. Defaults to [`LocalBlobUploader`] over
    /// the same store.
    pub fn media_uploader(mut self, media: Arc<dyn MediaUploader>) -> Self {
        self.media = Some(media);
        self
    }

    /// Wire every service over one shared record store.
    pub fn build(self) -> Causeway {
        let Self {
            medium,
            clock,
            capture,
            media,
        } = self;
        let store = Arc::new(RecordStore::new(medium));
        let clock: Arc<dyn Clock> = clock.unwrap_or_else(|| Arc::new(DefaultClock));
        let capture: Arc<dyn DeviceCapture> =
            capture.unwrap_or_else(|| Arc::new(FixtureDeviceCapture::granted()));
        let media: Arc<dyn MediaUploader> = media.unwrap_or_else(|| {
            Arc::new(LocalBlobUploader::new(Arc::clone(&store), Arc::clone(&clock)))
        });

        let notifications = NotificationService::new(Arc::clone(&store), Arc::clone(&clock));
        Causeway {
            identity: IdentityService::new(Arc::clone(&store), Arc::clone(&clock)),
            social_graph: SocialGraphService::new(Arc::clone(&store), notifications.clone()),
            graph_audit: GraphAudit::new(Arc::clone(&store)),
            content: ContentService::new(
                Arc::clone(&store),
                Arc::clone(&clock),
                notifications.clone(),
            ),
            live_sessions: LiveSessionService::new(Arc::clone(&store), clock, capture),
            notifications,
            media,
            store,
        }
    }
}
