use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{Mutex, RwLock};

use crate::{
    error::{AppError, AppResult},
    models::{
        BatchSource, Layout, PreferenceKind, Preferences, RecommendationRequest,
        RecommendationResponse, Surface,
    },
    services::{
        feed::{self, DerivedFeed, FeedInputs},
        interaction::{InteractionLogger, OpenedItem, ReadOutcome},
        preference_store::{PendingWrite, PreferenceStore},
        recommender::RecommendationApi,
        session::SessionIdentity,
    },
};

const PRIMARY_PAGE_SIZE: u32 = 36;
const BECAUSE_YOU_CLICKED_PAGE_SIZE: u32 = 12;
const RECENT_CLICKS_LIMIT: u32 = 10;
const DEVICE_TYPE: &str = "web";
const USER_AGENT: &str = "newsflix-dashboard";
const APP_VERSION: &str = concat!("newsflix/", env!("CARGO_PKG_VERSION"));

/// Request context that does not change between fetches
#[derive(Debug, Clone)]
pub struct FeedSettings {
    pub layout: Layout,
    pub locale: String,
    pub primary_page_size: u32,
    pub because_you_clicked_page_size: u32,
    pub recent_clicks_limit: u32,
}

impl FeedSettings {
    pub fn new(layout: Layout, locale: impl Into<String>) -> Self {
        Self {
            layout,
            locale: locale.into(),
            primary_page_size: PRIMARY_PAGE_SIZE,
            because_you_clicked_page_size: BECAUSE_YOU_CLICKED_PAGE_SIZE,
            recent_clicks_limit: RECENT_CLICKS_LIMIT,
        }
    }

    fn request(
        &self,
        identity: &SessionIdentity,
        surface: Surface,
        page_size: u32,
        referrer: &str,
    ) -> RecommendationRequest {
        RecommendationRequest {
            device_type: Some(DEVICE_TYPE.to_string()),
            app_version: Some(APP_VERSION.to_string()),
            user_agent: Some(USER_AGENT.to_string()),
            referrer: Some(referrer.to_string()),
            page_size: Some(page_size),
            surface: Some(surface.to_string()),
            locale: Some(self.locale.clone()),
            ..RecommendationRequest::new(identity.anonymous_id(), identity.session_id())
        }
    }
}

/// Holder of one batch plus the sequence number of the newest fetch for it
///
/// Each fetch takes a number from [`BatchSlot::issue`]; only the holder of
/// the latest number may settle the slot, so a slow superseded response can
/// never overwrite a newer one.
#[derive(Debug, Default)]
struct BatchSlot {
    issued: u64,
    in_flight: bool,
    current: Option<RecommendationResponse>,
}

impl BatchSlot {
    fn issue(&mut self) -> u64 {
        self.issued += 1;
        self.in_flight = true;
        self.issued
    }

    /// True when `seq` is still the latest; the caller then owns `current`
    fn settle(&mut self, seq: u64) -> bool {
        if seq != self.issued {
            return false;
        }
        self.in_flight = false;
        true
    }

    /// Drops the batch and invalidates every fetch in flight
    fn clear(&mut self) {
        self.issued += 1;
        self.in_flight = false;
        self.current = None;
    }

    /// An empty impression id is treated as missing
    fn impression_id(&self) -> Option<String> {
        self.current
            .as_ref()
            .and_then(|r| r.impression_id.clone())
            .filter(|id| !id.is_empty())
    }
}

struct FeedState {
    identity: SessionIdentity,
    primary: BatchSlot,
    because_you_clicked: BatchSlot,
    query: String,
    error: Option<String>,
    prefs: PreferenceStore,
    logger: InteractionLogger,
}

/// Serializable snapshot of everything the dashboard shows
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub anonymous_id: String,
    pub session_id: String,
    /// Only populated in debug mode
    pub impression_id: Option<String>,
    /// Only populated in debug mode
    pub because_you_clicked_impression_id: Option<String>,
    pub query: String,
    pub loading: bool,
    pub error: Option<String>,
    #[serde(flatten)]
    pub feed: DerivedFeed,
    pub opened: Option<OpenedItem>,
    /// A click for the opened item is on the wire
    pub reading: bool,
}

/// Owns identity, batches, query, preferences and the detail view
///
/// Network calls and preference writes happen with no state lock held.
/// Overlapping refreshes are allowed; the newest one wins regardless of
/// completion order.
pub struct FeedController {
    api: Arc<dyn RecommendationApi>,
    settings: FeedSettings,
    state: RwLock<FeedState>,
    /// Revision of the last preference snapshot handed to storage
    persisted: Mutex<u64>,
}

impl FeedController {
    pub fn new(
        api: Arc<dyn RecommendationApi>,
        settings: FeedSettings,
        prefs: PreferenceStore,
        logger: InteractionLogger,
    ) -> Self {
        Self {
            api,
            settings,
            state: RwLock::new(FeedState {
                identity: SessionIdentity::new(),
                primary: BatchSlot::default(),
                because_you_clicked: BatchSlot::default(),
                query: String::new(),
                error: None,
                prefs,
                logger,
            }),
            persisted: Mutex::new(0),
        }
    }

    pub fn settings(&self) -> &FeedSettings {
        &self.settings
    }

    pub async fn identity(&self) -> SessionIdentity {
        self.state.read().await.identity.clone()
    }

    /// Reloads the primary batch and the because-you-clicked row together
    pub async fn refresh(&self) {
        let (primary, _) = tokio::join!(self.refresh_primary(), self.refresh_because_you_clicked());
        if let Err(e) = primary {
            tracing::debug!(error = %e, "Primary refresh failed");
        }
    }

    /// Fetches a new primary batch for the configured layout
    ///
    /// On failure the previous batch stays and the error becomes the
    /// dismissible message in the view.
    pub async fn refresh_primary(&self) -> AppResult<()> {
        let layout = self.settings.layout;
        let (seq, request) = {
            let mut state = self.state.write().await;
            state.error = None;
            let seq = state.primary.issue();
            let request = self.settings.request(
                &state.identity,
                layout.surface(),
                self.settings.primary_page_size,
                layout.referrer(),
            );
            (seq, request)
        };

        let result = self.api.fetch_recommendations(&request).await;

        let mut state = self.state.write().await;
        if !state.primary.settle(seq) {
            tracing::debug!(
                seq,
                latest = state.primary.issued,
                failed = result.is_err(),
                "Discarding stale primary response"
            );
            return Ok(());
        }

        match result {
            Ok(batch) => {
                tracing::info!(
                    seq,
                    items = batch.items.len(),
                    surface = %layout.surface(),
                    "Primary batch replaced"
                );
                state.primary.current = Some(batch);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load recommendations");
                state.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Rebuilds the because-you-clicked row
    ///
    /// The row only exists when the user has recent clicks. Failures clear the
    /// row quietly; they never reach the error message.
    pub async fn refresh_because_you_clicked(&self) {
        let (seq, anonymous_id, request) = {
            let mut state = self.state.write().await;
            let seq = state.because_you_clicked.issue();
            let request = self.settings.request(
                &state.identity,
                Surface::BecauseYouClicked,
                self.settings.because_you_clicked_page_size,
                "because_you_clicked",
            );
            (seq, state.identity.anonymous_id().to_string(), request)
        };

        let outcome = self.fetch_because_you_clicked(&anonymous_id, &request).await;

        let mut state = self.state.write().await;
        if !state.because_you_clicked.settle(seq) {
            tracing::debug!(seq, "Discarding stale because-you-clicked response");
            return;
        }

        state.because_you_clicked.current = match outcome {
            Ok(batch) => batch,
            Err(e) => {
                tracing::warn!(error = %e, "Because-you-clicked row unavailable");
                None
            }
        };
    }

    async fn fetch_because_you_clicked(
        &self,
        anonymous_id: &str,
        request: &RecommendationRequest,
    ) -> AppResult<Option<RecommendationResponse>> {
        let recent = self
            .api
            .fetch_recent_clicks(anonymous_id, Some(self.settings.recent_clicks_limit))
            .await?;

        if recent.is_empty() {
            return Ok(None);
        }

        self.api.fetch_recommendations(request).await.map(Some)
    }

    /// Same user, fresh session id; both batches are dropped and reloaded
    pub async fn new_session(&self) {
        {
            let mut state = self.state.write().await;
            state.identity.new_session();
            state.primary.clear();
            state.because_you_clicked.clear();
        }
        self.refresh().await;
    }

    /// Fresh anonymous id and session id; both batches are dropped and reloaded
    pub async fn new_user(&self) {
        {
            let mut state = self.state.write().await;
            state.identity.new_user();
            state.primary.clear();
            state.because_you_clicked.clear();
        }
        self.refresh().await;
    }

    pub async fn set_query(&self, query: impl Into<String>) {
        self.state.write().await.query = query.into();
    }

    pub async fn dismiss_error(&self) {
        self.state.write().await.error = None;
    }

    pub async fn preferences(&self) -> Preferences {
        self.state.read().await.prefs.preferences().clone()
    }

    pub async fn toggle_preference(&self, kind: PreferenceKind, item_id: &str) -> bool {
        let (member, pending) = self.state.write().await.prefs.toggle(kind, item_id);
        self.persist(pending).await;
        member
    }

    pub async fn hide(&self, item_id: &str) {
        let pending = self.state.write().await.prefs.hide(item_id);
        self.persist(pending).await;
    }

    pub async fn unhide_all(&self) {
        let pending = self.state.write().await.prefs.unhide_all();
        self.persist(pending).await;
    }

    /// Writes a snapshot off the runtime workers unless a newer one already went out
    async fn persist(&self, pending: PendingWrite) {
        let mut persisted = self.persisted.lock().await;
        if pending.revision() <= *persisted {
            tracing::debug!(
                revision = pending.revision(),
                latest = *persisted,
                "Skipping superseded preference snapshot"
            );
            return;
        }
        *persisted = pending.revision();
        pending.write_blocking().await;
    }

    /// Opens an item from the batch currently held for `source`
    pub async fn open_item(&self, source: BatchSource, item_id: &str) -> AppResult<OpenedItem> {
        let mut state = self.state.write().await;
        let slot = match source {
            BatchSource::Primary => &state.primary,
            BatchSource::BecauseYouClicked => &state.because_you_clicked,
        };

        let item = slot
            .current
            .as_ref()
            .and_then(|batch| batch.find(item_id))
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Item {} is not in the current batch", item_id)))?;
        let impression_id = slot.impression_id();

        state.logger.open(item, source, impression_id);
        state
            .logger
            .opened()
            .cloned()
            .ok_or_else(|| AppError::Internal("Opened item missing".to_string()))
    }

    pub async fn close_item(&self) {
        self.state.write().await.logger.close();
    }

    /// Logs a click for the opened item against the impression it came from
    ///
    /// Skipped without any network call when the item's batch had no
    /// impression id. Failures leave the detail view open and are not retried.
    pub async fn confirm_read(&self) -> AppResult<ReadOutcome> {
        let Some(event) = self.state.write().await.logger.begin_read() else {
            return Ok(ReadOutcome::Skipped);
        };

        let result = self.api.log_click(&event).await;

        let mut state = self.state.write().await;
        state.logger.finish_read(&result);
        match result {
            Ok(_) => Ok(ReadOutcome::Logged(event)),
            Err(e) => {
                state.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Derives the current view
    pub async fn view(&self, debug: bool) -> DashboardView {
        let state = self.state.read().await;

        let mut derived = feed::derive(&FeedInputs {
            primary: state.primary.current.as_ref(),
            because_you_clicked: state.because_you_clicked.current.as_ref(),
            query: &state.query,
            prefs: state.prefs.preferences(),
            layout: self.settings.layout,
        });

        let mut opened = state.logger.opened().cloned();
        if !debug {
            derived.strip_diagnostics();
            if let Some(opened) = opened.as_mut() {
                opened.item = opened.item.without_diagnostics();
                opened.impression_id = None;
            }
        }

        DashboardView {
            anonymous_id: state.identity.anonymous_id().to_string(),
            session_id: state.identity.session_id().to_string(),
            impression_id: debug.then(|| state.primary.impression_id()).flatten(),
            because_you_clicked_impression_id: debug
                .then(|| state.because_you_clicked.impression_id())
                .flatten(),
            query: state.query.clone(),
            loading: state.primary.in_flight,
            error: state.error.clone(),
            feed: derived,
            opened,
            reading: state.logger.in_flight(),
        }
    }
}
