use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    error::AppResult,
    models::{BatchSource, ClickEvent, RecommendationItem, OPEN_TYPE_MODAL_READ},
    services::recommender::RecommendationApi,
};

/// Source of "now" for dwell measurement
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// The item currently shown in the detail view
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OpenedItem {
    pub item: RecommendationItem,
    pub source: BatchSource,
    /// Impression of the batch the item was opened from, captured at open time
    pub impression_id: Option<String>,
    pub opened_at: DateTime<Utc>,
}

/// Result of a confirm-read action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// One click event was accepted by the backend
    Logged(ClickEvent),
    /// Nothing to log against: no item open, or its batch had no impression id
    Skipped,
}

/// Tracks the open detail view and turns "read" confirmations into click events
///
/// A read has two halves so a shared owner can release its lock while the
/// click is on the wire: [`begin_read`] builds the event and raises the
/// in-flight flag, [`finish_read`] lowers it. [`confirm_read`] runs both
/// around the network call for single owners.
///
/// [`begin_read`]: InteractionLogger::begin_read
/// [`finish_read`]: InteractionLogger::finish_read
/// [`confirm_read`]: InteractionLogger::confirm_read
pub struct InteractionLogger {
    clock: Box<dyn Clock>,
    opened: Option<OpenedItem>,
    in_flight: bool,
}

impl Default for InteractionLogger {
    fn default() -> Self {
        Self::new(Box::new(SystemClock))
    }
}

impl InteractionLogger {
    pub fn new(clock: Box<dyn Clock>) -> Self {
        Self {
            clock,
            opened: None,
            in_flight: false,
        }
    }

    pub fn opened(&self) -> Option<&OpenedItem> {
        self.opened.as_ref()
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    /// Opens the detail view; replaces whatever was open before
    ///
    /// An empty impression id counts as none.
    pub fn open(&mut self, item: RecommendationItem, source: BatchSource, impression_id: Option<String>) {
        tracing::debug!(item_id = %item.item_id, ?source, "Item opened");
        self.opened = Some(OpenedItem {
            item,
            source,
            impression_id: impression_id.filter(|id| !id.is_empty()),
            opened_at: self.clock.now(),
        });
    }

    pub fn close(&mut self) {
        self.opened = None;
    }

    /// Builds the click event for the open item and marks the read in flight
    ///
    /// Returns `None` when there is nothing to send. A second call while a
    /// read is in flight also returns `None`.
    pub fn begin_read(&mut self) -> Option<ClickEvent> {
        if self.in_flight {
            return None;
        }

        let opened = self.opened.as_ref()?;
        let Some(impression_id) = opened.impression_id.clone() else {
            tracing::debug!(item_id = %opened.item.item_id, "No impression id, click not logged");
            return None;
        };

        let elapsed = self.clock.now() - opened.opened_at;
        let dwell_ms = elapsed.num_milliseconds().max(0) as u64;

        self.in_flight = true;
        Some(ClickEvent {
            impression_id,
            item_id: opened.item.item_id.clone(),
            position: opened.item.position,
            dwell_ms,
            open_type: OPEN_TYPE_MODAL_READ.to_string(),
        })
    }

    /// Clears the in-flight flag. The detail view stays open either way.
    pub fn finish_read<T>(&mut self, result: &AppResult<T>) {
        self.in_flight = false;
        if let Err(e) = result {
            tracing::warn!(error = %e, "Click logging failed");
        }
    }

    /// Logs one click for the open item, if it has an impression id
    pub async fn confirm_read(&mut self, api: &dyn RecommendationApi) -> AppResult<ReadOutcome> {
        let Some(event) = self.begin_read() else {
            return Ok(ReadOutcome::Skipped);
        };

        let result = api.log_click(&event).await;
        self.finish_read(&result);
        result.map(|_| ReadOutcome::Logged(event))
    }
}
