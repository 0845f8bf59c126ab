use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::Display;

mod preferences;

pub use preferences::{PreferenceKind, Preferences};

/// How the detail view was invoked when a click is logged
pub const OPEN_TYPE_MODAL_READ: &str = "modal_read";

// ============================================================================
// Recommendation API Types
// ============================================================================

/// Body of `POST /recommendations`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RecommendationRequest {
    pub anonymous_id: String,
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
    /// Upper bound on returned items; the backend may return fewer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    /// Passed through to the ranker unmodified
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surface: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
}

impl RecommendationRequest {
    pub fn new(anonymous_id: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            anonymous_id: anonymous_id.into(),
            session_id: session_id.into(),
            ..Default::default()
        }
    }

    /// Checks the fields the backend requires before anything goes on the wire
    pub fn validate(&self) -> Result<(), String> {
        if self.anonymous_id.trim().is_empty() {
            return Err("anonymous_id cannot be empty".to_string());
        }
        if self.session_id.trim().is_empty() {
            return Err("session_id cannot be empty".to_string());
        }
        if self.page_size == Some(0) {
            return Err("page_size must be positive".to_string());
        }
        Ok(())
    }
}

/// One ranked content entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendationItem {
    pub item_id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    /// 1-based rank within the batch
    pub position: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retrieval_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_score: Option<f64>,
    /// Rank at the retrieval stage, before re-ranking
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retrieval_pos: Option<u32>,
}

/// Untitled items arrive as `"title": null`
fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl RecommendationItem {
    pub fn new(item_id: impl Into<String>, title: impl Into<String>, position: u32) -> Self {
        Self {
            item_id: item_id.into(),
            title: title.into(),
            position,
            retrieval_score: None,
            rank_score: None,
            final_score: None,
            retrieval_pos: None,
        }
    }

    /// Same item with the score diagnostics stripped, for non-debug display
    pub fn without_diagnostics(&self) -> Self {
        Self {
            retrieval_score: None,
            rank_score: None,
            final_score: None,
            retrieval_pos: None,
            ..self.clone()
        }
    }
}

/// One served batch. Replaced wholesale by the next fetch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendationResponse {
    pub impression_id: Option<String>,
    #[serde(default)]
    pub items: Vec<RecommendationItem>,
}

impl RecommendationResponse {
    pub fn find(&self, item_id: &str) -> Option<&RecommendationItem> {
        self.items.iter().find(|item| item.item_id == item_id)
    }
}

/// Body of `POST /click`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClickEvent {
    pub impression_id: String,
    pub item_id: String,
    pub position: u32,
    pub dwell_ms: u64,
    pub open_type: String,
}

/// Response of `POST /click`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClickAck {
    #[serde(default)]
    pub status: String,
}

/// Response of `GET /users/{anonymous_id}/recent_clicks`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecentClicksResponse {
    pub anonymous_id: String,
    #[serde(default)]
    pub recent_clicks: Vec<String>,
}

// ============================================================================
// View-model Types
// ============================================================================

/// Primary layout of the dashboard
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// Two horizontal rows ("For You", "Trending Now")
    #[default]
    Feed,
    /// Three columns split by position range
    Board,
}

impl Layout {
    /// Surface tag sent with the primary fetch for this layout
    pub fn surface(&self) -> Surface {
        match self {
            Layout::Feed => Surface::ForYou,
            Layout::Board => Surface::EditorialBoard,
        }
    }

    /// Referrer sent with the primary fetch for this layout
    pub fn referrer(&self) -> &'static str {
        match self {
            Layout::Feed => "home",
            Layout::Board => "dashboard",
        }
    }
}

/// UI placement requesting a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Surface {
    ForYou,
    EditorialBoard,
    BecauseYouClicked,
}

impl Display for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Surface::ForYou => write!(f, "for_you"),
            Surface::EditorialBoard => write!(f, "editorial_board"),
            Surface::BecauseYouClicked => write!(f, "because_you_clicked"),
        }
    }
}

/// Which held batch an item was opened from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BatchSource {
    Primary,
    BecauseYouClicked,
}
