/// Recommendation backend abstraction
///
/// The dashboard only ever talks to the recommender through this trait: the
/// reqwest-backed client in [`http`] in production, mocks in tests.
use crate::{
    error::AppResult,
    models::{ClickAck, ClickEvent, RecommendationRequest, RecommendationResponse},
};

pub mod http;

pub use http::HttpRecommendationClient;

/// Number of recent clicks requested when the caller does not say
pub const DEFAULT_RECENT_CLICKS_LIMIT: u32 = 10;

/// The three backend operations the dashboard consumes
///
/// None of these retry. `log_click` appends to the backend's interaction log on
/// every call, so repeating it after a transport failure may double-log; that
/// decision is left to the caller.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RecommendationApi: Send + Sync {
    /// Fetch one ranked batch for the given identity and context
    async fn fetch_recommendations(
        &self,
        request: &RecommendationRequest,
    ) -> AppResult<RecommendationResponse>;

    /// Record one click against the impression that displayed the item
    async fn log_click(&self, event: &ClickEvent) -> AppResult<ClickAck>;

    /// Item ids recently clicked by this anonymous user, in backend order
    ///
    /// `limit` falls back to [`DEFAULT_RECENT_CLICKS_LIMIT`].
    async fn fetch_recent_clicks(
        &self,
        anonymous_id: &str,
        limit: Option<u32>,
    ) -> AppResult<Vec<String>>;
}
