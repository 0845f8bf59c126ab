/// HTTP client for the recommendation backend
///
/// Endpoints:
/// 1. `POST /recommendations` → one ranked batch with its impression id
/// 2. `POST /click` → status acknowledgement
/// 3. `GET /users/{anonymous_id}/recent_clicks?limit=n` → recently clicked item ids
use crate::{
    error::{AppError, AppResult},
    models::{
        ClickAck, ClickEvent, RecentClicksResponse, RecommendationRequest, RecommendationResponse,
    },
    services::recommender::{RecommendationApi, DEFAULT_RECENT_CLICKS_LIMIT},
};
use reqwest::{Client as HttpClient, Response, Url};
use serde::de::DeserializeOwned;

#[derive(Clone)]
pub struct HttpRecommendationClient {
    http_client: HttpClient,
    api_url: Url,
}

impl HttpRecommendationClient {
    pub fn new(api_url: &str) -> AppResult<Self> {
        let api_url = Url::parse(api_url)
            .map_err(|e| AppError::InvalidInput(format!("Invalid API base URL {}: {}", api_url, e)))?;

        if api_url.cannot_be_a_base() {
            return Err(AppError::InvalidInput(format!(
                "API base URL {} cannot carry a path",
                api_url
            )));
        }

        Ok(Self {
            http_client: HttpClient::new(),
            api_url,
        })
    }

    /// Appends percent-encoded path segments to the base URL
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.api_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Turns a non-success status into `RequestFailed`, then decodes the body
    async fn read_json<T: DeserializeOwned>(response: Response) -> AppResult<T> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::RequestFailed {
                status: status.as_u16(),
                body,
            });
        }

        response.json::<T>().await.map_err(AppError::from_reqwest)
    }
}

#[async_trait::async_trait]
impl RecommendationApi for HttpRecommendationClient {
    async fn fetch_recommendations(
        &self,
        request: &RecommendationRequest,
    ) -> AppResult<RecommendationResponse> {
        request.validate().map_err(AppError::InvalidInput)?;

        let url = self.endpoint(&["recommendations"]);
        let response = self
            .http_client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(AppError::from_reqwest)?;

        let batch: RecommendationResponse = Self::read_json(response).await?;

        tracing::info!(
            surface = request.surface.as_deref().unwrap_or("-"),
            impression_id = batch.impression_id.as_deref().unwrap_or("-"),
            items = batch.items.len(),
            "Recommendations fetched"
        );

        Ok(batch)
    }

    async fn log_click(&self, event: &ClickEvent) -> AppResult<ClickAck> {
        let url = self.endpoint(&["click"]);
        let response = self
            .http_client
            .post(url)
            .json(event)
            .send()
            .await
            .map_err(AppError::from_reqwest)?;

        let ack: ClickAck = Self::read_json(response).await?;

        tracing::info!(
            impression_id = %event.impression_id,
            item_id = %event.item_id,
            position = event.position,
            dwell_ms = event.dwell_ms,
            status = %ack.status,
            "Click logged"
        );

        Ok(ack)
    }

    async fn fetch_recent_clicks(
        &self,
        anonymous_id: &str,
        limit: Option<u32>,
    ) -> AppResult<Vec<String>> {
        if anonymous_id.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "anonymous_id cannot be empty".to_string(),
            ));
        }

        let limit = limit.unwrap_or(DEFAULT_RECENT_CLICKS_LIMIT);
        let url = self.endpoint(&["users", anonymous_id, "recent_clicks"]);
        let response = self
            .http_client
            .get(url)
            .query(&[("limit", limit)])
            .send()
            .await
            .map_err(AppError::from_reqwest)?;

        let recent: RecentClicksResponse = Self::read_json(response).await?;

        tracing::debug!(
            anonymous_id = %anonymous_id,
            limit,
            returned = recent.recent_clicks.len(),
            "Recent clicks fetched"
        );

        Ok(recent.recent_clicks)
    }
}
