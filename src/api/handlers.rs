use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::models::{BatchSource, ClickEvent, PreferenceKind, Preferences};
use crate::services::{DashboardView, OpenedItem, ReadOutcome};

use super::AppState;

// Request/Response types

#[derive(Debug, Default, Deserialize)]
pub struct ViewParams {
    /// Include score diagnostics and impression ids
    #[serde(default)]
    pub debug: bool,
}

#[derive(Debug, Deserialize)]
pub struct SetQueryRequest {
    pub query: String,
}

#[derive(Debug, Deserialize)]
pub struct OpenItemRequest {
    #[serde(default = "default_source")]
    pub source: BatchSource,
    pub item_id: String,
}

fn default_source() -> BatchSource {
    BatchSource::Primary
}

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub item_id: String,
    pub kind: PreferenceKind,
    pub member: bool,
}

#[derive(Debug, Serialize)]
pub struct ReadResponse {
    /// False when there was no impression to log against
    pub logged: bool,
    pub event: Option<ClickEvent>,
}

impl From<ReadOutcome> for ReadResponse {
    fn from(outcome: ReadOutcome) -> Self {
        match outcome {
            ReadOutcome::Logged(event) => Self {
                logged: true,
                event: Some(event),
            },
            ReadOutcome::Skipped => Self {
                logged: false,
                event: None,
            },
        }
    }
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// Current derived view
pub async fn get_view(
    State(state): State<AppState>,
    Query(params): Query<ViewParams>,
) -> Json<DashboardView> {
    Json(state.controller.view(params.debug).await)
}

/// Reload the primary batch and the because-you-clicked row
///
/// Backend failures do not fail this request; they show up in the view's
/// `error` field.
pub async fn refresh(
    State(state): State<AppState>,
    Query(params): Query<ViewParams>,
) -> Json<DashboardView> {
    state.controller.refresh().await;
    Json(state.controller.view(params.debug).await)
}

pub async fn new_session(
    State(state): State<AppState>,
    Query(params): Query<ViewParams>,
) -> Json<DashboardView> {
    state.controller.new_session().await;
    Json(state.controller.view(params.debug).await)
}

pub async fn new_user(
    State(state): State<AppState>,
    Query(params): Query<ViewParams>,
) -> Json<DashboardView> {
    state.controller.new_user().await;
    Json(state.controller.view(params.debug).await)
}

/// Replace the search query
pub async fn set_query(
    State(state): State<AppState>,
    Query(params): Query<ViewParams>,
    Json(request): Json<SetQueryRequest>,
) -> Json<DashboardView> {
    state.controller.set_query(request.query).await;
    Json(state.controller.view(params.debug).await)
}

pub async fn dismiss_error(State(state): State<AppState>) -> StatusCode {
    state.controller.dismiss_error().await;
    StatusCode::NO_CONTENT
}

pub async fn get_preferences(State(state): State<AppState>) -> Json<Preferences> {
    Json(state.controller.preferences().await)
}

/// Flip liked/saved membership for one item
pub async fn toggle_preference(
    State(state): State<AppState>,
    Path((kind, item_id)): Path<(PreferenceKind, String)>,
) -> Json<ToggleResponse> {
    let member = state.controller.toggle_preference(kind, &item_id).await;
    Json(ToggleResponse {
        item_id,
        kind,
        member,
    })
}

pub async fn hide_item(
    State(state): State<AppState>,
    Path(item_id): Path<String>,
) -> Json<Preferences> {
    state.controller.hide(&item_id).await;
    Json(state.controller.preferences().await)
}

pub async fn unhide_all(State(state): State<AppState>) -> Json<Preferences> {
    state.controller.unhide_all().await;
    Json(state.controller.preferences().await)
}

/// Open the detail view for an item of the primary or secondary batch
pub async fn open_item(
    State(state): State<AppState>,
    Json(request): Json<OpenItemRequest>,
) -> AppResult<Json<OpenedItem>> {
    let opened = state
        .controller
        .open_item(request.source, &request.item_id)
        .await?;
    Ok(Json(opened))
}

/// Confirm the opened item was read, logging a click with its dwell time
pub async fn confirm_read(State(state): State<AppState>) -> AppResult<Json<ReadResponse>> {
    let outcome = state.controller.confirm_read().await?;
    Ok(Json(outcome.into()))
}

pub async fn close_item(State(state): State<AppState>) -> StatusCode {
    state.controller.close_item().await;
    StatusCode::NO_CONTENT
}
