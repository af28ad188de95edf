//! REST API handlers for the roster server
//!
//! Every response carries `ok`. Failures are `{ "ok": false, "error": "..." }`
//! with the status code of the underlying [`Error`].

use std::collections::HashMap;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;
use crate::models::{GuideId, GuideSummary, Slot, SlotTime};
use crate::publish::{CommitRow, Preview, SlotUpdate};
use crate::scheduler::{AssignmentSource, Overrides};

use super::auth::authorize;
use super::server::AppState;

// ============================================================================
// API Response Types
// ============================================================================

/// Error wrapper rendered as `{ ok: false, error }`
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(error = %self.0, category = self.0.category().as_str(), "Request failed");
        } else {
            tracing::debug!(error = %self.0, status = status.as_u16(), "Request rejected");
        }
        (status, Json(ErrorResponse::new(self.0.to_string()))).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Simple error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub ok: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: message.into(),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub ok: bool,
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// Candidates of one day
#[derive(Debug, Serialize)]
pub struct DayAvailability {
    pub date: NaiveDate,
    pub guides: Vec<GuideSummary>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityResponse {
    pub ok: bool,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub availability: Vec<DayAvailability>,
    pub history_by_guide_id: HashMap<GuideId, usize>,
}

/// Overrides are `{date, time, guide_id}` rows; a blank guide clears one
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewRequest {
    #[serde(default)]
    pub include_afternoon: bool,
    #[serde(default)]
    pub overrides: Vec<CommitRow>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewSlot {
    pub date: NaiveDate,
    pub time: String,
    pub time_of_day: SlotTime,
    pub guide: Option<GuideSummary>,
    pub baseline: Option<GuideSummary>,
    pub source: AssignmentSource,
    pub candidates: Vec<GuideSummary>,
}

#[derive(Debug, Serialize)]
pub struct DistributionRow {
    pub id: GuideId,
    pub name: String,
    pub assigned: usize,
    pub history: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResponse {
    pub ok: bool,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub slots: Vec<PreviewSlot>,
    pub distribution: Vec<DistributionRow>,
    pub unassigned: usize,
    pub applied_overrides: usize,
    pub ignored_overrides: usize,
    pub publishable: bool,
}

impl From<&Preview> for PreviewResponse {
    fn from(preview: &Preview) -> Self {
        let effective = &preview.effective;
        Self {
            ok: true,
            start_date: preview.snapshot.range.start,
            end_date: preview.snapshot.range.end,
            slots: effective
                .slots
                .iter()
                .map(|s| PreviewSlot {
                    date: s.slot.key.date,
                    time: s.slot.key.time.format("%H:%M").to_string(),
                    time_of_day: s.slot.time_of_day,
                    guide: s.guide.clone(),
                    baseline: s.baseline.clone(),
                    source: s.source,
                    candidates: s.candidates.clone(),
                })
                .collect(),
            distribution: preview
                .loads
                .iter()
                .map(|l| DistributionRow {
                    id: l.guide.id.clone(),
                    name: l.guide.name.clone(),
                    assigned: l.assigned,
                    history: l.history,
                })
                .collect(),
            unassigned: effective.unassigned,
            applied_overrides: effective.applied_overrides,
            ignored_overrides: effective.ignored_overrides.len(),
            publishable: preview.is_publishable(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CommitRequest {
    #[serde(default)]
    pub slots: Vec<CommitRow>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitResponse {
    pub ok: bool,
    pub count: usize,
    pub month: String,
    pub notified_users: usize,
    pub tokens: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentScheduleResponse {
    pub ok: bool,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub slots: Vec<Slot>,
    pub guides: Vec<GuideSummary>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRow {
    pub id: Uuid,
    #[serde(default, alias = "guideId")]
    pub guide_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateRequest {
    #[serde(default)]
    pub updates: Vec<UpdateRow>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResponse {
    pub ok: bool,
    pub count: usize,
    pub notified_users: usize,
    pub tokens: usize,
}

// ============================================================================
// API Routes
// ============================================================================

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/publish/availability", get(get_availability))
        .route("/api/publish/preview", post(post_preview))
        .route("/api/publish/commit", post(post_commit))
        .route("/api/edit-schedule/current", get(get_current_schedule))
        .route("/api/edit-schedule/update", post(post_schedule_update))
        .with_state(state)
}

/// Decode a JSON body into the crate error type; an empty body is the default
fn parse_body<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, Error> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    Ok(serde_json::from_slice(body)?)
}

// ============================================================================
// Health Handlers
// ============================================================================

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let uptime = state.start_time.elapsed().as_secs();

    Json(HealthResponse {
        ok: true,
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: uptime,
    })
}

// ============================================================================
// Publish Handlers
// ============================================================================

async fn get_availability(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<AvailabilityResponse> {
    let ctx = authorize(&state, &headers).await?;
    let snapshot = state.service.load_availability(&ctx).await?;

    let availability = snapshot
        .candidates
        .iter()
        .map(|(date, guides)| DayAvailability {
            date: *date,
            guides: guides.clone(),
        })
        .collect();

    Ok(Json(AvailabilityResponse {
        ok: true,
        start_date: snapshot.range.start,
        end_date: snapshot.range.end,
        availability,
        history_by_guide_id: snapshot.history.as_map().clone(),
    }))
}

async fn post_preview(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<PreviewResponse> {
    let ctx = authorize(&state, &headers).await?;
    let request: PreviewRequest = parse_body(&body)?;

    let mut overrides = Overrides::new();
    for (i, row) in request.overrides.iter().enumerate() {
        match row.parse(i)? {
            (key, Some(guide)) => overrides.set(key, guide),
            (key, None) => overrides.clear(&key),
        }
    }

    let preview = state
        .service
        .preview(&ctx, request.include_afternoon, &overrides)
        .await?;

    Ok(Json(PreviewResponse::from(&preview)))
}

async fn post_commit(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<CommitResponse> {
    let ctx = authorize(&state, &headers).await?;
    let request: CommitRequest = parse_body(&body)?;

    let outcome = state.service.commit_slots(&ctx, &request.slots).await?;

    Ok(Json(CommitResponse {
        ok: true,
        count: outcome.count,
        month: outcome.month,
        notified_users: outcome.notify.users,
        tokens: outcome.notify.tokens,
    }))
}

// ============================================================================
// Edit Handlers
// ============================================================================

async fn get_current_schedule(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<CurrentScheduleResponse> {
    let ctx = authorize(&state, &headers).await?;
    let current = state.service.current_schedule(&ctx).await?;

    Ok(Json(CurrentScheduleResponse {
        ok: true,
        start_date: current.start_date,
        end_date: current.end_date,
        slots: current.slots,
        guides: current.guides,
    }))
}

async fn post_schedule_update(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<UpdateResponse> {
    let ctx = authorize(&state, &headers).await?;
    let request: UpdateRequest = parse_body(&body)?;

    let updates: Vec<SlotUpdate> = request
        .updates
        .iter()
        .map(|u| SlotUpdate::new(u.id, u.guide_id.as_deref()))
        .collect();
    let outcome = state.service.update_schedule(&ctx, &updates).await?;

    Ok(Json(UpdateResponse {
        ok: true,
        count: outcome.count,
        notified_users: outcome.notified_users(),
        tokens: outcome.tokens(),
    }))
}
