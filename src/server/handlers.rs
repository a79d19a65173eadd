/// API Request Handlers
/// Read the current snapshot from the refresh loop and wrap it in `ApiResponse`

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;

use crate::core::derived::DashboardSummary;
use crate::core::refresh::SharedSnapshot;
use crate::core::MetricsSnapshot;
use crate::utils::APP_NAME;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Serialize)]
pub struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn error(msg: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg),
        }
    }
}

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, (StatusCode, Json<ApiResponse<()>>)>;

/// Shared by every handler; a read-only view of the refresh loop's slot
#[derive(Clone)]
pub struct AppState {
    snapshots: watch::Receiver<SharedSnapshot>,
}

impl AppState {
    pub fn new(snapshots: watch::Receiver<SharedSnapshot>) -> Self {
        Self { snapshots }
    }

    pub fn current(&self) -> SharedSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SharedSnapshot> {
        self.snapshots.clone()
    }
}

fn no_snapshot() -> (StatusCode, Json<ApiResponse<()>>) {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ApiResponse::error("No snapshot available yet".to_string())),
    )
}

// ============================================================================
// Snapshot Handlers
// ============================================================================

pub async fn get_snapshot(State(state): State<AppState>) -> ApiResult<MetricsSnapshot> {
    let snapshot = state.current().ok_or_else(no_snapshot)?;
    Ok(Json(ApiResponse::ok(MetricsSnapshot::clone(&snapshot))))
}

pub async fn get_summary(State(state): State<AppState>) -> ApiResult<DashboardSummary> {
    let snapshot = state.current().ok_or_else(no_snapshot)?;
    Ok(Json(ApiResponse::ok(DashboardSummary::from_snapshot(&snapshot))))
}

// ============================================================================
// Health & Version
// ============================================================================

#[derive(Serialize)]
pub struct HealthInfo {
    status: &'static str,
    generated_at: Option<DateTime<Utc>>,
}

pub async fn health_check(State(state): State<AppState>) -> Json<ApiResponse<HealthInfo>> {
    let generated_at = state.current().map(|s| s.generated_at);
    let status = if generated_at.is_some() { "healthy" } else { "waiting" };

    Json(ApiResponse::ok(HealthInfo { status, generated_at }))
}

#[derive(Serialize)]
pub struct VersionInfo {
    name: &'static str,
    version: &'static str,
}

pub async fn get_version_info() -> Json<ApiResponse<VersionInfo>> {
    Json(ApiResponse::ok(VersionInfo {
        name: APP_NAME,
        version: crate::cli::get_version(),
    }))
}
