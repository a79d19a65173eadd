/// API Routes definition

use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::handlers::{self, AppState};
use super::websocket;

pub fn create_router(state: AppState, enable_cors: bool) -> Router {
    // Everything is read-only
    let mut app = Router::new()
        .route("/api/snapshot", get(handlers::get_snapshot))
        .route("/api/summary", get(handlers::get_summary))
        .route("/api/health", get(handlers::health_check))
        .route("/api/version", get(handlers::get_version_info))
        .route("/ws/snapshot", get(websocket::ws_snapshot_handler))
        // Add tracing middleware
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if enable_cors {
        app = app.layer(CorsLayer::permissive());
    }

    app
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::time::Duration;
    use tokio::sync::watch;
    use tower::ServiceExt;

    use crate::core::feed::ReferenceFeed;
    use crate::core::RefreshLoop;

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    fn live_router(refresh: &mut RefreshLoop) -> Router {
        refresh.activate(ReferenceFeed::new()).unwrap();
        create_router(AppState::new(refresh.subscribe()), false)
    }

    #[tokio::test]
    async fn test_summary_route() {
        let mut refresh = RefreshLoop::new(Duration::from_secs(60));
        let (status, json) = get_json(live_router(&mut refresh), "/api/summary").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["total_transit_riders"], 53000);
        assert_eq!(json["data"]["renewable_share_percent"], 90);
        assert_eq!(json["data"]["air_quality_category"], "Good");
    }

    #[tokio::test]
    async fn test_snapshot_route() {
        let mut refresh = RefreshLoop::new(Duration::from_secs(60));
        let (status, json) = get_json(live_router(&mut refresh), "/api/snapshot").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["air_quality_index"], 65);
        assert_eq!(json["data"]["energy_mix"].as_array().unwrap().len(), 6);
        assert_eq!(json["data"]["mobility_network"]["stations"][3]["status"], "OutOfService");
    }

    #[tokio::test]
    async fn test_routes_without_snapshot() {
        let (_tx, rx) = watch::channel(None);
        let app = create_router(AppState::new(rx), true);

        let (status, json) = get_json(app.clone(), "/api/summary").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json["success"], false);
        assert!(json["error"].as_str().unwrap().contains("No snapshot"));

        let (status, json) = get_json(app, "/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["status"], "waiting");
    }

    #[tokio::test]
    async fn test_version_route() {
        let (_tx, rx) = watch::channel(None);
        let (status, json) = get_json(create_router(AppState::new(rx), false), "/api/version").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["name"], "smartcity-dash");
        assert!(json["data"]["version"].as_str().unwrap().starts_with(env!("CARGO_PKG_VERSION")));
    }
}
