/// HTTP API server mode
/// Serves the same snapshots and summaries as the TUI over REST and WebSocket

#[cfg(feature = "server")]
pub mod routes;

#[cfg(feature = "server")]
pub mod handlers;

#[cfg(feature = "server")]
pub mod websocket;

#[cfg(feature = "server")]
pub use handlers::AppState;

#[cfg(feature = "server")]
pub use routes::create_router;

#[cfg(feature = "server")]
pub async fn run(host: String, port: u16, enable_cors: bool, config: &crate::utils::AppConfig) -> anyhow::Result<()> {
    use anyhow::Context;
    use std::net::SocketAddr;

    use crate::core::{open_source, RefreshLoop};
    use crate::utils::format_duration;

    let source = open_source(config.feed, &config.feed_options())
        .with_context(|| format!("Failed to open {} feed", config.feed))?;

    let mut refresh = RefreshLoop::new(config.refresh_interval);
    refresh
        .activate(source)
        .with_context(|| format!("Failed to load initial snapshot from {} feed", config.feed))?;

    let app = create_router(AppState::new(refresh.subscribe()), enable_cors);

    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", host, port))?;

    println!("🌱 Smart City Dashboard Server");
    println!("   🔌 API:     http://{}/api", addr);
    println!("   📡 Feed:    {} (every {})", config.feed, format_duration(refresh.period()));
    println!("   🌐 CORS:    {}", if enable_cors { "permissive" } else { "disabled" });
    println!();
    println!("📚 API Endpoints:");
    println!("   GET  /api/snapshot  - Current metrics snapshot");
    println!("   GET  /api/summary   - Derived dashboard values");
    println!("   GET  /api/health    - Health check");
    println!("   GET  /api/version   - Build version");
    println!("   GET  /ws/snapshot   - WebSocket stream, one message per refresh");
    println!();

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(%addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    refresh.deactivate();
    tracing::info!("HTTP server stopped");

    Ok(())
}

#[cfg(feature = "server")]
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}
