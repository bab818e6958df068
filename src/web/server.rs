// src/web/server.rs
use crate::config::Config;
use crate::stats::StatsSnapshot;
use crate::utils::error::TelemetryError;
use axum::{
    Router,
    extract::State,
    http::{Method, StatusCode, Uri, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

const DASHBOARD_PAGE: &str = include_str!("../../templates/dashboard.html");

/// Routes of the HTTP surface
///
/// * `GET /` and `GET /index*` - dashboard page
/// * `GET /stats.json` - current snapshot
/// * other methods on those paths - 405
/// * anything else - 404 with an empty body
pub fn router(snapshot: Arc<StatsSnapshot>) -> Router {
    Router::new()
        .route("/", get(dashboard_handler))
        .route("/stats.json", get(stats_handler))
        .fallback(fallback_handler)
        .with_state(snapshot)
}

/// Binds the configured address
pub async fn bind(config: &Config) -> Result<TcpListener, TelemetryError> {
    let address = format!("{}:{}", config.http_bind, config.http_port);
    TcpListener::bind(&address).await.map_err(|e| {
        TelemetryError::ConnectionError(format!("Failed to bind {}: {}", address, e))
    })
}

/// Serves until `token` is cancelled
pub async fn serve(
    listener: TcpListener,
    snapshot: Arc<StatsSnapshot>,
    token: CancellationToken,
) -> Result<(), TelemetryError> {
    if let Ok(addr) = listener.local_addr() {
        log::info!("HTTP stats on http://{}/stats.json", addr);
    }

    axum::serve(listener, router(snapshot))
        .with_graceful_shutdown(async move { token.cancelled().await })
        .await?;

    Ok(())
}

async fn dashboard_handler() -> Html<&'static str> {
    Html(DASHBOARD_PAGE)
}

async fn stats_handler(State(snapshot): State<Arc<StatsSnapshot>>) -> Response {
    match snapshot.snapshot() {
        Ok(body) => ([(header::CONTENT_TYPE, "application/json")], body).into_response(),
        Err(e) => {
            log::error!("Failed to serialize snapshot: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn fallback_handler(method: Method, uri: Uri) -> Response {
    if !uri.path().starts_with("/index") {
        return StatusCode::NOT_FOUND.into_response();
    }
    if method == Method::GET {
        Html(DASHBOARD_PAGE).into_response()
    } else {
        StatusCode::METHOD_NOT_ALLOWED.into_response()
    }
}
