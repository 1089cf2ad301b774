//! HTTP exporter for controller metrics.

use super::{MetricsRegistry, MetricsSnapshot};
use crate::controller::StatsSnapshot;
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind metrics listener: {0}")]
    Bind(#[from] std::io::Error),

    #[error("metrics server stopped: {0}")]
    Serve(String),
}

/// Where the exporter listens.
#[derive(Debug, Clone)]
pub struct MetricsServerConfig {
    pub bind_addr: SocketAddr,
}

impl Default for MetricsServerConfig {
    fn default() -> Self {
        Self::with_port(9090)
    }
}

impl MetricsServerConfig {
    pub fn with_port(port: u16) -> Self {
        Self {
            bind_addr: ([127, 0, 0, 1], port).into(),
        }
    }
}

/// Registry plus the session state last pushed into it.
pub struct MetricsState {
    registry: MetricsRegistry,
    session_running: bool,
}

impl MetricsState {
    /// Copies controller counters into the registry.
    pub fn update(&mut self, stats: &StatsSnapshot) {
        self.registry.update(&MetricsSnapshot::from_stats(stats));
        self.session_running = stats.is_running;
    }
}

type SharedState = Arc<RwLock<MetricsState>>;

/// Serves `/metrics` in Prometheus text format and `/health`, which
/// answers 503 while the capture session is not running.
pub struct MetricsServer {
    config: MetricsServerConfig,
    state: SharedState,
}

impl MetricsServer {
    pub fn new(config: MetricsServerConfig, registry: MetricsRegistry) -> Self {
        Self {
            config,
            state: Arc::new(RwLock::new(MetricsState {
                registry,
                session_running: false,
            })),
        }
    }

    /// Handle for pushing updates while the server runs.
    pub fn state(&self) -> SharedState {
        Arc::clone(&self.state)
    }

    /// Runs until the listener fails.
    pub async fn run(self) -> Result<(), ServerError> {
        let app = Router::new()
            .route("/metrics", get(metrics_handler))
            .route("/health", get(health_handler))
            .layer(CorsLayer::permissive())
            .with_state(self.state);

        let listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!(addr = %self.config.bind_addr, "Metrics exporter listening");

        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Serve(e.to_string()))
    }
}

async fn metrics_handler(State(state): State<SharedState>) -> impl IntoResponse {
    let state = state.read().await;

    match state.registry.encode() {
        Ok(output) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            output,
        ),
        Err(e) => {
            tracing::warn!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain; charset=utf-8")],
                format!("Failed to encode metrics: {}", e),
            )
        }
    }
}

async fn health_handler(State(state): State<SharedState>) -> impl IntoResponse {
    if state.read().await.session_running {
        (StatusCode::OK, "running")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "session not running")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_binds_loopback() {
        let config = MetricsServerConfig::default();
        assert_eq!(config.bind_addr.port(), 9090);
        assert!(config.bind_addr.ip().is_loopback());
    }

    #[test]
    fn test_state_tracks_running_flag() {
        let server = MetricsServer::new(
            MetricsServerConfig::with_port(0),
            MetricsRegistry::new().unwrap(),
        );
        let state = server.state();

        state.blocking_write().update(&StatsSnapshot {
            captures_delivered: 2,
            is_running: true,
            ..Default::default()
        });

        let state = state.blocking_read();
        assert!(state.session_running);
        assert!(state
            .registry
            .encode()
            .unwrap()
            .contains("doc_camera_captures_delivered_total 2"));
    }
}
