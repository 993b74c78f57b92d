//! Axum application builder.

use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::routes::{control, read};
use crate::state::ServerState;

/// Assemble the router over a controller handle.
pub fn create_app(state: ServerState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(Duration::from_secs(3600));

    Router::new()
        // Read surface
        .route("/state", get(read::get_state))
        .route("/instruments", get(read::get_instruments))
        .route("/agents", get(read::get_agents))
        .route("/metrics", get(read::get_metrics))
        .route("/config", get(read::get_config).post(control::post_config))
        .route("/orderbook/{symbol}", get(read::get_order_book))
        .route("/trades", get(read::get_trades))
        .route("/news/recent", get(read::get_news_recent))
        .route("/news/history", get(read::get_news_history))
        .route("/candles", get(read::get_candles_bulk))
        .route("/candles/{symbol}", get(read::get_candles))
        .route("/stream", get(read::stream))
        // Write surface
        .route("/control", post(control::post_control))
        .route("/news", post(control::post_news))
        .route("/orders", post(control::post_order))
        .route("/reinitialize", post(control::post_reinitialize))
        .route("/populate", post(control::post_populate))
        .route("/restore", post(control::post_restore))
        .route("/export", post(control::post_export))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Bind address configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use simulation::{Controller, SimConfig};

    #[test]
    fn test_app_builds() {
        let controller = Controller::new(SimConfig::default()).unwrap();
        let state = ServerState::new(controller);
        let _app = create_app(state);
    }

    #[test]
    fn test_bind_addr() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr(), "0.0.0.0:8080");
    }
}
