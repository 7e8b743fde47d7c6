//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the guarded WebSocket route
//! - Choose the origin validator from configuration
//! - Apply live allow-list updates from the config watcher
//! - Serve until shutdown is signalled

use std::io;

use axum::{http::StatusCode, response::IntoResponse, routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::trace::TraceLayer;

use crate::config::{GuardConfig, OriginMode};
use crate::http::middleware::OriginValidatorLayer;
use crate::http::websocket::ws_echo_handler;
use crate::lifecycle::shutdown;
use crate::security::{
    AllowListOriginValidator, ConfigurationError, PatternOriginValidator, SharedAllowList,
};

/// Path of the guarded WebSocket endpoint.
pub const WS_PATH: &str = "/ws";

/// HTTP server hosting the origin-guarded WebSocket endpoint.
pub struct HttpServer {
    router: Router,
    config: GuardConfig,
    allow_list: SharedAllowList,
}

impl HttpServer {
    /// Build the server. Fails if a configured origin pattern is invalid.
    pub fn new(config: GuardConfig) -> Result<Self, ConfigurationError> {
        let allow_list = SharedAllowList::new(config.origin.host_allow_list());
        let router = Self::build_router(&config, allow_list.clone())?;
        Ok(Self {
            router,
            config,
            allow_list,
        })
    }

    fn build_router(
        config: &GuardConfig,
        allow_list: SharedAllowList,
    ) -> Result<Router, ConfigurationError> {
        let ws = Router::new().route(WS_PATH, get(ws_echo_handler));

        let ws = match config.origin.mode {
            OriginMode::Patterns => {
                let validator = PatternOriginValidator::new(&config.origin.allowed_origins)?;
                tracing::info!(
                    patterns = validator.patterns().len(),
                    "Origin validation: pattern list"
                );
                ws.route_layer(OriginValidatorLayer::new(validator))
            }
            OriginMode::AllowedHosts => {
                tracing::info!(
                    hosts = config.origin.allowed_hosts.len(),
                    debug = config.origin.debug,
                    "Origin validation: host allow-list"
                );
                let validator = AllowListOriginValidator::new(allow_list);
                ws.route_layer(OriginValidatorLayer::new(validator))
            }
        };

        Ok(Router::new()
            .route("/health", get(health_handler))
            .merge(ws)
            .layer(TraceLayer::new_for_http()))
    }

    /// Handle to the live allow-list. Updates apply to the next handshake.
    pub fn allow_list(&self) -> SharedAllowList {
        self.allow_list.clone()
    }

    /// Serve on `listener` until `shutdown` fires.
    ///
    /// Configs arriving on `config_updates` replace the host allow-list.
    pub async fn run(
        self,
        listener: TcpListener,
        config_updates: mpsc::UnboundedReceiver<GuardConfig>,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        tokio::spawn(apply_config_updates(
            self.allow_list.clone(),
            self.config.origin.mode,
            config_updates,
        ));

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown::wait(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn apply_config_updates(
    allow_list: SharedAllowList,
    mode: OriginMode,
    mut updates: mpsc::UnboundedReceiver<GuardConfig>,
) {
    while let Some(config) = updates.recv().await {
        if config.origin.mode != mode {
            tracing::warn!("origin.mode changed; restart required to switch validators");
        }
        if mode == OriginMode::Patterns {
            tracing::warn!("origin.allowed_origins is fixed at startup; restart to apply changes");
        }

        let list = config.origin.host_allow_list();
        tracing::info!(
            hosts = list.hosts.len(),
            debug = list.local_bypass,
            "Host allow-list updated"
        );
        allow_list.store(list);
    }
}

async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}
