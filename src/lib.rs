//! Origin validation middleware for WebSocket upgrades.
//!
//! Rejects cross-site WebSocket connections by checking the `Origin` header
//! against either a fixed list of origin patterns or the application's live
//! host allow-list.
//!
//! ```no_run
//! use axum::{routing::get, Router};
//! use origin_guard::http::websocket::ws_echo_handler;
//! use origin_guard::{OriginValidatorLayer, PatternOriginValidator};
//!
//! # fn build() -> Result<Router, origin_guard::ConfigurationError> {
//! let validator = PatternOriginValidator::new([".example.com", "http://localhost:3000"])?;
//! let app: Router = Router::new()
//!     .route("/ws", get(ws_echo_handler))
//!     .route_layer(OriginValidatorLayer::new(validator));
//! # Ok(app)
//! # }
//! ```

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::GuardConfig;
pub use http::{HttpServer, OriginValidatorLayer};
pub use lifecycle::Shutdown;
pub use security::{
    AllowListOriginValidator, ConfigurationError, HostAllowList, OriginPolicy, OriginRejection,
    PatternOriginValidator, SharedAllowList,
};
