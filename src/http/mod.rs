//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, routes)
//!     → middleware/origin.rs (Origin check, 403 on reject)
//!     → websocket.rs (upgrade, echo)
//! ```

pub mod middleware;
pub mod server;
pub mod websocket;

pub use middleware::{OriginValidatorLayer, OriginValidatorService};
pub use server::{HttpServer, WS_PATH};
