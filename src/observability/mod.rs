//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Origin middleware and WebSocket handlers produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (decision and connection counters)
//!
//! Consumers:
//!     → stdout (fmt subscriber)
//!     → Metrics endpoint (Prometheus scrape)
//! ```

pub mod logging;
pub mod metrics;
