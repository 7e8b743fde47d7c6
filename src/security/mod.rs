//! Security subsystem: Origin validation for WebSocket upgrades.
//!
//! # Data Flow
//! ```text
//! Incoming upgrade request:
//!     → origin.rs (classify Origin header: absent / null / parsed / malformed)
//!     → validator.rs (pick pattern set: fixed list or live allow-list)
//!     → pattern.rs (match origin against each pattern)
//!     → accept (delegate) or reject (403)
//! ```
//!
//! # Design Decisions
//! - Fail closed: a garbled Origin is rejected, never treated as absent
//! - Patterns are parsed once; allow-list entries are converted per call
//! - No shared mutable state inside validators

pub mod allow_list;
pub mod error;
pub mod origin;
pub mod pattern;
pub mod validator;

pub use allow_list::{AllowListSource, HostAllowList, SharedAllowList};
pub use error::{ConfigurationError, OriginParseError, OriginRejection};
pub use origin::{HeaderOrigin, OriginSpec};
pub use pattern::{HostPattern, OriginPattern};
pub use validator::{
    Acceptance, AllowListOriginValidator, OriginPolicy, PatternOriginValidator, LOCAL_HOSTS,
};
