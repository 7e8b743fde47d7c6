//! HTTP middleware.

pub mod origin;

pub use origin::{OriginValidatorLayer, OriginValidatorService};
