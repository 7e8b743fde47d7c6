//! Origin validators.
//!
//! # Responsibilities
//! - `PatternOriginValidator`: fixed pattern list parsed at construction
//! - `AllowListOriginValidator`: patterns derived per call from a live host allow-list
//! - Common decision procedure for both, exposed through `OriginPolicy`
//!
//! # Design Decisions
//! - Missing Origin is accepted (non-browser clients)
//! - Malformed Origin is rejected, never treated as missing
//! - `null` is only accepted by a catch-all pattern
//! - Decisions are pure and synchronous; no locks are held after returning

use std::sync::Arc;

use axum::http::header::ORIGIN;
use axum::http::{HeaderMap, HeaderValue};

use crate::security::allow_list::AllowListSource;
use crate::security::error::{ConfigurationError, OriginParseError, OriginRejection};
use crate::security::origin::{parse_header, HeaderOrigin};
use crate::security::pattern::{matches_any, OriginPattern};

/// Loopback hosts trusted when local bypass is enabled.
pub const LOCAL_HOSTS: [&str; 3] = ["localhost", "127.0.0.1", "[::1]"];

/// Why a request was let through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acceptance {
    /// No Origin header.
    NoOrigin,
    /// Origin matched a pattern.
    Matched,
}

impl Acceptance {
    pub fn outcome(&self) -> &'static str {
        match self {
            Acceptance::NoOrigin => "no_origin",
            Acceptance::Matched => "matched",
        }
    }
}

/// Decides whether a connection with the given Origin header may proceed.
pub trait OriginPolicy: Send + Sync + 'static {
    fn check(&self, origin: Option<&HeaderValue>) -> Result<Acceptance, OriginRejection>;

    /// Check a request's headers. More than one `Origin` value is malformed.
    fn check_headers(&self, headers: &HeaderMap) -> Result<Acceptance, OriginRejection> {
        let mut values = headers.get_all(ORIGIN).iter();
        let first = values.next();
        if values.next().is_some() {
            return Err(OriginRejection::Malformed(OriginParseError::MultipleValues));
        }
        self.check(first)
    }
}

impl<P: OriginPolicy + ?Sized> OriginPolicy for Arc<P> {
    fn check(&self, origin: Option<&HeaderValue>) -> Result<Acceptance, OriginRejection> {
        (**self).check(origin)
    }
}

impl<P: OriginPolicy + ?Sized> OriginPolicy for Box<P> {
    fn check(&self, origin: Option<&HeaderValue>) -> Result<Acceptance, OriginRejection> {
        (**self).check(origin)
    }
}

/// Run the shared decision procedure against a pattern set.
pub fn evaluate(
    patterns: &[OriginPattern],
    origin: Option<&HeaderValue>,
) -> Result<Acceptance, OriginRejection> {
    match parse_header(origin) {
        HeaderOrigin::Absent => Ok(Acceptance::NoOrigin),
        HeaderOrigin::Malformed(e) => Err(OriginRejection::Malformed(e)),
        HeaderOrigin::Opaque => {
            if patterns.iter().any(OriginPattern::is_any) {
                Ok(Acceptance::Matched)
            } else {
                Err(OriginRejection::Opaque)
            }
        }
        HeaderOrigin::Present(origin) => {
            if matches_any(patterns, &origin) {
                Ok(Acceptance::Matched)
            } else {
                Err(OriginRejection::NotAllowed {
                    origin: origin.to_string(),
                })
            }
        }
    }
}

/// Validator over an explicit, ordered list of origin patterns.
#[derive(Debug, Clone)]
pub struct PatternOriginValidator {
    patterns: Vec<OriginPattern>,
}

impl PatternOriginValidator {
    /// Parse every pattern. Fails on the first structurally invalid one.
    pub fn new<I, S>(patterns: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| OriginPattern::parse(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn patterns(&self) -> &[OriginPattern] {
        &self.patterns
    }

    /// Check a raw origin string as if it were the header value.
    pub fn is_allowed(&self, origin: &str) -> bool {
        match HeaderValue::from_str(origin) {
            Ok(value) => self.check(Some(&value)).is_ok(),
            Err(_) => false,
        }
    }
}

impl OriginPolicy for PatternOriginValidator {
    fn check(&self, origin: Option<&HeaderValue>) -> Result<Acceptance, OriginRejection> {
        evaluate(&self.patterns, origin)
    }
}

/// Validator driven by the application's host allow-list.
///
/// The list is read on every call; entries are scheme- and port-agnostic.
#[derive(Debug, Clone)]
pub struct AllowListOriginValidator<A> {
    source: A,
}

impl<A: AllowListSource> AllowListOriginValidator<A> {
    pub fn new(source: A) -> Self {
        Self { source }
    }

    /// Patterns in effect right now, local bypass included.
    pub fn effective_patterns(&self) -> Vec<OriginPattern> {
        let list = self.source.snapshot();

        let mut patterns: Vec<OriginPattern> = list
            .hosts
            .iter()
            .filter_map(|entry| {
                let pattern = OriginPattern::from_allowed_host(entry);
                if pattern.is_none() {
                    tracing::debug!(entry = %entry, "Skipping unusable allow-list entry");
                }
                pattern
            })
            .collect();

        if list.local_bypass {
            patterns.extend(
                LOCAL_HOSTS
                    .iter()
                    .filter_map(|h| OriginPattern::from_allowed_host(h)),
            );
        }

        patterns
    }
}

impl<A: AllowListSource> OriginPolicy for AllowListOriginValidator<A> {
    fn check(&self, origin: Option<&HeaderValue>) -> Result<Acceptance, OriginRejection> {
        evaluate(&self.effective_patterns(), origin)
    }
}
