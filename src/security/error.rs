//! Origin validation error and rejection types.

use thiserror::Error;

/// Reasons an origin string (header value or pattern) fails to parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OriginParseError {
    /// Header value or pattern is empty.
    #[error("origin is empty")]
    Empty,

    /// Header bytes are not visible ASCII.
    #[error("origin is not visible ASCII")]
    NonAscii,

    /// Header carries more than one origin.
    #[error("origin contains whitespace")]
    Whitespace,

    /// Request carries more than one Origin header.
    #[error("multiple Origin headers")]
    MultipleValues,

    /// Scheme is not a valid URI scheme token.
    #[error("invalid scheme '{0}'")]
    InvalidScheme(String),

    /// No host component.
    #[error("missing host")]
    MissingHost,

    /// Host contains characters not allowed in a hostname or IP literal.
    #[error("invalid host '{0}'")]
    InvalidHost(String),

    /// Port is empty, not numeric, or out of range.
    #[error("invalid port '{0}'")]
    InvalidPort(String),

    /// Path, query, fragment or userinfo present.
    #[error("unexpected path, query, fragment or userinfo")]
    ExtraComponents,
}

/// Raised while building a validator from configured pattern strings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("invalid origin pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: OriginParseError,
    },
}

/// Why a request was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OriginRejection {
    /// Origin header present but unparseable.
    #[error("malformed Origin header: {0}")]
    Malformed(OriginParseError),

    /// Opaque `null` origin without a catch-all pattern.
    #[error("opaque origin 'null' is not allowed")]
    Opaque,

    /// Well-formed origin that matched no pattern.
    #[error("origin '{origin}' is not allowed")]
    NotAllowed { origin: String },
}

impl OriginRejection {
    /// Short label used for metrics and structured logs.
    pub fn outcome(&self) -> &'static str {
        match self {
            OriginRejection::Malformed(_) => "malformed",
            OriginRejection::Opaque => "opaque",
            OriginRejection::NotAllowed { .. } => "not_allowed",
        }
    }
}
