//! Origin header parsing.
//!
//! # Responsibilities
//! - Split `[scheme://]host[:port]` into its components
//! - Case-fold scheme and host
//! - Classify a raw `Origin` header as absent, opaque, present or malformed
//!
//! # Design Decisions
//! - Parsing never panics: every failure is an `OriginParseError`
//! - Path, query, fragment and userinfo make an origin malformed
//! - Missing ports are resolved to the scheme default at match time

use std::fmt;

use axum::http::HeaderValue;

use crate::security::error::OriginParseError;

/// A well-formed origin taken from a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginSpec {
    scheme: Option<String>,
    host: String,
    port: Option<u16>,
}

/// Classification of a request's `Origin` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderOrigin {
    /// No header, or an empty one. Non-browser client.
    Absent,
    /// The literal `null` sent for sandboxed or privacy-sensitive contexts.
    Opaque,
    /// Parsed origin.
    Present(OriginSpec),
    /// Header present but unusable.
    Malformed(OriginParseError),
}

impl OriginSpec {
    /// Parse an origin of the form `scheme://host[:port]` or `host[:port]`.
    pub fn parse(raw: &str) -> Result<Self, OriginParseError> {
        let parts = split_origin(raw)?;
        if parts.host.starts_with('.') {
            return Err(OriginParseError::InvalidHost(parts.host.to_string()));
        }

        Ok(Self {
            scheme: parts.scheme.map(str::to_ascii_lowercase),
            host: parts.host.to_ascii_lowercase(),
            port: parts.port,
        })
    }

    /// Lowercase scheme, if the origin carried one.
    pub fn scheme(&self) -> Option<&str> {
        self.scheme.as_deref()
    }

    /// Lowercase host. IPv6 literals keep their brackets.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Port exactly as written in the origin.
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Explicit port, or the well-known default for the scheme.
    pub fn effective_port(&self) -> Option<u16> {
        self.port.or_else(|| self.scheme().and_then(default_port))
    }
}

impl fmt::Display for OriginSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(scheme) = &self.scheme {
            write!(f, "{}://", scheme)?;
        }
        write!(f, "{}", self.host)?;
        if let Some(port) = self.port {
            write!(f, ":{}", port)?;
        }
        Ok(())
    }
}

/// Classify the value of an `Origin` header.
pub fn parse_header(value: Option<&HeaderValue>) -> HeaderOrigin {
    let Some(value) = value else {
        return HeaderOrigin::Absent;
    };

    // Origin uses an ASCII serialization.
    let raw = match value.to_str() {
        Ok(raw) => raw,
        Err(_) => return HeaderOrigin::Malformed(OriginParseError::NonAscii),
    };

    if raw.is_empty() {
        return HeaderOrigin::Absent;
    }
    if raw.contains(char::is_whitespace) {
        return HeaderOrigin::Malformed(OriginParseError::Whitespace);
    }
    if raw == "null" {
        return HeaderOrigin::Opaque;
    }

    match OriginSpec::parse(raw) {
        Ok(origin) => HeaderOrigin::Present(origin),
        Err(e) => HeaderOrigin::Malformed(e),
    }
}

/// Well-known default ports for schemes that appear in origins.
pub fn default_port(scheme: &str) -> Option<u16> {
    match scheme {
        "http" | "ws" => Some(80),
        "https" | "wss" => Some(443),
        _ => None,
    }
}

/// Borrowed components of an origin-like string, shared with pattern parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct OriginParts<'a> {
    pub scheme: Option<&'a str>,
    pub host: &'a str,
    pub port: Option<u16>,
}

/// Split `[scheme://]host[:port]` without case folding.
///
/// A single leading `.` on the host is accepted here; callers decide
/// whether it is meaningful.
pub(crate) fn split_origin(raw: &str) -> Result<OriginParts<'_>, OriginParseError> {
    if raw.is_empty() {
        return Err(OriginParseError::Empty);
    }

    let (scheme, authority) = match raw.find("://") {
        Some(idx) => {
            let scheme = &raw[..idx];
            if !is_scheme(scheme) {
                return Err(OriginParseError::InvalidScheme(scheme.to_string()));
            }
            (Some(scheme), &raw[idx + 3..])
        }
        None => (None, raw),
    };

    if authority.contains(['/', '?', '#', '@']) {
        return Err(OriginParseError::ExtraComponents);
    }

    let (host, port) = split_host_port(authority)?;
    if host.is_empty() {
        return Err(OriginParseError::MissingHost);
    }
    let port = port.map(parse_port).transpose()?;

    Ok(OriginParts { scheme, host, port })
}

fn split_host_port(authority: &str) -> Result<(&str, Option<&str>), OriginParseError> {
    if authority.starts_with('[') {
        let end = authority
            .find(']')
            .ok_or_else(|| OriginParseError::InvalidHost(authority.to_string()))?;
        let (host, rest) = authority.split_at(end + 1);
        let literal = &host[1..host.len() - 1];
        let valid = literal
            .chars()
            .all(|c| c.is_ascii_hexdigit() || c == ':' || c == '.');
        if literal.is_empty() || !valid {
            return Err(OriginParseError::InvalidHost(host.to_string()));
        }
        return match rest {
            "" => Ok((host, None)),
            _ => rest
                .strip_prefix(':')
                .map(|port| (host, Some(port)))
                .ok_or_else(|| OriginParseError::InvalidHost(authority.to_string())),
        };
    }

    let (host, port) = match authority.split_once(':') {
        Some((host, port)) => (host, Some(port)),
        None => (authority, None),
    };

    let name = host.strip_prefix('.').unwrap_or(host);
    if !host.is_empty() && !is_hostname(name) {
        return Err(OriginParseError::InvalidHost(host.to_string()));
    }

    Ok((host, port))
}

fn parse_port(raw: &str) -> Result<u16, OriginParseError> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(OriginParseError::InvalidPort(raw.to_string()));
    }
    raw.parse()
        .map_err(|_| OriginParseError::InvalidPort(raw.to_string()))
}

// RFC 3986: ALPHA *( ALPHA / DIGIT / "+" / "-" / "." )
fn is_scheme(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        _ => false,
    }
}

fn is_hostname(s: &str) -> bool {
    !s.is_empty()
        && !s.starts_with('.')
        && !s.contains("..")
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_'))
}
