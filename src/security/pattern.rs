//! Origin pattern parsing and matching.
//!
//! # Responsibilities
//! - Parse configured pattern strings (`*`, `host`, `.host`, `scheme://host:port`)
//! - Match a parsed origin against a single pattern or a set
//!
//! # Design Decisions
//! - Host matching is case-insensitive; both sides are lowercased up front
//! - Subdomain patterns require a dot boundary (`.site.com` never matches `evilsite.com`)
//! - Omitted scheme or port in a pattern matches anything
//! - Pattern ports compare against the origin's effective port (scheme default applied)

use std::fmt;

use crate::security::error::{ConfigurationError, OriginParseError};
use crate::security::origin::{split_origin, OriginSpec};

/// Host half of a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostPattern {
    /// Exactly this host.
    Exact(String),
    /// This domain or any subdomain of it (written with a leading `.`).
    Domain(String),
}

impl HostPattern {
    /// Build from a host string, lowercasing it. A leading `.` selects
    /// [`HostPattern::Domain`].
    pub fn new(host: &str) -> Self {
        let host = host.to_ascii_lowercase();
        match host.strip_prefix('.') {
            Some(domain) => HostPattern::Domain(domain.to_string()),
            None => HostPattern::Exact(host),
        }
    }

    /// Matches a lowercase host.
    pub fn matches(&self, host: &str) -> bool {
        match self {
            HostPattern::Exact(expected) => host == expected,
            HostPattern::Domain(domain) => {
                host == domain
                    || host
                        .strip_suffix(domain.as_str())
                        .is_some_and(|prefix| prefix.ends_with('.'))
            }
        }
    }
}

impl fmt::Display for HostPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostPattern::Exact(host) => write!(f, "{}", host),
            HostPattern::Domain(domain) => write!(f, ".{}", domain),
        }
    }
}

/// One allowed-origin rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginPattern {
    /// `*`: every well-formed origin, including `null`.
    Any,
    Rule {
        scheme: Option<String>,
        host: HostPattern,
        port: Option<u16>,
    },
}

impl OriginPattern {
    /// Parse a configured pattern string.
    pub fn parse(raw: &str) -> Result<Self, ConfigurationError> {
        Self::parse_inner(raw).map_err(|source| ConfigurationError::InvalidPattern {
            pattern: raw.to_string(),
            source,
        })
    }

    fn parse_inner(raw: &str) -> Result<Self, OriginParseError> {
        if raw == "*" {
            return Ok(OriginPattern::Any);
        }
        let parts = split_origin(raw)?;
        Ok(OriginPattern::Rule {
            scheme: parts.scheme.map(str::to_ascii_lowercase),
            host: HostPattern::new(parts.host),
            port: parts.port,
        })
    }

    /// Scheme- and port-agnostic pattern from a host allow-list entry.
    ///
    /// Returns `None` for entries that are not plain host patterns
    /// (empty, scheme-qualified, port-qualified, or otherwise malformed).
    pub fn from_allowed_host(entry: &str) -> Option<Self> {
        let entry = entry.trim();
        if entry == "*" {
            return Some(OriginPattern::Any);
        }
        match split_origin(entry) {
            Ok(parts) if parts.scheme.is_none() && parts.port.is_none() => {
                Some(OriginPattern::Rule {
                    scheme: None,
                    host: HostPattern::new(parts.host),
                    port: None,
                })
            }
            _ => None,
        }
    }

    /// Whether this is the catch-all `*`.
    pub fn is_any(&self) -> bool {
        matches!(self, OriginPattern::Any)
    }

    /// Returns true if `origin` satisfies every field this pattern restricts.
    pub fn matches(&self, origin: &OriginSpec) -> bool {
        match self {
            OriginPattern::Any => true,
            OriginPattern::Rule { scheme, host, port } => {
                host.matches(origin.host())
                    && scheme.as_deref().map_or(true, |s| origin.scheme() == Some(s))
                    && port.map_or(true, |p| origin.effective_port() == Some(p))
            }
        }
    }
}

impl fmt::Display for OriginPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OriginPattern::Any => write!(f, "*"),
            OriginPattern::Rule { scheme, host, port } => {
                if let Some(scheme) = scheme {
                    write!(f, "{}://", scheme)?;
                }
                write!(f, "{}", host)?;
                if let Some(port) = port {
                    write!(f, ":{}", port)?;
                }
                Ok(())
            }
        }
    }
}

/// Returns true if any pattern matches.
pub fn matches_any<'a, I>(patterns: I, origin: &OriginSpec) -> bool
where
    I: IntoIterator<Item = &'a OriginPattern>,
{
    patterns.into_iter().any(|p| p.matches(origin))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(pattern: &str, origin: &str) -> bool {
        let pattern = OriginPattern::parse(pattern).unwrap();
        let origin = OriginSpec::parse(origin).unwrap();
        pattern.matches(&origin)
    }

    #[test]
    fn test_full_pattern() {
        assert!(check("http://allowed-domain.com:80", "http://allowed-domain.com:80"));
        assert!(check("http://allowed-domain.com:80", "http://allowed-domain.com"));
        assert!(!check("http://allowed-domain.com:80", "http://allowed-domain.com:8000"));
        assert!(!check("http://allowed-domain.com:80", "http://bad-domain.com:8000"));
        assert!(!check("http://allowed-domain.com:80", "https://allowed-domain.com:80"));
        assert!(!check("http://allowed-domain.com:80", "https://allowed-domain.com"));
        assert!(!check("http://allowed-domain.com:80", "allowed-domain.com"));
        assert!(!check("http://allowed-domain.com:80", "allowed-domain.com:80"));
        assert!(check("https://allowed-domain.com:443", "https://allowed-domain.com"));
        assert!(!check("https://allowed-domain.com:443", "https://allowed-domain.com:8000"));
    }

    #[test]
    fn test_partial_pattern() {
        assert!(check("http://allowed-domain.com", "http://allowed-domain.com:8000"));
        assert!(!check("http://allowed-domain.com", "https://allowed-domain.com:8000"));
        assert!(check("allowed-domain.com", "https://allowed-domain.com:8000"));
        assert!(check("allowed-domain.com", "allowed-domain.com"));
        assert!(!check("allowed-domain.com:80", "https://allowed-domain.com"));
        assert!(check("allowed-domain.com:80", "https://allowed-domain.com:80"));
    }

    #[test]
    fn test_subdomain_pattern() {
        assert!(check(".allowed-domain.com", "http://allowed-domain.com"));
        assert!(check(".allowed-domain.com", "http://foo.allowed-domain.com"));
        assert!(check(".allowed-domain.com", "http://bar.foo.allowed-domain.com"));
        assert!(!check(".allowed-domain.com", "http://com"));
        assert!(!check(".allowed-domain.com", "http://notallowed-domain.com"));
        assert!(check("http://.allowed-domain.com", "http://foo.allowed-domain.com"));
        assert!(!check("http://.allowed-domain.com", "https://foo.allowed-domain.com"));
    }

    #[test]
    fn test_case_insensitive() {
        assert!(check("HTTPS://GoodSite.COM", "https://goodsite.com"));
        assert!(check(".GOODSITE.com", "https://WWW.goodsite.COM"));
    }

    #[test]
    fn test_catch_all() {
        assert!(check("*", "http://allowed-domain.com"));
        assert!(check("*", "http://allowed-domain.com:8000"));
        assert!(OriginPattern::parse("*").unwrap().is_any());
    }

    #[test]
    fn test_invalid_patterns() {
        let invalid = [
            "", "http://", "a.com/path", "a.com?q", "u@a.com", "a.com:port", "..a.com", "*.a.com",
        ];
        for raw in invalid {
            assert!(OriginPattern::parse(raw).is_err(), "{raw} should be rejected");
        }
    }

    #[test]
    fn test_from_allowed_host() {
        assert_eq!(
            OriginPattern::from_allowed_host("Example.com"),
            Some(OriginPattern::Rule {
                scheme: None,
                host: HostPattern::Exact("example.com".into()),
                port: None,
            })
        );
        assert_eq!(OriginPattern::from_allowed_host("*"), Some(OriginPattern::Any));
        assert_eq!(OriginPattern::from_allowed_host(""), None);
        assert_eq!(OriginPattern::from_allowed_host("https://example.com"), None);
        assert_eq!(OriginPattern::from_allowed_host("example.com:80"), None);
    }

    #[test]
    fn test_display_round_trip() {
        for raw in ["*", "https://.example.com:8443", "example.com", "[::1]"] {
            assert_eq!(OriginPattern::parse(raw).unwrap().to_string(), raw);
        }
    }

    #[test]
    fn test_matches_any() {
        let patterns = vec![
            OriginPattern::parse("https://a.com").unwrap(),
            OriginPattern::parse(".b.com").unwrap(),
        ];
        let origin = OriginSpec::parse("http://www.b.com").unwrap();
        assert!(matches_any(&patterns, &origin));

        let origin = OriginSpec::parse("http://a.com").unwrap();
        assert!(!matches_any(&patterns, &origin));
    }
}
