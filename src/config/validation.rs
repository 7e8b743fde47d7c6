//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses parse
//! - Validate every origin pattern and allow-list entry
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GuardConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::GuardConfig;
use crate::security::OriginPattern;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a socket address")]
    BindAddress(String),

    #[error("observability.metrics_address '{0}' is not a socket address")]
    MetricsAddress(String),

    #[error("origin.allowed_origins: {0}")]
    OriginPattern(String),

    #[error("origin.allowed_hosts entry '{0}' is not a host pattern")]
    AllowedHost(String),
}

/// Check the configuration, collecting every problem found.
pub fn validate_config(config: &GuardConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    for pattern in &config.origin.allowed_origins {
        if let Err(e) = OriginPattern::parse(pattern) {
            errors.push(ValidationError::OriginPattern(e.to_string()));
        }
    }

    for host in &config.origin.allowed_hosts {
        if OriginPattern::from_allowed_host(host).is_none() {
            errors.push(ValidationError::AllowedHost(host.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&GuardConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = GuardConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.origin.allowed_origins = vec!["https://ok.com".into(), "https://bad.com/x".into()];
        config.origin.allowed_hosts = vec!["ok.com".into(), "https://bad.com".into()];

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert_eq!(errors[0], ValidationError::BindAddress("not-an-address".into()));
        assert!(matches!(
            errors[1],
            ValidationError::OriginPattern(ref msg) if msg.contains("bad.com/x")
        ));
        assert_eq!(errors[2], ValidationError::AllowedHost("https://bad.com".into()));
    }

    #[test]
    fn test_metrics_address_only_checked_when_enabled() {
        let mut config = GuardConfig::default();
        config.observability.metrics_address = "nope".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert_eq!(
            validate_config(&config).unwrap_err(),
            vec![ValidationError::MetricsAddress("nope".into())]
        );
    }
}
