//! Configuration validation

use crate::schema::{RawConfig, RawEntityId, RawNotifierConfig};
use std::collections::HashSet;
use thiserror::Error;

/// Validation error
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("No entities to monitor")]
    NoEntities,

    #[error("Duplicate entity ID: {0}")]
    DuplicateEntityId(String),

    #[error("Entity ID cannot be empty")]
    EmptyEntityId,

    #[error("{field} must be greater than zero")]
    ZeroDuration { field: &'static str },

    #[error("{field} must be at most {max} seconds")]
    DurationTooLong { field: &'static str, max: u64 },

    #[error("Position source base_url is not set (use [source].base_url or API_BASE_URL)")]
    MissingBaseUrl,

    #[error("Invalid base_url '{0}': expected an http:// or https:// URL")]
    InvalidBaseUrl(String),

    #[error("Notifier '{field}': {message}")]
    NotifierError { field: &'static str, message: String },
}

/// Upper bound for every `*_seconds` setting (one year)
pub const MAX_DURATION_SECONDS: u64 = 365 * 24 * 60 * 60;

/// Validate a raw configuration, collecting every problem found
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    errors.extend(validate_entities(&config.monitor.entities));

    let monitor = &config.monitor;
    for (field, value) in [
        ("poll_interval_seconds", monitor.poll_interval_seconds),
        ("run_duration_seconds", monitor.run_duration_seconds),
        ("fetch_timeout_seconds", monitor.fetch_timeout_seconds),
        ("debounce_seconds", monitor.debounce_seconds),
        ("drain_timeout_seconds", monitor.drain_timeout_seconds),
    ] {
        match value {
            Some(0) if field != "drain_timeout_seconds" => {
                errors.push(ValidationError::ZeroDuration { field });
            }
            Some(secs) if secs > MAX_DURATION_SECONDS => {
                errors.push(ValidationError::DurationTooLong {
                    field,
                    max: MAX_DURATION_SECONDS,
                });
            }
            _ => {}
        }
    }

    match config.source.base_url.as_deref().map(str::trim) {
        None | Some("") => errors.push(ValidationError::MissingBaseUrl),
        Some(url) if !is_http_url(url) => {
            errors.push(ValidationError::InvalidBaseUrl(url.to_string()));
        }
        Some(_) => {}
    }

    if let Some(notifier) = &config.notifier {
        errors.extend(validate_notifier(notifier));
    }

    errors
}

fn validate_entities(entities: &[RawEntityId]) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if entities.is_empty() {
        errors.push(ValidationError::NoEntities);
    }

    let mut seen = HashSet::new();
    for entity in entities {
        let id = entity.to_string();
        if id.trim().is_empty() {
            errors.push(ValidationError::EmptyEntityId);
            continue;
        }
        // 7 and "7" name the same entity once normalized
        if !seen.insert(id.clone()) {
            errors.push(ValidationError::DuplicateEntityId(id));
        }
    }

    errors
}

fn validate_notifier(notifier: &RawNotifierConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if let RawNotifierConfig::Smtp {
        host,
        port,
        username,
        sender,
        recipient,
        ..
    } = notifier
    {
        for (field, value) in [
            ("host", host),
            ("username", username),
            ("sender", sender),
            ("recipient", recipient),
        ] {
            if value.trim().is_empty() {
                errors.push(ValidationError::NotifierError {
                    field,
                    message: "cannot be empty".into(),
                });
            }
        }

        for (field, value) in [("sender", sender), ("recipient", recipient)] {
            if !value.trim().is_empty() && !value.contains('@') {
                errors.push(ValidationError::NotifierError {
                    field,
                    message: format!("'{}' is not an e-mail address", value),
                });
            }
        }

        if *port == Some(0) {
            errors.push(ValidationError::NotifierError {
                field: "port",
                message: "must be between 1 and 65535".into(),
            });
        }
    }

    errors
}

/// Whether `url` looks like an absolute http(s) URL
pub fn is_http_url(url: &str) -> bool {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));
    matches!(rest, Some(host) if !host.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{RawMonitorConfig, RawSourceConfig};

    fn valid_config() -> RawConfig {
        RawConfig {
            config_version: 1,
            monitor: RawMonitorConfig {
                entities: vec![RawEntityId::Number(1), RawEntityId::Number(2)],
                poll_interval_seconds: Some(60),
                ..Default::default()
            },
            source: RawSourceConfig {
                base_url: Some("https://status.example.com".into()),
            },
            notifier: None,
        }
    }

    #[test]
    fn valid_config_has_no_errors() {
        assert!(validate_config(&valid_config()).is_empty());
    }

    #[test]
    fn test_oversized_durations_rejected() {
        let mut config = valid_config();
        config.monitor.poll_interval_seconds = Some(u64::MAX);
        config.monitor.run_duration_seconds = Some(MAX_DURATION_SECONDS + 1);
        config.monitor.drain_timeout_seconds = Some(u64::MAX);

        let errors = validate_config(&config);
        let fields: Vec<_> = errors
            .iter()
            .filter_map(|e| match e {
                ValidationError::DurationTooLong { field, .. } => Some(*field),
                _ => None,
            })
            .collect();
        assert_eq!(
            fields,
            vec!["poll_interval_seconds", "run_duration_seconds", "drain_timeout_seconds"]
        );

        config.monitor.poll_interval_seconds = Some(MAX_DURATION_SECONDS);
        config.monitor.run_duration_seconds = Some(MAX_DURATION_SECONDS);
        config.monitor.drain_timeout_seconds = Some(0);
        assert!(validate_config(&config).is_empty());
    }

    #[test]
    fn test_is_http_url() {
        assert!(is_http_url("https://example.com"));
        assert!(is_http_url("http://localhost:8080/api"));
        assert!(!is_http_url("ftp://example.com"));
        assert!(!is_http_url("https://"));
        assert!(!is_http_url("example.com"));
    }

    #[test]
    fn test_duplicate_id_detection() {
        let mut config = valid_config();
        config.monitor.entities = vec![
            RawEntityId::Number(7),
            RawEntityId::Name("7".into()),
            RawEntityId::Name("ops".into()),
        ];

        let errors = validate_config(&config);
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::DuplicateEntityId(id) if id == "7")));
    }

    #[test]
    fn test_empty_entities_and_zero_interval() {
        let mut config = valid_config();
        config.monitor.entities.clear();
        config.monitor.poll_interval_seconds = Some(0);

        let errors = validate_config(&config);
        assert!(errors.iter().any(|e| matches!(e, ValidationError::NoEntities)));
        assert!(errors.iter().any(|e| matches!(
            e,
            ValidationError::ZeroDuration { field: "poll_interval_seconds" }
        )));
    }

    #[test]
    fn test_missing_and_invalid_base_url() {
        let mut config = valid_config();
        config.source.base_url = None;
        let errors = validate_config(&config);
        assert!(errors.iter().any(|e| matches!(e, ValidationError::MissingBaseUrl)));

        config.source.base_url = Some("status.example.com".into());
        let errors = validate_config(&config);
        assert!(errors.iter().any(|e| matches!(e, ValidationError::InvalidBaseUrl(_))));
    }

    #[test]
    fn test_smtp_fields_checked() {
        let mut config = valid_config();
        config.notifier = Some(RawNotifierConfig::Smtp {
            host: "".into(),
            port: Some(0),
            username: "alerts".into(),
            password_env: None,
            sender: "not-an-address".into(),
            recipient: "ops@example.com".into(),
        });

        let errors = validate_config(&config);
        assert_eq!(errors.len(), 3);
    }
}
