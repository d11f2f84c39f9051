//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use std::collections::HashSet;
use thiserror::Error;

/// Longest accepted close/delete delay.
const MAX_CLOSE_DELAY_MS: u64 = 60_000;

/// Interactions must be answered within 3 seconds.
const MAX_RESPONSE_TIMEOUT_MS: u64 = 3_000;

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("bot.token is required (or set TICKETD_TOKEN)")]
    MissingToken,
    #[error("bot.public_key must be 64 hex characters")]
    InvalidPublicKey,
    #[error("tickets.kinds must not be empty")]
    NoKinds,
    #[error("tickets.kinds has an entry with an empty key")]
    EmptyKindKey,
    #[error("tickets.kinds key '{0}' is used more than once")]
    DuplicateKindKey(String),
    #[error("tickets.close_delay_ms must be at most {MAX_CLOSE_DELAY_MS}, got {0}")]
    CloseDelayTooLong(u64),
    #[error("http.response_timeout_ms must be below {MAX_RESPONSE_TIMEOUT_MS}, got {0}")]
    ResponseTimeoutTooLong(u64),
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.bot.token.trim().is_empty() {
        errors.push(ValidationError::MissingToken);
    }

    let key = config.bot.public_key.trim();
    if key.len() != 64 || !key.chars().all(|c| c.is_ascii_hexdigit()) {
        errors.push(ValidationError::InvalidPublicKey);
    }

    if config.tickets.kinds.is_empty() {
        errors.push(ValidationError::NoKinds);
    }
    let mut seen = HashSet::new();
    for kind in &config.tickets.kinds {
        if kind.key.trim().is_empty() {
            errors.push(ValidationError::EmptyKindKey);
        } else if !seen.insert(kind.key.as_str()) {
            errors.push(ValidationError::DuplicateKindKey(kind.key.clone()));
        }
    }

    if config.tickets.close_delay_ms > MAX_CLOSE_DELAY_MS {
        errors.push(ValidationError::CloseDelayTooLong(config.tickets.close_delay_ms));
    }
    if config.http.response_timeout_ms >= MAX_RESPONSE_TIMEOUT_MS {
        errors.push(ValidationError::ResponseTimeoutTooLong(
            config.http.response_timeout_ms,
        ));
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
    fn collects_every_problem() {
        let mut config = Config::parse(
            r#"
[bot]
application_id = 1
public_key = "zz"

[tickets]
close_delay_ms = 120000

[[tickets.kinds]]
key = "a"
label = "A"
description = ""

[[tickets.kinds]]
key = "a"
label = "A again"
description = ""
"#,
        )
        .unwrap();
        config.http.response_timeout_ms = 5000;

        let errors = validate(&config).unwrap_err();
        assert!(errors.iter().any(|e| matches!(e, ValidationError::MissingToken)));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::InvalidPublicKey)));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::DuplicateKindKey(k) if k == "a")));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::CloseDelayTooLong(120000))));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::ResponseTimeoutTooLong(5000))));
    }
}
