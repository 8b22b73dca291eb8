//! Configuration validation rules.
//!
//! - The barrier poll interval must be positive
//! - The barrier wait timeout must be positive

use crate::config::schema::ChainConfig;
use crate::error::{ChainError, Result};

/// Collect every validation problem in `config`.
pub fn validation_errors(config: &ChainConfig) -> Vec<String> {
    let mut errors = Vec::new();

    if config.barrier.poll_interval_ms == 0 {
        errors.push("barrier.poll_interval_ms must be greater than 0".to_string());
    }
    if config.barrier.wait_timeout_secs == 0 {
        errors.push("barrier.wait_timeout_secs must be greater than 0".to_string());
    }

    errors
}

/// Validate a configuration, failing with all problems joined.
pub fn validate(config: &ChainConfig) -> Result<()> {
    let errors = validation_errors(config);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ChainError::ConfigValidationError {
            message: errors.join("; "),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(validate(&ChainConfig::default()).is_ok());
    }

    #[test]
    fn reports_every_problem() {
        let mut config = ChainConfig::default();
        config.barrier.poll_interval_ms = 0;
        config.barrier.wait_timeout_secs = 0;

        assert_eq!(validation_errors(&config).len(), 2);
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("poll_interval_ms"));
        assert!(err.to_string().contains("wait_timeout_secs"));
    }
}
