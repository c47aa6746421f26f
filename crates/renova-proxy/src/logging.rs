//! Tracing subscriber setup for the binary

use crate::config::LogConfig;
use crate::error::ConfigError;
use tracing_subscriber::EnvFilter;

/// Filter directive for `config`; `RUST_LOG` wins when set
///
/// # Errors
/// Returns [`ConfigError::Invalid`] when the configured directive does not parse
pub fn env_filter(config: &LogConfig) -> Result<EnvFilter, ConfigError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.filter)
        .map_err(|e| ConfigError::invalid(format!("bad log filter '{}': {e}", config.filter)))
}

/// Install the global subscriber
///
/// # Errors
/// Returns [`ConfigError::Invalid`] for a bad filter or if a subscriber is
/// already installed
pub fn init(config: &LogConfig) -> Result<(), ConfigError> {
    let filter = env_filter(config)?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    let result = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| ConfigError::invalid(format!("cannot install log subscriber: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_directive() {
        let config = LogConfig {
            filter: "renova_proxy=debug,warn".to_string(),
            json: false,
        };
        assert!(env_filter(&config).is_ok());
    }
}
