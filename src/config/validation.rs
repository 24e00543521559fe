use crate::config::types::{Config, HttpConfig};
use crate::ConfigError;
use regex::Regex;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_starting_point(&config.starting_point)?;

    if let Some(whitelist) = &config.whitelist {
        validate_patterns(whitelist)?;
    }
    validate_patterns(&config.blacklist)?;

    validate_http_config(&config.http)?;
    Ok(())
}

/// Parses the starting point, which must be an absolute HTTP(S) URL with a host
///
/// The returned URL has no fragment, like every other page URL in a crawl.
pub fn validate_starting_point(starting_point: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidStartingPoint {
        url: starting_point.to_string(),
        reason,
    };

    let mut url = Url::parse(starting_point).map_err(|e| invalid(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(invalid(format!(
            "only http and https are supported, got {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }

    url.set_fragment(None);
    Ok(url)
}

/// Checks that every pattern compiles as a regular expression
fn validate_patterns(patterns: &[String]) -> Result<(), ConfigError> {
    for pattern in patterns {
        Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
            pattern: pattern.clone(),
            source,
        })?;
    }
    Ok(())
}

/// Validates HTTP transport configuration
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout-secs must be >= 1".to_string(),
        ));
    }

    if config.connect_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "connect-timeout-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}
