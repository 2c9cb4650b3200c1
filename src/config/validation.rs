use crate::config::types::{
    BrowserConfig, Config, OutputConfig, RetryConfig, SelectorConfig, SiteConfig, TimingConfig,
};
use crate::ConfigError;
use regex::Regex;
use scraper::Selector;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_selectors(&config.selectors)?;
    validate_timing_config(&config.timing)?;
    validate_retry_config(&config.retry)?;
    validate_browser_config(&config.browser)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the target site configuration
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    validate_http_url("start-url", &config.start_url)?;

    for pattern in &config.control_labels {
        Regex::new(pattern).map_err(|e| {
            ConfigError::InvalidPattern(format!("Invalid control label '{}': {}", pattern, e))
        })?;
    }

    Ok(())
}

/// Validates that every selector is non-empty and parses as CSS
fn validate_selectors(config: &SelectorConfig) -> Result<(), ConfigError> {
    for (key, selector) in config.entries() {
        if selector.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "selector '{}' cannot be empty",
                key
            )));
        }

        Selector::parse(selector).map_err(|e| {
            ConfigError::InvalidPattern(format!(
                "Selector '{}' ({}) is not valid CSS: {:?}",
                key, selector, e
            ))
        })?;
    }

    Ok(())
}

/// Validates delays and timeouts
fn validate_timing_config(config: &TimingConfig) -> Result<(), ConfigError> {
    if config.poll_interval < 10 {
        return Err(ConfigError::Validation(format!(
            "poll-interval must be >= 10ms, got {}ms",
            config.poll_interval
        )));
    }

    if config.element_timeout < 100 {
        return Err(ConfigError::Validation(format!(
            "element-timeout must be >= 100ms, got {}ms",
            config.element_timeout
        )));
    }

    if config.max_backoff < config.load_delay {
        return Err(ConfigError::Validation(format!(
            "max-backoff ({}ms) must not be shorter than load-delay ({}ms)",
            config.max_backoff, config.load_delay
        )));
    }

    Ok(())
}

/// Validates retry limits
fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.max_expansion_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "max-expansion-attempts must be >= 1, got {}",
            config.max_expansion_attempts
        )));
    }

    if config.navigation_retries > 10 {
        return Err(ConfigError::Validation(format!(
            "navigation-retries must be <= 10, got {}",
            config.navigation_retries
        )));
    }

    Ok(())
}

/// Validates the WebDriver settings
fn validate_browser_config(config: &BrowserConfig) -> Result<(), ConfigError> {
    validate_http_url("webdriver-url", &config.webdriver_url)
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.path.is_empty() {
        return Err(ConfigError::Validation("path cannot be empty".to_string()));
    }

    if config.journal_path.is_empty() {
        return Err(ConfigError::Validation(
            "journal-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates that `value` is an absolute http(s) URL
fn validate_http_url(key: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", key, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            key, value
        )));
    }

    Ok(())
}
