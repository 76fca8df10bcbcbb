use crate::config::types::{
    Config, ExportConfig, ExtractionConfig, FetcherConfig, GeneratorConfig, RateLimitConfig,
    RetryConfig,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_fetcher_config(&config.fetcher)?;
    validate_retry_config(&config.retry)?;
    validate_extraction_config(&config.extraction)?;
    validate_rate_limit_config(&config.rate_limit)?;
    validate_generator_config(&config.generator)?;
    validate_export_config(&config.export)?;
    Ok(())
}

fn validate_fetcher_config(config: &FetcherConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout_secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    if config.connect_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "connect_timeout_secs must be >= 1, got {}",
            config.connect_timeout_secs
        )));
    }

    Ok(())
}

fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 || config.max_attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be between 1 and 10, got {}",
            config.max_attempts
        )));
    }

    Ok(())
}

fn validate_extraction_config(config: &ExtractionConfig) -> Result<(), ConfigError> {
    if config.min_content_length < 1 {
        return Err(ConfigError::Validation(
            "min_content_length must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_rate_limit_config(config: &RateLimitConfig) -> Result<(), ConfigError> {
    if config.quota < 1 {
        return Err(ConfigError::Validation(format!(
            "quota must be >= 1, got {}",
            config.quota
        )));
    }

    if config.window_hours < 1 {
        return Err(ConfigError::Validation(format!(
            "window_hours must be >= 1, got {}",
            config.window_hours
        )));
    }

    if let Some(path) = &config.database_path {
        if path.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "database_path cannot be empty".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_generator_config(config: &GeneratorConfig) -> Result<(), ConfigError> {
    let endpoint = Url::parse(&config.endpoint).map_err(|e| {
        ConfigError::Validation(format!("Invalid endpoint '{}': {}", config.endpoint, e))
    })?;

    if endpoint.scheme() != "http" && endpoint.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "endpoint must use http or https, got '{}'",
            config.endpoint
        )));
    }

    if config.model.trim().is_empty() {
        return Err(ConfigError::Validation("model cannot be empty".to_string()));
    }

    if config.api_key_env.trim().is_empty() {
        return Err(ConfigError::Validation(
            "api_key_env cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_export_config(config: &ExportConfig) -> Result<(), ConfigError> {
    if config.directory.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "export directory cannot be empty".to_string(),
        ));
    }

    if !config.url_prefix.starts_with('/') {
        return Err(ConfigError::Validation(format!(
            "url_prefix must start with '/', got '{}'",
            config.url_prefix
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_retry_bounds() {
        let mut config = Config::default();
        config.retry.max_attempts = 0;
        assert!(validate(&config).is_err());

        config.retry.max_attempts = 11;
        assert!(validate(&config).is_err());

        config.retry.max_attempts = 1;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_validate_rate_limit() {
        let mut config = Config::default();
        config.rate_limit.quota = 0;
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));

        let mut config = Config::default();
        config.rate_limit.window_hours = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_generator_endpoint() {
        let mut config = Config::default();
        config.generator.endpoint = "not a url".to_string();
        assert!(validate(&config).is_err());

        config.generator.endpoint = "ftp://example.com".to_string();
        assert!(validate(&config).is_err());

        config.generator.endpoint = "http://127.0.0.1:9999".to_string();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_validate_export_prefix() {
        let mut config = Config::default();
        config.export.url_prefix = "export".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_timeouts() {
        let mut config = Config::default();
        config.fetcher.timeout_secs = 0;
        assert!(validate(&config).is_err());

        let mut config = Config::default();
        config.fetcher.user_agent = "   ".to_string();
        assert!(validate(&config).is_err());
    }
}
