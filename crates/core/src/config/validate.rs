use super::{types::Config, ConfigError};

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    let subtitles = &config.subtitles;

    if subtitles.languages.is_empty() {
        return Err(ConfigError::ValidationError(
            "subtitles.languages cannot be empty".to_string(),
        ));
    }

    if subtitles.providers.is_empty() {
        return Err(ConfigError::ValidationError(
            "subtitles.providers cannot be empty".to_string(),
        ));
    }

    if !subtitles.providers.contains(&subtitles.fallback_provider) {
        return Err(ConfigError::ValidationError(format!(
            "subtitles.fallback_provider '{}' is not in subtitles.providers",
            subtitles.fallback_provider
        )));
    }

    if subtitles.retry.max_attempts == 0 {
        return Err(ConfigError::ValidationError(
            "subtitles.retry.max_attempts must be at least 1".to_string(),
        ));
    }

    if subtitles.request_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "subtitles.request_timeout_secs cannot be 0".to_string(),
        ));
    }

    if subtitles.sync.enabled && subtitles.sync.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "subtitles.sync.timeout_secs cannot be 0".to_string(),
        ));
    }

    if subtitles.list_fallback_limit == 0 {
        return Err(ConfigError::ValidationError(
            "subtitles.list_fallback_limit must be at least 1".to_string(),
        ));
    }

    if subtitles.subtitle_extension.is_empty() || subtitles.subtitle_extension.contains('.') {
        return Err(ConfigError::ValidationError(
            "subtitles.subtitle_extension must be a bare extension like \"vtt\"".to_string(),
        ));
    }

    Ok(())
}
