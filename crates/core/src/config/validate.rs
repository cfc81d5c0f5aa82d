use super::{types::TranscoderConfig, ConfigLoadError};

const LOG_LEVELS: &[&str] = &[
    "quiet", "panic", "fatal", "error", "warning", "info", "verbose", "debug", "trace",
];

/// Validate configuration
/// Currently validates:
/// - ffmpeg path is not empty
/// - log level is one ffmpeg understands (or empty)
/// - at least one diagnostic line is kept
pub fn validate_config(config: &TranscoderConfig) -> Result<(), ConfigLoadError> {
    if config.ffmpeg_path.as_os_str().is_empty() {
        return Err(ConfigLoadError::ValidationError(
            "ffmpeg_path cannot be empty".to_string(),
        ));
    }

    if !config.log_level.is_empty() && !LOG_LEVELS.contains(&config.log_level.as_str()) {
        return Err(ConfigLoadError::ValidationError(format!(
            "log_level '{}' is not an ffmpeg log level",
            config.log_level
        )));
    }

    if config.diagnostic_tail_lines == 0 {
        return Err(ConfigLoadError::ValidationError(
            "diagnostic_tail_lines must be at least 1".to_string(),
        ));
    }

    Ok(())
}
