use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::TranscoderConfig, ConfigLoadError};

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<TranscoderConfig, ConfigLoadError> {
    if !path.exists() {
        return Err(ConfigLoadError::FileNotFound(path.display().to_string()));
    }

    let config: TranscoderConfig = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed("FFDRIVE_"))
        .extract()
        .map_err(|e| ConfigLoadError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<TranscoderConfig, ConfigLoadError> {
    toml::from_str(toml_str).map_err(|e| ConfigLoadError::ParseError(e.to_string()))
}
