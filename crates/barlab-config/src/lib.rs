//! Configuration management.

mod settings;

pub use settings::{AppConfig, AppSettings, DataSettings, LogFormat, LoggingConfig};

use barlab_core::error::ConfigError;
use config::{Config, Environment, File, FileFormat};
use std::path::Path;

/// Load configuration from a TOML file and `BARLAB__*` environment overrides.
///
/// The result is validated: an `Ok` config can be handed to the engine as is.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::from(path).format(FileFormat::Toml).required(true))
        .add_source(
            Environment::with_prefix("BARLAB")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .map_err(load_error)?;

    let app: AppConfig = config.try_deserialize().map_err(load_error)?;
    app.validate()?;
    Ok(app)
}

fn load_error(e: config::ConfigError) -> ConfigError {
    ConfigError::Load(e.to_string())
}
