//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::ProbeConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load a configuration from a TOML file without validating it.
fn read_config(path: &Path) -> Result<ProbeConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    toml::from_str(&content).map_err(ConfigError::Parse)
}

/// Build the effective configuration and validate it.
///
/// Starts from the file at `path` (defaults when `None`), lets `overrides`
/// adjust it, then validates the result once.
pub fn load_config<F>(path: Option<&Path>, overrides: F) -> Result<ProbeConfig, ConfigError>
where
    F: FnOnce(&mut ProbeConfig),
{
    let mut config = match path {
        Some(path) => read_config(path)?,
        None => ProbeConfig::default(),
    };
    overrides(&mut config);

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}
