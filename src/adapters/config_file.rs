//! File-backed configuration adapter.
//!
//! Implements [`ConfigPort`] over a JSON (`.json`) or YAML (`.yaml`,
//! `.yml`) file.  Parsing only; the service validates.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::info;

use crate::app::ports::{ConfigError, ConfigPort};
use crate::config::ControllerConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Yaml,
}

impl ConfigFormat {
    /// Pick a format from the file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }

    pub fn parse(self, text: &str) -> Result<ControllerConfig, ConfigError> {
        let parsed = match self {
            Self::Json => ControllerConfig::from_json(text),
            Self::Yaml => ControllerConfig::from_yaml(text),
        };
        parsed.map_err(|e| ConfigError::Corrupted(e.to_string()))
    }
}

pub struct FileConfig {
    path: PathBuf,
}

impl FileConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ConfigPort for FileConfig {
    fn load(&self) -> Result<ControllerConfig, ConfigError> {
        let format = ConfigFormat::from_path(&self.path).ok_or(ConfigError::UnsupportedFormat)?;
        let text = fs::read_to_string(&self.path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ConfigError::NotFound,
            _ => ConfigError::IoError(e.to_string()),
        })?;
        info!("Loading {:?} config from {}", format, self.path.display());
        format.parse(&text)
    }
}
