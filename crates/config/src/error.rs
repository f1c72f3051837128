//! Configuration errors

use crate::validation::ValidationError;
use std::path::PathBuf;
use thiserror::Error;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// A filesystem operation on the config directory failed
    #[error("{action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{} contains no settings", .0.display())]
    EmptyFile(PathBuf),

    #[error("{} is not valid TOML: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("{} has format version {found}; this build reads up to {supported}", path.display())]
    TooNew {
        path: PathBuf,
        found: u32,
        supported: u32,
    },

    #[error("Cannot render config as TOML: {0}")]
    Render(#[from] toml::ser::Error),

    #[error("Invalid config: {}", summarize(.0))]
    Invalid(Vec<ValidationError>),

    #[error("No home directory to place VoxLibre files in")]
    NoHomeDirectory,
}

impl ConfigError {
    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }
}

/// Joins validation failures into one line
pub(crate) fn summarize(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
