//! VoxLibre configuration
//!
//! `config.toml` holds one table per [`ConfigSection`]: `[app]`, `[player]`,
//! `[library]` and `[generation]`. Missing tables and keys take their
//! defaults. Saving validates first and replaces the file atomically.
//!
//! # Example
//!
//! ```rust,no_run
//! use voxlibre_config::{Config, ConfigManager};
//!
//! let manager = ConfigManager::new().expect("Failed to initialize config");
//! let config = manager.load().unwrap_or_else(|e| {
//!     eprintln!("Config error: {}, using defaults", e);
//!     Config::default()
//! });
//!
//! println!("Voice: {}", config.generation.voice);
//! ```

mod error;
mod manager;
mod persistence;
mod validation;

mod app_config;
mod generation_config;
mod library_config;
mod player_config;

pub use error::{ConfigError, ConfigResult};
pub use manager::{apply_env_overrides, ConfigManager};
pub use validation::{ConfigSection, ValidationError, Validator};

pub use app_config::{AppConfig, LogLevel};
pub use generation_config::GenerationConfig;
pub use library_config::LibraryConfig;
pub use player_config::{OutputKind, PlayerConfig};

use serde::{Deserialize, Serialize};

/// Highest `version` this build reads
pub const CONFIG_VERSION: u32 = 1;

/// Contents of `config.toml`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub version: u32,
    pub app: AppConfig,
    pub player: PlayerConfig,
    pub library: LibraryConfig,
    pub generation: GenerationConfig,
}

impl Config {
    /// Every invalid field across all sections
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let errors: Vec<ValidationError> = [
            self.app.validate(),
            self.player.validate(),
            self.library.validate(),
            self.generation.validate(),
        ]
        .into_iter()
        .filter_map(Result::err)
        .flatten()
        .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Renders the config the way it is written to disk
    pub fn to_toml(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Section-wise merge; values from `other` win
    pub fn merge(&mut self, other: Config) {
        self.app.merge(other.app);
        self.player.merge(other.player);
        self.library.merge(other.library);
        self.generation.merge(other.generation);
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            app: AppConfig::default(),
            player: PlayerConfig::default(),
            library: LibraryConfig::default(),
            generation: GenerationConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid_and_current() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.version, CONFIG_VERSION);
    }

    #[test]
    fn test_config_merge() {
        let mut base = Config::default();
        let mut override_config = Config::default();
        override_config.player.default_volume = 75;
        override_config.generation.voice = "Puck".to_string();

        base.merge(override_config);
        assert_eq!(base.player.default_volume, 75);
        assert_eq!(base.generation.voice, "Puck");
    }

    #[test]
    fn test_to_toml_round_trips_sections() {
        let mut config = Config::default();
        config.generation.voice = "Puck".to_string();

        let rendered = config.to_toml().unwrap();
        assert!(rendered.contains("[generation]"));
        assert_eq!(toml::from_str::<Config>(&rendered).unwrap(), config);
    }

    #[test]
    fn test_errors_collected_across_sections() {
        let mut config = Config::default();
        config.player.channels = 0;
        config.generation.voice = String::new();

        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 2);
    }
}
