//! Locating, loading and saving the config file

use crate::persistence::ConfigFile;
use crate::{Config, ConfigError, ConfigResult};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "config.toml";

pub const ENV_DEFAULT_VOLUME: &str = "VOXLIBRE_PLAYER_DEFAULT_VOLUME";
pub const ENV_VOICE: &str = "VOXLIBRE_GENERATION_VOICE";
pub const ENV_DATA_DIR: &str = "VOXLIBRE_APP_DATA_DIR";

/// Owns the location of `config.toml`
pub struct ConfigManager {
    file: ConfigFile,
    config_dir: PathBuf,
}

impl ConfigManager {
    /// Uses the platform config directory
    ///
    /// - Linux: `~/.config/voxlibre/`
    /// - macOS: `~/Library/Application Support/voxlibre/`
    /// - Windows: `%APPDATA%\voxlibre\config\`
    pub fn new() -> ConfigResult<Self> {
        let dirs = project_dirs()?;
        Self::with_directory(dirs.config_dir().to_path_buf())
    }

    pub fn with_directory(config_dir: PathBuf) -> ConfigResult<Self> {
        Ok(Self {
            file: ConfigFile::new(config_dir.join(CONFIG_FILE)),
            config_dir,
        })
    }

    /// Platform data directory, home of the library cache
    pub fn default_data_dir() -> ConfigResult<PathBuf> {
        Ok(project_dirs()?.data_dir().to_path_buf())
    }

    /// `app.data_dir` when set, otherwise [`default_data_dir`](Self::default_data_dir)
    pub fn data_dir(&self, config: &Config) -> ConfigResult<PathBuf> {
        config
            .app
            .data_dir
            .clone()
            .map_or_else(Self::default_data_dir, Ok)
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn config_path(&self) -> PathBuf {
        self.file.path().to_path_buf()
    }

    /// Reads the file; defaults when it does not exist
    pub fn load(&self) -> ConfigResult<Config> {
        match self.file.read()? {
            Some(config) => Ok(config),
            None => {
                log::info!("No config at {}, using defaults", self.file.path().display());
                Ok(Config::default())
            }
        }
    }

    /// Like [`load`](Self::load), but any failure yields the defaults
    pub fn load_or_default(&self) -> Config {
        self.load().unwrap_or_else(|e| {
            log::warn!("Failed to load config: {}, using defaults", e);
            Config::default()
        })
    }

    pub fn save(&self, config: &Config) -> ConfigResult<()> {
        self.file.write(config)
    }

    /// Load, modify, save
    pub fn update<F>(&self, update_fn: F) -> ConfigResult<()>
    where
        F: FnOnce(&mut Config),
    {
        let mut config = self.load()?;
        update_fn(&mut config);
        self.save(&config)
    }

    /// Writes the defaults unless a file is already there
    ///
    /// Returns `Ok(true)` when a file was created.
    pub fn initialize(&self) -> ConfigResult<bool> {
        if self.file.exists() {
            log::debug!("Config already present at {}", self.file.path().display());
            return Ok(false);
        }

        self.save(&Config::default())?;
        Ok(true)
    }

    pub fn reset(&self) -> ConfigResult<()> {
        self.save(&Config::default())
    }

    /// Messages for every invalid field of the stored config
    pub fn validate(&self) -> ConfigResult<Vec<String>> {
        let errors = self.load()?.validate().err().unwrap_or_default();
        Ok(errors.iter().map(ToString::to_string).collect())
    }

    /// [`load`](Self::load) followed by [`apply_env_overrides`] on the
    /// process environment
    pub fn load_with_env_overrides(&self) -> ConfigResult<Config> {
        let mut config = self.load()?;
        apply_env_overrides(&mut config, |name| std::env::var(name).ok());

        if let Err(errors) = config.validate() {
            log::warn!("Config invalid after environment overrides: {:?}", errors);
        }
        Ok(config)
    }
}

fn project_dirs() -> ConfigResult<ProjectDirs> {
    ProjectDirs::from("", "", "voxlibre").ok_or(ConfigError::NoHomeDirectory)
}

/// Applies `VOXLIBRE_<SECTION>_<FIELD>` variables found through `lookup`
///
/// Supported: [`ENV_DEFAULT_VOLUME`], [`ENV_VOICE`], [`ENV_DATA_DIR`].
/// A volume that does not parse is ignored.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(raw) = lookup(ENV_DEFAULT_VOLUME) {
        match raw.trim().parse::<u8>() {
            Ok(volume) => config.player.default_volume = volume,
            Err(_) => log::warn!("Ignoring {}={}", ENV_DEFAULT_VOLUME, raw),
        }
    }

    if let Some(voice) = lookup(ENV_VOICE) {
        config.generation.voice = voice;
    }

    if let Some(dir) = lookup(ENV_DATA_DIR) {
        config.app.data_dir = Some(PathBuf::from(dir));
    }
}
