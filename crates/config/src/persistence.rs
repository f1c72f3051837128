//! Reading and writing `config.toml`
//!
//! Writes are staged in a temporary file next to the target and renamed
//! over it. The file being replaced is copied to `config.toml.backup` first.

use crate::error::summarize;
use crate::{Config, ConfigError, ConfigResult, CONFIG_VERSION};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub(crate) struct ConfigFile {
    path: PathBuf,
}

impl ConfigFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn backup_path(&self) -> PathBuf {
        self.path.with_extension("toml.backup")
    }

    /// Parses the file; `None` when it has not been written yet
    ///
    /// Out-of-range values are only logged so a hand-edited file still
    /// loads.
    pub fn read(&self) -> ConfigResult<Option<Config>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ConfigError::io("Cannot read", &self.path, e)),
        };

        let config = parse(&self.path, &contents)?;
        if let Err(errors) = config.validate() {
            log::warn!("{} has invalid values: {}", self.path.display(), summarize(&errors));
        }
        Ok(Some(config))
    }

    /// Validates `config`, then replaces the file atomically
    pub fn write(&self, config: &Config) -> ConfigResult<()> {
        config.validate().map_err(ConfigError::Invalid)?;
        let rendered = config.to_toml()?;

        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(|e| ConfigError::io("Cannot create", dir, e))?;

        if self.exists() {
            let backup = self.backup_path();
            fs::copy(&self.path, &backup).map_err(|e| ConfigError::io("Cannot back up to", &backup, e))?;
        }

        let mut staged = NamedTempFile::new_in(dir).map_err(|e| ConfigError::io("Cannot stage in", dir, e))?;
        staged
            .write_all(rendered.as_bytes())
            .and_then(|()| staged.flush())
            .map_err(|e| ConfigError::io("Cannot write", staged.path(), e))?;
        staged
            .persist(&self.path)
            .map_err(|e| ConfigError::io("Cannot replace", &self.path, e.error))?;

        log::info!("Config saved to {}", self.path.display());
        Ok(())
    }
}

fn parse(path: &Path, contents: &str) -> ConfigResult<Config> {
    if contents.trim().is_empty() {
        return Err(ConfigError::EmptyFile(path.to_path_buf()));
    }

    let config: Config = toml::from_str(contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    if config.version > CONFIG_VERSION {
        return Err(ConfigError::TooNew {
            path: path.to_path_buf(),
            found: config.version,
            supported: CONFIG_VERSION,
        });
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_file() -> (TempDir, ConfigFile) {
        let temp_dir = TempDir::new().unwrap();
        let file = ConfigFile::new(temp_dir.path().join("config.toml"));
        (temp_dir, file)
    }

    #[test]
    fn test_missing_file_reads_as_none() {
        let (_temp_dir, file) = config_file();
        assert!(file.read().unwrap().is_none());
    }

    #[test]
    fn test_written_voice_reads_back() {
        let (_temp_dir, file) = config_file();
        let mut config = Config::default();
        config.generation.voice = "Charon".to_string();

        file.write(&config).unwrap();

        assert_eq!(file.read().unwrap().unwrap().generation.voice, "Charon");
    }

    #[test]
    fn test_write_creates_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let file = ConfigFile::new(temp_dir.path().join("voxlibre").join("config.toml"));

        file.write(&Config::default()).unwrap();
        assert!(file.exists());
    }

    #[test]
    fn test_second_write_keeps_backup_of_first() {
        let (_temp_dir, file) = config_file();
        let mut config = Config::default();
        config.player.default_volume = 40;
        file.write(&config).unwrap();

        config.player.default_volume = 60;
        file.write(&config).unwrap();

        let backup = fs::read_to_string(file.backup_path()).unwrap();
        assert!(backup.contains("default_volume = 40"));
    }

    #[test]
    fn test_garbage_is_a_parse_error() {
        let (_temp_dir, file) = config_file();
        fs::write(file.path(), "voice = [unterminated").unwrap();
        assert!(matches!(file.read(), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_blank_file_is_rejected() {
        let (_temp_dir, file) = config_file();
        fs::write(file.path(), "\n   \n").unwrap();
        assert!(matches!(file.read(), Err(ConfigError::EmptyFile(_))));
    }

    #[test]
    fn test_future_version_is_rejected() {
        let (_temp_dir, file) = config_file();
        fs::write(file.path(), "version = 7\n").unwrap();
        assert!(matches!(file.read(), Err(ConfigError::TooNew { found: 7, .. })));
    }

    #[test]
    fn test_invalid_config_never_reaches_disk() {
        let (_temp_dir, file) = config_file();
        let mut config = Config::default();
        config.player.channels = 6;

        assert!(matches!(file.write(&config), Err(ConfigError::Invalid(_))));
        assert!(!file.exists());
    }

    #[test]
    fn test_hand_edited_out_of_range_value_still_loads() {
        let (_temp_dir, file) = config_file();
        fs::write(file.path(), "[player]\ndefault_volume = 150\n").unwrap();

        let config = file.read().unwrap().unwrap();
        assert_eq!(config.player.default_volume, 150);
    }
}
