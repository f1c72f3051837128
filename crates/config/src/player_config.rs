//! Player configuration section

use crate::validation::{ConfigSection, ValidationError, Validator};
use serde::{Deserialize, Serialize};

/// Where decoded narration is sent
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    /// Default system output device
    Cpal,
    /// No device; time advances on the wall clock only
    Headless,
}

impl std::fmt::Display for OutputKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputKind::Cpal => write!(f, "cpal"),
            OutputKind::Headless => write!(f, "headless"),
        }
    }
}

/// Playback engine settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlayerConfig {
    /// Initial volume level (0-100)
    pub default_volume: u8,

    /// Sample rate of synthesized narration in Hz
    pub sample_rate: u32,

    /// Channel count of synthesized narration
    pub channels: u16,

    /// Progress refresh cadence in milliseconds
    pub progress_interval_ms: u64,

    pub output: OutputKind,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            default_volume: 80,
            sample_rate: 24_000,
            channels: 1,
            progress_interval_ms: 16,
            output: OutputKind::Cpal,
        }
    }
}

impl ConfigSection for PlayerConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        Validator::collect_errors(vec![
            Validator::in_range(self.default_volume, 0, 100, "player.default_volume"),
            Validator::in_range(self.sample_rate, 8_000, 48_000, "player.sample_rate"),
            Validator::one_of(&self.channels, &[1, 2], "player.channels"),
            Validator::in_range(
                self.progress_interval_ms,
                8,
                1_000,
                "player.progress_interval_ms",
            ),
        ])
    }

    fn merge(&mut self, other: Self) {
        self.default_volume = other.default_volume;
        self.sample_rate = other.sample_rate;
        self.channels = other.channels;
        self.progress_interval_ms = other.progress_interval_ms;
        self.output = other.output;
    }

    fn section_name(&self) -> &'static str {
        "player"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = PlayerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.sample_rate, 24_000);
        assert_eq!(config.channels, 1);
    }

    #[test]
    fn test_invalid_volume() {
        let config = PlayerConfig {
            default_volume: 101,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_multiple_validation_errors() {
        let config = PlayerConfig {
            default_volume: 101,
            channels: 6,
            progress_interval_ms: 0,
            ..Default::default()
        };

        assert_eq!(config.validate().unwrap_err().len(), 3);
    }

    #[test]
    fn test_merge() {
        let mut base = PlayerConfig::default();
        let other = PlayerConfig {
            default_volume: 40,
            output: OutputKind::Headless,
            ..Default::default()
        };

        base.merge(other);
        assert_eq!(base.default_volume, 40);
        assert_eq!(base.output, OutputKind::Headless);
    }

    #[test]
    fn test_output_kind_serializes_lowercase() {
        let toml = toml::to_string(&PlayerConfig::default()).unwrap();
        assert!(toml.contains("output = \"cpal\""));
    }
}
