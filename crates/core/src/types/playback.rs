//! Playback-related domain models

use crate::types::{BookId, Validator};
use serde::{Deserialize, Serialize};

/// Default output volume (0-100)
pub const DEFAULT_VOLUME: u8 = 80;

/// Transport state published by the playback engine
///
/// `current_book` refers into the library by id; the state never owns the
/// book itself and is never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackState {
    pub is_playing: bool,
    pub current_book: Option<BookId>,
    /// Percentage of the current track elapsed, in [0, 100)
    pub progress: f64,
    /// Rate multiplier; not wired to the output
    pub speed: f32,
    pub volume: u8, // 0-100
}

impl PlaybackState {
    pub fn new(volume: u8) -> Self {
        Self {
            is_playing: false,
            current_book: None,
            progress: 0.0,
            speed: 1.0,
            volume: volume.min(100),
        }
    }

    /// Returns true when nothing has been selected yet
    pub fn is_idle(&self) -> bool {
        self.current_book.is_none()
    }

    /// Gain applied to the output for the current volume
    pub fn gain(&self) -> f32 {
        f32::from(self.volume) / 100.0
    }
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self::new(DEFAULT_VOLUME)
    }
}

impl Validator for PlaybackState {
    fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.volume > 100 {
            errors.push("Volume must be between 0 and 100".to_string());
        }

        if !(0.0..100.0).contains(&self.progress) {
            errors.push("Progress must be in [0, 100)".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_is_idle() {
        let state = PlaybackState::default();
        assert!(state.is_idle());
        assert!(!state.is_playing);
        assert_eq!(state.volume, DEFAULT_VOLUME);
        assert_eq!(state.speed, 1.0);
        assert!(state.is_valid());
    }

    #[test]
    fn test_volume_is_clamped() {
        assert_eq!(PlaybackState::new(250).volume, 100);
    }

    #[test]
    fn test_gain() {
        let state = PlaybackState::new(80);
        assert!((state.gain() - 0.8).abs() < f32::EPSILON);
    }

    #[test]
    fn test_progress_at_hundred_is_invalid() {
        let mut state = PlaybackState::default();
        state.progress = 100.0;
        assert!(!state.is_valid());
    }
}
