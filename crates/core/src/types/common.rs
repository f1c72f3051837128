//! Small value types shared by the domain models

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Wall-clock instant in Unix milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(i64);

impl Timestamp {
    /// A clock set before 1970 reads as 0
    pub fn now() -> Self {
        let since_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Self(i64::try_from(since_epoch.as_millis()).unwrap_or(i64::MAX))
    }

    pub fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    pub fn as_millis(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Playback time in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Duration(u64);

impl Duration {
    pub const ZERO: Self = Self(0);

    pub fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Converts fractional seconds, clamping negatives and NaN to zero
    pub fn from_secs_f64(seconds: f64) -> Self {
        if seconds.is_finite() && seconds > 0.0 {
            Self((seconds * 1000.0).round() as u64)
        } else {
            Self::ZERO
        }
    }

    pub fn as_millis(&self) -> u64 {
        self.0
    }

    pub fn as_secs_f64(&self) -> f64 {
        self.0 as f64 / 1000.0
    }

    /// Formats as M:SS, or H:MM:SS once past the hour
    pub fn as_clock(&self) -> String {
        let total_seconds = self.0 / 1000;
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}:{:02}:{:02}", hours, minutes, seconds)
        } else {
            format!("{}:{:02}", minutes, seconds)
        }
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_clock())
    }
}

impl From<std::time::Duration> for Duration {
    fn from(d: std::time::Duration) -> Self {
        Self(d.as_millis() as u64)
    }
}

/// Domain values that can check their own invariants
pub trait Validator {
    /// One message per violated rule
    fn validate(&self) -> Result<(), Vec<String>>;

    fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_from_millis() {
        let t = Timestamp::from_millis(1234567890123);
        assert_eq!(t.as_millis(), 1234567890123);
        assert_eq!(t.to_string(), "1234567890123");
    }

    #[test]
    fn test_timestamp_now_is_after_epoch() {
        assert!(Timestamp::now().as_millis() > 0);
    }

    #[test]
    fn test_duration_from_secs_f64() {
        assert_eq!(Duration::from_secs_f64(1.5).as_millis(), 1500);
        assert_eq!(Duration::from_secs_f64(-3.0), Duration::ZERO);
        assert_eq!(Duration::from_secs_f64(f64::NAN), Duration::ZERO);
    }

    #[test]
    fn test_duration_as_clock() {
        assert_eq!(Duration::from_millis(0).as_clock(), "0:00");
        assert_eq!(Duration::from_millis(125_000).as_clock(), "2:05");
        assert_eq!(Duration::from_millis(3_665_000).as_clock(), "1:01:05");
    }

    #[test]
    fn test_duration_from_std_duration() {
        let d: Duration = std::time::Duration::from_secs(42).into();
        assert_eq!(d.as_secs_f64(), 42.0);
    }

    #[test]
    fn test_validator_trait() {
        struct Rating(i32);

        impl Validator for Rating {
            fn validate(&self) -> Result<(), Vec<String>> {
                if self.0 < 0 {
                    Err(vec!["Rating must be positive".to_string()])
                } else {
                    Ok(())
                }
            }
        }

        assert!(Rating(3).is_valid());
        assert!(!Rating(-1).is_valid());
    }
}
