//! Field validation shared by the config sections

use std::fmt::Display;
use thiserror::Error;

/// One rejected config field
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Field '{field}': {message}{}", rejected(.value))]
pub struct ValidationError {
    /// Dotted path, e.g. `player.default_volume`
    pub field: String,
    pub message: String,
    pub value: Option<String>,
}

fn rejected(value: &Option<String>) -> String {
    value
        .as_ref()
        .map(|v| format!(" (got: {})", v))
        .unwrap_or_default()
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            value: None,
        }
    }

    pub fn with_value(field: impl Into<String>, message: impl Into<String>, value: impl ToString) -> Self {
        Self {
            value: Some(value.to_string()),
            ..Self::new(field, message)
        }
    }
}

/// A `[section]` of `config.toml`
pub trait ConfigSection: Default {
    fn validate(&self) -> Result<(), Vec<ValidationError>>;

    /// Takes every value from `other`
    fn merge(&mut self, other: Self);

    /// Table name, also the prefix of field paths
    fn section_name(&self) -> &'static str;
}

/// Checks used by the sections' `validate`
pub struct Validator;

impl Validator {
    /// Inclusive on both ends
    pub fn in_range<T>(value: T, min: T, max: T, field: &str) -> Result<(), ValidationError>
    where
        T: PartialOrd + Display + Copy,
    {
        if (min..=max).contains(&value) {
            return Ok(());
        }
        Err(ValidationError::with_value(
            field,
            format!("must be between {} and {}", min, max),
            value,
        ))
    }

    pub fn not_empty(value: &str, field: &str) -> Result<(), ValidationError> {
        match value.trim() {
            "" => Err(ValidationError::new(field, "must not be empty")),
            _ => Ok(()),
        }
    }

    pub fn http_url(value: &str, field: &str) -> Result<(), ValidationError> {
        let scheme_ok = ["https://", "http://"]
            .iter()
            .any(|scheme| value.starts_with(scheme));
        if scheme_ok {
            return Ok(());
        }
        Err(ValidationError::with_value(
            field,
            "must start with http:// or https://",
            value,
        ))
    }

    pub fn one_of<T>(value: &T, allowed: &[T], field: &str) -> Result<(), ValidationError>
    where
        T: PartialEq + Display,
    {
        if allowed.contains(value) {
            return Ok(());
        }
        let options: Vec<String> = allowed.iter().map(ToString::to_string).collect();
        Err(ValidationError::with_value(
            field,
            format!("must be one of: {}", options.join(", ")),
            value,
        ))
    }

    /// Keeps the failures; `Ok` when there are none
    pub fn collect_errors<I>(results: I) -> Result<(), Vec<ValidationError>>
    where
        I: IntoIterator<Item = Result<(), ValidationError>>,
    {
        let errors: Vec<_> = results.into_iter().filter_map(Result::err).collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
