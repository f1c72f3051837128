//! Remote generation service configuration section

use crate::validation::{ConfigSection, ValidationError, Validator};
use serde::{Deserialize, Serialize};

/// Settings for the story, cover and speech generation service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GenerationConfig {
    /// Service root, without trailing path
    pub base_url: String,

    /// Environment variable holding the API key
    pub api_key_env: String,

    pub story_model: String,
    pub tts_model: String,
    pub image_model: String,

    /// Prebuilt narration voice
    pub voice: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Attempts per request, including the first one
    pub max_attempts: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            api_key_env: "API_KEY".to_string(),
            story_model: "gemini-3-pro-preview".to_string(),
            tts_model: "gemini-2.5-flash-preview-tts".to_string(),
            image_model: "gemini-2.5-flash-image".to_string(),
            voice: "Kore".to_string(),
            timeout_secs: 120,
            max_attempts: 3,
        }
    }
}

impl GenerationConfig {
    /// Reads the API key from the configured environment variable
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

impl ConfigSection for GenerationConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        Validator::collect_errors(vec![
            Validator::http_url(&self.base_url, "generation.base_url"),
            Validator::not_empty(&self.api_key_env, "generation.api_key_env"),
            Validator::not_empty(&self.story_model, "generation.story_model"),
            Validator::not_empty(&self.tts_model, "generation.tts_model"),
            Validator::not_empty(&self.image_model, "generation.image_model"),
            Validator::not_empty(&self.voice, "generation.voice"),
            Validator::in_range(self.timeout_secs, 5, 600, "generation.timeout_secs"),
            Validator::in_range(self.max_attempts, 1, 10, "generation.max_attempts"),
        ])
    }

    fn merge(&mut self, other: Self) {
        self.base_url = other.base_url;
        self.api_key_env = other.api_key_env;
        self.story_model = other.story_model;
        self.tts_model = other.tts_model;
        self.image_model = other.image_model;
        self.voice = other.voice;
        self.timeout_secs = other.timeout_secs;
        self.max_attempts = other.max_attempts;
    }

    fn section_name(&self) -> &'static str {
        "generation"
    }
}
