//! Generation client abstraction

use crate::cover::placeholder_cover;
use crate::error::GenerationResult;
use crate::retry::RetryPolicy;
use crate::types::StoryDraft;
use async_trait::async_trait;
use std::time::Duration;
use voxlibre_config::GenerationConfig;

/// Remote story, speech and cover generation
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Drafts a short story from a free-text prompt
    async fn generate_story(&self, prompt: &str) -> GenerationResult<StoryDraft>;

    /// Synthesizes narration; returns base64 16-bit PCM
    async fn generate_tts(&self, text: &str, voice: &str) -> GenerationResult<String>;

    /// Produces cover art as a URL or data URI, surfacing failures
    async fn try_generate_cover(&self, title: &str, prompt: &str) -> GenerationResult<String>;

    /// Produces cover art, falling back to a placeholder on any failure
    async fn generate_cover(&self, title: &str, prompt: &str) -> String {
        match self.try_generate_cover(title, prompt).await {
            Ok(cover) => cover,
            Err(e) => {
                log::error!("Cover generation failed for '{}': {}", title, e);
                placeholder_cover(title)
            }
        }
    }
}

/// Connection settings for a generation client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    /// Environment variable the key was expected in, for error messages
    pub api_key_env: String,
    pub story_model: String,
    pub tts_model: String,
    pub image_model: String,
    pub timeout: Duration,
    pub user_agent: String,
    pub retry_policy: RetryPolicy,
}

impl ClientConfig {
    /// Builds client settings from the persisted configuration section
    pub fn from_config(config: &GenerationConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key(),
            api_key_env: config.api_key_env.clone(),
            story_model: config.story_model.clone(),
            tts_model: config.tts_model.clone(),
            image_model: config.image_model.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            user_agent: default_user_agent(),
            retry_policy: RetryPolicy::new(config.max_attempts),
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::from_config(&GenerationConfig::default())
    }
}

fn default_user_agent() -> String {
    format!("VoxLibre/{}", env!("CARGO_PKG_VERSION"))
}
