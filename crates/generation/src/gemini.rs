//! Client for the Gemini `generateContent` REST API

use crate::client::{ClientConfig, GenerationClient};
use crate::cover::data_uri;
use crate::error::{GenerationError, GenerationResult};
use crate::types::StoryDraft;
use async_trait::async_trait;
use reqwest::{Client as ReqwestClient, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gemini-backed generation client
#[derive(Clone)]
pub struct GeminiClient {
    inner: ReqwestClient,
    config: ClientConfig,
}

impl GeminiClient {
    /// Creates a client; fails early when no API key is available
    pub fn new(config: ClientConfig) -> GenerationResult<Self> {
        if config.api_key.is_none() {
            return Err(GenerationError::MissingApiKey(config.api_key_env.clone()));
        }

        let inner = ReqwestClient::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self { inner, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url, model
        )
    }

    /// Posts one request body to `model`, retrying transient failures
    async fn generate(&self, label: &str, model: &str, body: &Value) -> GenerationResult<GenerateResponse> {
        let url = self.endpoint(model);
        let url = url.as_str();
        let key = self.config.api_key.as_deref().unwrap_or_default();

        self.config
            .retry_policy
            .run(label, || async {
                log::debug!("POST {}", url);
                let response = self
                    .inner
                    .post(url)
                    .header(API_KEY_HEADER, key)
                    .json(body)
                    .send()
                    .await?;

                let status = response.status();
                if !status.is_success() {
                    let text = response.text().await.unwrap_or_default();
                    return Err(api_error(status, &text));
                }

                Ok::<_, GenerationError>(response.json::<GenerateResponse>().await?)
            })
            .await
    }
}

#[async_trait]
impl GenerationClient for GeminiClient {
    async fn generate_story(&self, prompt: &str) -> GenerationResult<StoryDraft> {
        if prompt.trim().is_empty() {
            return Err(GenerationError::EmptyPrompt);
        }

        let body = story_request(prompt);
        let response = self
            .generate("story generation", &self.config.story_model, &body)
            .await?;

        let text = response
            .first_text()
            .ok_or_else(|| GenerationError::MalformedResponse("story response had no text".to_string()))?;
        let draft: StoryDraft = serde_json::from_str(text)?;

        if let Some(field) = draft.missing_field() {
            return Err(GenerationError::MalformedResponse(format!(
                "story is missing '{}'",
                field
            )));
        }

        log::info!("Drafted story '{}' ({} chars)", draft.title, draft.content.len());
        Ok(draft)
    }

    async fn generate_tts(&self, text: &str, voice: &str) -> GenerationResult<String> {
        let body = tts_request(text, voice);
        let response = self
            .generate("speech synthesis", &self.config.tts_model, &body)
            .await?;

        let audio = response
            .first_part()
            .and_then(|part| part.inline_data.as_ref())
            .map(|data| data.data.clone())
            .filter(|data| !data.is_empty())
            .ok_or(GenerationError::MissingAudio)?;

        log::debug!("Received {} bytes of base64 narration", audio.len());
        Ok(audio)
    }

    async fn try_generate_cover(&self, title: &str, prompt: &str) -> GenerationResult<String> {
        let body = cover_request(title, prompt);
        let response = self
            .generate("cover generation", &self.config.image_model, &body)
            .await?;

        let cover = response
            .parts()
            .find_map(|part| part.inline_data.as_ref())
            .map(|image| data_uri(image.mime_type.as_deref(), &image.data))
            .ok_or(GenerationError::MissingImage);
        cover
    }
}

fn story_request(prompt: &str) -> Value {
    let text = format!(
        "Create an immersive and cinematic short story (300-400 words) based on: \"{}\". \
         Include a compelling title and a short one-sentence hook.",
        prompt
    );

    json!({
        "contents": [{ "parts": [{ "text": text }] }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": {
                "type": "OBJECT",
                "properties": {
                    "title": { "type": "STRING" },
                    "author": { "type": "STRING" },
                    "content": { "type": "STRING" },
                    "description": { "type": "STRING" }
                },
                "required": ["title", "author", "content", "description"]
            }
        }
    })
}

fn tts_request(text: &str, voice: &str) -> Value {
    json!({
        "contents": [{
            "parts": [{ "text": format!("Narrate this story with expression and clarity: {}", text) }]
        }],
        "generationConfig": {
            "responseModalities": ["AUDIO"],
            "speechConfig": {
                "voiceConfig": {
                    "prebuiltVoiceConfig": { "voiceName": voice }
                }
            }
        }
    })
}

fn cover_request(title: &str, prompt: &str) -> Value {
    let text = format!(
        "A professional, cinematic, and artistic book cover for a title \"{}\". Theme: {}. \
         No text on the image, purely artistic illustration, highly detailed, 4k quality.",
        title, prompt
    );

    json!({
        "contents": [{ "parts": [{ "text": text }] }],
        "generationConfig": {
            "responseModalities": ["TEXT", "IMAGE"],
            "imageConfig": { "aspectRatio": "3:4" }
        }
    })
}

fn api_error(status: StatusCode, body: &str) -> GenerationError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| body.trim().to_string());

    GenerationError::Api {
        status: status.as_u16(),
        message,
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(default)]
    mime_type: Option<String>,
    data: String,
}

impl GenerateResponse {
    /// Parts of the first candidate only
    fn parts(&self) -> impl Iterator<Item = &Part> {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .into_iter()
            .flat_map(|content| content.parts.iter())
    }

    fn first_part(&self) -> Option<&Part> {
        self.parts().next()
    }

    fn first_text(&self) -> Option<&str> {
        self.parts().find_map(|part| part.text.as_deref())
    }
}
