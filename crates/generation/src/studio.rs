//! Studio pipeline: prompt to narrated library book

use crate::client::GenerationClient;
use crate::error::{GenerationError, GenerationResult};
use std::fmt;
use std::sync::Arc;
use voxlibre_core::{category, Book, BookId};

/// Display length for generated stories
pub const GENERATED_DURATION: &str = "Short Story";

/// Rating given to freshly generated books
pub const GENERATED_RATING: f32 = 5.0;

/// Progress reported while a book is being generated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StudioStep {
    Story,
    Cover,
    Narration,
}

impl fmt::Display for StudioStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            StudioStep::Story => "Weaving the story threads...",
            StudioStep::Cover => "Painting the cover art...",
            StudioStep::Narration => "Tuning neural voice narration...",
        };
        f.write_str(message)
    }
}

/// A generated book together with its synthesized narration
#[derive(Debug, Clone)]
pub struct GeneratedBook {
    pub book: Book,
    /// Base64 PCM, ready for playback without another synthesis call
    pub narration: String,
}

/// Drives story, cover and narration generation for one prompt
pub struct Studio {
    client: Arc<dyn GenerationClient>,
    voice: String,
}

impl Studio {
    pub fn new(client: Arc<dyn GenerationClient>, voice: impl Into<String>) -> Self {
        Self {
            client,
            voice: voice.into(),
        }
    }

    pub fn voice(&self) -> &str {
        &self.voice
    }

    /// Generates a complete book from `prompt`
    ///
    /// `on_step` is called before each stage starts. Cover failures fall
    /// back to a placeholder; story or narration failures abort.
    pub async fn create_book<F>(&self, prompt: &str, mut on_step: F) -> GenerationResult<GeneratedBook>
    where
        F: FnMut(StudioStep) + Send,
    {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(GenerationError::EmptyPrompt);
        }

        on_step(StudioStep::Story);
        let draft = self.client.generate_story(prompt).await?;

        on_step(StudioStep::Cover);
        let cover_url = self.client.generate_cover(&draft.title, prompt).await;

        on_step(StudioStep::Narration);
        let narration = self.client.generate_tts(&draft.content, &self.voice).await?;

        let mut book = Book::new(BookId::generate(), draft.title, draft.author, category::AI_GENERATED)
            .with_content(draft.content);
        book.description = draft.description;
        book.cover_url = cover_url;
        book.duration = GENERATED_DURATION.to_string();
        book.rating = GENERATED_RATING;
        book.is_generated = Some(true);

        log::info!("Generated book '{}' ({})", book.title, book.id);
        Ok(GeneratedBook { book, narration })
    }
}
