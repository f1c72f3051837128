//! Remote generation for VoxLibre
//!
//! Drafts stories, paints covers and synthesizes narration through a
//! [`GenerationClient`]. [`GeminiClient`] talks to the hosted service;
//! [`Studio`] chains the three calls into a ready-to-shelve [`voxlibre_core::Book`].

mod client;
mod cover;
mod error;
mod gemini;
mod retry;
mod studio;
mod types;

pub use client::{ClientConfig, GenerationClient};
pub use cover::{data_uri, placeholder_cover};
pub use error::{GenerationError, GenerationResult};
pub use gemini::GeminiClient;
pub use retry::RetryPolicy;
pub use studio::{GeneratedBook, Studio, StudioStep, GENERATED_DURATION, GENERATED_RATING};
pub use types::StoryDraft;
