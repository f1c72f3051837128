//! Media Engine - narration playback for VoxLibre
//!
//! Decodes synthesized PCM narration and plays it through an
//! [`AudioBackend`] while tracking progress against the output clock.

mod clock;
mod decoder;
mod engine;
mod error;
mod headless;
mod output;
mod playback_thread;
mod progress;
mod state;

pub use clock::{Clock, ManualClock, SystemClock};
pub use decoder::{
    decode_base64_pcm, decode_pcm16, AudioBuffer, NARRATION_CHANNELS, NARRATION_SAMPLE_RATE,
};
pub use engine::{EngineSettings, PlaybackEngine, DEFAULT_VOICE};
pub use error::{EngineError, EngineResult};
pub use headless::HeadlessBackend;
pub use output::{AudioBackend, OutputSession, SourceEnded, SourceId};
pub use playback_thread::CpalBackend;
pub use voxlibre_core::PlaybackState;
