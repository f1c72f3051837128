//! Output sessions: the sink a playing source is connected to

use crate::decoder::AudioBuffer;
use crate::error::EngineResult;
use std::fmt;
use std::sync::Arc;

/// Identifies one started source within a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(pub u64);

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "source#{}", self.0)
    }
}

/// Called once when a source plays through to its end
pub type SourceEnded = Box<dyn FnOnce(SourceId) + Send>;

/// Produces output sessions
pub trait AudioBackend: Send + Sync {
    /// Opens a session with its own clock and a persistent gain stage
    fn open_session(&self, sample_rate: u32, channels: u16) -> EngineResult<Box<dyn OutputSession>>;

    fn name(&self) -> &str;
}

/// One output graph: a clock, a gain stage and at most the sources the
/// caller starts on it
///
/// Implementations must never invoke a `SourceEnded` callback from inside
/// `start_source`, `stop_source` or `close`.
pub trait OutputSession: Send {
    /// Session clock in seconds; advances while the session is open
    fn current_time(&self) -> f64;

    /// Applies a linear gain to everything connected to the session
    fn set_gain(&self, gain: f32);

    /// Starts `buffer` from `offset` seconds
    fn start_source(
        &mut self,
        buffer: Arc<AudioBuffer>,
        offset: f64,
        on_ended: SourceEnded,
    ) -> EngineResult<SourceId>;

    /// Stops and disconnects a source; its end callback is dropped unfired
    fn stop_source(&mut self, id: SourceId);

    /// Number of sources currently connected to the sink
    fn connected_sources(&self) -> usize;

    /// Releases the session; stops anything still connected
    fn close(&mut self);
}
