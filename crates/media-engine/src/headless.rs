//! Device-free output backend
//!
//! Sessions keep time with a [`Clock`] instead of rendering samples. The
//! backend records what was connected so callers can inspect it, and
//! [`HeadlessBackend::finish_elapsed`] plays the role of the device
//! reaching the end of a source.

use crate::clock::{Clock, SystemClock};
use crate::decoder::AudioBuffer;
use crate::error::{EngineError, EngineResult};
use crate::output::{AudioBackend, OutputSession, SourceEnded, SourceId};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

struct HeadlessSource {
    session: u64,
    duration: f64,
    offset: f64,
    started_at: f64,
    on_ended: SourceEnded,
}

#[derive(Default)]
struct Registry {
    next_source: u64,
    next_session: u64,
    sessions_opened: usize,
    open_sessions: usize,
    sources: BTreeMap<SourceId, HeadlessSource>,
    started_offsets: Vec<f64>,
    last_gain: Option<f32>,
    unavailable: bool,
}

/// Output backend without an audio device
#[derive(Clone)]
pub struct HeadlessBackend {
    clock: Arc<dyn Clock>,
    registry: Arc<Mutex<Registry>>,
}

impl HeadlessBackend {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            registry: Arc::new(Mutex::new(Registry::default())),
        }
    }

    /// Headless output that keeps real time
    pub fn realtime() -> Self {
        Self::new(Arc::new(SystemClock::new()))
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sources connected across all open sessions
    pub fn connected_sources(&self) -> usize {
        self.registry().sources.len()
    }

    /// Gain most recently applied to any session
    pub fn last_gain(&self) -> Option<f32> {
        self.registry().last_gain
    }

    pub fn sessions_opened(&self) -> usize {
        self.registry().sessions_opened
    }

    pub fn open_sessions(&self) -> usize {
        self.registry().open_sessions
    }

    /// Offsets (seconds) every source was started from, in order
    pub fn started_offsets(&self) -> Vec<f64> {
        self.registry().started_offsets.clone()
    }

    /// Makes subsequent `open_session` calls fail as if no device existed
    pub fn set_unavailable(&self, unavailable: bool) {
        self.registry().unavailable = unavailable;
    }

    /// Ends every source whose playhead has reached its buffer's end and
    /// fires their callbacks; returns how many ended
    pub fn finish_elapsed(&self) -> usize {
        let now = self.clock.now();

        let ended: Vec<(SourceId, SourceEnded)> = {
            let mut registry = self.registry();
            let due: Vec<SourceId> = registry
                .sources
                .iter()
                .filter(|(_, s)| now - s.started_at + s.offset >= s.duration)
                .map(|(id, _)| *id)
                .collect();

            due.into_iter()
                .filter_map(|id| registry.sources.remove(&id).map(|s| (id, s.on_ended)))
                .collect()
        };

        let count = ended.len();
        for (id, on_ended) in ended {
            log::debug!("Headless {} reached its end", id);
            on_ended(id);
        }
        count
    }
}

impl AudioBackend for HeadlessBackend {
    fn open_session(&self, sample_rate: u32, channels: u16) -> EngineResult<Box<dyn OutputSession>> {
        let mut registry = self.registry();
        if registry.unavailable {
            return Err(EngineError::OutputError("No output device available".to_string()));
        }

        registry.next_session += 1;
        registry.sessions_opened += 1;
        registry.open_sessions += 1;
        log::debug!(
            "Opened headless session {} ({} Hz, {} ch)",
            registry.next_session,
            sample_rate,
            channels
        );

        Ok(Box::new(HeadlessSession {
            id: registry.next_session,
            clock: Arc::clone(&self.clock),
            registry: Arc::clone(&self.registry),
            closed: false,
        }))
    }

    fn name(&self) -> &str {
        "headless"
    }
}

struct HeadlessSession {
    id: u64,
    clock: Arc<dyn Clock>,
    registry: Arc<Mutex<Registry>>,
    closed: bool,
}

impl HeadlessSession {
    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl OutputSession for HeadlessSession {
    fn current_time(&self) -> f64 {
        self.clock.now()
    }

    fn set_gain(&self, gain: f32) {
        self.registry().last_gain = Some(gain);
    }

    fn start_source(
        &mut self,
        buffer: Arc<AudioBuffer>,
        offset: f64,
        on_ended: SourceEnded,
    ) -> EngineResult<SourceId> {
        if self.closed {
            return Err(EngineError::InvalidState("Output session is closed".to_string()));
        }

        let started_at = self.clock.now();
        let mut registry = self.registry();
        registry.next_source += 1;
        let id = SourceId(registry.next_source);

        registry.started_offsets.push(offset);
        registry.sources.insert(
            id,
            HeadlessSource {
                session: self.id,
                duration: buffer.duration(),
                offset,
                started_at,
                on_ended,
            },
        );
        Ok(id)
    }

    fn stop_source(&mut self, id: SourceId) {
        self.registry().sources.remove(&id);
    }

    fn connected_sources(&self) -> usize {
        let session = self.id;
        self.registry()
            .sources
            .values()
            .filter(|s| s.session == session)
            .count()
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        let session = self.id;
        let mut registry = self.registry();
        registry.sources.retain(|_, s| s.session != session);
        registry.open_sessions = registry.open_sessions.saturating_sub(1);
    }
}

impl Drop for HeadlessSession {
    fn drop(&mut self) {
        self.close();
    }
}
