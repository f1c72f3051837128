//! Per-book output resources

use crate::decoder::AudioBuffer;
use crate::output::{OutputSession, SourceId};
use std::sync::Arc;

/// The loaded book's session, decoded narration and playhead
///
/// Everything here belongs to one selected book and is dropped as a unit
/// when another book is selected.
#[derive(Default)]
pub(crate) struct Track {
    pub session: Option<Box<dyn OutputSession>>,
    pub buffer: Option<Arc<AudioBuffer>>,
    pub source: Option<SourceId>,
    /// Session time at which `source` started
    pub started_at: f64,
    /// Seconds of narration played before `started_at`
    pub offset: f64,
}

impl Track {
    pub fn is_sounding(&self) -> bool {
        self.source.is_some()
    }

    pub fn duration(&self) -> Option<f64> {
        self.buffer.as_ref().map(|b| b.duration())
    }

    /// Seconds of narration played so far
    pub fn elapsed(&self) -> f64 {
        match (&self.session, self.source) {
            (Some(session), Some(_)) => session.current_time() - self.started_at + self.offset,
            _ => self.offset,
        }
    }

    pub fn connected_sources(&self) -> usize {
        self.session
            .as_ref()
            .map(|s| s.connected_sources())
            .unwrap_or(0)
    }

    /// Stops the active source and folds its play time into the offset
    pub fn halt(&mut self) {
        if self.source.is_none() {
            return;
        }
        let elapsed = self.elapsed();
        self.stop_source();
        self.offset = match self.duration() {
            Some(duration) => elapsed.clamp(0.0, duration),
            None => elapsed.max(0.0),
        };
    }

    /// Stops the active source without touching the offset
    pub fn stop_source(&mut self) {
        if let (Some(session), Some(id)) = (self.session.as_mut(), self.source.take()) {
            session.stop_source(id);
        }
    }

    /// Closes the session and forgets the decoded narration
    pub fn teardown(&mut self) {
        self.stop_source();
        if let Some(mut session) = self.session.take() {
            session.close();
        }
        *self = Track::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, ManualClock};
    use crate::headless::HeadlessBackend;
    use crate::output::AudioBackend;

    fn playing_track(clock: &Arc<ManualClock>, backend: &HeadlessBackend) -> Track {
        let buffer = Arc::new(AudioBuffer::silence(10, 1, 100).unwrap());
        let mut session = backend.open_session(10, 1).unwrap();
        let source = session.start_source(buffer.clone(), 2.0, Box::new(|_| {})).unwrap();

        Track {
            session: Some(session),
            buffer: Some(buffer),
            source: Some(source),
            started_at: clock.now(),
            offset: 2.0,
        }
    }

    #[test]
    fn test_halt_accumulates_offset() {
        let clock = Arc::new(ManualClock::new());
        let backend = HeadlessBackend::new(clock.clone());
        let mut track = playing_track(&clock, &backend);

        clock.advance_secs(3.0);
        assert!((track.elapsed() - 5.0).abs() < 1e-9);

        track.halt();
        assert!(!track.is_sounding());
        assert!((track.offset - 5.0).abs() < 1e-9);
        assert_eq!(backend.connected_sources(), 0);

        // Halting twice changes nothing
        clock.advance_secs(3.0);
        track.halt();
        assert!((track.offset - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_halt_clamps_to_duration() {
        let clock = Arc::new(ManualClock::new());
        let backend = HeadlessBackend::new(clock.clone());
        let mut track = playing_track(&clock, &backend);

        clock.advance_secs(60.0);
        track.halt();
        assert_eq!(track.offset, 10.0);
    }

    #[test]
    fn test_teardown_closes_session() {
        let clock = Arc::new(ManualClock::new());
        let backend = HeadlessBackend::new(clock.clone());
        let mut track = playing_track(&clock, &backend);

        track.teardown();
        assert!(track.session.is_none());
        assert!(track.buffer.is_none());
        assert_eq!(track.offset, 0.0);
        assert_eq!(backend.open_sessions(), 0);
    }
}
