//! Progress tracking and end-of-track detection

use crate::engine::{lock_inner, EngineInner};
use crate::output::SourceId;
use std::sync::{Mutex, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// A source ending this close to the buffer's end counts as finished
pub(crate) const END_TOLERANCE_SECS: f64 = 0.1;

impl EngineInner {
    /// Recomputes progress from the session clock
    ///
    /// Returns false once there is nothing left to track.
    pub(crate) fn refresh_progress(&mut self) -> bool {
        if !self.state.is_playing || !self.track.is_sounding() {
            return false;
        }
        let Some(duration) = self.track.duration() else {
            return false;
        };

        let progress = if duration > 0.0 {
            self.track.elapsed() / duration * 100.0
        } else {
            100.0
        };

        if progress >= 100.0 {
            self.finish_track();
            return false;
        }

        self.state.progress = progress.max(0.0);
        self.publish();
        true
    }

    /// End of track: silence, rewind, stop tracking
    pub(crate) fn finish_track(&mut self) {
        self.track.stop_source();
        self.track.offset = 0.0;
        self.state.progress = 0.0;
        self.state.is_playing = false;
        self.stop_ticker();
        self.publish();

        if let Some(book) = &self.book {
            log::info!("Finished '{}'", book.title);
        }
    }

    /// Handles a source that the output played through
    pub(crate) fn source_ended(&mut self, id: SourceId, load_epoch: u64) {
        if self.load_epoch != load_epoch || self.track.source != Some(id) {
            return;
        }

        let elapsed = self.track.elapsed();
        let duration = self.track.duration().unwrap_or(0.0);

        if elapsed >= duration - END_TOLERANCE_SECS {
            self.finish_track();
        } else {
            log::debug!("{} ended early at {:.2}s of {:.2}s", id, elapsed, duration);
            self.track.halt();
            self.state.is_playing = false;
            self.stop_ticker();
            self.publish();
        }
    }

    pub(crate) fn stop_ticker(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }
}

/// Starts the repeating progress task for a playing engine
///
/// The task holds only a weak reference and ends on its own when playback
/// stops or the engine is dropped. Without a runtime there is no ticker;
/// progress then moves only on explicit refresh.
pub(crate) fn spawn_ticker(engine: Weak<Mutex<EngineInner>>, period: Duration) -> Option<JoinHandle<()>> {
    let runtime = match Handle::try_current() {
        Ok(handle) => handle,
        Err(_) => {
            log::debug!("No async runtime; progress refreshes on demand only");
            return None;
        }
    };

    Some(runtime.spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            interval.tick().await;

            let Some(inner) = engine.upgrade() else {
                break;
            };
            if !lock_inner(&inner).refresh_progress() {
                break;
            }
        }
    }))
}
