//! Playback engine: one book, one output session, one sounding source

use crate::decoder::{decode_base64_pcm, AudioBuffer, NARRATION_CHANNELS, NARRATION_SAMPLE_RATE};
use crate::error::{EngineError, EngineResult};
use crate::output::{AudioBackend, SourceEnded};
use crate::progress::spawn_ticker;
use crate::state::Track;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration as StdDuration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use voxlibre_config::PlayerConfig;
use voxlibre_core::{Book, Duration, PlaybackState, DEFAULT_VOLUME};
use voxlibre_generation::GenerationClient;

/// Voice used when none is configured
pub const DEFAULT_VOICE: &str = "Kore";

/// Engine tuning
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    /// Sample rate of synthesized narration
    pub sample_rate: u32,
    pub channels: u16,
    pub voice: String,
    /// Cadence of progress updates while playing
    pub progress_interval: StdDuration,
    pub default_volume: u8,
}

impl EngineSettings {
    pub fn from_config(player: &PlayerConfig, voice: impl Into<String>) -> Self {
        Self {
            sample_rate: player.sample_rate,
            channels: player.channels,
            voice: voice.into(),
            progress_interval: StdDuration::from_millis(player.progress_interval_ms),
            default_volume: player.default_volume.min(100),
        }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            sample_rate: NARRATION_SAMPLE_RATE,
            channels: NARRATION_CHANNELS,
            voice: DEFAULT_VOICE.to_string(),
            progress_interval: StdDuration::from_millis(16),
            default_volume: DEFAULT_VOLUME,
        }
    }
}

/// Everything guarded by the engine lock
pub(crate) struct EngineInner {
    pub state: PlaybackState,
    pub book: Option<Book>,
    pub track: Track,
    /// Content-less book "playing" without audio
    pub simulated: bool,
    /// A `play()` is waiting on speech synthesis
    pub synthesizing: bool,
    /// Bumped whenever the loaded book changes or the engine closes
    pub load_epoch: u64,
    /// Bumped on every transport command
    pub intent: u64,
    pub ticker: Option<JoinHandle<()>>,
    pub closed: bool,
    updates: watch::Sender<PlaybackState>,
}

impl EngineInner {
    pub(crate) fn publish(&self) {
        self.updates.send_replace(self.state.clone());
    }

    fn ensure_open(&self) -> EngineResult<()> {
        if self.closed {
            Err(EngineError::InvalidState("Engine is closed".to_string()))
        } else {
            Ok(())
        }
    }

    fn book_title(&self) -> &str {
        self.book.as_ref().map(|b| b.title.as_str()).unwrap_or("")
    }
}

pub(crate) fn lock_inner(inner: &Mutex<EngineInner>) -> MutexGuard<'_, EngineInner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Synthesis requested by a `play()` that has not resolved yet
struct PendingSynthesis {
    text: String,
    load_epoch: u64,
    intent: u64,
}

/// Audiobook transport over an [`AudioBackend`]
///
/// Narration is synthesized on first play and cached for as long as the
/// book stays selected. Results of synthesis that resolve after a pause or
/// a book change are discarded rather than started.
pub struct PlaybackEngine {
    inner: Arc<Mutex<EngineInner>>,
    backend: Arc<dyn AudioBackend>,
    client: Arc<dyn GenerationClient>,
    settings: EngineSettings,
}

impl PlaybackEngine {
    pub fn new(
        backend: Arc<dyn AudioBackend>,
        client: Arc<dyn GenerationClient>,
        settings: EngineSettings,
    ) -> Self {
        let state = PlaybackState::new(settings.default_volume);
        let (updates, _) = watch::channel(state.clone());

        log::debug!("Playback engine using {} output", backend.name());

        Self {
            inner: Arc::new(Mutex::new(EngineInner {
                state,
                book: None,
                track: Track::default(),
                simulated: false,
                synthesizing: false,
                load_epoch: 0,
                intent: 0,
                ticker: None,
                closed: false,
                updates,
            })),
            backend,
            client,
            settings,
        }
    }

    fn lock(&self) -> MutexGuard<'_, EngineInner> {
        lock_inner(&self.inner)
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn snapshot(&self) -> PlaybackState {
        self.lock().state.clone()
    }

    /// Receives every published state change
    pub fn subscribe(&self) -> watch::Receiver<PlaybackState> {
        self.lock().updates.subscribe()
    }

    pub fn current_book(&self) -> Option<Book> {
        self.lock().book.clone()
    }

    /// True while a content-less book is "playing" without audio
    pub fn is_simulated(&self) -> bool {
        self.lock().simulated
    }

    /// True once narration for the current book has been decoded
    pub fn has_narration_cached(&self) -> bool {
        self.lock().track.buffer.is_some()
    }

    /// Sources connected to the current session's sink
    pub fn connected_sources(&self) -> usize {
        self.lock().track.connected_sources()
    }

    /// Elapsed and total time of the decoded narration
    pub fn timeline(&self) -> Option<(Duration, Duration)> {
        let inner = self.lock();
        let total = inner.track.duration()?;
        let elapsed = inner.track.elapsed().clamp(0.0, total);
        Some((Duration::from_secs_f64(elapsed), Duration::from_secs_f64(total)))
    }

    /// Selects `book` and starts it
    ///
    /// The previous book's session and narration are released first. A
    /// book without narration text enters simulated playback instead.
    pub async fn select_book(&self, book: Book) -> EngineResult<()> {
        if self.load(book, None)? {
            return Ok(());
        }
        self.play().await
    }

    /// Like [`select_book`](Self::select_book), with narration that was
    /// synthesized ahead of time
    ///
    /// Unusable narration is logged and synthesized again on demand.
    pub async fn select_book_with_narration(&self, book: Book, audio_base64: &str) -> EngineResult<()> {
        let buffer = match decode_base64_pcm(audio_base64, self.settings.sample_rate, self.settings.channels) {
            Ok(buffer) => Some(Arc::new(buffer)),
            Err(e) => {
                log::warn!("Discarding pre-synthesized narration for '{}': {}", book.title, e);
                None
            }
        };

        if self.load(book, buffer)? {
            return Ok(());
        }
        self.play().await
    }

    /// Book card action: toggles the current book, otherwise selects `book`
    pub async fn play_book(&self, book: Book) -> EngineResult<()> {
        let is_current = self
            .lock()
            .book
            .as_ref()
            .map(|current| current.id == book.id)
            .unwrap_or(false);

        if is_current {
            self.toggle_play_pause().await
        } else {
            self.select_book(book).await
        }
    }

    /// Replaces the loaded book; returns true when it entered simulated mode
    fn load(&self, book: Book, buffer: Option<Arc<AudioBuffer>>) -> EngineResult<bool> {
        let mut guard = self.lock();
        let inner = &mut *guard;
        inner.ensure_open()?;

        inner.track.teardown();
        inner.stop_ticker();
        inner.load_epoch += 1;
        inner.intent += 1;
        inner.synthesizing = false;

        inner.state.current_book = Some(book.id.clone());
        inner.state.progress = 0.0;
        inner.state.is_playing = false;
        inner.track.buffer = buffer;

        inner.simulated = inner.track.buffer.is_none() && !book.has_narration();
        if inner.simulated {
            log::warn!("'{}' has no narration; simulating playback", book.title);
            inner.state.is_playing = true;
        } else {
            log::info!("Selected '{}' by {}", book.title, book.author);
        }

        inner.book = Some(book);
        inner.publish();
        Ok(inner.simulated)
    }

    /// Starts or resumes the current book from the saved offset
    ///
    /// Synthesizes narration first when none is cached. Failures are
    /// logged, leave the engine paused and are returned.
    pub async fn play(&self) -> EngineResult<()> {
        let pending = {
            let mut guard = self.lock();
            let inner = &mut *guard;
            inner.ensure_open()?;

            let Some(book) = inner.book.as_ref() else {
                return Err(EngineError::InvalidState("No book selected".to_string()));
            };

            if inner.state.is_playing
                && (inner.track.is_sounding() || inner.synthesizing || inner.simulated)
            {
                return Ok(());
            }

            if inner.track.buffer.is_some() {
                inner.intent += 1;
                inner.state.is_playing = true;
                return self.start_output(inner);
            }

            let Some(text) = book.narration().map(str::to_string) else {
                log::debug!("'{}' has nothing to narrate", book.title);
                return Ok(());
            };

            inner.intent += 1;
            inner.synthesizing = true;
            inner.state.is_playing = true;
            inner.publish();

            PendingSynthesis {
                text,
                load_epoch: inner.load_epoch,
                intent: inner.intent,
            }
        };

        let result = self.synthesize(&pending.text).await;

        let mut guard = self.lock();
        let inner = &mut *guard;

        if inner.closed || inner.load_epoch != pending.load_epoch {
            log::debug!("Discarding narration for a book that is no longer selected");
            return Ok(());
        }

        let current = inner.intent == pending.intent;
        if current {
            inner.synthesizing = false;
        }

        match result {
            Ok(buffer) => {
                if inner.track.buffer.is_none() {
                    inner.track.buffer = Some(Arc::new(buffer));
                }

                if !current || !inner.state.is_playing {
                    log::debug!("Discarding stale synthesis result for '{}'", inner.book_title());
                    return Ok(());
                }
                self.start_output(inner)
            }
            Err(e) if current => {
                log::error!("Playback failed for '{}': {}", inner.book_title(), e);
                inner.state.is_playing = false;
                inner.publish();
                Err(e)
            }
            Err(e) => {
                log::debug!("Ignoring failure of a superseded synthesis: {}", e);
                Ok(())
            }
        }
    }

    /// Stops output and remembers the position; does nothing when paused
    pub fn pause(&self) {
        let mut guard = self.lock();
        let inner = &mut *guard;

        inner.intent += 1;
        inner.synthesizing = false;
        inner.track.halt();
        inner.stop_ticker();

        if let Some(duration) = inner.track.duration().filter(|d| *d > 0.0) {
            let progress = inner.track.offset / duration * 100.0;
            if progress >= 100.0 {
                inner.track.offset = 0.0;
                inner.state.progress = 0.0;
            } else {
                inner.state.progress = progress.max(0.0);
            }
        }

        if inner.state.is_playing {
            inner.state.is_playing = false;
            inner.publish();
        }
    }

    pub async fn toggle_play_pause(&self) -> EngineResult<()> {
        let is_playing = self.lock().state.is_playing;
        if is_playing {
            self.pause();
            Ok(())
        } else {
            self.play().await
        }
    }

    /// Moves the playhead to `percent` of the decoded narration
    pub fn seek(&self, percent: f64) -> EngineResult<()> {
        if !(0.0..100.0).contains(&percent) {
            return Err(EngineError::InvalidPosition(percent));
        }

        let mut guard = self.lock();
        let inner = &mut *guard;
        inner.ensure_open()?;

        let duration = inner
            .track
            .duration()
            .ok_or_else(|| EngineError::InvalidState("No narration decoded to seek in".to_string()))?;

        let was_sounding = inner.track.is_sounding();
        inner.track.stop_source();
        inner.track.offset = duration * percent / 100.0;
        inner.state.progress = percent;

        if was_sounding {
            self.start_output(inner)
        } else {
            inner.publish();
            Ok(())
        }
    }

    /// Sets the volume (0-100) without interrupting playback
    pub fn set_volume(&self, volume: u8) -> EngineResult<()> {
        if volume > 100 {
            return Err(EngineError::InvalidVolume(volume));
        }

        let mut guard = self.lock();
        let inner = &mut *guard;
        inner.state.volume = volume;
        if let Some(session) = &inner.track.session {
            session.set_gain(inner.state.gain());
        }
        inner.publish();
        Ok(())
    }

    /// Recomputes progress now and returns the resulting state
    pub fn refresh_progress(&self) -> PlaybackState {
        let mut inner = self.lock();
        inner.refresh_progress();
        inner.state.clone()
    }

    /// Releases the session, source and progress task
    ///
    /// Any later transport call fails with `InvalidState`.
    pub fn close(&self) {
        let mut guard = self.lock();
        let inner = &mut *guard;
        if inner.closed {
            return;
        }

        inner.closed = true;
        inner.load_epoch += 1;
        inner.intent += 1;
        inner.synthesizing = false;
        inner.simulated = false;
        inner.track.teardown();
        inner.stop_ticker();
        inner.state.is_playing = false;
        inner.publish();
        log::debug!("Playback engine closed");
    }

    async fn synthesize(&self, text: &str) -> EngineResult<AudioBuffer> {
        let audio = self.client.generate_tts(text, &self.settings.voice).await?;
        decode_base64_pcm(&audio, self.settings.sample_rate, self.settings.channels)
    }

    /// Connects a source for the cached narration, rolling back to paused
    /// on failure
    fn start_output(&self, inner: &mut EngineInner) -> EngineResult<()> {
        match self.connect_source(inner) {
            Ok(()) => {
                inner.publish();
                if inner.ticker.as_ref().map_or(true, |t| t.is_finished()) {
                    inner.ticker =
                        spawn_ticker(Arc::downgrade(&self.inner), self.settings.progress_interval);
                }
                Ok(())
            }
            Err(e) => {
                log::error!("Playback failed for '{}': {}", inner.book_title(), e);
                inner.state.is_playing = false;
                inner.stop_ticker();
                inner.publish();
                Err(e)
            }
        }
    }

    fn connect_source(&self, inner: &mut EngineInner) -> EngineResult<()> {
        let buffer = inner
            .track
            .buffer
            .clone()
            .ok_or_else(|| EngineError::InvalidState("No narration decoded".to_string()))?;

        if inner.track.session.is_none() {
            let session = self
                .backend
                .open_session(buffer.sample_rate(), buffer.channel_count() as u16)?;
            session.set_gain(inner.state.gain());
            inner.track.session = Some(session);
        }

        // At most one source per sink
        inner.track.stop_source();

        if inner.track.offset >= buffer.duration() {
            inner.track.offset = 0.0;
        }
        let offset = inner.track.offset;
        let on_ended = self.ended_callback(inner.load_epoch);

        let session = inner
            .track
            .session
            .as_mut()
            .ok_or_else(|| EngineError::InvalidState("No output session".to_string()))?;
        let started_at = session.current_time();
        let id = session.start_source(buffer, offset, on_ended)?;

        inner.track.started_at = started_at;
        inner.track.source = Some(id);
        log::debug!("Started {} at {:.2}s", id, offset);
        Ok(())
    }

    fn ended_callback(&self, load_epoch: u64) -> SourceEnded {
        let engine = Arc::downgrade(&self.inner);
        Box::new(move |id| {
            if let Some(inner) = engine.upgrade() {
                lock_inner(&inner).source_ended(id, load_epoch);
            }
        })
    }
}

impl Drop for PlaybackEngine {
    fn drop(&mut self) {
        self.close();
    }
}
