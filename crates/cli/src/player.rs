use anyhow::{Context, Result};
use console::{style, Key, Term};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use voxlibre_core::{Book, PlaybackState};
use voxlibre_media_engine::{EngineResult, PlaybackEngine};

const VOLUME_STEP: u8 = 5;
const SEEK_STEP_PERCENT: f64 = 5.0;
const REDRAW_INTERVAL: StdDuration = StdDuration::from_millis(250);
const BAR_WIDTH: usize = 50;

/// A transport control bound to a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Action {
    TogglePlay,
    VolumeUp,
    VolumeDown,
    SeekBack,
    SeekForward,
    Quit,
}

pub(crate) fn action_for_key(key: &Key) -> Option<Action> {
    match key {
        Key::Char(' ') => Some(Action::TogglePlay),
        Key::Char('+') | Key::Char('=') => Some(Action::VolumeUp),
        Key::Char('-') | Key::Char('_') => Some(Action::VolumeDown),
        Key::ArrowLeft => Some(Action::SeekBack),
        Key::ArrowRight => Some(Action::SeekForward),
        Key::Char('q') | Key::Char('Q') | Key::Escape => Some(Action::Quit),
        _ => None,
    }
}

/// Runs the transport until the user quits, then closes the engine
///
/// `start` is the first transport call, usually selecting `book`. It runs
/// in the background so keys stay live while narration is synthesized.
pub async fn run_player<F>(engine: Arc<PlaybackEngine>, book: &Book, start: F) -> Result<()>
where
    F: Future<Output = EngineResult<()>> + Send + 'static,
{
    let term = Term::stdout();
    if term.hide_cursor().is_err() {
        eprintln!("Warning: Failed to hide cursor");
    }

    let (transport, failures) = Transport::new(engine.clone());
    transport.spawn(start);

    let result = player_loop(&term, &transport, failures, book).await;

    engine.close();
    let _ = term.show_cursor();

    result
}

/// Applies actions to the engine without blocking the key loop
///
/// Calls that may wait on synthesis run as tasks; their failures arrive
/// on the receiver returned by [`Transport::new`].
pub(crate) struct Transport {
    engine: Arc<PlaybackEngine>,
    failures: mpsc::UnboundedSender<String>,
}

impl Transport {
    pub(crate) fn new(engine: Arc<PlaybackEngine>) -> (Self, mpsc::UnboundedReceiver<String>) {
        let (failures, rx) = mpsc::unbounded_channel();
        (Self { engine, failures }, rx)
    }

    pub(crate) fn engine(&self) -> &PlaybackEngine {
        &self.engine
    }

    pub(crate) fn spawn<F>(&self, call: F)
    where
        F: Future<Output = EngineResult<()>> + Send + 'static,
    {
        let failures = self.failures.clone();
        tokio::spawn(async move {
            if let Err(e) = call.await {
                let _ = failures.send(e.to_string());
            }
        });
    }

    /// Applies `action`; immediate errors come back as a status line
    pub(crate) fn apply(&self, action: Action) -> Result<(), String> {
        let state = self.engine.snapshot();

        let outcome = match action {
            Action::TogglePlay if state.is_playing => {
                self.engine.pause();
                Ok(())
            }
            Action::TogglePlay => {
                let engine = self.engine.clone();
                self.spawn(async move { engine.play().await });
                Ok(())
            }
            Action::VolumeUp => self
                .engine
                .set_volume(state.volume.saturating_add(VOLUME_STEP).min(100)),
            Action::VolumeDown => self.engine.set_volume(state.volume.saturating_sub(VOLUME_STEP)),
            Action::SeekBack => self.engine.seek(seek_target(&state, -SEEK_STEP_PERCENT)),
            Action::SeekForward => self.engine.seek(seek_target(&state, SEEK_STEP_PERCENT)),
            Action::Quit => Ok(()),
        };

        outcome.map_err(|e| e.to_string())
    }
}

fn spawn_key_reader() -> mpsc::UnboundedReceiver<Key> {
    let (tx, rx) = mpsc::unbounded_channel();

    // Blocking reads stay off the runtime; the thread ends once the
    // receiver is dropped and the next key arrives.
    std::thread::spawn(move || {
        let term = Term::stdout();
        while let Ok(key) = term.read_key() {
            if tx.send(key).is_err() {
                break;
            }
        }
    });

    rx
}

async fn player_loop(
    term: &Term,
    transport: &Transport,
    mut failures: mpsc::UnboundedReceiver<String>,
    book: &Book,
) -> Result<()> {
    let engine = transport.engine();
    let mut keys = spawn_key_reader();
    let mut updates = engine.subscribe();
    let mut redraw = interval(REDRAW_INTERVAL);
    redraw.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut message: Option<String> = None;
    let mut shown_playing = engine.snapshot().is_playing;
    let mut dirty = true;

    loop {
        if dirty {
            term.clear_screen().context("Failed to clear screen")?;
            draw_player_ui(term, engine, book, message.as_deref())?;
            dirty = false;
        }

        tokio::select! {
            key = keys.recv() => {
                let Some(key) = key else { break };
                let Some(action) = action_for_key(&key) else { continue };
                if action == Action::Quit {
                    break;
                }
                message = transport.apply(action).err();
                dirty = true;
            }
            Some(failure) = failures.recv() => {
                message = Some(format!("Playback failed: {}", failure));
                dirty = true;
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                // Progress ticks wait for the next redraw; transport changes show at once
                let playing = updates.borrow_and_update().is_playing;
                if playing != shown_playing {
                    shown_playing = playing;
                    dirty = true;
                }
            }
            _ = redraw.tick() => {
                dirty = true;
            }
        }
    }

    Ok(())
}

/// Progress after moving by `delta` percent, kept inside the seekable range
pub(crate) fn seek_target(state: &PlaybackState, delta: f64) -> f64 {
    (state.progress + delta).clamp(0.0, 99.9)
}

pub(crate) fn progress_bar(progress: f64, width: usize) -> String {
    let filled = ((progress.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    let filled = filled.min(width);
    format!(
        "[{}{}] {:>3.0}%",
        "=".repeat(filled),
        " ".repeat(width - filled),
        progress.clamp(0.0, 100.0)
    )
}

fn draw_player_ui(
    term: &Term,
    engine: &PlaybackEngine,
    book: &Book,
    message: Option<&str>,
) -> Result<()> {
    let state = engine.snapshot();

    term.write_line(&format!("\n  {}", style(&book.title).bold().cyan()))
        .context("Failed to write title")?;
    term.write_line(&format!("  by {}", style(&book.author).dim()))
        .context("Failed to write author")?;
    term.write_line("").context("Failed to write blank line")?;

    let position = match engine.timeline() {
        Some((elapsed, total)) => format!("  {} / {}", elapsed, total),
        None => format!("  --:-- / {}", book.duration),
    };
    term.write_line(&position)
        .context("Failed to write position")?;
    term.write_line(&format!("  {}", progress_bar(state.progress, BAR_WIDTH)))
        .context("Failed to write progress bar")?;
    term.write_line("").context("Failed to write blank line")?;

    let status = if engine.is_simulated() {
        style("Simulated (no narration)").magenta()
    } else if state.is_playing {
        style("Playing").green()
    } else {
        style("Paused").yellow()
    };

    term.write_line(&format!("  Status: {}", status))
        .context("Failed to write status")?;
    term.write_line(&format!("  Volume: {}%", state.volume))
        .context("Failed to write volume")?;

    if let Some(message) = message {
        term.write_line(&format!("  {}", style(message).red()))
            .context("Failed to write message")?;
    }

    term.write_line("").context("Failed to write blank line")?;
    term.write_line("  Controls:")
        .context("Failed to write controls header")?;
    term.write_line("    Space   - Play/Pause")
        .context("Failed to write control")?;
    term.write_line("    ←/→     - Seek -5%/+5%")
        .context("Failed to write control")?;
    term.write_line("    +/-     - Volume up/down")
        .context("Failed to write control")?;
    term.write_line("    Q/Esc   - Quit")
        .context("Failed to write control")?;

    Ok(())
}
