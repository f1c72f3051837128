//! Device output through cpal
//!
//! A cpal stream cannot leave the thread that built it, so each session
//! spawns an audio thread that owns the stream for the session's lifetime
//! and delivers end-of-source notifications off the realtime callback.

use crate::decoder::AudioBuffer;
use crate::error::{EngineError, EngineResult};
use crate::output::{AudioBackend, OutputSession, SourceEnded, SourceId};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use crossbeam_channel::{bounded, select, unbounded, Receiver, Sender};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;

/// Output backend for the system's audio devices
#[derive(Debug, Clone, Default)]
pub struct CpalBackend {
    device_name: Option<String>,
}

impl CpalBackend {
    /// Uses the host's default output device
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses the output device with this exact name
    pub fn with_device(name: impl Into<String>) -> Self {
        Self {
            device_name: Some(name.into()),
        }
    }

    /// Names of the available output devices
    pub fn device_names() -> EngineResult<Vec<String>> {
        let host = cpal::default_host();
        let devices = host
            .output_devices()
            .map_err(|e| EngineError::OutputError(format!("Failed to enumerate devices: {}", e)))?;
        Ok(devices.filter_map(|d| d.name().ok()).collect())
    }
}

impl AudioBackend for CpalBackend {
    fn open_session(&self, sample_rate: u32, channels: u16) -> EngineResult<Box<dyn OutputSession>> {
        let shared = Arc::new(Shared::default());
        let callbacks: Callbacks = Arc::new(Mutex::new(HashMap::new()));
        let (ready_tx, ready_rx) = bounded(1);
        let (shutdown_tx, shutdown_rx) = bounded(1);

        let thread_shared = Arc::clone(&shared);
        let thread_callbacks = Arc::clone(&callbacks);
        let device_name = self.device_name.clone();

        thread::Builder::new()
            .name("voxlibre-audio".to_string())
            .spawn(move || {
                audio_thread(device_name, thread_shared, thread_callbacks, shutdown_rx, ready_tx)
            })
            .map_err(|e| EngineError::OutputError(format!("Failed to spawn audio thread: {}", e)))?;

        let device_rate = ready_rx
            .recv()
            .map_err(|_| EngineError::OutputError("Audio thread exited during startup".to_string()))??;

        log::info!(
            "Output session open at {} Hz (narration {} Hz, {} ch)",
            device_rate,
            sample_rate,
            channels
        );

        Ok(Box::new(CpalSession {
            shared,
            callbacks,
            device_rate,
            next_source: 0,
            shutdown_tx: Some(shutdown_tx),
        }))
    }

    fn name(&self) -> &str {
        "cpal"
    }
}

type Callbacks = Arc<Mutex<HashMap<SourceId, SourceEnded>>>;

/// State read by the realtime callback
#[derive(Default)]
struct Shared {
    mixer: Mutex<Option<ActiveSource>>,
    /// f32 bits
    gain: AtomicU32,
    frames_rendered: AtomicU64,
}

struct ActiveSource {
    id: SourceId,
    buffer: Arc<AudioBuffer>,
    /// Playhead in source frames
    position: f64,
    /// Source frames per device frame
    step: f64,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn audio_thread(
    device_name: Option<String>,
    shared: Arc<Shared>,
    callbacks: Callbacks,
    shutdown_rx: Receiver<()>,
    ready_tx: Sender<EngineResult<u32>>,
) {
    let (ended_tx, ended_rx) = unbounded();

    let (stream, device_rate) = match open_stream(device_name.as_deref(), Arc::clone(&shared), ended_tx) {
        Ok(opened) => opened,
        Err(e) => {
            let _ = ready_tx.send(Err(e));
            return;
        }
    };
    let _ = ready_tx.send(Ok(device_rate));

    loop {
        select! {
            recv(shutdown_rx) -> _ => break,
            recv(ended_rx) -> msg => match msg {
                Ok(id) => {
                    let callback = lock(&callbacks).remove(&id);
                    if let Some(on_ended) = callback {
                        on_ended(id);
                    }
                }
                Err(_) => break,
            },
        }
    }

    drop(stream);
    log::debug!("Audio thread stopped");
}

fn find_device(name: Option<&str>) -> EngineResult<Device> {
    let host = cpal::default_host();
    match name {
        None => host
            .default_output_device()
            .ok_or_else(|| EngineError::OutputError("No default output device".to_string())),
        Some(wanted) => host
            .output_devices()
            .map_err(|e| EngineError::OutputError(format!("Failed to enumerate devices: {}", e)))?
            .find(|d| d.name().map(|n| n == wanted).unwrap_or(false))
            .ok_or_else(|| EngineError::OutputError(format!("Device not found: {}", wanted))),
    }
}

fn open_stream(
    device_name: Option<&str>,
    shared: Arc<Shared>,
    ended_tx: Sender<SourceId>,
) -> EngineResult<(Stream, u32)> {
    let device = find_device(device_name)?;
    let label = device.name().unwrap_or_else(|_| "unknown".to_string());

    let supported = device
        .default_output_config()
        .map_err(|e| EngineError::OutputError(format!("No usable output config on {}: {}", label, e)))?;
    let config: StreamConfig = supported.config();
    let device_rate = config.sample_rate.0;
    let device_channels = config.channels.max(1) as usize;

    let error_label = label.clone();
    let stream = device
        .build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                render(data, device_channels, &shared, &ended_tx);
            },
            move |err| {
                log::error!("Audio output error on device '{}': {}", error_label, err);
            },
            None,
        )
        .map_err(|e| EngineError::OutputError(format!("Failed to build stream: {}", e)))?;

    stream
        .play()
        .map_err(|e| EngineError::OutputError(format!("Failed to start stream: {}", e)))?;

    log::info!("Audio output started on device: {}", label);
    Ok((stream, device_rate))
}

/// Fills one device buffer from the active source
fn render(
    data: &mut [f32],
    device_channels: usize,
    shared: &Shared,
    ended_tx: &Sender<SourceId>,
) {
    let frames = data.len() / device_channels;
    shared
        .frames_rendered
        .fetch_add(frames as u64, Ordering::Relaxed);

    // Never block the realtime thread
    let mut active = match shared.mixer.try_lock() {
        Ok(guard) => guard,
        Err(_) => {
            data.fill(0.0);
            return;
        }
    };

    let gain = f32::from_bits(shared.gain.load(Ordering::Relaxed));
    let mut finished = None;

    for frame in data.chunks_mut(device_channels) {
        let Some(source) = active.as_mut() else {
            frame.fill(0.0);
            continue;
        };

        let index = source.position as usize;
        if index >= source.buffer.frames() {
            finished = Some(source.id);
            *active = None;
            frame.fill(0.0);
            continue;
        }

        for (channel, sample) in frame.iter_mut().enumerate() {
            *sample = source.buffer.sample(channel, index) * gain;
        }
        source.position += source.step;
    }

    if let Some(id) = finished {
        let _ = ended_tx.send(id);
    }
}

struct CpalSession {
    shared: Arc<Shared>,
    callbacks: Callbacks,
    device_rate: u32,
    next_source: u64,
    shutdown_tx: Option<Sender<()>>,
}

impl OutputSession for CpalSession {
    fn current_time(&self) -> f64 {
        self.shared.frames_rendered.load(Ordering::Relaxed) as f64 / self.device_rate as f64
    }

    fn set_gain(&self, gain: f32) {
        self.shared.gain.store(gain.to_bits(), Ordering::Relaxed);
    }

    fn start_source(
        &mut self,
        buffer: Arc<AudioBuffer>,
        offset: f64,
        on_ended: SourceEnded,
    ) -> EngineResult<SourceId> {
        if self.shutdown_tx.is_none() {
            return Err(EngineError::InvalidState("Output session is closed".to_string()));
        }

        self.next_source += 1;
        let id = SourceId(self.next_source);
        let source_rate = buffer.sample_rate() as f64;

        let source = ActiveSource {
            id,
            position: offset.max(0.0) * source_rate,
            step: source_rate / self.device_rate as f64,
            buffer,
        };

        lock(&self.callbacks).insert(id, on_ended);
        let replaced = lock(&self.shared.mixer).replace(source);
        if let Some(old) = replaced {
            log::warn!("{} replaced {} still connected", id, old.id);
            lock(&self.callbacks).remove(&old.id);
        }

        Ok(id)
    }

    fn stop_source(&mut self, id: SourceId) {
        {
            let mut active = lock(&self.shared.mixer);
            if active.as_ref().map(|s| s.id) == Some(id) {
                *active = None;
            }
        }
        lock(&self.callbacks).remove(&id);
    }

    fn connected_sources(&self) -> usize {
        usize::from(lock(&self.shared.mixer).is_some())
    }

    fn close(&mut self) {
        lock(&self.callbacks).clear();
        lock(&self.shared.mixer).take();

        // The audio thread is not joined: it may be waiting to deliver a
        // callback to whoever is closing this session.
        if let Some(shutdown) = self.shutdown_tx.take() {
            let _ = shutdown.send(());
        }
    }
}

impl Drop for CpalSession {
    fn drop(&mut self) {
        self.close();
    }
}
