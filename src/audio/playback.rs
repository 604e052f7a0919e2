// src/audio/playback.rs
use crate::audio::{
    alsa_handler::AlsaPcmHandler,
    decoder::{DecodeResult, DecodedFrame, SymphoniaDecoder},
    engine::{EngineEvent, EngineEventSender, EngineFactory, PlaybackEngine},
    error::AudioError,
    progress::{new_shared_progress, PlaybackProgressInfo, SharedProgress},
    source::AudioSource,
    task::PlaybackTask,
};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;
use tokio::sync::broadcast;
use tokio::sync::Mutex as TokioMutex;
use tokio::task::{self, JoinHandle};
use tracing::{debug, error, info, instrument, trace, warn};

const LOG_TARGET: &str = "timeplayer::audio::playback";

/// Frames handed to ALSA per write call.
const WRITE_CHUNK_FRAMES: usize = 1024;
/// Poll interval of the playback thread while paused.
const PAUSE_POLL_INTERVAL: StdDuration = StdDuration::from_millis(100);

/// Indicates why the playback loop returned successfully.
#[derive(Debug, PartialEq, Eq)]
enum PlaybackLoopExitReason {
    EndOfStream,
    ShutdownSignal,
}

type SharedHandler = Arc<Mutex<AlsaPcmHandler>>;
type DecoderSlot = Arc<Mutex<Option<SymphoniaDecoder>>>;

/// Plays an in-memory source through an ALSA PCM device.
///
/// Preparation (probe + device setup) and the decode/write loop both run on
/// the blocking pool; results come back as [`EngineEvent`]s.
pub struct AlsaEngine {
    source: Option<AudioSource>,
    events: EngineEventSender,
    alsa_handler: SharedHandler,
    prepared_decoder: DecoderSlot,
    prepare_handle: Option<JoinHandle<()>>,
    pub(super) playback_task: Option<PlaybackTask>,
    pause_state: Arc<TokioMutex<bool>>,
    progress: SharedProgress,
}

impl AlsaEngine {
    pub fn new(device_name: &str, events: EngineEventSender) -> Self {
        info!(target: LOG_TARGET, "Creating new AlsaEngine for device: {}", device_name);
        AlsaEngine {
            source: None,
            events,
            alsa_handler: Arc::new(Mutex::new(AlsaPcmHandler::new(device_name))),
            prepared_decoder: Arc::new(Mutex::new(None)),
            prepare_handle: None,
            playback_task: None,
            pause_state: Arc::new(TokioMutex::new(false)),
            progress: new_shared_progress(),
        }
    }

    fn source(&self) -> Result<&AudioSource, AudioError> {
        self.source.as_ref().ok_or(AudioError::InvalidState("No source bound".to_string()))
    }

    fn has_live_task(&self) -> bool {
        self.playback_task.as_ref().map_or(false, |t| !t.is_finished())
    }

    /// Takes the decoder built during preparation, or opens a fresh one when
    /// replaying after completion.
    async fn take_or_reopen_decoder(&mut self) -> Result<SymphoniaDecoder, AudioError> {
        let prepared = self
            .prepared_decoder
            .lock()
            .map_err(|_| AudioError::InvalidState("Decoder slot mutex poisoned".to_string()))?
            .take();
        if let Some(decoder) = prepared {
            return Ok(decoder);
        }

        debug!(target: LOG_TARGET, "No prepared decoder, reopening source for replay.");
        let source = self.source()?.clone();
        let handler = Arc::clone(&self.alsa_handler);
        task::spawn_blocking(move || -> Result<SymphoniaDecoder, AudioError> {
            let decoder = SymphoniaDecoder::open(&source)?;
            lock_handler(&handler)?.prepare()?;
            Ok(decoder)
        })
        .await?
    }
}

fn lock_handler(handler: &SharedHandler) -> Result<std::sync::MutexGuard<'_, AlsaPcmHandler>, AudioError> {
    handler
        .lock()
        .map_err(|poisoned| AudioError::InvalidState(format!("ALSA handler mutex poisoned: {}", poisoned)))
}

/// Probes the source and configures the device for its signal spec.
fn prepare_output(source: &AudioSource, handler: &SharedHandler) -> Result<SymphoniaDecoder, AudioError> {
    let decoder = SymphoniaDecoder::open(source)?;
    let spec = decoder.initial_spec();
    let mut guard = lock_handler(handler)?;
    guard.initialize(spec)?;
    match guard.actual_rate() {
        Some(rate) if rate == spec.rate => Ok(decoder),
        Some(rate) => Err(AudioError::UnsupportedFormat(format!(
            "Device runs at {} Hz but the source is {} Hz",
            rate, spec.rate
        ))),
        None => Err(AudioError::InitializationError("ALSA handler did not report a rate".to_string())),
    }
}

/// Writes one decoded frame to ALSA in chunks, retrying after recovered underruns.
fn write_frame(
    handler: &SharedHandler,
    frame: &DecodedFrame,
    shutdown_rx: &mut broadcast::Receiver<()>,
) -> Result<(), AudioError> {
    let total_frames = frame.frames();
    let channels = frame.channels;
    let mut offset = 0;

    while offset < total_frames {
        if shutdown_requested(shutdown_rx) {
            return Err(AudioError::ShutdownRequested);
        }
        let chunk_frames = (total_frames - offset).min(WRITE_CHUNK_FRAMES);
        let chunk = &frame.samples[offset * channels..(offset + chunk_frames) * channels];

        let written = lock_handler(handler)?.write_s16_buffer(chunk)?;
        match written {
            0 => {
                warn!(target: LOG_TARGET, "ALSA underrun recovered, retrying write for the same chunk.");
                std::thread::sleep(StdDuration::from_millis(10));
            }
            written => {
                offset += written.min(chunk_frames);
                trace!(target: LOG_TARGET, "Wrote {} frames to ALSA (total {}/{})", written, offset, total_frames);
            }
        }
    }
    Ok(())
}

fn shutdown_requested(shutdown_rx: &mut broadcast::Receiver<()>) -> bool {
    !matches!(shutdown_rx.try_recv(), Err(broadcast::error::TryRecvError::Empty))
}

/// Decode/write loop. Runs on a blocking thread.
fn playback_loop(
    mut decoder: SymphoniaDecoder,
    handler: &SharedHandler,
    pause_state: &TokioMutex<bool>,
    progress: &SharedProgress,
    shutdown_rx: &mut broadcast::Receiver<()>,
) -> Result<PlaybackLoopExitReason, AudioError> {
    info!(target: LOG_TARGET, "Starting playback loop.");
    let mut was_paused = false;

    loop {
        if shutdown_requested(shutdown_rx) {
            info!(target: LOG_TARGET, "Shutdown signal received in playback loop.");
            return Ok(PlaybackLoopExitReason::ShutdownSignal);
        }

        let is_paused = *pause_state.blocking_lock();
        if is_paused != was_paused {
            let guard = lock_handler(handler)?;
            let transition = if is_paused { guard.pause() } else { guard.resume() };
            if let Err(e) = transition {
                warn!(target: LOG_TARGET, "Failed to switch ALSA pause state to {}: {}", is_paused, e);
            }
            was_paused = is_paused;
        }
        if is_paused {
            std::thread::sleep(PAUSE_POLL_INTERVAL);
            continue;
        }

        match decoder.decode_next_frame()? {
            DecodeResult::Decoded(frame) => {
                progress.blocking_lock().position_ms = decoder.timestamp_to_ms(frame.timestamp);
                match write_frame(handler, &frame, shutdown_rx) {
                    Ok(()) => {}
                    Err(AudioError::ShutdownRequested) => return Ok(PlaybackLoopExitReason::ShutdownSignal),
                    Err(e) => return Err(e),
                }
            }
            DecodeResult::Skipped(reason) => {
                warn!(target: LOG_TARGET, "Decoder skipped packet: {}", reason);
            }
            DecodeResult::EndOfStream => {
                info!(target: LOG_TARGET, "Decoder reached end of stream. Draining ALSA buffer...");
                if let Err(e) = lock_handler(handler)?.drain() {
                    error!(target: LOG_TARGET, "Error draining ALSA buffer after EndOfStream: {}", e);
                }
                return Ok(PlaybackLoopExitReason::EndOfStream);
            }
        }
    }
}

#[async_trait]
impl PlaybackEngine for AlsaEngine {
    fn set_source(&mut self, source: AudioSource) -> Result<(), AudioError> {
        info!(target: LOG_TARGET, "Binding source '{}' ({} bytes).", source.name(), source.len());
        if source.is_empty() {
            return Err(AudioError::InvalidState("Source is empty".to_string()));
        }
        self.source = Some(source);
        Ok(())
    }

    #[instrument(skip(self))]
    fn prepare_async(&mut self) -> Result<(), AudioError> {
        let source = self.source()?.clone();
        if self.prepare_handle.as_ref().map_or(false, |h| !h.is_finished()) {
            return Err(AudioError::InvalidState("Preparation already in progress".to_string()));
        }

        let handler = Arc::clone(&self.alsa_handler);
        let slot = Arc::clone(&self.prepared_decoder);
        let progress = Arc::clone(&self.progress);
        let events = self.events.clone();

        self.prepare_handle = Some(task::spawn_blocking(move || {
            let event = match prepare_output(&source, &handler) {
                Ok(decoder) => {
                    *progress.blocking_lock() = PlaybackProgressInfo { position_ms: 0 };
                    match slot.lock() {
                        Ok(mut guard) => {
                            *guard = Some(decoder);
                            EngineEvent::Prepared
                        }
                        Err(_) => EngineEvent::Error("Decoder slot mutex poisoned".to_string()),
                    }
                }
                Err(e) => {
                    error!(target: LOG_TARGET, "Preparation failed: {}", e);
                    EngineEvent::Error(e.to_string())
                }
            };
            if events.blocking_send(event).is_err() {
                debug!(target: LOG_TARGET, "Engine event receiver dropped before preparation finished.");
            }
        }));
        Ok(())
    }

    #[instrument(skip(self))]
    async fn start(&mut self) -> Result<(), AudioError> {
        if self.has_live_task() {
            debug!(target: LOG_TARGET, "Resuming running playback task.");
            *self.pause_state.lock().await = false;
            return Ok(());
        }
        if let Some(finished) = self.playback_task.take() {
            finished.stop_task().await;
        }

        let decoder = self.take_or_reopen_decoder().await?;
        *self.pause_state.lock().await = false;
        self.progress.lock().await.position_ms = 0;

        let handler = Arc::clone(&self.alsa_handler);
        let pause_state = Arc::clone(&self.pause_state);
        let progress = Arc::clone(&self.progress);
        let events = self.events.clone();

        self.playback_task = Some(PlaybackTask::spawn(move |mut shutdown_rx| {
            let result = playback_loop(decoder, &handler, &pause_state, &progress, &mut shutdown_rx);
            let event = match result {
                Ok(PlaybackLoopExitReason::EndOfStream) => Some(EngineEvent::Completed),
                Ok(PlaybackLoopExitReason::ShutdownSignal) => None,
                Err(e) => {
                    error!(target: LOG_TARGET, "Playback loop failed with error: {}", e);
                    Some(EngineEvent::Error(e.to_string()))
                }
            };
            if let Some(event) = event {
                if events.blocking_send(event).is_err() {
                    debug!(target: LOG_TARGET, "Engine event receiver dropped before playback finished.");
                }
            }
        }));
        Ok(())
    }

    async fn pause(&mut self) -> Result<(), AudioError> {
        match &self.playback_task {
            None => Err(AudioError::InvalidState("Nothing is playing".to_string())),
            Some(task) if task.is_finished() => {
                // The track ran out; its completion event is already on the way.
                debug!(target: LOG_TARGET, "Pause after end of stream, nothing to do.");
                Ok(())
            }
            Some(_) => {
                *self.pause_state.lock().await = true;
                Ok(())
            }
        }
    }

    async fn current_position_ms(&self) -> u64 {
        self.progress.lock().await.position_ms
    }

    #[instrument(skip(self))]
    async fn release(&mut self) -> Result<(), AudioError> {
        info!(target: LOG_TARGET, "Releasing AlsaEngine.");
        if let Some(handle) = self.prepare_handle.take() {
            if let Err(e) = handle.await {
                warn!(target: LOG_TARGET, "Preparation task ended abnormally: {}", e);
            }
        }
        if let Some(playback_task) = self.playback_task.take() {
            playback_task.stop_task().await;
        }

        let handler = Arc::clone(&self.alsa_handler);
        task::spawn_blocking(move || {
            lock_handler(&handler)?.close();
            Ok::<(), AudioError>(())
        })
        .await??;

        if let Ok(mut slot) = self.prepared_decoder.lock() {
            *slot = None;
        }
        *self.progress.lock().await = PlaybackProgressInfo::default();
        Ok(())
    }
}

/// Builds [`AlsaEngine`]s bound to one output device.
#[derive(Debug, Clone)]
pub struct AlsaEngineFactory {
    device_name: String,
}

impl AlsaEngineFactory {
    pub fn new(device_name: impl Into<String>) -> Self {
        AlsaEngineFactory { device_name: device_name.into() }
    }
}

impl EngineFactory for AlsaEngineFactory {
    fn create(&self, events: EngineEventSender) -> Box<dyn PlaybackEngine> {
        Box::new(AlsaEngine::new(&self.device_name, events))
    }
}
