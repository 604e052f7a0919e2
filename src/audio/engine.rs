// src/audio/engine.rs
use crate::audio::error::AudioError;
use crate::audio::source::AudioSource;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Asynchronous notifications raised by an engine.
///
/// They are delivered on the same queue the controller reads its commands from,
/// so a controller never observes them concurrently with its own work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Preparation finished; the engine can be started.
    Prepared,
    /// Playback reached the end of the source.
    Completed,
    /// Preparation or playback failed.
    Error(String),
}

pub type EngineEventSender = mpsc::Sender<EngineEvent>;

/// Controls for an audio playback engine.
///
/// The lifecycle mirrors a platform media player: bind a source, prepare it
/// asynchronously, then start and pause freely. Starting after `Completed`
/// plays the source again from the beginning.
#[async_trait]
pub trait PlaybackEngine: Send + Sync {
    /// Binds the source. Must be called once before `prepare_async`.
    fn set_source(&mut self, source: AudioSource) -> Result<(), AudioError>;

    /// Begins preparation in the background. The outcome arrives as
    /// `EngineEvent::Prepared` or `EngineEvent::Error`.
    fn prepare_async(&mut self) -> Result<(), AudioError>;

    /// Starts or resumes playback.
    async fn start(&mut self) -> Result<(), AudioError>;

    /// Pauses playback, keeping the position.
    async fn pause(&mut self) -> Result<(), AudioError>;

    /// Current playback position in milliseconds.
    async fn current_position_ms(&self) -> u64;

    /// Stops playback and releases any device.
    async fn release(&mut self) -> Result<(), AudioError>;
}

/// Allocates engines for a controller.
pub trait EngineFactory: Send + Sync {
    fn create(&self, events: EngineEventSender) -> Box<dyn PlaybackEngine>;
}

impl<F> EngineFactory for F
where
    F: Fn(EngineEventSender) -> Box<dyn PlaybackEngine> + Send + Sync,
{
    fn create(&self, events: EngineEventSender) -> Box<dyn PlaybackEngine> {
        self(events)
    }
}
