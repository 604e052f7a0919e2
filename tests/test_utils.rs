//! Common utilities for testing timeplayer
//!
//! This module provides shared functionality across all test types.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use timeplayer::audio::{AudioError, AudioSource, EngineEvent, EngineEventSender, EngineFactory, PlaybackEngine};
use timeplayer::player::StateChange;
use tokio::sync::broadcast;

/// Remote control for every engine a scripted factory creates.
///
/// Engines only do what the test tells them: preparation finishes when the
/// test calls `prepared`, playback ends when it calls `complete`.
#[derive(Clone, Default)]
pub struct EngineScript {
    calls: Arc<Mutex<Vec<String>>>,
    events: Arc<Mutex<Option<EngineEventSender>>>,
    engines_created: Arc<AtomicUsize>,
    position_ms: Arc<AtomicU64>,
    auto_prepare: Arc<AtomicBool>,
}

#[allow(dead_code)]
impl EngineScript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engines report `Prepared` as soon as preparation is requested.
    pub fn auto_preparing() -> Self {
        let script = Self::default();
        script.auto_prepare.store(true, Ordering::SeqCst);
        script
    }

    pub fn factory(&self) -> Arc<dyn EngineFactory> {
        let script = self.clone();
        Arc::new(move |events: EngineEventSender| -> Box<dyn PlaybackEngine> {
            script.engines_created.fetch_add(1, Ordering::SeqCst);
            *script.events.lock().unwrap() = Some(events);
            Box::new(ScriptedEngine { script: script.clone() })
        })
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == call).count()
    }

    pub fn engines_created(&self) -> usize {
        self.engines_created.load(Ordering::SeqCst)
    }

    pub fn set_position_ms(&self, position_ms: u64) {
        self.position_ms.store(position_ms, Ordering::SeqCst);
    }

    pub async fn prepared(&self) {
        self.emit(EngineEvent::Prepared).await;
    }

    pub async fn complete(&self) {
        self.emit(EngineEvent::Completed).await;
    }

    pub async fn fail(&self, message: &str) {
        self.emit(EngineEvent::Error(message.to_string())).await;
    }

    async fn emit(&self, event: EngineEvent) {
        let events = self.events.lock().unwrap().clone().expect("no engine has been created");
        events.send(event).await.expect("controller dropped its engine events");
    }

    fn record(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }
}

pub struct ScriptedEngine {
    script: EngineScript,
}

#[async_trait]
impl PlaybackEngine for ScriptedEngine {
    fn set_source(&mut self, source: AudioSource) -> Result<(), AudioError> {
        self.script.record("set_source");
        if source.is_empty() {
            return Err(AudioError::InvalidState("Source is empty".to_string()));
        }
        Ok(())
    }

    fn prepare_async(&mut self) -> Result<(), AudioError> {
        self.script.record("prepare_async");
        if self.script.auto_prepare.load(Ordering::SeqCst) {
            if let Some(events) = self.script.events.lock().unwrap().as_ref() {
                events
                    .try_send(EngineEvent::Prepared)
                    .map_err(|e| AudioError::InvalidState(e.to_string()))?;
            }
        }
        Ok(())
    }

    async fn start(&mut self) -> Result<(), AudioError> {
        self.script.record("start");
        Ok(())
    }

    async fn pause(&mut self) -> Result<(), AudioError> {
        self.script.record("pause");
        Ok(())
    }

    async fn current_position_ms(&self) -> u64 {
        self.script.position_ms.load(Ordering::SeqCst)
    }

    async fn release(&mut self) -> Result<(), AudioError> {
        self.script.record("release");
        Ok(())
    }
}

/// Next event that is not an elapsed-time tick.
#[allow(dead_code)]
pub async fn next_transition(rx: &mut broadcast::Receiver<StateChange>) -> StateChange {
    loop {
        match rx.recv().await.expect("state channel closed") {
            StateChange::Elapsed(_) => continue,
            other => return other,
        }
    }
}

/// Everything currently queued on `rx`.
#[allow(dead_code)]
pub fn drain(rx: &mut broadcast::Receiver<StateChange>) -> Vec<StateChange> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Builds a minimal 16-bit PCM WAV file in memory.
#[allow(dead_code)]
pub fn make_wav(sample_rate: u32, channels: u16, samples: &[i16]) -> Vec<u8> {
    let block_align = channels * 2;
    let byte_rate = sample_rate * block_align as u32;
    let data_size = (samples.len() * 2) as u32;

    let mut buf = Vec::with_capacity(44 + data_size as usize);
    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&(36 + data_size).to_le_bytes());
    buf.extend_from_slice(b"WAVEfmt ");
    buf.extend_from_slice(&16u32.to_le_bytes());
    buf.extend_from_slice(&1u16.to_le_bytes());
    buf.extend_from_slice(&channels.to_le_bytes());
    buf.extend_from_slice(&sample_rate.to_le_bytes());
    buf.extend_from_slice(&byte_rate.to_le_bytes());
    buf.extend_from_slice(&block_align.to_le_bytes());
    buf.extend_from_slice(&16u16.to_le_bytes());
    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&data_size.to_le_bytes());
    for sample in samples {
        buf.extend_from_slice(&sample.to_le_bytes());
    }
    buf
}
