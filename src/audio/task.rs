// src/audio/task.rs

use std::time::Duration as StdDuration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, trace};

const LOG_TARGET: &str = "timeplayer::audio::task";

/// Handle to a running blocking playback task.
#[derive(Debug)]
pub struct PlaybackTask {
    task_handle: JoinHandle<()>,
    shutdown_tx: broadcast::Sender<()>,
}

impl PlaybackTask {
    /// Spawns `body` on the blocking pool, handing it the shutdown receiver.
    pub fn spawn<F>(body: F) -> Self
    where
        F: FnOnce(broadcast::Receiver<()>) + Send + 'static,
    {
        let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);
        debug!(target: LOG_TARGET, "Spawning blocking playback task.");
        let task_handle = tokio::task::spawn_blocking(move || body(shutdown_rx));
        PlaybackTask { task_handle, shutdown_tx }
    }

    /// True once the task body has returned (end of stream, error or shutdown).
    pub fn is_finished(&self) -> bool {
        self.task_handle.is_finished()
    }

    fn signal_shutdown(&self) {
        if let Err(e) = self.shutdown_tx.send(()) {
            // Expected when the task already returned on its own.
            trace!(target: LOG_TARGET, "Failed to send shutdown signal (receiver likely dropped): {}", e);
        }
    }

    /// Signals shutdown and waits for the task, aborting it after a timeout.
    #[instrument(skip(self))]
    pub async fn stop_task(mut self) {
        self.signal_shutdown();
        let timeout_duration = StdDuration::from_secs(5);

        tokio::select! {
            biased;
            result = &mut self.task_handle => {
                match result {
                    Ok(()) => info!(target: LOG_TARGET, "Playback task finished gracefully."),
                    Err(e) if e.is_panic() => error!(target: LOG_TARGET, "Playback task panicked: {:?}", e),
                    Err(e) => error!(target: LOG_TARGET, "Playback task join error: {:?}", e),
                }
            }
            _ = tokio::time::sleep(timeout_duration) => {
                error!(target: LOG_TARGET, "Timeout waiting for playback task to finish after {:?}. Aborting task.", timeout_duration);
                self.task_handle.abort();
            }
        }
    }
}
