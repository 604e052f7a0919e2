//! Process lifecycle glue: spawns the controller task, hands out control
//! channels and event subscriptions, and tears everything down again.

mod control;
mod error;

pub use control::ControlChannel;
pub use error::ServiceError;

use crate::audio::EngineFactory;
use crate::config::Settings;
use crate::notification::NotificationSink;
use crate::player::{Player, PlayerCommand, StateChange};
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{error, info, instrument, warn};

const LOG_TARGET: &str = "timeplayer::service";

/// How long `stop` waits for the controller before aborting it.
const STOP_TIMEOUT: StdDuration = StdDuration::from_secs(5);

/// A running playback controller.
pub struct PlaybackService {
    command_tx: mpsc::Sender<PlayerCommand>,
    state_update_tx: broadcast::Sender<StateChange>,
    task_handle: JoinHandle<()>,
}

impl PlaybackService {
    /// Spawns the controller and asks it to create its engine.
    #[instrument(skip_all, fields(refresh_ms = settings.refresh_interval_ms))]
    pub async fn start(
        settings: &Settings,
        engine_factory: Arc<dyn EngineFactory>,
        notification_sink: Box<dyn NotificationSink>,
    ) -> Result<Self, ServiceError> {
        let (mut player, command_tx) = Player::new(
            engine_factory,
            notification_sink,
            settings.refresh_interval(),
            settings.state_update_capacity,
            settings.command_buffer_size,
        );
        let state_update_tx = player.state_update_sender();

        let task_handle = tokio::spawn(async move {
            player.run().await;
        });
        info!(target: LOG_TARGET, "Playback service started.");

        let service = PlaybackService {
            command_tx,
            state_update_tx,
            task_handle,
        };
        service.bind()?.send(PlayerCommand::Create).await?;
        Ok(service)
    }

    /// Returns a control channel, or `Unbound` once the controller has exited.
    pub fn bind(&self) -> Result<ControlChannel, ServiceError> {
        if self.is_running() {
            Ok(ControlChannel::new(self.command_tx.clone()))
        } else {
            warn!(target: LOG_TARGET, "Bind requested but the controller is not running.");
            Err(ServiceError::Unbound)
        }
    }

    /// A fresh receiver of state changes. Each subscriber gets its own.
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.state_update_tx.subscribe()
    }

    pub fn is_running(&self) -> bool {
        !self.task_handle.is_finished() && !self.command_tx.is_closed()
    }

    /// Shuts the controller down, aborting it if it does not exit in time.
    #[instrument(skip(self))]
    pub async fn stop(self) {
        let PlaybackService {
            command_tx,
            state_update_tx,
            mut task_handle,
        } = self;
        // Only the controller may keep the event channel open from here on.
        drop(state_update_tx);

        if command_tx.send(PlayerCommand::Shutdown).await.is_err() {
            info!(target: LOG_TARGET, "Controller already gone before shutdown.");
        }

        tokio::select! {
            biased;
            result = &mut task_handle => {
                match result {
                    Ok(()) => info!(target: LOG_TARGET, "Playback service stopped."),
                    Err(e) if e.is_panic() => error!(target: LOG_TARGET, "Controller task panicked: {:?}", e),
                    Err(e) => error!(target: LOG_TARGET, "Controller task join error: {:?}", e),
                }
            }
            _ = tokio::time::sleep(STOP_TIMEOUT) => {
                error!(target: LOG_TARGET, "Timeout waiting for controller after {:?}. Aborting task.", STOP_TIMEOUT);
                task_handle.abort();
            }
        }
    }
}
