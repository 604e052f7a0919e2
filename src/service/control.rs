use super::{ServiceError, LOG_TARGET};
use crate::notification::ActionCommand;
use crate::player::{PlaybackState, PlayerCommand};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

/// Sending side of a bound service.
#[derive(Debug, Clone)]
pub struct ControlChannel {
    command_tx: mpsc::Sender<PlayerCommand>,
}

impl ControlChannel {
    pub(super) fn new(command_tx: mpsc::Sender<PlayerCommand>) -> Self {
        ControlChannel { command_tx }
    }

    /// The single user command: play if paused, pause if playing.
    pub async fn toggle(&self) -> Result<(), ServiceError> {
        self.send(PlayerCommand::TogglePlayPause).await
    }

    /// Delivers a command carried by a notification action.
    pub async fn dispatch(&self, command: ActionCommand) -> Result<(), ServiceError> {
        self.send(command.into()).await
    }

    /// Asks the controller for a state snapshot.
    pub async fn state(&self) -> Result<PlaybackState, ServiceError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(PlayerCommand::GetState(reply_tx)).await?;
        reply_rx
            .await
            .map_err(|e| ServiceError::Delivery(format!("No state reply: {}", e)))
    }

    pub(super) async fn send(&self, command: PlayerCommand) -> Result<(), ServiceError> {
        debug!(target: LOG_TARGET, "Sending command: {:?}", command);
        self.command_tx.send(command).await.map_err(|e| {
            warn!(target: LOG_TARGET, "Failed to deliver command {:?}: controller is gone.", e.0);
            ServiceError::Unbound
        })
    }
}
