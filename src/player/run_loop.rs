// src/player/run_loop.rs
use super::{command_handler, Player, PlayerCommand, PLAYER_LOG_TARGET};
use crate::audio::EngineEvent;
use std::future;
use tokio::sync::mpsc;
use tokio::time::Interval;
use tracing::{info, trace};

/// Waits for the next timer tick, or forever while the timer is halted.
async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => future::pending::<()>().await,
    }
}

/// Waits for the current engine's next callback. Pending with no engine, or
/// once that engine has dropped its sender.
async fn next_engine_event(events: &mut Option<mpsc::Receiver<EngineEvent>>) -> EngineEvent {
    match events {
        Some(events) => match events.recv().await {
            Some(event) => event,
            None => future::pending().await,
        },
        None => future::pending().await,
    }
}

/// Runs the player's command processing loop.
pub async fn run_player_loop(player: &mut Player) {
    info!(target: PLAYER_LOG_TARGET, "Player run loop started.");

    loop {
        tokio::select! {
            biased; // Engine callbacks first, so a queued command sees their effect

            event = next_engine_event(&mut player.engine_event_rx) => {
                trace!(target: PLAYER_LOG_TARGET, "Received engine event: {:?}", event);
                command_handler::handle_engine_event(player, event).await;
            }

            command = player.command_rx.recv() => {
                let Some(command) = command else {
                    info!(target: PLAYER_LOG_TARGET, "Command channel closed. Exiting run loop.");
                    break;
                };
                trace!(target: PLAYER_LOG_TARGET, "Received command: {:?}", command);
                match command {
                    PlayerCommand::Create => command_handler::handle_create(player).await,
                    PlayerCommand::TogglePlayPause => command_handler::handle_toggle(player).await,
                    PlayerCommand::GetState(responder) => {
                        let _ = responder.send(player.get_state()); // Ignore error if receiver dropped
                    }
                    PlayerCommand::Shutdown => {
                        info!(target: PLAYER_LOG_TARGET, "Shutdown command received. Exiting run loop.");
                        break;
                    }
                }
            }

            _ = next_tick(&mut player.ticker), if player.ticker.is_some() => {
                trace!(target: PLAYER_LOG_TARGET, "Elapsed-time timer ticked.");
                command_handler::handle_tick(player).await;
            }
        }
    }

    info!(target: PLAYER_LOG_TARGET, "Player run loop finished. Performing final cleanup.");
    command_handler::handle_shutdown(player).await;
    info!(target: PLAYER_LOG_TARGET, "Player task cleanup complete.");
}
