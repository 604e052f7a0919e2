use super::{Player, StateChange, ENGINE_EVENT_CAPACITY, PLAYER_LOG_TARGET};
use crate::audio::{format_elapsed, EngineEvent};
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument, warn};

#[instrument(skip(player))]
pub async fn handle_create(player: &mut Player) {
    if player.engine.is_some() {
        debug!(target: PLAYER_LOG_TARGET, "Create: engine already exists, nothing to do.");
        return;
    }
    info!(target: PLAYER_LOG_TARGET, "Creating playback engine for '{}'.", player.source.name());
    let (events_tx, events_rx) = mpsc::channel(ENGINE_EVENT_CAPACITY);
    let mut engine = player.engine_factory.create(events_tx);
    match engine.set_source(player.source.clone()) {
        Ok(()) => {
            player.engine = Some(engine);
            player.engine_event_rx = Some(events_rx);
        }
        Err(e) => {
            // Nothing was started, so there is nothing to release beyond the engine itself.
            if let Err(release_err) = engine.release().await {
                warn!(target: PLAYER_LOG_TARGET, "Failed to release engine after bind error: {}", release_err);
            }
            fail(player, format!("Failed to bind source: {}", e)).await;
        }
    }
}

#[instrument(skip(player))]
pub async fn handle_toggle(player: &mut Player) {
    info!(target: PLAYER_LOG_TARGET, "Handling TogglePlayPause command.");
    if player.engine.is_none() {
        handle_create(player).await;
    }
    let Some(engine) = player.engine.as_mut() else {
        warn!(target: PLAYER_LOG_TARGET, "TogglePlayPause: no engine available.");
        return;
    };

    if !player.is_ready {
        if player.is_preparing {
            info!(target: PLAYER_LOG_TARGET, "TogglePlayPause: preparation in progress, ignoring.");
            return;
        }
        match engine.prepare_async() {
            Ok(()) => {
                debug!(target: PLAYER_LOG_TARGET, "Preparation started; playback begins when ready.");
                player.is_preparing = true;
            }
            Err(e) => fail(player, format!("Failed to prepare: {}", e)).await,
        }
        return;
    }

    if player.is_playing {
        if let Err(e) = engine.pause().await {
            fail(player, format!("Failed to pause: {}", e)).await;
            return;
        }
        player.halt_timer();
    } else {
        if let Err(e) = engine.start().await {
            fail(player, format!("Failed to start: {}", e)).await;
            return;
        }
        player.has_finished = false;
        player.arm_timer();
        player.notification.show_foreground();
    }

    player.is_playing = !player.is_playing;
    player.notification.update(&player.elapsed, player.is_playing);
    player.broadcast_update(StateChange::PlayState(player.is_playing));
}

pub async fn handle_engine_event(player: &mut Player, event: EngineEvent) {
    match event {
        EngineEvent::Prepared => handle_engine_ready(player).await,
        EngineEvent::Completed => handle_completion(player).await,
        EngineEvent::Error(message) => {
            if player.engine.is_none() {
                warn!(target: PLAYER_LOG_TARGET, "Ignoring engine error with no engine: {}", message);
                return;
            }
            fail(player, message).await
        }
    }
}

#[instrument(skip(player))]
async fn handle_engine_ready(player: &mut Player) {
    if !player.is_preparing {
        warn!(target: PLAYER_LOG_TARGET, "Ignoring Prepared event with no preparation in flight.");
        return;
    }
    player.is_preparing = false;
    let Some(engine) = player.engine.as_mut() else {
        warn!(target: PLAYER_LOG_TARGET, "Prepared event arrived after the engine was released.");
        return;
    };
    info!(target: PLAYER_LOG_TARGET, "Engine prepared, starting playback.");
    player.is_ready = true;
    if let Err(e) = engine.start().await {
        fail(player, format!("Failed to start: {}", e)).await;
        return;
    }

    player.is_playing = true;
    player.has_finished = false;
    player.arm_timer();
    player.notification.show_foreground();
    player.notification.update(&player.elapsed, true);
    player.broadcast_update(StateChange::PlayState(true));
}

#[instrument(skip(player))]
async fn handle_completion(player: &mut Player) {
    // A pause queued behind the completion may already have run, so a paused
    // track still finishes here.
    if !player.is_ready || player.has_finished || player.engine.is_none() {
        warn!(target: PLAYER_LOG_TARGET, "Ignoring stale Completed event.");
        return;
    }
    info!(target: PLAYER_LOG_TARGET, "Track finished.");
    player.halt_timer();
    player.is_playing = false;
    player.has_finished = true;
    player.notification.demote();
    player.notification.update(&player.elapsed, false);
    player.broadcast_update(StateChange::Finished);
}

/// Terminal failure path: stop everything, drop the engine and tell listeners.
/// The next toggle starts over with a fresh engine.
async fn fail(player: &mut Player, message: String) {
    error!(target: PLAYER_LOG_TARGET, "Playback failed: {}", message);
    player.halt_timer();
    player.notification.demote();
    release_engine(player).await;
    player.broadcast_update(StateChange::Failed(message));
}

async fn release_engine(player: &mut Player) {
    if let Some(mut engine) = player.engine.take() {
        if let Err(e) = engine.release().await {
            warn!(target: PLAYER_LOG_TARGET, "Error releasing engine: {}", e);
        }
    }
    player.engine_event_rx = None;
    player.is_ready = false;
    player.is_playing = false;
    player.is_preparing = false;
    player.has_finished = false;
}

#[instrument(skip(player))]
pub async fn handle_tick(player: &mut Player) {
    let Some(engine) = player.engine.as_ref() else {
        player.halt_timer();
        return;
    };
    let position_ms = engine.current_position_ms().await;
    player.elapsed = format_elapsed(position_ms);
    player.notification.update(&player.elapsed, player.is_playing);
    player.broadcast_update(StateChange::Elapsed(player.elapsed.clone()));
}

#[instrument(skip(player))]
pub async fn handle_shutdown(player: &mut Player) {
    info!(target: PLAYER_LOG_TARGET, "Shutting down player.");
    player.halt_timer();
    release_engine(player).await;
    player.notification.clear();
}
