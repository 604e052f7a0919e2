use crate::audio::{AudioSource, EngineEvent, EngineFactory, PlaybackEngine, INITIAL_ELAPSED};
use crate::notification::{NotificationPresenter, NotificationSink};
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{interval, Interval, MissedTickBehavior};
use tracing::{debug, instrument, trace};

mod command_handler;
mod run_loop;
mod state;

pub use state::{PlaybackState, PlayerCommand, StateChange};

const PLAYER_LOG_TARGET: &str = "timeplayer::player";

/// Capacity of each engine's callback queue. Engines raise at most a couple of
/// events per start.
const ENGINE_EVENT_CAPACITY: usize = 8;

/// The playback controller.
///
/// Owns the engine, the elapsed-time timer and the notification, and reacts
/// to commands and engine callbacks one message at a time.
pub struct Player {
    // --- Configuration ---
    engine_factory: Arc<dyn EngineFactory>,
    source: AudioSource,
    refresh_interval: StdDuration,

    // --- State ---
    is_ready: bool,
    is_playing: bool,
    is_preparing: bool,
    /// Set by a completion, cleared by the next start.
    has_finished: bool,
    elapsed: String,
    ticker: Option<Interval>,

    // --- Communication ---
    command_rx: mpsc::Receiver<PlayerCommand>,
    /// Callbacks of the current engine only. Replaced with every new engine, so
    /// events still queued by a released engine are dropped with it.
    engine_event_rx: Option<mpsc::Receiver<EngineEvent>>,
    state_update_tx: broadcast::Sender<StateChange>,

    // --- Engine & notification ---
    engine: Option<Box<dyn PlaybackEngine>>,
    notification: NotificationPresenter,
}

impl Player {
    /// Creates a new Player instance and the command channel sender.
    /// The Player itself should be run in a separate task using `Player::run`.
    pub fn new(
        engine_factory: Arc<dyn EngineFactory>,
        notification_sink: Box<dyn NotificationSink>,
        refresh_interval: StdDuration,
        state_update_capacity: usize,
        command_buffer_size: usize,
    ) -> (Self, mpsc::Sender<PlayerCommand>) {
        let (command_tx, command_rx) = mpsc::channel(command_buffer_size);
        let (state_update_tx, _) = broadcast::channel(state_update_capacity);

        let player = Player {
            engine_factory,
            source: AudioSource::bundled(),
            refresh_interval,
            is_ready: false,
            is_playing: false,
            is_preparing: false,
            has_finished: false,
            elapsed: INITIAL_ELAPSED.to_string(),
            ticker: None,
            command_rx,
            engine_event_rx: None,
            state_update_tx,
            engine: None,
            notification: NotificationPresenter::new(notification_sink),
        };

        (player, command_tx)
    }

    /// Subscribes to player state updates.
    pub fn subscribe_state_updates(&self) -> broadcast::Receiver<StateChange> {
        self.state_update_tx.subscribe()
    }

    /// A sender for further subscriptions that outlives `run`'s borrow.
    pub fn state_update_sender(&self) -> broadcast::Sender<StateChange> {
        self.state_update_tx.clone()
    }

    // --- Private Helper Methods ---

    /// Sends a state update via the broadcast channel, logging errors.
    fn broadcast_update(&self, update: StateChange) {
        trace!(target: PLAYER_LOG_TARGET, "Broadcasting state update: {:?}", update);
        if self.state_update_tx.send(update.clone()).is_err() {
            // No receivers is normal before the surface subscribes.
            debug!(target: PLAYER_LOG_TARGET, "No active listeners for state update: {:?}", update);
        }
    }

    /// Starts the elapsed-time timer. The first tick fires immediately.
    fn arm_timer(&mut self) {
        let mut ticker = interval(self.refresh_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.ticker = Some(ticker);
    }

    fn halt_timer(&mut self) {
        if self.ticker.take().is_some() {
            trace!(target: PLAYER_LOG_TARGET, "Elapsed-time timer halted.");
        }
    }

    fn get_state(&self) -> PlaybackState {
        PlaybackState {
            is_ready: self.is_ready,
            is_playing: self.is_playing,
            is_preparing: self.is_preparing,
            timer_active: self.ticker.is_some(),
            elapsed: self.elapsed.clone(),
        }
    }

    // --- Main Run Loop ---

    /// Runs the player's command processing loop. This should be spawned as a Tokio task.
    #[instrument(skip(self))]
    pub async fn run(&mut self) {
        run_loop::run_player_loop(self).await;
    }
}
