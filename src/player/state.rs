use crate::audio::INITIAL_ELAPSED;
use crate::notification::ActionCommand;
use tokio::sync::oneshot;

/// Commands that can be sent to the Player task.
#[derive(Debug)]
pub enum PlayerCommand {
    /// Allocates the engine and binds the bundled track. No-op when it exists.
    Create,
    TogglePlayPause,
    GetState(oneshot::Sender<PlaybackState>),
    Shutdown,
}

impl From<ActionCommand> for PlayerCommand {
    fn from(command: ActionCommand) -> Self {
        match command {
            ActionCommand::TogglePlayPause => PlayerCommand::TogglePlayPause,
        }
    }
}

/// Snapshot of the controller's state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackState {
    pub is_ready: bool,
    pub is_playing: bool,
    pub is_preparing: bool,
    pub timer_active: bool,
    /// Last computed elapsed time, `HH:MM:SS`.
    pub elapsed: String,
}

impl Default for PlaybackState {
    fn default() -> Self {
        PlaybackState {
            is_ready: false,
            is_playing: false,
            is_preparing: false,
            timer_active: false,
            elapsed: INITIAL_ELAPSED.to_string(),
        }
    }
}

/// Updates broadcast by the Player task about its state changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateChange {
    /// Periodic elapsed-time update while playing.
    Elapsed(String),
    /// The track played to its end.
    Finished,
    PlayState(bool),
    /// The engine failed; playback stopped and the engine was released.
    Failed(String),
}
