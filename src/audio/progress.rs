use std::sync::Arc;
use tokio::sync::Mutex as TokioMutex;

/// Elapsed-time label shown before anything has played.
pub const INITIAL_ELAPSED: &str = "00:00:00";

/// Holds the current playback position of the engine.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PlaybackProgressInfo {
    pub position_ms: u64,
}

// Type alias for the shared progress tracker
pub type SharedProgress = Arc<TokioMutex<PlaybackProgressInfo>>;

pub fn new_shared_progress() -> SharedProgress {
    Arc::new(TokioMutex::new(PlaybackProgressInfo::default()))
}

/// Formats an engine position as `HH:MM:SS`.
///
/// Hours wrap at 24, matching a wall-clock style display.
pub fn format_elapsed(position_ms: u64) -> String {
    let seconds = (position_ms / 1000) % 60;
    let minutes = (position_ms / (1000 * 60)) % 60;
    let hours = (position_ms / (1000 * 60 * 60)) % 24;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}
