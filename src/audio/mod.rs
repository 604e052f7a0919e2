//! Audio engine: the bundled source, decoding and ALSA output behind the
//! `PlaybackEngine` trait the controller drives.

mod alsa_handler;
mod decoder;
mod engine;
mod error;
mod playback;
mod progress;
mod source;
mod task;

pub use decoder::{DecodeResult, DecodedFrame, SymphoniaDecoder};
pub use engine::{EngineEvent, EngineEventSender, EngineFactory, PlaybackEngine};
pub use error::AudioError;
pub use playback::{AlsaEngine, AlsaEngineFactory};
pub use progress::{format_elapsed, new_shared_progress, PlaybackProgressInfo, SharedProgress, INITIAL_ELAPSED};
pub use source::AudioSource;
