//! Integration tests for audio functionality
//!
//! These tests verify the audio engine pieces against real data.

use crate::test_utils::make_wav;
use std::error::Error;
use std::time::Duration;
use timeplayer::audio::{
    AlsaEngine, AudioError, AudioSource, DecodeResult, EngineEvent, PlaybackEngine, SymphoniaDecoder,
};
use tokio::sync::mpsc;

#[cfg(test)]
mod audio_integration_tests {
    use super::*;

    #[test]
    fn test_decode_generated_clip_to_end() -> Result<(), Box<dyn Error>> {
        let samples: Vec<i16> = (0..22050).map(|i| ((i * 37) % 2000) as i16 - 1000).collect();
        let source = AudioSource::from_bytes("sweep.wav", make_wav(22050, 1, &samples));
        let mut decoder = SymphoniaDecoder::open(&source)?;
        assert_eq!(decoder.duration_ms(), Some(1000));

        let mut decoded = Vec::new();
        loop {
            match decoder.decode_next_frame()? {
                DecodeResult::Decoded(frame) => decoded.extend_from_slice(&frame.samples),
                DecodeResult::Skipped(_) => continue,
                DecodeResult::EndOfStream => break,
            }
        }
        assert_eq!(decoded, samples);
        Ok(())
    }

    #[test]
    fn test_bundled_source_reopens_from_start() -> Result<(), Box<dyn Error>> {
        let source = AudioSource::bundled();
        let mut first = SymphoniaDecoder::open(&source)?;
        let mut second = SymphoniaDecoder::open(&source)?;

        let (DecodeResult::Decoded(a), DecodeResult::Decoded(b)) = (first.decode_next_frame()?, second.decode_next_frame()?) else {
            panic!("bundled track should decode");
        };
        assert_eq!(a.timestamp, 0);
        assert_eq!(a.samples, b.samples);
        Ok(())
    }

    /// Plays the bundled track on the default ALSA device.
    /// Marked as ignored as it requires audio hardware.
    #[tokio::test]
    #[ignore]
    async fn test_alsa_engine_plays_bundled_track() -> Result<(), Box<dyn Error>> {
        let (events_tx, mut events_rx) = mpsc::channel(8);
        let mut engine = AlsaEngine::new("default", events_tx);
        engine.set_source(AudioSource::bundled())?;
        engine.prepare_async()?;
        assert_eq!(events_rx.recv().await, Some(EngineEvent::Prepared));

        engine.start().await?;
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(engine.current_position_ms().await > 0);

        engine.pause().await?;
        let paused_at = engine.current_position_ms().await;
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(engine.current_position_ms().await <= paused_at + 200);

        engine.release().await?;
        Ok(())
    }

    #[test]
    fn test_audio_error_handling() {
        let error = AudioError::AlsaError("Test error".to_string());
        assert_eq!(format!("{}", error), "ALSA error: Test error");

        let error = AudioError::MissingCodecParams("sample rate");
        assert_eq!(format!("{}", error), "Missing codec parameters: sample rate");
    }
}
