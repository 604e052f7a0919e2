use crate::audio::error::AudioError;
use alsa::nix::errno::Errno;
use alsa::pcm::{Access, Format, HwParams, State as PcmState, PCM};
use alsa::{Direction, ValueOr};
use std::ffi::CString;
use symphonia::core::audio::SignalSpec;
use tracing::{debug, error, info, instrument, warn};

const LOG_TARGET: &str = "timeplayer::audio::alsa_handler";

/// Owns the ALSA PCM device used for output.
pub struct AlsaPcmHandler {
    device_name: String,
    pcm: Option<PCM>,
    actual_rate: Option<u32>,
}

impl AlsaPcmHandler {
    pub fn new(device_name: &str) -> Self {
        debug!(target: LOG_TARGET, "Creating AlsaPcmHandler for device: {}", device_name);
        AlsaPcmHandler {
            device_name: device_name.to_string(),
            pcm: None,
            actual_rate: None,
        }
    }

    /// Opens the device in blocking mode and configures it for interleaved S16 at `spec`.
    #[instrument(skip(self, spec), fields(device = %self.device_name, rate = spec.rate, channels = spec.channels.count()))]
    pub fn initialize(&mut self, spec: SignalSpec) -> Result<(), AudioError> {
        self.close();

        let device = CString::new(self.device_name.clone())
            .map_err(|e| AudioError::InitializationError(format!("Invalid device name: {}", e)))?;
        let pcm = PCM::open(&device, Direction::Playback, false)?;

        {
            let hwp = HwParams::any(&pcm)?;
            hwp.set_access(Access::RWInterleaved)?;
            hwp.set_format(Format::s16())?;
            hwp.set_channels(spec.channels.count() as u32)?;
            hwp.set_rate_near(spec.rate, ValueOr::Nearest)?;
            let actual_rate = hwp.get_rate()?;
            if actual_rate != spec.rate {
                warn!(target: LOG_TARGET, "ALSA rate negotiation: requested={}, actual={}", spec.rate, actual_rate);
            }
            pcm.hw_params(&hwp)?;
            self.actual_rate = Some(actual_rate);

            let swp = pcm.sw_params_current()?;
            let buffer_size = hwp.get_buffer_size()?;
            let period_size = hwp.get_period_size()?;
            swp.set_start_threshold(buffer_size - period_size)?;
            pcm.sw_params(&swp)?;
            debug!(target: LOG_TARGET, "ALSA parameters applied (buffer={}, period={}).", buffer_size, period_size);
        }

        self.pcm = Some(pcm);
        info!(target: LOG_TARGET, "ALSA device '{}' initialized.", self.device_name);
        Ok(())
    }

    /// Writes interleaved S16 samples. Returns `Ok(0)` after a recovered underrun,
    /// in which case the caller retries the same chunk.
    pub fn write_s16_buffer(&self, buffer: &[i16]) -> Result<usize, AudioError> {
        let pcm = self.pcm.as_ref().ok_or(AudioError::InvalidState("PCM not initialized for writing".to_string()))?;
        let io = pcm.io_i16()?;

        match io.writei(buffer) {
            Ok(frames_written) => Ok(frames_written),
            Err(e) if e.errno() == Errno::EPIPE => {
                warn!(target: LOG_TARGET, "ALSA buffer underrun (EPIPE), recovering...");
                pcm.recover(libc::EPIPE, false)
                    .map(|_| 0)
                    .map_err(|recover_err| AudioError::AlsaError(format!("ALSA recovery failed: {}", recover_err)))
            }
            Err(e) => {
                error!(target: LOG_TARGET, "ALSA write error: {}", e);
                Err(e.into())
            }
        }
    }

    /// Blocks until queued frames have been played.
    pub fn drain(&self) -> Result<(), AudioError> {
        match &self.pcm {
            Some(pcm) if matches!(pcm.state(), PcmState::Running | PcmState::Prepared) => {
                debug!(target: LOG_TARGET, "Draining ALSA buffer.");
                pcm.drain().map_err(AudioError::from)
            }
            _ => Ok(()),
        }
    }

    pub fn pause(&self) -> Result<(), AudioError> {
        let pcm = self.pcm.as_ref().ok_or(AudioError::InvalidState("PCM not initialized for pausing".to_string()))?;
        match pcm.state() {
            PcmState::Running => {
                debug!(target: LOG_TARGET, "Pausing ALSA PCM device.");
                pcm.pause(true).map_err(AudioError::from)
            }
            other_state => {
                debug!(target: LOG_TARGET, "Not pausing ALSA in state {:?}.", other_state);
                Ok(())
            }
        }
    }

    pub fn resume(&self) -> Result<(), AudioError> {
        let pcm = self.pcm.as_ref().ok_or(AudioError::InvalidState("PCM not initialized for resuming".to_string()))?;
        match pcm.state() {
            PcmState::Paused => {
                debug!(target: LOG_TARGET, "Resuming ALSA PCM device.");
                pcm.pause(false).map_err(AudioError::from)
            }
            other_state => {
                debug!(target: LOG_TARGET, "Not resuming ALSA in state {:?}.", other_state);
                Ok(())
            }
        }
    }

    /// Re-arms the device after a drain so the next track start can write again.
    pub fn prepare(&self) -> Result<(), AudioError> {
        match &self.pcm {
            Some(pcm) if pcm.state() != PcmState::Prepared => pcm.prepare().map_err(AudioError::from),
            _ => Ok(()),
        }
    }

    /// Stops output immediately and releases the device.
    pub fn close(&mut self) {
        if let Some(pcm) = self.pcm.take() {
            if matches!(pcm.state(), PcmState::Running | PcmState::Prepared | PcmState::Paused) {
                if let Err(e) = pcm.drop() {
                    warn!(target: LOG_TARGET, "Error dropping ALSA buffer during close (ignored): {}", e);
                }
            }
            debug!(target: LOG_TARGET, "ALSA PCM closed.");
        }
        self.actual_rate = None;
    }

    pub fn actual_rate(&self) -> Option<u32> {
        self.actual_rate
    }
}

impl Drop for AlsaPcmHandler {
    fn drop(&mut self) {
        self.close();
    }
}
