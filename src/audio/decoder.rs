use crate::audio::error::AudioError;
use crate::audio::source::AudioSource;
use std::io;
use symphonia::core::audio::{SampleBuffer, SignalSpec};
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::units::TimeBase;
use tracing::{debug, error, info, trace, warn};

const LOG_TARGET: &str = "timeplayer::audio::decoder";

/// Manages Symphonia format reading and decoding for one asset.
pub struct SymphoniaDecoder {
    format_reader: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    track_time_base: Option<TimeBase>,
    initial_spec: SignalSpec,
    duration_ms: Option<u64>,
    sample_buf: Option<SampleBuffer<i16>>,
}

/// One block of interleaved S16 samples and the packet timestamp it started at.
#[derive(Debug)]
pub struct DecodedFrame {
    pub samples: Vec<i16>,
    pub channels: usize,
    pub timestamp: u64,
}

impl DecodedFrame {
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.samples.len() / self.channels
        }
    }
}

/// Outcome of a single decode step.
#[derive(Debug)]
pub enum DecodeResult {
    Decoded(DecodedFrame),
    EndOfStream,
    /// A recoverable condition; the caller should keep decoding.
    Skipped(String),
}

impl SymphoniaDecoder {
    /// Probes the asset and sets up a decoder for its first playable track.
    pub fn open(source: &AudioSource) -> Result<Self, AudioError> {
        debug!(target: LOG_TARGET, "Setting up Symphonia format reader and decoder for {}...", source.name());
        let meta_opts: MetadataOptions = Default::default();
        let fmt_opts: FormatOptions = Default::default();

        let probed = symphonia::default::get_probe().format(&source.hint(), source.open_stream(), &fmt_opts, &meta_opts)?;
        let format_reader = probed.format;

        let track = format_reader
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or(AudioError::UnsupportedFormat("No suitable audio track found".to_string()))?
            .clone();

        debug!(target: LOG_TARGET, "Found suitable audio track: ID={}, Codec={:?}", track.id, track.codec_params.codec);

        let decoder = symphonia::default::get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

        let initial_spec = SignalSpec::new(
            track.codec_params.sample_rate.ok_or(AudioError::MissingCodecParams("sample rate"))?,
            track.codec_params.channels.ok_or(AudioError::MissingCodecParams("channels map"))?,
        );
        let track_time_base = track.codec_params.time_base;
        let duration_ms = match (track_time_base, track.codec_params.n_frames) {
            (Some(tb), Some(n_frames)) => Some(time_to_ms(tb, n_frames)),
            _ => None,
        };

        info!(target: LOG_TARGET, "Decoder ready. Spec: {:?}, duration: {:?} ms", initial_spec, duration_ms);

        Ok(Self {
            format_reader,
            decoder,
            track_id: track.id,
            track_time_base,
            initial_spec,
            duration_ms,
            sample_buf: None,
        })
    }

    /// Returns the signal specification detected at probe time.
    pub fn initial_spec(&self) -> SignalSpec {
        self.initial_spec
    }

    pub fn duration_ms(&self) -> Option<u64> {
        self.duration_ms
    }

    /// Converts a packet timestamp into milliseconds, or 0 without a time base.
    pub fn timestamp_to_ms(&self, ts: u64) -> u64 {
        self.track_time_base.map_or(0, |tb| time_to_ms(tb, ts))
    }

    /// Decodes the next packet of the selected track into interleaved S16.
    pub fn decode_next_frame(&mut self) -> Result<DecodeResult, AudioError> {
        loop {
            let packet = match self.format_reader.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(ref io_err)) if io_err.kind() == io::ErrorKind::UnexpectedEof => {
                    debug!(target: LOG_TARGET, "End of stream reached.");
                    return Ok(DecodeResult::EndOfStream);
                }
                Err(SymphoniaError::ResetRequired) => {
                    warn!(target: LOG_TARGET, "Symphonia decoder reset required.");
                    self.decoder.reset();
                    return Ok(DecodeResult::Skipped("Stream discontinuity (ResetRequired)".to_string()));
                }
                Err(e) => {
                    error!(target: LOG_TARGET, "Error reading next packet: {}", e);
                    return Err(e.into());
                }
            };

            if packet.track_id() != self.track_id {
                trace!(target: LOG_TARGET, "Skipping packet for track {}", packet.track_id());
                continue;
            }

            match self.decoder.decode(&packet) {
                Ok(decoded) => {
                    let spec = *decoded.spec();
                    if spec != self.initial_spec {
                        warn!(
                            target: LOG_TARGET,
                            "Audio specification changed mid-stream! Expected: {:?}, Got: {:?}.",
                            self.initial_spec, spec
                        );
                        return Err(AudioError::UnsupportedFormat("Dynamic spec change".to_string()));
                    }

                    let capacity = decoded.capacity();
                    let needs_new_buf = self
                        .sample_buf
                        .as_ref()
                        .map_or(true, |buf| buf.capacity() < capacity * spec.channels.count());
                    if needs_new_buf {
                        self.sample_buf = Some(SampleBuffer::new(capacity as u64, spec));
                    }

                    let Some(buf) = self.sample_buf.as_mut() else {
                        return Err(AudioError::InvalidState("Sample buffer missing".to_string()));
                    };
                    buf.copy_interleaved_ref(decoded);

                    return Ok(DecodeResult::Decoded(DecodedFrame {
                        samples: buf.samples().to_vec(),
                        channels: spec.channels.count(),
                        timestamp: packet.ts(),
                    }));
                }
                Err(SymphoniaError::DecodeError(err)) => {
                    warn!(target: LOG_TARGET, "Symphonia decode error (skipping packet): {}", err);
                }
                Err(e) => {
                    error!(target: LOG_TARGET, "Unexpected decoder error: {}", e);
                    return Err(e.into());
                }
            }
        }
    }
}

fn time_to_ms(time_base: TimeBase, ts: u64) -> u64 {
    let time = time_base.calc_time(ts);
    time.seconds * 1000 + (time.frac * 1000.0) as u64
}
