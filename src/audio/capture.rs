//! Microphone capture via `cpal`.
//!
//! [`AudioCapture`] wraps the cpal host/device/stream lifecycle. Call
//! [`AudioCapture::start`] to begin streaming [`AudioChunk`]s over a bounded
//! channel. The returned [`StreamHandle`] is a RAII guard — dropping it
//! stops the underlying cpal stream, which in turn closes the channel.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::mpsc::SyncSender;

use super::AudioError;

// ---------------------------------------------------------------------------
// AudioChunk
// ---------------------------------------------------------------------------

/// A single buffer of raw audio as delivered by the cpal callback.
///
/// Samples are interleaved `f32` in the range `[-1.0, 1.0]`; the session's
/// sample rate and channel count are fixed at capture start and live on the
/// [`AudioCapture`] that produced the chunk.
#[derive(Debug, Clone)]
pub struct AudioChunk {
    /// Interleaved PCM samples in `[-1.0, 1.0]`.
    pub samples: Vec<f32>,
}

// ---------------------------------------------------------------------------
// StreamHandle
// ---------------------------------------------------------------------------

/// RAII guard that keeps the cpal stream alive.
///
/// Dropping this value stops the underlying hardware stream and drops the
/// chunk sender, which lets the drain thread run to completion.
pub struct StreamHandle {
    _stream: cpal::Stream,
}

// ---------------------------------------------------------------------------
// AudioCapture
// ---------------------------------------------------------------------------

/// Microphone device wrapper built on top of `cpal`.
///
/// One instance is created per recording session on a dedicated capture
/// thread (cpal streams are not `Send` on every platform), queried for its
/// native format, started, and dropped when the session ends.
pub struct AudioCapture {
    device: cpal::Device,
    config: cpal::StreamConfig,
    /// Native sample rate reported by the device (Hz).
    sample_rate: u32,
    /// Number of interleaved channels reported by the device.
    channels: u16,
}

impl AudioCapture {
    /// Create a new [`AudioCapture`] using the system default input device.
    ///
    /// Queries the device's preferred stream configuration (sample rate,
    /// channels, buffer size) so no manual configuration is required.
    ///
    /// # Errors
    ///
    /// Returns [`AudioError::DeviceUnavailable`] when no input device exists
    /// or the device cannot report a default configuration.
    pub fn new() -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or(AudioError::DeviceUnavailable)?;

        let supported = device.default_input_config().map_err(|e| {
            log::warn!("default input config unavailable: {e}");
            AudioError::DeviceUnavailable
        })?;

        let channels = supported.channels();
        let sample_rate = supported.sample_rate().0;
        let config: cpal::StreamConfig = supported.into();

        Ok(Self {
            device,
            config,
            sample_rate,
            channels,
        })
    }

    /// Start recording and send [`AudioChunk`]s to `tx`.
    ///
    /// The cpal callback runs on a dedicated real-time thread; each hardware
    /// buffer is wrapped in an [`AudioChunk`] and forwarded over the bounded
    /// channel with `try_send` — a full queue drops the chunk rather than
    /// blocking the audio thread, and a dropped receiver is silently ignored.
    ///
    /// # Errors
    ///
    /// Returns [`AudioError::EngineStartFailed`] if the platform rejects the
    /// stream configuration or refuses to start the stream.
    pub fn start(&self, tx: SyncSender<AudioChunk>) -> Result<StreamHandle, AudioError> {
        let stream = self
            .device
            .build_input_stream(
                &self.config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    let chunk = AudioChunk {
                        samples: data.to_vec(),
                    };
                    let _ = tx.try_send(chunk);
                },
                |err: cpal::StreamError| {
                    log::error!("cpal stream error: {err}");
                },
                None, // no timeout
            )
            .map_err(|e| AudioError::EngineStartFailed(e.to_string()))?;

        stream
            .play()
            .map_err(|e| AudioError::EngineStartFailed(e.to_string()))?;

        Ok(StreamHandle { _stream: stream })
    }

    /// Native sample rate of the capture stream in Hz (commonly 44 100 or
    /// 48 000). The WAV container records this rate verbatim.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of interleaved channels in each [`AudioChunk`].
    pub fn channels(&self) -> u16 {
        self.channels
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
