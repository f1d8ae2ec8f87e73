//! Audio capture and encoding.
//!
//! One recording session flows through three stages:
//!
//! 1. [`capture`] — a cpal input stream delivers raw `f32` chunks over a
//!    bounded channel from the real-time callback thread.
//! 2. [`pipeline`] — [`AudioPipeline`] owns the session: it downmixes each
//!    chunk to mono 16-bit PCM, appends it to the accumulator, feeds the
//!    live loudness stream ([`level`]), and enforces the 30 s / 25 MiB
//!    self-stop limits.
//! 3. [`wav`] — on stop, the accumulated PCM is wrapped in a byte-exact
//!    RIFF/WAVE container at the native capture sample rate.

pub mod capture;
pub mod level;
pub mod pipeline;
pub mod wav;

pub use capture::{AudioChunk, AudioCapture, StreamHandle};
pub use level::LevelMeter;
pub use pipeline::{AudioCapturing, AudioPipeline};
pub use wav::{encode_wav, WavFormat};

use thiserror::Error;

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

/// Maximum recording length in seconds; accumulation self-stops beyond this.
pub const MAX_DURATION_SECS: u64 = 30;

/// Maximum accumulated audio size in bytes (25 MiB); accumulation self-stops
/// beyond this.
pub const MAX_FILE_BYTES: usize = 25 * 1024 * 1024;

// ---------------------------------------------------------------------------
// AudioError
// ---------------------------------------------------------------------------

/// All errors that can surface from audio capture and encoding.
#[derive(Debug, Clone, Error)]
pub enum AudioError {
    /// No usable input device on the default audio host.
    #[error("no audio input device available")]
    DeviceUnavailable,

    /// `start_capture` was called while a session was already recording.
    #[error("audio capture is already running")]
    EngineAlreadyRunning,

    /// The platform rejected the stream configuration or refused to start.
    #[error("failed to start audio capture: {0}")]
    EngineStartFailed(String),

    /// WAV encoding failed (empty buffer or unsupported bit depth).
    #[error("audio encoding failed: {0}")]
    EncodingFailed(String),

    /// The accumulated audio exceeds the duration limit.
    #[error("recording exceeds the {max_secs} s limit")]
    DurationExceeded { max_secs: u64 },

    /// The encoded file exceeds the size limit.
    #[error("audio file exceeds the {max_mb} MB limit")]
    FileSizeExceeded { max_mb: usize },

    /// Internal failure (thread join, channel teardown).
    #[error("internal audio error: {0}")]
    Internal(String),
}
