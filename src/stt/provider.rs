//! The provider-facing transcription protocol: error taxonomy, audio
//! validation, and the [`SttProvider`] trait every backend implements.

use async_trait::async_trait;
use tokio::sync::mpsc;

use thiserror::Error;

/// Uploads at or below this many bytes are rejected as too small to contain
/// speech (a bare WAV header is 44 bytes).
pub const MIN_AUDIO_BYTES: usize = 100;

/// Upload ceiling shared by the supported transcription services (25 MiB).
pub const MAX_AUDIO_BYTES: usize = 25 * 1024 * 1024;

// ---------------------------------------------------------------------------
// SttError
// ---------------------------------------------------------------------------

/// All errors a transcription backend can produce.
#[derive(Debug, Error)]
pub enum SttError {
    /// No API key configured for the selected provider.
    #[error("no API key configured for the transcription service")]
    MissingApiKey,

    /// The request could not be built or sent.
    #[error("transcription request failed: {0}")]
    Network(String),

    /// The request exceeded the configured timeout.
    #[error("transcription request timed out")]
    Timeout,

    /// HTTP 401.
    #[error("transcription service rejected the API key")]
    Unauthorized,

    /// HTTP 429.
    #[error("transcription service rate limit exceeded")]
    RateLimited,

    /// HTTP 5xx.
    #[error("transcription service unavailable (HTTP {0})")]
    ServiceUnavailable(u16),

    /// Unexpected status code or response shape.
    #[error("invalid transcription response: {0}")]
    InvalidResponse(String),

    /// The response body could not be decoded.
    #[error("failed to decode transcription response: {0}")]
    Decoding(String),

    /// The audio payload fails the size validation.
    #[error("invalid audio file: {0}")]
    InvalidAudioFile(String),

    /// The streaming connection dropped before the end-of-stream marker.
    #[error("transcription stream was interrupted")]
    StreamingInterrupted,
}

// ---------------------------------------------------------------------------
// SttProvider
// ---------------------------------------------------------------------------

/// A remote speech-to-text backend.
///
/// Backends that cannot stream still honor `transcribe_streaming` by
/// synthesizing a single-element channel carrying the final text.
#[async_trait]
pub trait SttProvider: Send + Sync {
    /// Short backend name for logging.
    fn name(&self) -> &'static str;

    /// Whether the backend produces incremental deltas.
    fn supports_streaming(&self) -> bool;

    /// Transcribe a complete WAV buffer to final text. With `streaming` set
    /// on a streaming-capable backend, deltas are collected in arrival order
    /// and concatenated.
    async fn transcribe(
        &self,
        audio: Vec<u8>,
        streaming: bool,
        custom_words: &[String],
    ) -> Result<String, SttError>;

    /// Transcribe a complete WAV buffer as a stream of text deltas. The
    /// channel closes after the final delta.
    async fn transcribe_streaming(
        &self,
        audio: Vec<u8>,
        custom_words: &[String],
    ) -> Result<mpsc::Receiver<String>, SttError>;
}

// ---------------------------------------------------------------------------
// Shared request plumbing
// ---------------------------------------------------------------------------

/// Reject audio payloads outside `(MIN_AUDIO_BYTES, MAX_AUDIO_BYTES]`.
pub fn validate_audio_data(audio: &[u8]) -> Result<(), SttError> {
    if audio.len() <= MIN_AUDIO_BYTES {
        return Err(SttError::InvalidAudioFile(format!(
            "audio payload too small ({} bytes)",
            audio.len()
        )));
    }
    if audio.len() > MAX_AUDIO_BYTES {
        return Err(SttError::InvalidAudioFile(
            "audio payload exceeds the 25 MB upload limit".into(),
        ));
    }
    Ok(())
}

/// Map a response status to the error taxonomy. 2xx passes through.
pub(crate) fn check_status(status: reqwest::StatusCode) -> Result<(), SttError> {
    match status.as_u16() {
        200..=299 => Ok(()),
        401 => Err(SttError::Unauthorized),
        429 => Err(SttError::RateLimited),
        code @ 500..=599 => Err(SttError::ServiceUnavailable(code)),
        code => Err(SttError::InvalidResponse(format!("HTTP {code}"))),
    }
}

/// Map a transport-level failure, distinguishing timeouts.
pub(crate) fn request_error(err: reqwest::Error) -> SttError {
    if err.is_timeout() {
        SttError::Timeout
    } else {
        SttError::Network(err.to_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn audio_at_minimum_boundary_is_rejected() {
        assert!(validate_audio_data(&vec![0; MIN_AUDIO_BYTES]).is_err());
        assert!(validate_audio_data(&vec![0; MIN_AUDIO_BYTES + 1]).is_ok());
    }

    #[test]
    fn audio_at_maximum_boundary_is_accepted() {
        assert!(validate_audio_data(&vec![0; MAX_AUDIO_BYTES]).is_ok());
        assert!(matches!(
            validate_audio_data(&vec![0; MAX_AUDIO_BYTES + 1]),
            Err(SttError::InvalidAudioFile(_))
        ));
    }

    #[test]
    fn success_statuses_pass_through() {
        assert!(check_status(StatusCode::OK).is_ok());
        assert!(check_status(StatusCode::NO_CONTENT).is_ok());
    }

    #[test]
    fn auth_and_throttle_statuses_map_to_dedicated_errors() {
        assert!(matches!(
            check_status(StatusCode::UNAUTHORIZED),
            Err(SttError::Unauthorized)
        ));
        assert!(matches!(
            check_status(StatusCode::TOO_MANY_REQUESTS),
            Err(SttError::RateLimited)
        ));
    }

    #[test]
    fn server_errors_carry_the_status_code() {
        assert!(matches!(
            check_status(StatusCode::INTERNAL_SERVER_ERROR),
            Err(SttError::ServiceUnavailable(500))
        ));
        assert!(matches!(
            check_status(StatusCode::SERVICE_UNAVAILABLE),
            Err(SttError::ServiceUnavailable(503))
        ));
    }

    #[test]
    fn other_statuses_are_invalid_responses() {
        assert!(matches!(
            check_status(StatusCode::NOT_FOUND),
            Err(SttError::InvalidResponse(_))
        ));
    }
}
