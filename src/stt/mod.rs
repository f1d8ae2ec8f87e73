//! Remote speech-to-text backends.
//!
//! [`SttProvider`] is the protocol: validate the WAV, upload it as multipart
//! form data, map HTTP statuses onto the [`SttError`] taxonomy, and return
//! either the final text or a stream of deltas. [`create_provider`] selects
//! the configured backend.

pub mod openai;
pub mod provider;
pub mod sse;
pub mod zhipu;

pub use openai::OpenAiProvider;
pub use provider::{validate_audio_data, SttError, SttProvider, MAX_AUDIO_BYTES, MIN_AUDIO_BYTES};
pub use sse::{parse_line, SseBuffer, SseEvent};
pub use zhipu::ZhipuProvider;

use std::sync::Arc;

use crate::config::{SttConfig, SttProviderKind};

/// Build the transcription backend selected by configuration.
///
/// A missing API key is not an error here; it surfaces as
/// [`SttError::MissingApiKey`] on first use so the application can start
/// unconfigured.
pub fn create_provider(config: &SttConfig) -> Arc<dyn SttProvider> {
    match config.provider {
        SttProviderKind::Zhipu => Arc::new(ZhipuProvider::new(config)),
        SttProviderKind::OpenAi => Arc::new(OpenAiProvider::new(config)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_selects_the_configured_backend() {
        let zhipu = create_provider(&SttConfig::default());
        assert_eq!(zhipu.name(), "zhipu");
        assert!(zhipu.supports_streaming());

        let openai = create_provider(&SttConfig {
            provider: SttProviderKind::OpenAi,
            ..SttConfig::default()
        });
        assert_eq!(openai.name(), "openai-whisper");
        assert!(!openai.supports_streaming());
    }
}
