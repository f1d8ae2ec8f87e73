//! OpenAI Whisper transcription backend.
//!
//! Whisper has no streaming endpoint, so the `streaming` flag is ignored and
//! `transcribe_streaming` is synthesized from the batch result as a
//! single-element channel.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use tokio::sync::mpsc;

use crate::config::SttConfig;

use super::provider::{check_status, request_error, validate_audio_data, SttError, SttProvider};

#[derive(Debug, serde::Deserialize)]
struct WhisperResponse {
    text: String,
}

// ---------------------------------------------------------------------------
// OpenAiProvider
// ---------------------------------------------------------------------------

/// Batch-only Whisper client.
pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl OpenAiProvider {
    pub fn new(config: &SttConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: config.api_key.clone().unwrap_or_default(),
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    fn build_form(&self, audio: Vec<u8>) -> Result<Form, SttError> {
        let file = Part::bytes(audio)
            .file_name("audio.wav")
            .mime_str("audio/wav")
            .map_err(|e| SttError::Network(e.to_string()))?;

        Ok(Form::new()
            .part("file", file)
            .text("model", self.model.clone())
            .text("response_format", "json"))
    }
}

#[async_trait]
impl SttProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai-whisper"
    }

    fn supports_streaming(&self) -> bool {
        false
    }

    async fn transcribe(
        &self,
        audio: Vec<u8>,
        _streaming: bool,
        _custom_words: &[String],
    ) -> Result<String, SttError> {
        if self.api_key.is_empty() {
            return Err(SttError::MissingApiKey);
        }
        validate_audio_data(&audio)?;

        log::info!("transcribing {} bytes via Whisper (batch)", audio.len());

        let form = self.build_form(audio)?;
        let response = self
            .client
            .post(&self.base_url)
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .multipart(form)
            .send()
            .await
            .map_err(request_error)?;
        check_status(response.status())?;

        let body: WhisperResponse = response
            .json()
            .await
            .map_err(|e| SttError::Decoding(e.to_string()))?;

        if body.text.is_empty() {
            return Err(SttError::InvalidResponse("empty transcription result".into()));
        }
        Ok(body.text)
    }

    async fn transcribe_streaming(
        &self,
        audio: Vec<u8>,
        custom_words: &[String],
    ) -> Result<mpsc::Receiver<String>, SttError> {
        let text = self.transcribe(audio, false, custom_words).await?;

        let (tx, rx) = mpsc::channel(1);
        // The capacity-1 channel always has room for the single element.
        let _ = tx.try_send(text);
        Ok(rx)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(api_key: Option<&str>) -> OpenAiProvider {
        OpenAiProvider::new(&SttConfig {
            api_key: api_key.map(str::to_owned),
            base_url: "https://api.openai.com/v1/audio/transcriptions".into(),
            model: "whisper-1".into(),
            ..SttConfig::default()
        })
    }

    #[tokio::test]
    async fn missing_api_key_is_rejected_before_any_request() {
        let p = provider(None);
        let err = p.transcribe(vec![0; 200], false, &[]).await.unwrap_err();
        assert!(matches!(err, SttError::MissingApiKey));
    }

    #[tokio::test]
    async fn oversized_audio_is_rejected_before_any_request() {
        let p = provider(Some("sk-test"));
        let audio = vec![0; super::super::provider::MAX_AUDIO_BYTES + 1];
        let err = p.transcribe(audio, false, &[]).await.unwrap_err();
        assert!(matches!(err, SttError::InvalidAudioFile(_)));
    }

    #[test]
    fn backend_reports_no_streaming_support() {
        assert!(!provider(Some("sk-test")).supports_streaming());
    }
}
