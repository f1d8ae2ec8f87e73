//! Zhipu GLM-ASR transcription backend.
//!
//! Uploads the WAV as `multipart/form-data` and supports two response modes:
//! a single JSON document (`{"text": …}`) or an SSE stream of incremental
//! deltas when the `stream=true` field is present.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::multipart::{Form, Part};
use tokio::sync::mpsc;

use crate::config::SttConfig;

use super::provider::{check_status, request_error, validate_audio_data, SttError, SttProvider};
use super::sse::{parse_line, SseBuffer, SseEvent};

/// Bound of the delta channel handed to the caller.
const DELTA_QUEUE_DEPTH: usize = 32;

/// Batch response body.
#[derive(Debug, serde::Deserialize)]
struct TranscriptionResponse {
    text: Option<String>,
}

// ---------------------------------------------------------------------------
// ZhipuProvider
// ---------------------------------------------------------------------------

/// Streaming-capable GLM-ASR client.
pub struct ZhipuProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl ZhipuProvider {
    pub fn new(config: &SttConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: config.api_key.clone().unwrap_or_default(),
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Build the upload form: the WAV under field `file`, the model name,
    /// `stream=true` when streaming, and the vocabulary hints as a JSON array
    /// string under `custom_words`.
    fn build_form(
        &self,
        audio: Vec<u8>,
        streaming: bool,
        custom_words: &[String],
    ) -> Result<Form, SttError> {
        let file = Part::bytes(audio)
            .file_name("audio.wav")
            .mime_str("audio/wav")
            .map_err(|e| SttError::Network(e.to_string()))?;

        let mut form = Form::new()
            .part("file", file)
            .text("model", self.model.clone());

        if streaming {
            form = form.text("stream", "true");
        }
        if !custom_words.is_empty() {
            let words = serde_json::to_string(custom_words)
                .map_err(|e| SttError::Decoding(e.to_string()))?;
            form = form.text("custom_words", words);
        }
        Ok(form)
    }

    async fn send(&self, form: Form) -> Result<reqwest::Response, SttError> {
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
        Ok(response)
    }

    async fn request_batch(
        &self,
        audio: Vec<u8>,
        custom_words: &[String],
    ) -> Result<String, SttError> {
        let form = self.build_form(audio, false, custom_words)?;
        let response = self.send(form).await?;

        let body: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| SttError::Decoding(e.to_string()))?;

        match body.text {
            Some(text) if !text.is_empty() => Ok(text),
            _ => Err(SttError::InvalidResponse("empty transcription result".into())),
        }
    }

    /// Open the SSE stream and spawn its drain task. The returned flag is set
    /// when the connection drops before the `[DONE]` marker.
    async fn start_stream(
        &self,
        audio: Vec<u8>,
        custom_words: &[String],
    ) -> Result<(mpsc::Receiver<String>, Arc<AtomicBool>), SttError> {
        let form = self.build_form(audio, true, custom_words)?;
        let response = self.send(form).await?;

        let (tx, rx) = mpsc::channel(DELTA_QUEUE_DEPTH);
        let interrupted = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&interrupted);

        tokio::spawn(async move {
            let mut stream = response.bytes_stream();
            let mut buffer = SseBuffer::new();
            let mut done = false;

            'read: while let Some(next) = stream.next().await {
                let bytes = match next {
                    Ok(bytes) => bytes,
                    Err(err) => {
                        log::warn!("transcription stream read failed: {err}");
                        break;
                    }
                };
                for line in buffer.push(&bytes) {
                    match parse_line(&line) {
                        SseEvent::Delta(delta) => {
                            if tx.send(delta).await.is_err() {
                                // Receiver gone; nothing left to deliver.
                                return;
                            }
                        }
                        SseEvent::Done => {
                            done = true;
                            break 'read;
                        }
                        SseEvent::Skip => {}
                    }
                }
            }

            if !done {
                flag.store(true, Ordering::Release);
            }
        });

        Ok((rx, interrupted))
    }
}

#[async_trait]
impl SttProvider for ZhipuProvider {
    fn name(&self) -> &'static str {
        "zhipu"
    }

    fn supports_streaming(&self) -> bool {
        true
    }

    async fn transcribe(
        &self,
        audio: Vec<u8>,
        streaming: bool,
        custom_words: &[String],
    ) -> Result<String, SttError> {
        if self.api_key.is_empty() {
            return Err(SttError::MissingApiKey);
        }
        validate_audio_data(&audio)?;

        log::info!(
            "transcribing {} bytes via GLM-ASR ({})",
            audio.len(),
            if streaming { "streaming" } else { "batch" }
        );

        if !streaming {
            return self.request_batch(audio, custom_words).await;
        }

        let (mut rx, interrupted) = self.start_stream(audio, custom_words).await?;
        let mut full = String::new();
        while let Some(delta) = rx.recv().await {
            full.push_str(&delta);
        }

        if full.is_empty() && interrupted.load(Ordering::Acquire) {
            return Err(SttError::StreamingInterrupted);
        }
        Ok(full)
    }

    async fn transcribe_streaming(
        &self,
        audio: Vec<u8>,
        custom_words: &[String],
    ) -> Result<mpsc::Receiver<String>, SttError> {
        if self.api_key.is_empty() {
            return Err(SttError::MissingApiKey);
        }
        validate_audio_data(&audio)?;

        let (rx, _interrupted) = self.start_stream(audio, custom_words).await?;
        Ok(rx)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(api_key: Option<&str>) -> ZhipuProvider {
        ZhipuProvider::new(&SttConfig {
            api_key: api_key.map(str::to_owned),
            ..SttConfig::default()
        })
    }

    #[tokio::test]
    async fn missing_api_key_is_rejected_before_any_request() {
        let p = provider(None);
        let err = p.transcribe(vec![0; 200], false, &[]).await.unwrap_err();
        assert!(matches!(err, SttError::MissingApiKey));

        let err = p.transcribe_streaming(vec![0; 200], &[]).await.unwrap_err();
        assert!(matches!(err, SttError::MissingApiKey));
    }

    #[tokio::test]
    async fn undersized_audio_is_rejected_before_any_request() {
        let p = provider(Some("key"));
        let err = p.transcribe(vec![0; 50], true, &[]).await.unwrap_err();
        assert!(matches!(err, SttError::InvalidAudioFile(_)));
    }

    #[test]
    fn form_includes_stream_and_custom_words_only_when_present() {
        let p = provider(Some("key"));
        // Construction must succeed with and without the optional fields.
        assert!(p.build_form(vec![0; 200], false, &[]).is_ok());
        assert!(p
            .build_form(vec![0; 200], true, &["voxd".into(), "SSE".into()])
            .is_ok());
    }
}
