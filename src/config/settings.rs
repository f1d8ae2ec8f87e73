//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// SttProviderKind
// ---------------------------------------------------------------------------

/// Selects which remote speech-to-text backend handles transcription.
///
/// | Variant | Wire behaviour |
/// |---------|----------------|
/// | Zhipu   | multipart upload; supports SSE streaming of incremental deltas |
/// | OpenAi  | multipart upload; batch-only (one request, one response) |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SttProviderKind {
    /// Zhipu GLM-ASR — streaming-capable.
    Zhipu,
    /// OpenAI Whisper — batch-only; a streaming request is synthesized from
    /// the final text.
    OpenAi,
}

impl Default for SttProviderKind {
    fn default() -> Self {
        Self::Zhipu
    }
}

// ---------------------------------------------------------------------------
// SttConfig
// ---------------------------------------------------------------------------

/// Settings for the remote transcription service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SttConfig {
    /// Which provider variant to use.
    pub provider: SttProviderKind,
    /// API key — `None` until the user configures one.
    pub api_key: Option<String>,
    /// Full transcription endpoint URL.
    pub base_url: String,
    /// Model identifier sent with the upload.
    pub model: String,
    /// Request incremental SSE deltas instead of a single response
    /// (only honoured by streaming-capable providers).
    pub streaming: bool,
    /// Maximum seconds to wait for the service before timing out.
    pub timeout_secs: u64,
    /// Domain vocabulary hints forwarded to the service as a JSON array.
    pub custom_words: Vec<String>,
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            provider: SttProviderKind::default(),
            api_key: None,
            base_url: "https://open.bigmodel.cn/api/paas/v4/audio/transcriptions".into(),
            model: "glm-asr-2512".into(),
            streaming: true,
            timeout_secs: 30,
            custom_words: Vec::new(),
        }
    }
}

impl SttConfig {
    /// Returns `true` when a non-empty API key has been configured.
    pub fn is_configured(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

// ---------------------------------------------------------------------------
// HotwordRule
// ---------------------------------------------------------------------------

/// One literal replacement applied to the raw transcript before rewriting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotwordRule {
    /// Text to look for (matched case-insensitively).
    pub pattern: String,
    /// Replacement text.
    pub replacement: String,
}

// ---------------------------------------------------------------------------
// RewriteConfig
// ---------------------------------------------------------------------------

/// Settings for the optional transcript-rewrite step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewriteConfig {
    /// Chat-completion endpoint URL.
    pub base_url: String,
    /// API key — `None` disables the LLM pass (hotwords still apply).
    pub api_key: Option<String>,
    /// Model identifier for the chat request.
    pub model: String,
    /// Maximum seconds to wait for a rewrite before degrading.
    pub timeout_secs: u64,
    /// System instruction for the rewrite. `None` or empty skips the LLM
    /// pass entirely.
    pub instruction: Option<String>,
    /// Hotword replacements applied before the LLM pass.
    pub hotwords: Vec<HotwordRule>,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://open.bigmodel.cn/api/paas/v4/chat/completions".into(),
            api_key: None,
            model: "glm-4-flash".into(),
            timeout_secs: 30,
            instruction: None,
            hotwords: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// TriggerConfig
// ---------------------------------------------------------------------------

/// Global key bindings for session control.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerConfig {
    /// Push-to-talk key name (press starts a session, release ends it).
    pub push_to_talk_key: String,
    /// Key that toggles recording (start when idle, stop when recording).
    pub toggle_key: String,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            push_to_talk_key: "F9".into(),
            toggle_key: "F10".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// InjectConfig
// ---------------------------------------------------------------------------

/// Timing knobs for the clipboard-paste fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InjectConfig {
    /// Milliseconds to wait after setting the clipboard before simulating
    /// paste (lets the clipboard manager flush).
    pub flush_delay_ms: u64,
    /// Milliseconds to wait after the paste event before restoring the
    /// original clipboard content.
    pub restore_delay_ms: u64,
}

impl Default for InjectConfig {
    fn default() -> Self {
        Self {
            flush_delay_ms: 50,
            restore_delay_ms: 200,
        }
    }
}

// ---------------------------------------------------------------------------
// HistoryConfig
// ---------------------------------------------------------------------------

/// Settings for the dictation history sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Whether completed sessions are appended to the history file.
    pub enabled: bool,
    /// Override path for `history.jsonl`; `None` uses the platform config dir.
    pub path: Option<std::path::PathBuf>,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use voxd::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
///
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Remote transcription settings.
    pub stt: SttConfig,
    /// Transcript-rewrite settings.
    pub rewrite: RewriteConfig,
    /// Global key bindings.
    pub trigger: TriggerConfig,
    /// Injection timing.
    pub inject: InjectConfig,
    /// Dictation history.
    pub history: HistoryConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet
    /// (first-run scenario) so callers never need to special-case a missing
    /// file.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    /// Verify that a default `AppConfig` can be serialised to TOML and
    /// deserialised back without any data loss.
    #[test]
    fn round_trip_toml() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");

        let original = AppConfig::default();
        original.save_to(&path).expect("save");

        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(original.stt.provider, loaded.stt.provider);
        assert_eq!(original.stt.base_url, loaded.stt.base_url);
        assert_eq!(original.stt.api_key, loaded.stt.api_key);
        assert_eq!(original.stt.model, loaded.stt.model);
        assert_eq!(original.stt.streaming, loaded.stt.streaming);
        assert_eq!(original.stt.timeout_secs, loaded.stt.timeout_secs);

        assert_eq!(original.rewrite.base_url, loaded.rewrite.base_url);
        assert_eq!(original.rewrite.model, loaded.rewrite.model);
        assert_eq!(original.rewrite.instruction, loaded.rewrite.instruction);
        assert_eq!(original.rewrite.hotwords, loaded.rewrite.hotwords);

        assert_eq!(
            original.trigger.push_to_talk_key,
            loaded.trigger.push_to_talk_key
        );
        assert_eq!(original.trigger.toggle_key, loaded.trigger.toggle_key);

        assert_eq!(original.inject.flush_delay_ms, loaded.inject.flush_delay_ms);
        assert_eq!(
            original.inject.restore_delay_ms,
            loaded.inject.restore_delay_ms
        );

        assert_eq!(original.history.enabled, loaded.history.enabled);
    }

    /// `load_from` on a non-existent path must return `Default` without error.
    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.toml");

        let config = AppConfig::load_from(&path).expect("should not error");
        let default = AppConfig::default();

        assert_eq!(config.stt.provider, default.stt.provider);
        assert_eq!(config.stt.model, default.stt.model);
        assert_eq!(
            config.trigger.push_to_talk_key,
            default.trigger.push_to_talk_key
        );
    }

    /// Verify that modified non-default values survive a round trip.
    #[test]
    fn round_trip_modified_values() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("modified.toml");

        let mut cfg = AppConfig::default();
        cfg.stt.provider = SttProviderKind::OpenAi;
        cfg.stt.api_key = Some("sk-test".into());
        cfg.stt.base_url = "https://api.openai.com/v1/audio/transcriptions".into();
        cfg.stt.model = "whisper-1".into();
        cfg.stt.streaming = false;
        cfg.stt.custom_words = vec!["voxd".into(), "SSE".into()];
        cfg.rewrite.instruction = Some("Fix punctuation.".into());
        cfg.rewrite.hotwords = vec![HotwordRule {
            pattern: "vox dee".into(),
            replacement: "voxd".into(),
        }];
        cfg.trigger.push_to_talk_key = "F6".into();
        cfg.inject.restore_delay_ms = 350;

        cfg.save_to(&path).expect("save");
        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(loaded.stt.provider, SttProviderKind::OpenAi);
        assert_eq!(loaded.stt.api_key, Some("sk-test".into()));
        assert_eq!(loaded.stt.model, "whisper-1");
        assert!(!loaded.stt.streaming);
        assert_eq!(loaded.stt.custom_words.len(), 2);
        assert_eq!(loaded.rewrite.instruction, Some("Fix punctuation.".into()));
        assert_eq!(loaded.rewrite.hotwords.len(), 1);
        assert_eq!(loaded.trigger.push_to_talk_key, "F6");
        assert_eq!(loaded.inject.restore_delay_ms, 350);
    }

    /// `is_configured` requires a non-empty key.
    #[test]
    fn stt_is_configured() {
        let mut cfg = SttConfig::default();
        assert!(!cfg.is_configured());

        cfg.api_key = Some(String::new());
        assert!(!cfg.is_configured());

        cfg.api_key = Some("key".into());
        assert!(cfg.is_configured());
    }
}
