//! Transcript post-processing: hotword correction followed by an optional
//! LLM rewrite.
//!
//! The contract of [`TextRewriter::process`] is degrade-on-failure: whatever
//! goes wrong in the LLM pass (no backend, no instruction, request error,
//! empty result), the caller gets the hotword-corrected text back. A rewrite
//! problem never aborts a dictation session.

pub mod chat;
pub mod hotwords;

pub use chat::{ChatRewriter, PromptRewriting, RewriteError};
pub use hotwords::HotwordCorrector;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::RewriteConfig;

// ---------------------------------------------------------------------------
// InstructionSource
// ---------------------------------------------------------------------------

/// Where the rewrite instruction comes from. `None` or a blank string skips
/// the LLM pass.
#[async_trait]
pub trait InstructionSource: Send + Sync {
    async fn instruction(&self) -> Option<String>;
}

/// Instruction taken verbatim from configuration.
pub struct ConfigInstructionSource {
    instruction: Option<String>,
}

impl ConfigInstructionSource {
    pub fn new(config: &RewriteConfig) -> Self {
        Self {
            instruction: config.instruction.clone(),
        }
    }
}

#[async_trait]
impl InstructionSource for ConfigInstructionSource {
    async fn instruction(&self) -> Option<String> {
        self.instruction.clone()
    }
}

// ---------------------------------------------------------------------------
// TextRewriter
// ---------------------------------------------------------------------------

/// Hotword pass plus optional LLM rewrite, with unconditional degrade.
pub struct TextRewriter {
    hotwords: HotwordCorrector,
    instructions: Arc<dyn InstructionSource>,
    backend: Option<Arc<dyn PromptRewriting>>,
}

impl TextRewriter {
    pub fn new(
        hotwords: HotwordCorrector,
        instructions: Arc<dyn InstructionSource>,
        backend: Option<Arc<dyn PromptRewriting>>,
    ) -> Self {
        Self {
            hotwords,
            instructions,
            backend,
        }
    }

    /// Wire the production rewriter from configuration. Without an API key
    /// there is no LLM backend and only the hotword pass runs.
    pub fn from_config(config: &RewriteConfig) -> Self {
        let backend: Option<Arc<dyn PromptRewriting>> = config
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .map(|_| Arc::new(ChatRewriter::new(config)) as Arc<dyn PromptRewriting>);

        Self::new(
            HotwordCorrector::new(config.hotwords.clone()),
            Arc::new(ConfigInstructionSource::new(config)),
            backend,
        )
    }

    /// Post-process one raw transcript. Infallible: the worst case is the
    /// hotword-corrected input.
    pub async fn process(&self, raw: &str) -> String {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return String::new();
        }

        let corrected = self.hotwords.apply(trimmed);

        let Some(backend) = &self.backend else {
            return corrected;
        };
        let instruction = match self.instructions.instruction().await {
            Some(instruction) if !instruction.trim().is_empty() => instruction,
            _ => return corrected,
        };

        match backend.rewrite(&corrected, &instruction).await {
            Ok(rewritten) if !rewritten.trim().is_empty() => rewritten,
            Ok(_) => {
                log::warn!("rewrite returned blank text, keeping the corrected transcript");
                corrected
            }
            Err(err) => {
                log::warn!("rewrite failed ({err}), keeping the corrected transcript");
                corrected
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HotwordRule;
    use std::sync::Mutex;

    struct FixedInstruction(Option<String>);

    #[async_trait]
    impl InstructionSource for FixedInstruction {
        async fn instruction(&self) -> Option<String> {
            self.0.clone()
        }
    }

    /// Records what it was asked to rewrite and answers from a script.
    struct ScriptedBackend {
        result: Result<String, ()>,
        seen: Mutex<Vec<String>>,
    }

    impl ScriptedBackend {
        fn ok(text: &str) -> Self {
            Self {
                result: Ok(text.into()),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                result: Err(()),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PromptRewriting for ScriptedBackend {
        async fn rewrite(&self, text: &str, _instruction: &str) -> Result<String, RewriteError> {
            self.seen.lock().unwrap().push(text.to_owned());
            match &self.result {
                Ok(text) => Ok(text.clone()),
                Err(()) => Err(RewriteError::Request("connection refused".into())),
            }
        }
    }

    fn rewriter(
        rules: Vec<HotwordRule>,
        instruction: Option<&str>,
        backend: Option<Arc<ScriptedBackend>>,
    ) -> TextRewriter {
        TextRewriter::new(
            HotwordCorrector::new(rules),
            Arc::new(FixedInstruction(instruction.map(str::to_owned))),
            backend.map(|b| b as Arc<dyn PromptRewriting>),
        )
    }

    #[tokio::test]
    async fn empty_input_yields_empty_output() {
        let r = rewriter(Vec::new(), Some("fix"), Some(Arc::new(ScriptedBackend::ok("x"))));
        assert_eq!(r.process("   \n ").await, "");
    }

    #[tokio::test]
    async fn successful_rewrite_replaces_the_text() {
        let r = rewriter(Vec::new(), Some("fix"), Some(Arc::new(ScriptedBackend::ok("Hello."))));
        assert_eq!(r.process("hello").await, "Hello.");
    }

    #[tokio::test]
    async fn backend_failure_degrades_to_corrected_text() {
        let backend = Arc::new(ScriptedBackend::failing());
        let rules = vec![HotwordRule {
            pattern: "vox dee".into(),
            replacement: "voxd".into(),
        }];
        let r = rewriter(rules, Some("fix"), Some(backend));
        assert_eq!(r.process("use vox dee").await, "use voxd");
    }

    #[tokio::test]
    async fn blank_rewrite_result_degrades_to_corrected_text() {
        let r = rewriter(Vec::new(), Some("fix"), Some(Arc::new(ScriptedBackend::ok("  "))));
        assert_eq!(r.process("keep me").await, "keep me");
    }

    #[tokio::test]
    async fn missing_instruction_skips_the_llm_pass() {
        let backend = Arc::new(ScriptedBackend::ok("SHOULD NOT APPEAR"));
        let r = rewriter(Vec::new(), None, Some(Arc::clone(&backend)));
        assert_eq!(r.process("raw text").await, "raw text");
        assert!(backend.seen.lock().unwrap().is_empty());

        let backend = Arc::new(ScriptedBackend::ok("SHOULD NOT APPEAR"));
        let r = rewriter(Vec::new(), Some("  "), Some(Arc::clone(&backend)));
        assert_eq!(r.process("raw text").await, "raw text");
        assert!(backend.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn no_backend_applies_hotwords_only() {
        let rules = vec![HotwordRule {
            pattern: "teh".into(),
            replacement: "the".into(),
        }];
        let r = rewriter(rules, Some("fix"), None);
        assert_eq!(r.process("teh text").await, "the text");
    }

    #[tokio::test]
    async fn hotwords_apply_before_the_backend_sees_the_text() {
        let backend = Arc::new(ScriptedBackend::ok("done"));
        let rules = vec![HotwordRule {
            pattern: "sse".into(),
            replacement: "SSE".into(),
        }];
        let r = rewriter(rules, Some("fix"), Some(Arc::clone(&backend)));
        r.process("the sse parser").await;
        assert_eq!(backend.seen.lock().unwrap()[0], "the SSE parser");
    }

    #[tokio::test]
    async fn from_config_without_api_key_has_no_backend() {
        let r = TextRewriter::from_config(&RewriteConfig::default());
        // Degrades to passthrough without attempting any request.
        assert_eq!(r.process("as dictated").await, "as dictated");
    }
}
