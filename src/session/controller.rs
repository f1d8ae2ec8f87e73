//! The finite-state session controller.
//!
//! One perpetual loop consumes trigger events and drives exactly one session
//! pipeline at a time:
//!
//! ```text
//! Idle → Recording → Transcribing → Rewriting → Injecting → Idle
//!          │              │                         │
//!          └──────────────┴───── Failed(reason) ────┘
//! ```
//!
//! `Failed` auto-reverts to `Idle` after a fixed delay, re-checking that the
//! state is still `Failed` so the revert can never clobber a session that has
//! already moved on. Triggers that do not match the current state are ignored
//! rather than queued.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::mpsc;

use crate::audio::{AudioCapturing, WavFormat};
use crate::inject::Injecting;
use crate::rewrite::TextRewriter;
use crate::stt::SttProvider;
use crate::trigger::TriggerEvent;

use super::history::HistorySink;
use super::traits::Presenting;
use super::SessionState;

/// Captures shorter than this many encoded bytes are discarded without
/// contacting the transcription service.
const MIN_CAPTURE_BYTES: usize = 1000;

/// How long a failure stays visible before auto-recovery to `Idle`.
const RECOVERY_DELAY: Duration = Duration::from_secs(2);

// ---------------------------------------------------------------------------
// SessionController
// ---------------------------------------------------------------------------

/// Owns the session state machine and all error/recovery policy.
pub struct SessionController {
    audio: Arc<dyn AudioCapturing>,
    stt: Arc<dyn SttProvider>,
    rewriter: Arc<TextRewriter>,
    injector: Arc<dyn Injecting>,
    presenter: Arc<dyn Presenting>,
    history: Option<Arc<dyn HistorySink>>,
    state: Arc<Mutex<SessionState>>,
    /// Request incremental deltas from streaming-capable backends.
    stt_streaming: bool,
    custom_words: Vec<String>,
    recovery_delay: Duration,
}

impl SessionController {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        audio: Arc<dyn AudioCapturing>,
        stt: Arc<dyn SttProvider>,
        rewriter: Arc<TextRewriter>,
        injector: Arc<dyn Injecting>,
        presenter: Arc<dyn Presenting>,
        history: Option<Arc<dyn HistorySink>>,
        stt_streaming: bool,
        custom_words: Vec<String>,
    ) -> Self {
        Self {
            audio,
            stt,
            rewriter,
            injector,
            presenter,
            history,
            state: Arc::new(Mutex::new(SessionState::Idle)),
            stt_streaming,
            custom_words,
            recovery_delay: RECOVERY_DELAY,
        }
    }

    /// Override the failure auto-recovery delay (tests use a short one).
    pub fn with_recovery_delay(mut self, delay: Duration) -> Self {
        self.recovery_delay = delay;
        self
    }

    /// Current state snapshot, for observation only.
    pub fn state(&self) -> SessionState {
        self.lock_state().clone()
    }

    /// Perpetual single-flight loop: one event handled to completion at a
    /// time. Returns when the trigger source closes.
    pub async fn run(self: Arc<Self>, mut triggers: mpsc::Receiver<TriggerEvent>) {
        log::info!("session controller running");
        while let Some(event) = triggers.recv().await {
            self.handle_event(event).await;
        }
        log::info!("trigger source closed, session controller stopping");
    }

    /// Dispatch one trigger event against the current state.
    pub async fn handle_event(&self, event: TriggerEvent) {
        match event {
            TriggerEvent::SessionBegin => self.begin().await,
            TriggerEvent::SessionEnd => self.finish().await,
            TriggerEvent::ToggleRequested => match self.state() {
                SessionState::Idle => self.begin().await,
                SessionState::Recording => self.finish().await,
                other => {
                    log::debug!("toggle ignored in state {other:?}");
                }
            },
        }
    }

    // -- pipeline stages ----------------------------------------------------

    /// Idle → Recording.
    async fn begin(&self) {
        {
            let mut state = self.lock_state();
            if *state != SessionState::Idle {
                log::debug!("begin ignored in state {state:?}");
                return;
            }
            *state = SessionState::Recording;
        }

        self.presenter.show();
        self.presenter.update_status("listening");

        match self.audio.start_capture().await {
            Ok(()) => {
                if let Some(levels) = self.audio.take_level_stream().await {
                    self.presenter.set_level_stream(levels);
                }
            }
            Err(err) => self.fail(err.to_string()).await,
        }
    }

    /// Recording → Transcribing → Rewriting → Injecting → Idle.
    async fn finish(&self) {
        {
            let mut state = self.lock_state();
            if *state != SessionState::Recording {
                log::debug!("end ignored in state {state:?}");
                return;
            }
            *state = SessionState::Transcribing;
        }

        let wav = match self.audio.stop_capture().await {
            Ok(wav) => wav,
            Err(err) => {
                self.fail(err.to_string()).await;
                return;
            }
        };

        if wav.len() < MIN_CAPTURE_BYTES {
            log::info!("capture too short ({} bytes), discarding", wav.len());
            self.settle_idle();
            return;
        }

        let duration_secs = WavFormat::parse(&wav)
            .map(|fmt| fmt.data_len as f64 / f64::from(fmt.byte_rate.max(1)))
            .unwrap_or(0.0);

        self.presenter.update_status("transcribing");
        let raw = match self
            .stt
            .transcribe(wav, self.stt_streaming, &self.custom_words)
            .await
        {
            Ok(text) => text,
            Err(err) => {
                self.fail(err.to_string()).await;
                return;
            }
        };

        self.set_state(SessionState::Rewriting);
        self.presenter.update_status("rewriting");
        let final_text = self.rewriter.process(&raw).await;

        if final_text.trim().is_empty() {
            log::info!("final text is empty, skipping injection");
            self.settle_idle();
            return;
        }

        self.set_state(SessionState::Injecting);
        self.presenter.update_status("injecting");

        let injector = Arc::clone(&self.injector);
        let text = final_text.clone();
        let injected = tokio::task::spawn_blocking(move || injector.inject(&text))
            .await
            .unwrap_or(false);

        if !injected {
            self.fail("injection failed".into()).await;
            return;
        }

        if let Some(history) = &self.history {
            history.accept(&raw, &final_text, duration_secs).await;
        }
        self.settle_idle();
    }

    // -- state plumbing -----------------------------------------------------

    /// Enter `Failed(reason)`, surface it, and schedule the auto-recovery.
    /// The recovery task re-checks that the state is still `Failed` before
    /// reverting.
    async fn fail(&self, reason: String) {
        log::error!("session failed: {reason}");
        self.presenter.update_status(&reason);
        self.set_state(SessionState::Failed(reason));

        let state = Arc::clone(&self.state);
        let presenter = Arc::clone(&self.presenter);
        let delay = self.recovery_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut state = state.lock().unwrap_or_else(|p| p.into_inner());
            if matches!(*state, SessionState::Failed(_)) {
                *state = SessionState::Idle;
                presenter.hide();
                log::info!("recovered from failure, back to idle");
            }
        });
    }

    /// End of a session (successful or discarded): back to `Idle`.
    fn settle_idle(&self) {
        self.set_state(SessionState::Idle);
        self.presenter.hide();
    }

    fn set_state(&self, next: SessionState) {
        *self.lock_state() = next;
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
