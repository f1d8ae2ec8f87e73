//! Session orchestration: the finite-state controller and the collaborator
//! interfaces it drives (presentation surface, history sink).

pub mod controller;
pub mod history;
pub mod traits;

pub use controller::SessionController;
pub use history::{FileHistorySink, HistoryEntry, HistorySink};
pub use traits::{LogPresenter, NullPresenter, Presenting};

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Lifecycle of one dictation session. Exactly one instance lives behind the
/// controller; collaborators only ever observe it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for a trigger.
    Idle,
    /// Microphone capture in progress.
    Recording,
    /// Audio uploaded, waiting for text.
    Transcribing,
    /// Transcript post-processing in progress.
    Rewriting,
    /// Delivering the final text to the focused application.
    Injecting,
    /// Something went wrong; auto-reverts to `Idle` after a short delay.
    Failed(String),
}

impl Default for SessionState {
    fn default() -> Self {
        Self::Idle
    }
}
