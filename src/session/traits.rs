//! Presentation surface consumed by the session controller.
//!
//! Strictly one-way: the controller pushes state changes and the live level
//! stream out; nothing is ever queried back.

use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// Presenting
// ---------------------------------------------------------------------------

/// One-way presentation consumer (overlay, tray icon, log line).
pub trait Presenting: Send + Sync {
    /// A session started; make the surface visible.
    fn show(&self);

    /// The session is over; hide the surface.
    fn hide(&self);

    /// Short human-readable status ("listening", "transcribing", failure
    /// reasons).
    fn update_status(&self, status: &str);

    /// Hand over the loudness stream of the current recording. Must be
    /// called from within a tokio runtime.
    fn set_level_stream(&self, levels: mpsc::Receiver<f32>);
}

// ---------------------------------------------------------------------------
// LogPresenter
// ---------------------------------------------------------------------------

/// Presentation via the log. The level stream is drained at trace level so
/// the channel never backs up.
pub struct LogPresenter;

impl Presenting for LogPresenter {
    fn show(&self) {
        log::info!("session surface: show");
    }

    fn hide(&self) {
        log::info!("session surface: hide");
    }

    fn update_status(&self, status: &str) {
        log::info!("session status: {status}");
    }

    fn set_level_stream(&self, mut levels: mpsc::Receiver<f32>) {
        tokio::spawn(async move {
            while let Some(level) = levels.recv().await {
                log::trace!("input level: {level:.3}");
            }
        });
    }
}

// ---------------------------------------------------------------------------
// NullPresenter
// ---------------------------------------------------------------------------

/// Discards everything. Useful for wiring the controller without any UI.
pub struct NullPresenter;

impl Presenting for NullPresenter {
    fn show(&self) {}

    fn hide(&self) {}

    fn update_status(&self, _status: &str) {}

    fn set_level_stream(&self, levels: mpsc::Receiver<f32>) {
        // Still drain, otherwise the pipeline's sender would see a full
        // queue and start dropping levels it could have delivered.
        let mut levels = levels;
        tokio::spawn(async move { while levels.recv().await.is_some() {} });
    }
}
