//! Clipboard-paste fallback with snapshot and restore.
//!
//! Sequence: snapshot the current clipboard text, put the target text on the
//! clipboard, give the clipboard manager a moment to flush, synthesize the
//! paste accelerator, wait for the focused application to consume the paste,
//! then restore the snapshot. The restore happens exactly once whether or not
//! the paste shortcut could be dispatched.

use std::thread;
use std::time::Duration;

use arboard::Clipboard;

use super::keyboard::{self, InjectError};

/// Paste `text` into the focused element via the clipboard.
///
/// `Ok` means the paste event was dispatched; what the focused application
/// does with it is not observable. A clipboard that held no text (empty, or
/// an image) is left holding the pasted text, since there is nothing to
/// restore.
pub fn paste_via_clipboard(
    text: &str,
    flush_delay: Duration,
    restore_delay: Duration,
) -> Result<(), InjectError> {
    let mut clipboard =
        Clipboard::new().map_err(|e| InjectError::Clipboard(e.to_string()))?;

    let snapshot = clipboard.get_text().ok();

    clipboard
        .set_text(text.to_owned())
        .map_err(|e| InjectError::Clipboard(e.to_string()))?;
    thread::sleep(flush_delay);

    let dispatched = keyboard::send_paste_shortcut();

    // Let the target application read the clipboard before it changes again.
    // The restore runs whether or not the paste could be dispatched.
    thread::sleep(restore_delay);

    if let Some(previous) = snapshot {
        if let Err(err) = clipboard.set_text(previous) {
            log::warn!("failed to restore clipboard snapshot: {err}");
        }
    }

    dispatched
}
