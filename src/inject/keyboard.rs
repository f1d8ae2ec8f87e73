//! Synthetic keyboard input via `enigo`.

use enigo::{Direction, Enigo, Key, Keyboard, Settings};
use thiserror::Error;

/// Failures of the synthetic-input layer.
#[derive(Debug, Error)]
pub enum InjectError {
    #[error("keyboard injection failed: {0}")]
    Keyboard(String),

    #[error("clipboard access failed: {0}")]
    Clipboard(String),
}

/// Type `text` directly into the focused element.
pub fn type_text(text: &str) -> Result<(), InjectError> {
    let mut enigo =
        Enigo::new(&Settings::default()).map_err(|e| InjectError::Keyboard(e.to_string()))?;
    enigo
        .text(text)
        .map_err(|e| InjectError::Keyboard(e.to_string()))
}

/// Synthesize the platform paste accelerator (⌘V on macOS, Ctrl+V elsewhere).
pub fn send_paste_shortcut() -> Result<(), InjectError> {
    let mut enigo =
        Enigo::new(&Settings::default()).map_err(|e| InjectError::Keyboard(e.to_string()))?;

    #[cfg(target_os = "macos")]
    let modifier = Key::Meta;
    #[cfg(not(target_os = "macos"))]
    let modifier = Key::Control;

    let err = |e: enigo::InputError| InjectError::Keyboard(e.to_string());
    enigo.key(modifier, Direction::Press).map_err(err)?;
    enigo.key(Key::Unicode('v'), Direction::Click).map_err(err)?;
    enigo.key(modifier, Direction::Release).map_err(err)?;
    Ok(())
}
