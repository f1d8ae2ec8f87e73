//! Best-effort text injection into the focused application.
//!
//! Primary path: direct synthetic typing ([`keyboard::type_text`]). Fallback
//! path: clipboard paste with snapshot and restore ([`clipboard`]). Injection
//! reports `true` once text entry was dispatched; it cannot observe whether
//! the focused application actually accepted it.
//!
//! Calls never interleave: the session controller runs one session at a time
//! and each `inject` call completes its save/paste/restore sequence before
//! returning.

pub mod clipboard;
pub mod keyboard;

pub use keyboard::InjectError;

use std::time::Duration;

use crate::config::InjectConfig;

// ---------------------------------------------------------------------------
// Injecting
// ---------------------------------------------------------------------------

/// Text delivery into the focused element. Blocking; the controller calls it
/// through `spawn_blocking`.
pub trait Injecting: Send + Sync {
    /// Deliver `text`. Empty or whitespace-only input is a no-op success.
    fn inject(&self, text: &str) -> bool;
}

// ---------------------------------------------------------------------------
// TextInjector
// ---------------------------------------------------------------------------

/// Production injector: direct typing first, clipboard paste as fallback.
pub struct TextInjector {
    flush_delay: Duration,
    restore_delay: Duration,
}

impl TextInjector {
    pub fn new(config: &InjectConfig) -> Self {
        Self {
            flush_delay: Duration::from_millis(config.flush_delay_ms),
            restore_delay: Duration::from_millis(config.restore_delay_ms),
        }
    }
}

impl Injecting for TextInjector {
    fn inject(&self, text: &str) -> bool {
        let Some(text) = prepared(text) else {
            log::debug!("skipping injection of empty text");
            return true;
        };

        match keyboard::type_text(text) {
            Ok(()) => {
                log::info!("injected {} chars via direct typing", text.chars().count());
                true
            }
            Err(err) => {
                log::warn!("direct typing failed ({err}), falling back to clipboard paste");
                match clipboard::paste_via_clipboard(text, self.flush_delay, self.restore_delay) {
                    Ok(()) => true,
                    Err(err) => {
                        log::error!("clipboard fallback failed: {err}");
                        false
                    }
                }
            }
        }
    }
}

/// Surrounding whitespace is never injected; blank input means nothing to do.
fn prepared(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_is_a_noop_success() {
        let injector = TextInjector::new(&InjectConfig::default());
        assert!(injector.inject(""));
        assert!(injector.inject("   \n\t "));
    }

    #[test]
    fn dispatched_text_is_trimmed() {
        assert_eq!(prepared("  hello world \n"), Some("hello world"));
        // Inner whitespace is content, only the edges go.
        assert_eq!(prepared("inner  spaces"), Some("inner  spaces"));
        assert_eq!(prepared(" \t "), None);
    }

    #[test]
    fn delays_come_from_configuration() {
        let injector = TextInjector::new(&InjectConfig {
            flush_delay_ms: 10,
            restore_delay_ms: 20,
        });
        assert_eq!(injector.flush_delay, Duration::from_millis(10));
        assert_eq!(injector.restore_delay, Duration::from_millis(20));
    }
}
