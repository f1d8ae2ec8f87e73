//! Dedicated OS-thread key listener using `rdev::listen`.
//!
//! `rdev::listen` is a blocking call that must live on its own OS thread; it
//! has no graceful shutdown API. [`TriggerListener`] owns that thread and a
//! stop flag: dropping the handle sets the flag so the callback silently
//! discards further events, while the thread itself stays parked inside the
//! rdev event loop until the process exits.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use tokio::sync::mpsc;

use super::TriggerEvent;

// ---------------------------------------------------------------------------
// TriggerListener
// ---------------------------------------------------------------------------

/// Handle to a running trigger listener thread. Drop it to stop forwarding
/// events.
pub struct TriggerListener {
    stop: Arc<AtomicBool>,
    /// Never joined: `rdev::listen` does not return.
    _thread: std::thread::JoinHandle<()>,
}

impl TriggerListener {
    /// Spawn the listener thread.
    ///
    /// Holding `push_to_talk` down brackets a session: the first key-down
    /// sends [`TriggerEvent::SessionBegin`], the key-up sends
    /// [`TriggerEvent::SessionEnd`]. OS key auto-repeat delivers extra
    /// key-down events while a key is held; those are suppressed by tracking
    /// the down state of each key. Pressing `toggle` sends
    /// [`TriggerEvent::ToggleRequested`] once per physical press.
    ///
    /// Events go out with `blocking_send`, which is the correct sender to use
    /// from a non-async thread.
    ///
    /// # Panics
    ///
    /// Panics if the OS refuses to create the thread (extremely unlikely).
    pub fn start(
        push_to_talk: rdev::Key,
        toggle: rdev::Key,
        tx: mpsc::Sender<TriggerEvent>,
    ) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_clone = Arc::clone(&stop);

        let thread = std::thread::Builder::new()
            .name("trigger-listener".into())
            .spawn(move || {
                // Key-down state lives in atomics so the rdev callback does
                // not need to be FnMut.
                let ptt_down = AtomicBool::new(false);
                let toggle_down = AtomicBool::new(false);

                let result = rdev::listen(move |event| {
                    if stop_clone.load(Ordering::Relaxed) {
                        return;
                    }

                    match event.event_type {
                        rdev::EventType::KeyPress(k) if k == push_to_talk => {
                            if !ptt_down.swap(true, Ordering::Relaxed) {
                                let _ = tx.blocking_send(TriggerEvent::SessionBegin);
                            }
                        }
                        rdev::EventType::KeyRelease(k) if k == push_to_talk => {
                            if ptt_down.swap(false, Ordering::Relaxed) {
                                let _ = tx.blocking_send(TriggerEvent::SessionEnd);
                            }
                        }
                        rdev::EventType::KeyPress(k) if k == toggle => {
                            if !toggle_down.swap(true, Ordering::Relaxed) {
                                let _ = tx.blocking_send(TriggerEvent::ToggleRequested);
                            }
                        }
                        rdev::EventType::KeyRelease(k) if k == toggle => {
                            toggle_down.store(false, Ordering::Relaxed);
                        }
                        _ => {}
                    }
                });

                if let Err(e) = result {
                    log::error!("trigger-listener: rdev::listen exited with error: {e:?}");
                }
            })
            .expect("failed to spawn trigger-listener thread");

        Self {
            stop,
            _thread: thread,
        }
    }
}

impl Drop for TriggerListener {
    /// Set the stop flag so the rdev callback stops forwarding events.
    /// Idempotent; the OS thread itself stays blocked inside `rdev::listen`.
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}
