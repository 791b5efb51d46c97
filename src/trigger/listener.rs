//! Dedicated OS-thread push-to-talk listener using `rdev::listen`.
//!
//! `rdev::listen` blocks forever, so it lives on its own thread.  Each key
//! press is offered to the [`TriggerGate`]; only a press that arms a new
//! cycle is forwarded.  Auto-repeat presses while the key is held, and
//! presses during a running cycle, are dropped here.
//!
//! Dropping the [`HotkeyListener`] sets a stop flag.  The thread itself stays
//! parked inside rdev until the process exits; rdev has no shutdown API.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use tokio::sync::mpsc;

use super::{TriggerEvent, TriggerGate};

/// Handle to a running hotkey listener thread.
pub struct HotkeyListener {
    stop: Arc<AtomicBool>,
    _thread: std::thread::JoinHandle<()>,
}

impl HotkeyListener {
    /// Spawn the listener thread watching `key`.
    ///
    /// `tx` is a tokio sender; the rdev callback uses `blocking_send`
    /// because it runs outside the runtime.
    ///
    /// # Panics
    ///
    /// Panics if the OS refuses to create the thread.
    pub fn start(key: rdev::Key, gate: Arc<TriggerGate>, tx: mpsc::Sender<TriggerEvent>) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_clone = Arc::clone(&stop);

        let thread = std::thread::Builder::new()
            .name("hotkey-listener".into())
            .spawn(move || {
                let result = rdev::listen(move |event| {
                    if stop_clone.load(Ordering::Relaxed) {
                        return;
                    }

                    if let rdev::EventType::KeyPress(k) = event.event_type {
                        if k != key {
                            return;
                        }
                        if gate.try_fire() {
                            if tx.blocking_send(TriggerEvent::Hotkey).is_err() {
                                log::warn!("hotkey-listener: router is gone, trigger lost");
                                gate.rearm();
                            }
                        } else {
                            log::debug!("hotkey-listener: busy, trigger dropped");
                        }
                    }
                });

                if let Err(e) = result {
                    log::error!("hotkey-listener: rdev::listen exited with error: {:?}", e);
                }
            })
            .expect("failed to spawn hotkey-listener thread");

        Self {
            stop,
            _thread: thread,
        }
    }
}

impl Drop for HotkeyListener {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}
