//! One-shot arming flag shared by every trigger surface.
//!
//! A surface calls [`TriggerGate::try_fire`] before emitting a
//! [`TriggerEvent`](super::TriggerEvent).  Only the first caller after
//! [`TriggerGate::rearm`] wins; everybody else is told the assistant is
//! busy.  The router re-arms the gate once a dispatch cycle is back in
//! `Idle`.

use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug)]
pub struct TriggerGate {
    armed: AtomicBool,
}

impl TriggerGate {
    /// A gate that accepts the first trigger.
    pub fn new() -> Self {
        Self {
            armed: AtomicBool::new(true),
        }
    }

    /// Disarm the gate if it is armed.  Returns `true` when this call won.
    pub fn try_fire(&self) -> bool {
        self.armed
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Accept the next trigger.
    pub fn rearm(&self) {
        self.armed.store(true, Ordering::Release);
    }

    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::Acquire)
    }
}

impl Default for TriggerGate {
    fn default() -> Self {
        Self::new()
    }
}
