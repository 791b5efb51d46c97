//! Trigger surfaces: the events that start one dispatch cycle.
//!
//! Two surfaces exist: the mic button in the window ([`crate::app`]) and a
//! global push-to-talk key watched by [`HotkeyListener`] on a dedicated OS
//! thread.  Both go through the shared [`TriggerGate`] so that at most one
//! [`TriggerEvent`] is in flight per cycle.
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use tokio::sync::mpsc;
//! use voice_assistant::trigger::{parse_key, HotkeyListener, TriggerGate};
//!
//! let gate = Arc::new(TriggerGate::new());
//! let (tx, mut rx) = mpsc::channel(4);
//! let key = parse_key("F9").expect("unknown key");
//! let _listener = HotkeyListener::start(key, Arc::clone(&gate), tx);
//! ```

pub mod gate;
pub mod listener;

pub use gate::TriggerGate;
pub use listener::HotkeyListener;

// ---------------------------------------------------------------------------
// TriggerEvent
// ---------------------------------------------------------------------------

/// A user gesture that asks for one classify-and-dispatch cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerEvent {
    /// The mic button in the window was clicked.
    MicButton,
    /// The global push-to-talk key was pressed.
    Hotkey,
}

// ---------------------------------------------------------------------------
// parse_key
// ---------------------------------------------------------------------------

/// Parse a key name from the config into an [`rdev::Key`].
///
/// Accepts F1 to F12, a handful of named keys and single ASCII letters, all
/// case-insensitively.  Returns `None` for anything else.
///
/// ```
/// use voice_assistant::trigger::parse_key;
///
/// assert_eq!(parse_key("F9"), Some(rdev::Key::F9));
/// assert_eq!(parse_key("pause"), Some(rdev::Key::Pause));
/// assert_eq!(parse_key("ctrl+v"), None);
/// ```
pub fn parse_key(name: &str) -> Option<rdev::Key> {
    use rdev::Key;

    let key = match name.trim().to_ascii_uppercase().as_str() {
        "F1" => Key::F1,
        "F2" => Key::F2,
        "F3" => Key::F3,
        "F4" => Key::F4,
        "F5" => Key::F5,
        "F6" => Key::F6,
        "F7" => Key::F7,
        "F8" => Key::F8,
        "F9" => Key::F9,
        "F10" => Key::F10,
        "F11" => Key::F11,
        "F12" => Key::F12,
        "ESC" | "ESCAPE" => Key::Escape,
        "SPACE" => Key::Space,
        "INSERT" => Key::Insert,
        "HOME" => Key::Home,
        "END" => Key::End,
        "PAUSE" => Key::Pause,
        "SCROLLLOCK" => Key::ScrollLock,
        "PRINTSCREEN" => Key::PrintScreen,
        "A" => Key::KeyA,
        "B" => Key::KeyB,
        "C" => Key::KeyC,
        "D" => Key::KeyD,
        "E" => Key::KeyE,
        "F" => Key::KeyF,
        "G" => Key::KeyG,
        "H" => Key::KeyH,
        "I" => Key::KeyI,
        "J" => Key::KeyJ,
        "K" => Key::KeyK,
        "L" => Key::KeyL,
        "M" => Key::KeyM,
        "N" => Key::KeyN,
        "O" => Key::KeyO,
        "P" => Key::KeyP,
        "Q" => Key::KeyQ,
        "R" => Key::KeyR,
        "S" => Key::KeyS,
        "T" => Key::KeyT,
        "U" => Key::KeyU,
        "V" => Key::KeyV,
        "W" => Key::KeyW,
        "X" => Key::KeyX,
        "Y" => Key::KeyY,
        "Z" => Key::KeyZ,
        _ => return None,
    };
    Some(key)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_function_keys() {
        assert_eq!(parse_key("F1"), Some(rdev::Key::F1));
        assert_eq!(parse_key("f12"), Some(rdev::Key::F12));
    }

    #[test]
    fn parse_named_and_letter_keys() {
        assert_eq!(parse_key("Esc"), Some(rdev::Key::Escape));
        assert_eq!(parse_key(" space "), Some(rdev::Key::Space));
        assert_eq!(parse_key("m"), Some(rdev::Key::KeyM));
    }

    #[test]
    fn parse_unknown_key_returns_none() {
        assert_eq!(parse_key(""), None);
        assert_eq!(parse_key("F13"), None);
        assert_eq!(parse_key("Ctrl+Shift+T"), None);
    }
}
