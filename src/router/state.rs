//! Dispatch-cycle state machine and the shared state the window reads.
//!
//! [`CyclePhase`] tracks where the single in-flight cycle is.  The router
//! advances it through [`advance`], which refuses illegal moves.
//!
//! [`AssistantState`] is what the mic window renders each frame; it lives
//! behind [`SharedState`] (`Arc<Mutex<…>>`).

use std::sync::{Arc, Mutex};

use super::classifier::Intent;
use super::dispatch::DispatchResult;

// ---------------------------------------------------------------------------
// CyclePhase
// ---------------------------------------------------------------------------

/// Phases of one dispatch cycle.
///
/// ```text
/// Idle ──trigger──▶ Listening ──text──▶ Classifying
///   ▲                  │                   ├──▶ Executing ──▶ Speaking? ──┐
///   │                  └─recognition err─▶ Speaking                     │
///   │                                      └──▶ ExecutingSequence ───────┤
///   └────────────────────────────────────────────────────────────────────┘
/// ```
///
/// `Idle → Classifying` is also legal for text that did not come from the
/// microphone.  Nothing re-enters `Classifying` without passing `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CyclePhase {
    /// Armed and waiting for a trigger.
    #[default]
    Idle,
    /// Capturing and transcribing an utterance.
    Listening,
    /// Mapping text to an intent.
    Classifying,
    /// Running a single-intent handler.
    Executing,
    /// Running the scripted presentation.
    ExecutingSequence,
    /// Rendering spoken feedback.
    Speaking,
}

impl CyclePhase {
    /// `true` whenever a cycle is in flight; trigger surfaces stay disabled.
    ///
    /// ```
    /// use voice_assistant::router::CyclePhase;
    ///
    /// assert!(!CyclePhase::Idle.is_busy());
    /// assert!(CyclePhase::Listening.is_busy());
    /// assert!(CyclePhase::ExecutingSequence.is_busy());
    /// ```
    pub fn is_busy(&self) -> bool {
        !matches!(self, CyclePhase::Idle)
    }

    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_advance_to(&self, next: CyclePhase) -> bool {
        use CyclePhase::*;
        matches!(
            (self, next),
            (Idle, Listening)
                | (Idle, Classifying)
                | (Listening, Classifying)
                | (Listening, Speaking)
                | (Listening, Idle)
                | (Classifying, Executing)
                | (Classifying, ExecutingSequence)
                | (Executing, Speaking)
                | (Executing, Idle)
                | (ExecutingSequence, Idle)
                | (Speaking, Idle)
        )
    }

    /// Short label for the window status line.
    pub fn label(&self) -> &'static str {
        match self {
            CyclePhase::Idle => "Idle",
            CyclePhase::Listening => "Listening",
            CyclePhase::Classifying => "Thinking",
            CyclePhase::Executing => "Working",
            CyclePhase::ExecutingSequence => "Presenting",
            CyclePhase::Speaking => "Speaking",
        }
    }
}

// ---------------------------------------------------------------------------
// AssistantState
// ---------------------------------------------------------------------------

/// Everything the window needs to render.
#[derive(Debug, Default)]
pub struct AssistantState {
    /// Current phase of the in-flight cycle.
    pub phase: CyclePhase,
    /// Phases entered since the cycle left `Idle`, ending with `Idle`.
    pub trace: Vec<CyclePhase>,
    /// Text recognised in the latest cycle.
    pub last_utterance: Option<String>,
    /// Intent chosen in the latest cycle.
    pub last_intent: Option<Intent>,
    /// Outcome of the latest cycle.
    pub last_result: Option<DispatchResult>,
}

/// Thread-safe handle to [`AssistantState`].  Do not hold the lock across
/// `.await` points.
pub type SharedState = Arc<Mutex<AssistantState>>;

/// Construct a [`SharedState`] in `Idle`.
pub fn new_shared_state() -> SharedState {
    Arc::new(Mutex::new(AssistantState::default()))
}

/// Move the cycle to `next`.
///
/// Leaving `Idle` starts a new cycle: the trace, utterance and intent of
/// the previous one are cleared.  `last_result` stays until the new cycle
/// produces its own.
///
/// Staying in the same phase is a no-op.  An illegal move is logged and
/// refused; the function then returns `false`.
pub fn advance(state: &SharedState, next: CyclePhase) -> bool {
    let mut st = state.lock().unwrap();
    if st.phase == next {
        return true;
    }
    if !st.phase.can_advance_to(next) {
        log::error!(
            "router: illegal transition {} -> {}",
            st.phase.label(),
            next.label()
        );
        return false;
    }
    if st.phase == CyclePhase::Idle {
        st.trace.clear();
        st.last_utterance = None;
        st.last_intent = None;
    }
    log::debug!("router: {} -> {}", st.phase.label(), next.label());
    st.phase = next;
    st.trace.push(next);
    true
}

/// Current phase.
pub fn phase(state: &SharedState) -> CyclePhase {
    state.lock().unwrap().phase
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use CyclePhase::*;

    #[test]
    fn only_idle_is_not_busy() {
        for p in [Listening, Classifying, Executing, ExecutingSequence, Speaking] {
            assert!(p.is_busy(), "{p:?}");
        }
        assert!(!Idle.is_busy());
    }

    #[test]
    fn default_phase_is_idle() {
        assert_eq!(CyclePhase::default(), Idle);
        assert_eq!(phase(&new_shared_state()), Idle);
    }

    #[test]
    fn full_voice_cycle_is_legal() {
        let state = new_shared_state();
        for p in [Listening, Classifying, Executing, Speaking, Idle] {
            assert!(advance(&state, p), "{p:?}");
        }
        assert_eq!(
            state.lock().unwrap().trace,
            vec![Listening, Classifying, Executing, Speaking, Idle]
        );
    }

    #[test]
    fn classifying_cannot_be_reentered_without_idle() {
        let state = new_shared_state();
        advance(&state, Classifying);
        advance(&state, Executing);
        assert!(!advance(&state, Classifying));
        assert_eq!(phase(&state), Executing);
    }

    #[test]
    fn sequence_cannot_detour_through_executing() {
        assert!(!ExecutingSequence.can_advance_to(Executing));
        assert!(!ExecutingSequence.can_advance_to(Speaking));
        assert!(ExecutingSequence.can_advance_to(Idle));
    }

    #[test]
    fn idle_cannot_jump_to_execution() {
        assert!(!Idle.can_advance_to(Executing));
        assert!(!Idle.can_advance_to(ExecutingSequence));
        assert!(!Idle.can_advance_to(Speaking));
    }

    #[test]
    fn same_phase_is_noop() {
        let state = new_shared_state();
        advance(&state, Classifying);
        advance(&state, Executing);
        assert!(advance(&state, Executing));
        assert_eq!(state.lock().unwrap().trace, vec![Classifying, Executing]);
    }

    #[test]
    fn trace_resets_when_leaving_idle() {
        let state = new_shared_state();
        for p in [Classifying, Executing, Idle, Listening] {
            advance(&state, p);
        }
        assert_eq!(state.lock().unwrap().trace, vec![Listening]);
    }

    #[test]
    fn leaving_idle_forgets_previous_command() {
        let state = new_shared_state();
        {
            let mut st = state.lock().unwrap();
            st.last_utterance = Some("open calculator".into());
            st.last_intent = Some(Intent::OpenApplication);
        }
        advance(&state, Listening);

        let st = state.lock().unwrap();
        assert!(st.last_utterance.is_none());
        assert!(st.last_intent.is_none());
    }

    #[test]
    fn shared_state_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SharedState>();
    }
}
