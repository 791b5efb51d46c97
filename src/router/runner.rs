//! Trigger loop: turns trigger events into listen → classify → dispatch
//! cycles.
//!
//! [`TriggerLoop`] receives [`TriggerEvent`]s from the mic button and the
//! hotkey thread over a `tokio::sync::mpsc` channel and runs exactly one
//! cycle per accepted event.
//!
//! # Cycle flow
//!
//! ```text
//! TriggerEvent
//!   └─▶ spawn_blocking(speech.listen)                  [Listening]
//!         ├─ Ok(text)  → engine.handle_utterance(text)  [Classifying → … → Idle]
//!         └─ Err / ""  → speak recognition apology      [Speaking → Idle]
//!   └─▶ drain triggers queued during the cycle (logged, dropped)
//!   └─▶ re-arm the trigger gate
//! ```

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::speech::SpeechError;
use crate::trigger::TriggerEvent;

use super::dispatch::{DispatchEngine, DispatchResult};
use super::state::{advance, CyclePhase};

/// Serial consumer of trigger events.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use voice_assistant::router::{DispatchEngine, TriggerLoop};
///
/// # async fn example(engine: Arc<DispatchEngine>) {
/// let (trigger_tx, trigger_rx) = tokio::sync::mpsc::channel(8);
/// # drop(trigger_tx);
/// TriggerLoop::new(engine).run(trigger_rx).await;
/// # }
/// ```
pub struct TriggerLoop {
    engine: Arc<DispatchEngine>,
}

impl TriggerLoop {
    pub fn new(engine: Arc<DispatchEngine>) -> Self {
        Self { engine }
    }

    /// Run until every sender of `trigger_rx` has been dropped.
    pub async fn run(self, mut trigger_rx: mpsc::Receiver<TriggerEvent>) {
        while let Some(event) = trigger_rx.recv().await {
            log::info!("router: {event:?} trigger accepted");
            let result = self.run_cycle().await;
            log::debug!("router: cycle finished: {result:?}");

            while let Ok(dropped) = trigger_rx.try_recv() {
                log::info!("router: {dropped:?} trigger arrived mid-cycle, dropped");
            }
            self.engine.session().rearm_trigger();
        }

        log::info!("router: trigger channel closed, loop shutting down");
    }

    /// Listen for one utterance and dispatch it.
    pub async fn run_cycle(&self) -> DispatchResult {
        advance(self.engine.state(), CyclePhase::Listening);

        match self.engine.listen().await {
            Ok(text) if !text.trim().is_empty() => {
                log::info!("router: heard {:?}", text.trim());
                self.engine.handle_utterance(text.trim()).await
            }
            Ok(_) => {
                let error = SpeechError::Recognition("empty transcript".into());
                self.engine.recognition_failed(&error).await
            }
            Err(e) => self.engine.recognition_failed(&e).await,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::dispatch::{ErrorKind, RECOGNITION_FAILURE_MESSAGE};
    use crate::router::state::phase;
    use crate::router::testing::{Event, Harness};

    fn trigger_loop(h: &Harness) -> TriggerLoop {
        TriggerLoop::new(Arc::clone(&h.engine))
    }

    #[tokio::test]
    async fn heard_command_is_dispatched() {
        let h = Harness::builder().hearing(Ok("open calculator")).build();
        let result = trigger_loop(&h).run_cycle().await;

        assert!(result.succeeded);
        assert_eq!(
            h.events(),
            vec![
                Event::Listen,
                Event::OpenApp {
                    name: "calculator".into(),
                    fuzzy: true
                },
                Event::Speak("Opening calculator".into()),
            ]
        );
        assert_eq!(
            h.state.lock().unwrap().trace,
            vec![
                CyclePhase::Listening,
                CyclePhase::Classifying,
                CyclePhase::Executing,
                CyclePhase::Speaking,
                CyclePhase::Idle
            ]
        );
    }

    #[tokio::test]
    async fn recognition_failure_skips_classification() {
        let h = Harness::builder()
            .hearing(Err(SpeechError::Recognition("mumble".into())))
            .build();
        let result = trigger_loop(&h).run_cycle().await;

        assert_eq!(result.error_kind, Some(ErrorKind::RecognitionFailure));
        assert_eq!(
            h.events(),
            vec![
                Event::Listen,
                Event::Speak(RECOGNITION_FAILURE_MESSAGE.into())
            ]
        );
        let st = h.state.lock().unwrap();
        assert_eq!(
            st.trace,
            vec![CyclePhase::Listening, CyclePhase::Speaking, CyclePhase::Idle]
        );
        assert!(st.last_intent.is_none());
        assert_eq!(st.last_result.as_ref(), Some(&result));
    }

    #[tokio::test]
    async fn failed_cycle_does_not_show_previous_command() {
        let h = Harness::builder()
            .hearing(Ok("open calculator"))
            .hearing(Err(SpeechError::Recognition("mumble".into())))
            .build();
        let runner = trigger_loop(&h);

        assert!(runner.run_cycle().await.succeeded);
        assert_eq!(
            h.state.lock().unwrap().last_intent,
            Some(crate::router::Intent::OpenApplication)
        );

        let result = runner.run_cycle().await;
        assert_eq!(result.error_kind, Some(ErrorKind::RecognitionFailure));
        let st = h.state.lock().unwrap();
        assert!(st.last_intent.is_none());
        assert!(st.last_utterance.is_none());
        assert_eq!(st.last_result.as_ref(), Some(&result));
    }

    #[tokio::test]
    async fn blank_transcript_is_a_recognition_failure() {
        let h = Harness::builder().hearing(Ok("   ")).build();
        let result = trigger_loop(&h).run_cycle().await;

        assert_eq!(result.error_kind, Some(ErrorKind::RecognitionFailure));
        assert!(h.provider_calls().is_empty());
    }

    #[tokio::test]
    async fn capture_failure_is_a_recognition_failure() {
        let h = Harness::builder()
            .hearing(Err(SpeechError::Capture("no input device".into())))
            .build();
        let result = trigger_loop(&h).run_cycle().await;
        assert_eq!(result.error_kind, Some(ErrorKind::RecognitionFailure));
        assert_eq!(phase(&h.state), CyclePhase::Idle);
    }

    #[tokio::test]
    async fn broken_listen_task_still_closes_cycle() {
        let h = Harness::builder()
            .hearing(Err(SpeechError::Internal("task panicked".into())))
            .build();
        let result = trigger_loop(&h).run_cycle().await;

        assert_eq!(result.error_kind, Some(ErrorKind::RecognitionFailure));
        assert_eq!(h.spoken(), vec![RECOGNITION_FAILURE_MESSAGE.to_string()]);
        assert_eq!(phase(&h.state), CyclePhase::Idle);
    }

    #[tokio::test]
    async fn run_rearms_gate_after_cycle() {
        let h = Harness::builder().hearing(Ok("what time is it")).build();
        let (tx, rx) = mpsc::channel(4);

        assert!(h.gate.try_fire());
        tx.send(TriggerEvent::MicButton).await.unwrap();
        drop(tx);

        trigger_loop(&h).run(rx).await;

        assert!(h.gate.is_armed());
        assert_eq!(
            h.spoken(),
            vec!["The current time is 09:05 PM".to_string()]
        );
    }

    #[tokio::test]
    async fn triggers_queued_mid_cycle_are_dropped() {
        let h = Harness::builder()
            .hearing(Ok("search otters"))
            .hearing(Ok("search badgers"))
            .build();
        let (tx, rx) = mpsc::channel(4);

        tx.send(TriggerEvent::MicButton).await.unwrap();
        tx.send(TriggerEvent::Hotkey).await.unwrap();
        drop(tx);

        trigger_loop(&h).run(rx).await;

        let listens = h
            .events()
            .into_iter()
            .filter(|e| *e == Event::Listen)
            .count();
        assert_eq!(listens, 1);
        assert_eq!(h.provider_calls(), vec![Event::Search("otters".into())]);
    }

    #[tokio::test]
    async fn consecutive_cycles_each_start_from_idle() {
        let h = Harness::builder()
            .hearing(Ok("search otters"))
            .hearing(Ok("make me a sandwich"))
            .build();
        let runner = trigger_loop(&h);

        let first = runner.run_cycle().await;
        assert!(first.succeeded);
        let second = runner.run_cycle().await;
        assert_eq!(second.error_kind, Some(ErrorKind::UnknownIntent));
        assert_eq!(phase(&h.state), CyclePhase::Idle);
    }
}
