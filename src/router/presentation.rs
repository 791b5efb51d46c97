//! The scripted class-presentation macro.
//!
//! [`PRESENTATION_SCRIPT`] is an ordered list of [`Step`]s, each with the
//! delay that follows it.  The dispatch engine walks it start to finish;
//! nothing interrupts it.  Delays go through the [`Pause`] trait so tests
//! can record them instead of sleeping.

use std::time::Duration;

use async_trait::async_trait;

// ---------------------------------------------------------------------------
// Steps
// ---------------------------------------------------------------------------

/// What a single step does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepAction {
    /// Play a pre-recorded cue.
    Clip(&'static str),
    /// Speak the session time followed by [`TIME_ASIDE`].
    SpeakTimeAside,
    /// Web search for the configured presentation query.
    Search,
    /// Play the configured presentation video.
    PlayVideo,
}

/// One entry of the script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub action: StepAction,
    /// Pause after the step completes (or fails).
    pub delay_after: Duration,
}

impl Step {
    const fn now(action: StepAction) -> Self {
        Self {
            action,
            delay_after: Duration::ZERO,
        }
    }

    const fn then_wait(action: StepAction, delay_after: Duration) -> Self {
        Self {
            action,
            delay_after,
        }
    }
}

/// Spoken right after the session time during the presentation.
pub const TIME_ASIDE: &str = " also, if you are wondering why I sound like this now, \
it's because I require too much CPU usage, anyways back to the time";

pub static PRESENTATION_SCRIPT: &[Step] = &[
    Step::now(StepAction::Clip("introductionPresent1")),
    Step::now(StepAction::Clip("introductionPresent1.5")),
    Step::now(StepAction::Clip("introductionPresent2")),
    Step::now(StepAction::Clip("introductionPresent3")),
    Step::now(StepAction::SpeakTimeAside),
    Step::now(StepAction::Clip("introductionPresent6")),
    Step::now(StepAction::Search),
    Step::then_wait(
        StepAction::Clip("introductionPresent7"),
        Duration::from_millis(1_500),
    ),
    Step::then_wait(StepAction::PlayVideo, Duration::from_secs(10)),
    Step::now(StepAction::Clip("introductionPresent8")),
    Step::now(StepAction::Clip("outroPresent")),
];

/// The spoken line for [`StepAction::SpeakTimeAside`].
pub fn time_aside(current_time: &str) -> String {
    format!("{current_time}{TIME_ASIDE}")
}

// ---------------------------------------------------------------------------
// Pause
// ---------------------------------------------------------------------------

/// Source of inter-step delays.
#[async_trait]
pub trait Pause: Send + Sync {
    async fn pause(&self, duration: Duration);
}

/// Real delays on the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioPause;

#[async_trait]
impl Pause for TokioPause {
    async fn pause(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
