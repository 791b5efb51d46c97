//! Command router: intent classification, dispatch and the cycle loop.
//!
//! Sub-modules:
//! - [`classifier`]  : keyword table and [`classify`]
//! - [`dispatch`]    : [`DispatchEngine`] and per-intent handlers
//! - [`presentation`]: the scripted presentation macro
//! - [`runner`]      : [`TriggerLoop`], one cycle per trigger
//! - [`session`]     : process-wide [`AssistantSession`]
//! - [`state`]       : [`CyclePhase`] machine and [`SharedState`]

pub mod classifier;
pub mod dispatch;
pub mod presentation;
pub mod runner;
pub mod session;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

pub use classifier::{classify, ArgumentRule, Classification, Intent, KEYWORD_TABLE};
pub use dispatch::{DispatchConfig, DispatchEngine, DispatchResult, ErrorKind};
pub use presentation::{Pause, TokioPause, PRESENTATION_SCRIPT};
pub use runner::TriggerLoop;
pub use session::AssistantSession;
pub use state::{new_shared_state, AssistantState, CyclePhase, SharedState};
