//! Dispatch engine: turns an (intent, argument) pair into provider calls
//! and spoken feedback.
//!
//! # Per-intent behaviour
//!
//! ```text
//! Introduce          → clip intro_{lang} per requested language
//! Time               → speak "The current time is {session time}"
//! PlayOnVideoSite    → play_on_video_site(arg)            → speak confirmation
//! WebSearch          → search(arg)                        → speak confirmation
//! OpenRepositoryPage → open_url(repository_url + arg)     → clip "github"
//! SendMessage        → send_instant_message(arg, body, …) → speak confirmation
//! OpenApplication    → open_application(arg, fuzzy)       → speak confirmation
//! Weather            → fetch_current_temperature(arg)     → speak temperature
//! Wiki               → summarize(arg, 1, strip)           → speak summary
//! Presentation       → scripted macro (ExecutingSequence)
//! Unknown            → speak fixed apology + clip "error", no provider call
//! ```
//!
//! A provider failure never propagates: it is logged, a fixed apology is
//! spoken in place of the confirmation, and the result carries
//! [`ErrorKind::ProviderFailure`].  Speech and clips are blocking calls and
//! run on `tokio::task::spawn_blocking`.

use std::sync::Arc;

use crate::config::{AppConfig, PresentationConfig};
use crate::providers::{ActionProvider, MessageOptions, ProviderError};
use crate::speech::{SpeechError, SpeechIo};

use super::classifier::{classify, Intent};
use super::presentation::{time_aside, Pause, StepAction, TokioPause, PRESENTATION_SCRIPT};
use super::session::AssistantSession;
use super::state::{advance, phase, CyclePhase, SharedState};

// ---------------------------------------------------------------------------
// Fixed phrases and cues
// ---------------------------------------------------------------------------

/// Spoken when no keyword matched.
pub const UNKNOWN_INTENT_MESSAGE: &str = "Sorry, but I am unable to assist you with this problem";
/// Spoken instead of a confirmation when a provider call failed.
pub const PROVIDER_FAILURE_MESSAGE: &str = "Sorry, something went wrong with that request";
/// Spoken when capture or transcription failed.
pub const RECOGNITION_FAILURE_MESSAGE: &str = "Sorry, I did not catch that";
pub const MESSAGE_SENT: &str = "Message sent successfully";

pub const ERROR_CLIP: &str = "error";
pub const REPOSITORY_CLIP: &str = "github";

/// Summaries are cut to this many sentences.
const SUMMARY_SENTENCES: usize = 1;

// ---------------------------------------------------------------------------
// DispatchResult
// ---------------------------------------------------------------------------

/// Error taxonomy surfaced to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Capture or transcription failed before classification.
    RecognitionFailure,
    /// An action provider call failed.
    ProviderFailure,
    /// No keyword matched.
    UnknownIntent,
}

/// Outcome of one dispatch.  Produced once, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchResult {
    pub succeeded: bool,
    /// Text actually spoken as the cycle's response, if any.
    pub spoken_response: Option<String>,
    pub error_kind: Option<ErrorKind>,
}

impl DispatchResult {
    pub fn success(spoken_response: Option<String>) -> Self {
        Self {
            succeeded: true,
            spoken_response,
            error_kind: None,
        }
    }

    pub fn failure(kind: ErrorKind, spoken_response: Option<String>) -> Self {
        Self {
            succeeded: false,
            spoken_response,
            error_kind: Some(kind),
        }
    }
}

// ---------------------------------------------------------------------------
// DispatchConfig
// ---------------------------------------------------------------------------

/// The slice of [`AppConfig`] the engine needs.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Prefix for repository pages; the argument is appended verbatim.
    pub repository_url: String,
    /// Body sent by [`Intent::SendMessage`].
    pub message_body: String,
    pub message_options: MessageOptions,
    pub presentation: PresentationConfig,
}

impl DispatchConfig {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            repository_url: config.providers.repository_url.clone(),
            message_body: config.messaging.default_body.clone(),
            message_options: MessageOptions::from(&config.messaging),
            presentation: config.presentation.clone(),
        }
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

// ---------------------------------------------------------------------------
// DispatchEngine
// ---------------------------------------------------------------------------

/// Executes classified commands.
///
/// Calls are expected to be serialized by the caller (the trigger loop in
/// [`super::runner`]); the engine itself keeps no per-dispatch state.
pub struct DispatchEngine {
    session: Arc<AssistantSession>,
    speech: Arc<dyn SpeechIo>,
    provider: Arc<dyn ActionProvider>,
    pause: Arc<dyn Pause>,
    state: SharedState,
    config: DispatchConfig,
}

impl DispatchEngine {
    /// Create an engine that pauses on the tokio timer.
    pub fn new(
        session: Arc<AssistantSession>,
        speech: Arc<dyn SpeechIo>,
        provider: Arc<dyn ActionProvider>,
        state: SharedState,
        config: DispatchConfig,
    ) -> Self {
        Self {
            session,
            speech,
            provider,
            pause: Arc::new(TokioPause),
            state,
            config,
        }
    }

    /// Replace the delay source used by the presentation.
    pub fn with_pause(mut self, pause: Arc<dyn Pause>) -> Self {
        self.pause = pause;
        self
    }

    pub fn session(&self) -> &Arc<AssistantSession> {
        &self.session
    }

    pub fn state(&self) -> &SharedState {
        &self.state
    }

    // -----------------------------------------------------------------------
    // Entry points
    // -----------------------------------------------------------------------

    /// Classify `utterance` and dispatch it.
    pub async fn handle_utterance(&self, utterance: &str) -> DispatchResult {
        advance(&self.state, CyclePhase::Classifying);

        let classification = classify(utterance);
        log::info!(
            "router: {:?} -> {} {:?}",
            utterance,
            classification.intent,
            classification.argument
        );
        self.state.lock().unwrap().last_utterance = Some(utterance.to_string());

        self.dispatch(classification.intent, &classification.argument)
            .await
    }

    /// Run the handler for `intent` and return the machine to `Idle`.
    pub async fn dispatch(&self, intent: Intent, argument: &str) -> DispatchResult {
        if phase(&self.state) == CyclePhase::Idle {
            advance(&self.state, CyclePhase::Classifying);
        }
        self.state.lock().unwrap().last_intent = Some(intent);
        if let Some(keyword) = intent.keyword() {
            log::debug!("router: {intent} via {keyword:?}, argument {argument:?}");
        }

        let result = if intent == Intent::Presentation {
            advance(&self.state, CyclePhase::ExecutingSequence);
            self.run_presentation().await
        } else {
            advance(&self.state, CyclePhase::Executing);
            self.execute(intent, argument).await
        };

        advance(&self.state, CyclePhase::Idle);
        self.state.lock().unwrap().last_result = Some(result.clone());
        result
    }

    /// Capture one utterance on the blocking pool.
    pub async fn listen(&self) -> Result<String, SpeechError> {
        let speech = Arc::clone(&self.speech);
        match tokio::task::spawn_blocking(move || speech.listen()).await {
            Ok(result) => result,
            Err(e) => Err(SpeechError::Internal(e.to_string())),
        }
    }

    /// Close a cycle whose capture or transcription failed.
    ///
    /// Expects the machine in `Listening`; speaks the fixed apology and
    /// returns to `Idle` without classifying anything.
    pub async fn recognition_failed(&self, error: &SpeechError) -> DispatchResult {
        if error.is_recognition() {
            log::warn!("router: recognition failed: {error}");
        } else {
            log::error!("router: speech input broke down: {error}");
        }
        advance(&self.state, CyclePhase::Speaking);
        let spoken = self.say(RECOGNITION_FAILURE_MESSAGE).await;
        advance(&self.state, CyclePhase::Idle);

        let result = DispatchResult::failure(ErrorKind::RecognitionFailure, spoken);
        self.state.lock().unwrap().last_result = Some(result.clone());
        result
    }

    // -----------------------------------------------------------------------
    // Single-intent handlers
    // -----------------------------------------------------------------------

    async fn execute(&self, intent: Intent, argument: &str) -> DispatchResult {
        match intent {
            Intent::Introduce => self.introduce(argument).await,
            Intent::Time => {
                let line = format!("The current time is {}", self.session.current_time());
                self.confirm(line).await
            }
            Intent::PlayOnVideoSite => match self.provider.play_on_video_site(argument).await {
                Ok(()) => self.confirm(format!("Playing {argument} on YouTube")).await,
                Err(e) => self.provider_failed(intent, e).await,
            },
            Intent::WebSearch => match self.provider.search(argument).await {
                Ok(()) => self.confirm(format!("Searching {argument} on Google")).await,
                Err(e) => self.provider_failed(intent, e).await,
            },
            Intent::OpenRepositoryPage => {
                let url = format!("{}{}", self.config.repository_url, argument);
                match self.provider.open_url(&url).await {
                    Ok(()) => self.cue(REPOSITORY_CLIP).await,
                    Err(e) => self.provider_failed(intent, e).await,
                }
            }
            Intent::SendMessage => {
                let sent = self
                    .provider
                    .send_instant_message(
                        argument,
                        &self.config.message_body,
                        &self.config.message_options,
                    )
                    .await;
                match sent {
                    Ok(()) => self.confirm(MESSAGE_SENT.to_string()).await,
                    Err(e) => self.provider_failed(intent, e).await,
                }
            }
            Intent::OpenApplication => match self.provider.open_application(argument, true).await {
                Ok(()) => self.confirm(format!("Opening {argument}")).await,
                Err(e) => self.provider_failed(intent, e).await,
            },
            Intent::Weather => match self.provider.fetch_current_temperature(argument).await {
                Ok(celsius) => {
                    let line = format!(
                        "The current weather in {argument} is {celsius} degrees Celsius."
                    );
                    self.confirm(line).await
                }
                Err(e) => self.provider_failed(intent, e).await,
            },
            Intent::Wiki => match self
                .provider
                .summarize(argument, SUMMARY_SENTENCES, true)
                .await
            {
                Ok(summary) => self.confirm(summary).await,
                Err(e) => self.provider_failed(intent, e).await,
            },
            Intent::Presentation => self.run_presentation().await,
            Intent::Unknown => self.unknown().await,
        }
    }

    async fn introduce(&self, languages: &str) -> DispatchResult {
        let languages: Vec<&str> = languages.split_whitespace().collect();
        if languages.is_empty() {
            log::info!("router: introduction requested without a language");
            return DispatchResult::success(None);
        }

        advance(&self.state, CyclePhase::Speaking);
        let mut failed = false;
        for lang in languages {
            if let Err(e) = self.play_clip(&format!("intro_{lang}")).await {
                log::error!("router: introduction in {lang} failed: {e}");
                failed = true;
            }
        }

        if failed {
            DispatchResult::failure(ErrorKind::ProviderFailure, None)
        } else {
            DispatchResult::success(None)
        }
    }

    async fn unknown(&self) -> DispatchResult {
        log::warn!("router: no command keyword recognised");
        advance(&self.state, CyclePhase::Speaking);

        let spoken = self.say(UNKNOWN_INTENT_MESSAGE).await;
        if let Err(e) = self.play_clip(ERROR_CLIP).await {
            log::warn!("router: error cue not played: {e}");
        }
        DispatchResult::failure(ErrorKind::UnknownIntent, spoken)
    }

    /// Speak a confirmation after a successful action.
    async fn confirm(&self, line: String) -> DispatchResult {
        advance(&self.state, CyclePhase::Speaking);
        DispatchResult::success(self.say(&line).await)
    }

    /// Play a confirmation cue after a successful action.
    async fn cue(&self, clip_id: &str) -> DispatchResult {
        advance(&self.state, CyclePhase::Speaking);
        if let Err(e) = self.play_clip(clip_id).await {
            log::warn!("router: confirmation cue {clip_id:?} not played: {e}");
        }
        DispatchResult::success(None)
    }

    async fn provider_failed(&self, intent: Intent, error: ProviderError) -> DispatchResult {
        log::error!("router: {intent} failed: {error}");
        advance(&self.state, CyclePhase::Speaking);
        let spoken = self.say(PROVIDER_FAILURE_MESSAGE).await;
        DispatchResult::failure(ErrorKind::ProviderFailure, spoken)
    }

    // -----------------------------------------------------------------------
    // Presentation macro
    // -----------------------------------------------------------------------

    async fn run_presentation(&self) -> DispatchResult {
        let mut failures = 0usize;
        let mut spoken = None;

        for (n, step) in PRESENTATION_SCRIPT.iter().enumerate() {
            let outcome = match step.action {
                StepAction::Clip(id) => self.play_clip(id).await.map_err(|e| e.to_string()),
                StepAction::SpeakTimeAside => {
                    let line = time_aside(self.session.current_time());
                    let r = self.speak(&line).await.map_err(|e| e.to_string());
                    if r.is_ok() {
                        spoken = Some(line);
                    }
                    r
                }
                StepAction::Search => self
                    .provider
                    .search(&self.config.presentation.search_query)
                    .await
                    .map_err(|e| e.to_string()),
                StepAction::PlayVideo => self
                    .provider
                    .play_on_video_site(&self.config.presentation.video_query)
                    .await
                    .map_err(|e| e.to_string()),
            };

            if let Err(e) = outcome {
                failures += 1;
                log::warn!("router: presentation step {} {:?} failed: {e}", n + 1, step.action);
            }

            if !step.delay_after.is_zero() {
                self.pause.pause(step.delay_after).await;
            }
        }

        if failures == 0 {
            DispatchResult::success(spoken)
        } else {
            log::error!("router: presentation finished with {failures} failed step(s)");
            DispatchResult::failure(ErrorKind::ProviderFailure, spoken)
        }
    }

    // -----------------------------------------------------------------------
    // Blocking speech calls
    // -----------------------------------------------------------------------

    /// Speak `line`, logging failure.  Returns the line if it was spoken.
    async fn say(&self, line: &str) -> Option<String> {
        match self.speak(line).await {
            Ok(()) => Some(line.to_string()),
            Err(e) => {
                log::error!("router: could not speak {line:?}: {e}");
                None
            }
        }
    }

    async fn speak(&self, line: &str) -> Result<(), SpeechError> {
        let speech = Arc::clone(&self.speech);
        let line = line.to_string();
        match tokio::task::spawn_blocking(move || speech.speak(&line)).await {
            Ok(result) => result,
            Err(e) => Err(SpeechError::Internal(e.to_string())),
        }
    }

    async fn play_clip(&self, clip_id: &str) -> Result<(), SpeechError> {
        let speech = Arc::clone(&self.speech);
        let clip_id = clip_id.to_string();
        match tokio::task::spawn_blocking(move || speech.play_clip(&clip_id)).await {
            Ok(result) => result,
            Err(e) => Err(SpeechError::Internal(e.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
