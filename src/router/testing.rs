//! Recording test doubles shared by the router tests.
//!
//! Speech, provider and pause doubles all append to one [`Journal`] so tests
//! can assert on the interleaving of provider calls and spoken feedback.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use crate::providers::{ActionProvider, MessageOptions, ProviderError};
use crate::speech::{SpeechError, SpeechIo};
use crate::trigger::TriggerGate;

use super::dispatch::{DispatchConfig, DispatchEngine};
use super::presentation::Pause;
use super::session::AssistantSession;
use super::state::{new_shared_state, SharedState};

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Speak(String),
    Listen,
    Clip(String),
    Search(String),
    PlayVideo(String),
    OpenUrl(String),
    Message {
        contact: String,
        body: String,
        options: MessageOptions,
    },
    OpenApp {
        name: String,
        fuzzy: bool,
    },
    Temperature(String),
    Summarize {
        topic: String,
        sentences: usize,
        strip: bool,
    },
    Pause(Duration),
}

impl Event {
    fn is_provider_call(&self) -> bool {
        !matches!(
            self,
            Event::Speak(_) | Event::Listen | Event::Clip(_) | Event::Pause(_)
        )
    }
}

pub type Journal = Arc<Mutex<Vec<Event>>>;

// ---------------------------------------------------------------------------
// Speech
// ---------------------------------------------------------------------------

pub struct RecordingSpeech {
    journal: Journal,
    heard: Mutex<VecDeque<Result<String, SpeechError>>>,
    mute: bool,
}

impl SpeechIo for RecordingSpeech {
    fn speak(&self, text: &str) -> Result<(), SpeechError> {
        self.journal
            .lock()
            .unwrap()
            .push(Event::Speak(text.to_string()));
        if self.mute {
            return Err(SpeechError::Playback("no output device".into()));
        }
        Ok(())
    }

    fn listen(&self) -> Result<String, SpeechError> {
        self.journal.lock().unwrap().push(Event::Listen);
        self.heard
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(SpeechError::Recognition("nothing queued".into())))
    }

    fn play_clip(&self, clip_id: &str) -> Result<(), SpeechError> {
        self.journal
            .lock()
            .unwrap()
            .push(Event::Clip(clip_id.to_string()));
        if self.mute {
            return Err(SpeechError::ClipNotFound(format!("{clip_id}.mp3").into()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

pub struct RecordingProvider {
    journal: Journal,
    fail: bool,
}

impl RecordingProvider {
    fn record(&self, event: Event) -> Result<(), ProviderError> {
        self.journal.lock().unwrap().push(event);
        if self.fail {
            Err(ProviderError::Request("network unreachable".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ActionProvider for RecordingProvider {
    async fn search(&self, query: &str) -> Result<(), ProviderError> {
        self.record(Event::Search(query.to_string()))
    }

    async fn play_on_video_site(&self, query: &str) -> Result<(), ProviderError> {
        self.record(Event::PlayVideo(query.to_string()))
    }

    async fn open_url(&self, url: &str) -> Result<(), ProviderError> {
        self.record(Event::OpenUrl(url.to_string()))
    }

    async fn send_instant_message(
        &self,
        contact: &str,
        body: &str,
        options: &MessageOptions,
    ) -> Result<(), ProviderError> {
        self.record(Event::Message {
            contact: contact.to_string(),
            body: body.to_string(),
            options: options.clone(),
        })
    }

    async fn open_application(&self, name: &str, fuzzy_match: bool) -> Result<(), ProviderError> {
        self.record(Event::OpenApp {
            name: name.to_string(),
            fuzzy: fuzzy_match,
        })
    }

    async fn fetch_current_temperature(&self, location: &str) -> Result<f64, ProviderError> {
        self.record(Event::Temperature(location.to_string()))
            .map(|()| Harness::TEMPERATURE)
    }

    async fn summarize(
        &self,
        topic: &str,
        sentence_count: usize,
        strip_formatting: bool,
    ) -> Result<String, ProviderError> {
        self.record(Event::Summarize {
            topic: topic.to_string(),
            sentences: sentence_count,
            strip: strip_formatting,
        })
        .map(|()| Harness::SUMMARY.to_string())
    }
}

// ---------------------------------------------------------------------------
// Pause
// ---------------------------------------------------------------------------

pub struct RecordingPause {
    journal: Journal,
}

#[async_trait]
impl Pause for RecordingPause {
    async fn pause(&self, duration: Duration) {
        self.journal.lock().unwrap().push(Event::Pause(duration));
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

/// A dispatch engine wired to recording doubles, with the session clock
/// fixed at 21:05.
pub struct Harness {
    pub engine: Arc<DispatchEngine>,
    pub state: SharedState,
    pub gate: Arc<TriggerGate>,
    journal: Journal,
}

#[derive(Default)]
pub struct HarnessBuilder {
    fail: bool,
    mute: bool,
    heard: Vec<Result<String, SpeechError>>,
}

impl HarnessBuilder {
    /// Every provider call fails.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Every speak and clip fails.
    pub fn mute(mut self) -> Self {
        self.mute = true;
        self
    }

    /// Queue a `listen` outcome.
    pub fn hearing(mut self, outcome: Result<&str, SpeechError>) -> Self {
        self.heard.push(outcome.map(str::to_string));
        self
    }

    pub fn build(self) -> Harness {
        let journal: Journal = Arc::default();
        let gate = Arc::new(TriggerGate::new());
        let state = new_shared_state();

        let now = Utc.with_ymd_and_hms(2024, 3, 1, 21, 5, 0).unwrap();
        let session = Arc::new(AssistantSession::at(now, Arc::clone(&gate)));

        let speech = Arc::new(RecordingSpeech {
            journal: Arc::clone(&journal),
            heard: Mutex::new(self.heard.into()),
            mute: self.mute,
        });
        let provider = Arc::new(RecordingProvider {
            journal: Arc::clone(&journal),
            fail: self.fail,
        });
        let pause = Arc::new(RecordingPause {
            journal: Arc::clone(&journal),
        });

        let engine = DispatchEngine::new(
            session,
            speech,
            provider,
            Arc::clone(&state),
            DispatchConfig::default(),
        )
        .with_pause(pause);

        Harness {
            engine: Arc::new(engine),
            state,
            gate,
            journal,
        }
    }
}

impl Harness {
    pub const TEMPERATURE: f64 = 18.0;
    pub const SUMMARY: &'static str = "Alan Turing was an English mathematician.";

    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn failing() -> Self {
        Self::builder().failing().build()
    }

    pub fn builder() -> HarnessBuilder {
        HarnessBuilder::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.journal.lock().unwrap().clone()
    }

    pub fn spoken(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Speak(line) => Some(line),
                _ => None,
            })
            .collect()
    }

    pub fn provider_calls(&self) -> Vec<Event> {
        self.events()
            .into_iter()
            .filter(Event::is_provider_call)
            .collect()
    }

    pub fn pauses(&self) -> Vec<Duration> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Pause(d) => Some(d),
                _ => None,
            })
            .collect()
    }
}
