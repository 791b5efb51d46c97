//! Action providers: the external capabilities the router can invoke.
//!
//! [`ActionProvider`] is the single seam between the dispatch engine and the
//! outside world.  Every call takes string arguments and reports success or
//! a [`ProviderError`]; weather and knowledge lookups also return a value.
//!
//! [`SystemProvider`] is the production implementation, assembled from one
//! module per concern:
//!
//! | Module | Calls |
//! |--------|-------|
//! | [`browser`]   | `search`, `play_on_video_site`, `open_url` |
//! | [`apps`]      | `open_application` |
//! | [`messaging`] | `send_instant_message` |
//! | [`weather`]   | `fetch_current_temperature` |
//! | [`knowledge`] | `summarize` |

pub mod apps;
pub mod browser;
pub mod knowledge;
pub mod messaging;
pub mod weather;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{AppConfig, MessagingConfig, ProviderConfig};

// ---------------------------------------------------------------------------
// ProviderError
// ---------------------------------------------------------------------------

/// Errors raised by any action provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// The remote service answered with a non-success status.
    #[error("service returned HTTP {0}")]
    Status(u16),

    /// The response body did not have the expected shape.
    #[error("unexpected response: {0}")]
    Parse(String),

    /// The lookup target (location, topic, application, contact) is unknown.
    #[error("not found: {0}")]
    NotFound(String),

    /// A local program could not be started.
    #[error("failed to launch: {0}")]
    Launch(String),

    /// Simulated keyboard or clipboard input failed.
    #[error("input simulation failed: {0}")]
    Input(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ProviderError::Timeout
        } else if let Some(status) = e.status() {
            ProviderError::Status(status.as_u16())
        } else {
            ProviderError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// MessageOptions
// ---------------------------------------------------------------------------

/// Fixed knobs of the instant-message call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageOptions {
    /// Seconds to wait for the web client to become ready before typing.
    pub delay_secs: u64,
    /// Close the browser tab after sending.
    pub close_tab: bool,
    /// Seconds between sending and closing the tab.
    pub close_after_secs: u64,
}

impl Default for MessageOptions {
    fn default() -> Self {
        Self {
            delay_secs: 15,
            close_tab: true,
            close_after_secs: 4,
        }
    }
}

impl From<&MessagingConfig> for MessageOptions {
    fn from(config: &MessagingConfig) -> Self {
        Self {
            delay_secs: config.delay_secs,
            close_tab: config.close_tab,
            close_after_secs: config.close_after_secs,
        }
    }
}

// ---------------------------------------------------------------------------
// ActionProvider trait
// ---------------------------------------------------------------------------

/// The fixed set of capabilities the dispatch engine may call.
///
/// Implementors must be `Send + Sync` (held as `Arc<dyn ActionProvider>`).
#[async_trait]
pub trait ActionProvider: Send + Sync {
    /// Open a web search for `query`.
    async fn search(&self, query: &str) -> Result<(), ProviderError>;

    /// Start playing the best video-site match for `query`.
    async fn play_on_video_site(&self, query: &str) -> Result<(), ProviderError>;

    /// Open `url` in the default browser.
    async fn open_url(&self, url: &str) -> Result<(), ProviderError>;

    /// Send `body` to `contact` through the web messaging client.
    async fn send_instant_message(
        &self,
        contact: &str,
        body: &str,
        options: &MessageOptions,
    ) -> Result<(), ProviderError>;

    /// Launch an installed application; `fuzzy_match` picks the closest name.
    async fn open_application(&self, name: &str, fuzzy_match: bool) -> Result<(), ProviderError>;

    /// Current temperature at `location`, in degrees Celsius.
    async fn fetch_current_temperature(&self, location: &str) -> Result<f64, ProviderError>;

    /// A short plain-text summary of `topic`.
    async fn summarize(
        &self,
        topic: &str,
        sentence_count: usize,
        strip_formatting: bool,
    ) -> Result<String, ProviderError>;
}

const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn ActionProvider>) {}
};

// ---------------------------------------------------------------------------
// SystemProvider
// ---------------------------------------------------------------------------

/// Production provider backed by the browser, the desktop and HTTP APIs.
pub struct SystemProvider {
    client: reqwest::Client,
    endpoints: ProviderConfig,
    messaging: MessagingConfig,
}

impl SystemProvider {
    /// Build the provider from application config.
    ///
    /// The HTTP client carries the per-request timeout from
    /// `providers.timeout_secs`; a default client is the fallback if the
    /// builder fails.
    pub fn from_config(config: &AppConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.providers.timeout_secs))
            .user_agent(concat!("voice-assistant/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            endpoints: config.providers.clone(),
            messaging: config.messaging.clone(),
        }
    }
}

#[async_trait]
impl ActionProvider for SystemProvider {
    async fn search(&self, query: &str) -> Result<(), ProviderError> {
        let url = browser::search_url(&self.endpoints.search_url, query)?;
        browser::open_in_browser(url.as_str()).await
    }

    async fn play_on_video_site(&self, query: &str) -> Result<(), ProviderError> {
        browser::play_first_video(&self.client, &self.endpoints, query).await
    }

    async fn open_url(&self, url: &str) -> Result<(), ProviderError> {
        browser::open_in_browser(url).await
    }

    async fn send_instant_message(
        &self,
        contact: &str,
        body: &str,
        options: &MessageOptions,
    ) -> Result<(), ProviderError> {
        let phone = messaging::resolve_contact(&self.messaging.contacts, contact)?;
        messaging::send_via_web_client(&self.messaging.web_url, &phone, body, options).await
    }

    async fn open_application(&self, name: &str, fuzzy_match: bool) -> Result<(), ProviderError> {
        apps::open_application(name, fuzzy_match).await
    }

    async fn fetch_current_temperature(&self, location: &str) -> Result<f64, ProviderError> {
        weather::current_temperature(&self.client, &self.endpoints.weather_url, location).await
    }

    async fn summarize(
        &self,
        topic: &str,
        sentence_count: usize,
        strip_formatting: bool,
    ) -> Result<String, ProviderError> {
        knowledge::summarize(
            &self.client,
            &self.endpoints.knowledge_url,
            topic,
            sentence_count,
            strip_formatting,
        )
        .await
    }
}

// ---------------------------------------------------------------------------
// Child processes
// ---------------------------------------------------------------------------

/// Wait for a launched opener on a background thread so it is reaped once
/// it exits.  The launch itself has already succeeded; `label` only names
/// the process in logs.
pub(crate) fn reap(
    mut child: std::process::Child,
    label: String,
) -> Option<std::thread::JoinHandle<Option<std::process::ExitStatus>>> {
    let spawned = std::thread::Builder::new()
        .name("provider-reaper".into())
        .spawn(move || match child.wait() {
            Ok(status) => {
                if !status.success() {
                    log::warn!("providers: {label} exited with {status}");
                }
                Some(status)
            }
            Err(e) => {
                log::warn!("providers: waiting on {label} failed: {e}");
                None
            }
        });

    match spawned {
        Ok(handle) => Some(handle),
        Err(e) => {
            log::warn!("providers: no reaper thread, child left unreaped: {e}");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
