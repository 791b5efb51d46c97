//! Instant messaging through the web messaging client.
//!
//! The message is delivered the way a person would: open the chat page for
//! the phone number, wait for it to load, paste the body from the
//! clipboard, press Enter, and optionally close the tab.
//!
//! ```text
//! open {web_url}?phone=…   → sleep delay_secs
//! save clipboard → set body → Ctrl/⌘+V → Enter → restore clipboard
//! close_tab? → sleep close_after_secs → Ctrl/⌘+W
//! ```

use std::collections::BTreeMap;
use std::time::Duration;

use arboard::Clipboard;
use enigo::{Direction, Enigo, Key, Keyboard, Settings};
use reqwest::Url;

use super::browser::open_in_browser;
use super::{MessageOptions, ProviderError};

/// Pause between setting the clipboard and pasting.
const CLIPBOARD_SETTLE: Duration = Duration::from_millis(50);

/// Map a spoken contact to a phone number.
///
/// Looks the contact up case-insensitively in `contacts`; anything that
/// is not listed is used verbatim, so a spoken number works too.
pub fn resolve_contact(
    contacts: &BTreeMap<String, String>,
    contact: &str,
) -> Result<String, ProviderError> {
    let contact = contact.trim();
    if contact.is_empty() {
        return Err(ProviderError::NotFound("no contact given".into()));
    }

    let phone = contacts
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(contact))
        .map(|(_, phone)| phone.clone())
        .unwrap_or_else(|| contact.chars().filter(|c| !c.is_whitespace()).collect());
    Ok(phone)
}

/// Chat URL for `phone` under the client's `web_url`.
pub fn chat_url(web_url: &str, phone: &str) -> Result<Url, ProviderError> {
    Url::parse_with_params(web_url, &[("phone", phone)])
        .map_err(|e| ProviderError::Parse(format!("bad messaging URL {web_url:?}: {e}")))
}

/// Send `body` to `phone` by driving the web client.
pub async fn send_via_web_client(
    web_url: &str,
    phone: &str,
    body: &str,
    options: &MessageOptions,
) -> Result<(), ProviderError> {
    let url = chat_url(web_url, phone)?;
    open_in_browser(url.as_str()).await?;

    log::debug!("providers: waiting {}s for the chat to load", options.delay_secs);
    tokio::time::sleep(Duration::from_secs(options.delay_secs)).await;

    let body = body.to_string();
    tokio::task::spawn_blocking(move || paste_and_send(&body))
        .await
        .map_err(|e| ProviderError::Input(e.to_string()))??;
    log::info!("providers: message sent to {phone}");

    if options.close_tab {
        tokio::time::sleep(Duration::from_secs(options.close_after_secs)).await;
        tokio::task::spawn_blocking(close_tab)
            .await
            .map_err(|e| ProviderError::Input(e.to_string()))??;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Clipboard and keyboard
// ---------------------------------------------------------------------------

fn paste_and_send(body: &str) -> Result<(), ProviderError> {
    let mut clipboard = Clipboard::new().map_err(|e| ProviderError::Input(e.to_string()))?;
    let saved = clipboard.get_text().ok();

    clipboard
        .set_text(body)
        .map_err(|e| ProviderError::Input(e.to_string()))?;
    std::thread::sleep(CLIPBOARD_SETTLE);

    let mut enigo = new_enigo()?;
    chord(&mut enigo, 'v')?;
    enigo
        .key(Key::Return, Direction::Click)
        .map_err(|e| ProviderError::Input(e.to_string()))?;

    if let Some(text) = saved {
        report_restore(clipboard.set_text(text));
    }
    Ok(())
}

/// The message is already sent, so a failed restore is only logged.
/// Returns whether the previous clipboard text is back.
fn report_restore<E: std::fmt::Display>(restored: Result<(), E>) -> bool {
    match restored {
        Ok(()) => true,
        Err(e) => {
            log::warn!("providers: clipboard not restored: {e}");
            false
        }
    }
}

fn close_tab() -> Result<(), ProviderError> {
    let mut enigo = new_enigo()?;
    chord(&mut enigo, 'w')
}

fn new_enigo() -> Result<Enigo, ProviderError> {
    Enigo::new(&Settings::default()).map_err(|e| ProviderError::Input(e.to_string()))
}

/// Press the platform command modifier together with `letter`.
fn chord(enigo: &mut Enigo, letter: char) -> Result<(), ProviderError> {
    #[cfg(target_os = "macos")]
    let modifier = Key::Meta;
    #[cfg(not(target_os = "macos"))]
    let modifier = Key::Control;

    let input = |e: enigo::InputError| ProviderError::Input(e.to_string());
    enigo.key(modifier, Direction::Press).map_err(input)?;
    enigo
        .key(Key::Unicode(letter), Direction::Click)
        .map_err(input)?;
    enigo.key(modifier, Direction::Release).map_err(input)?;
    Ok(())
}
