//! Browser-backed providers: web search, video playback, plain URLs.
//!
//! Opening a page shells out to the platform opener (`xdg-open`, `open`,
//! `cmd /C start`) on the blocking pool.

use std::process::Command;

use reqwest::Url;

use crate::config::ProviderConfig;

use super::{reap, ProviderError};

/// Build the results-page URL for `query` under `base`.
pub fn search_url(base: &str, query: &str) -> Result<Url, ProviderError> {
    Url::parse_with_params(base, &[("q", query)])
        .map_err(|e| ProviderError::Parse(format!("bad search URL {base:?}: {e}")))
}

/// Open `url` in the user's default browser.
pub async fn open_in_browser(url: &str) -> Result<(), ProviderError> {
    log::info!("providers: opening {url}");
    let url = url.to_string();
    tokio::task::spawn_blocking(move || spawn_opener(&url))
        .await
        .map_err(|e| ProviderError::Launch(e.to_string()))?
}

/// Find the first video for `query` and open its watch page.
///
/// Falls back to the results page when no video id can be pulled out of it.
pub async fn play_first_video(
    client: &reqwest::Client,
    endpoints: &ProviderConfig,
    query: &str,
) -> Result<(), ProviderError> {
    let results = Url::parse_with_params(&endpoints.video_search_url, &[("search_query", query)])
        .map_err(|e| ProviderError::Parse(e.to_string()))?;

    let body = client
        .get(results.clone())
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    match first_video_id(&body) {
        Some(id) => {
            let watch = format!("{}{}", endpoints.video_watch_url, id);
            log::debug!("providers: first video for {query:?} is {id}");
            open_in_browser(&watch).await
        }
        None => {
            log::warn!("providers: no video id found for {query:?}, opening results page");
            open_in_browser(results.as_str()).await
        }
    }
}

/// Pull the first 11-character video id out of a results page.
///
/// Looks for the embedded `"videoId":"…"` JSON first, then plain
/// `watch?v=…` links.
pub fn first_video_id(page: &str) -> Option<String> {
    const MARKERS: [&str; 2] = ["\"videoId\":\"", "watch?v="];

    MARKERS.iter().find_map(|marker| {
        page.match_indices(marker).find_map(|(at, m)| {
            let id: String = page[at + m.len()..]
                .chars()
                .take_while(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
                .collect();
            (id.len() == 11).then_some(id)
        })
    })
}

fn spawn_opener(url: &str) -> Result<(), ProviderError> {
    #[cfg(target_os = "macos")]
    let mut cmd = {
        let mut c = Command::new("open");
        c.arg(url);
        c
    };

    #[cfg(target_os = "windows")]
    let mut cmd = {
        let mut c = Command::new("cmd");
        c.args(["/C", "start", "", url]);
        c
    };

    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    let mut cmd = {
        let mut c = Command::new("xdg-open");
        c.arg(url);
        c
    };

    let child = cmd
        .spawn()
        .map_err(|e| ProviderError::Launch(format!("browser for {url}: {e}")))?;
    reap(child, format!("browser for {url}"));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_url_encodes_query() {
        let url = search_url("https://www.google.com/search", "rust & tokio").unwrap();
        assert_eq!(url.as_str(), "https://www.google.com/search?q=rust+%26+tokio");
    }

    #[test]
    fn search_url_rejects_garbage_base() {
        assert!(matches!(
            search_url("not a url", "x"),
            Err(ProviderError::Parse(_))
        ));
    }

    #[test]
    fn video_id_from_embedded_json() {
        let page = r#"var ytInitialData = {"contents":[{"videoRenderer":{"videoId":"jfKfPfyJRdk","title":"lofi"}}]}"#;
        assert_eq!(first_video_id(page).as_deref(), Some("jfKfPfyJRdk"));
    }

    #[test]
    fn video_id_from_watch_link() {
        let page = r#"<a href="/watch?v=dQw4w9WgXcQ&list=x">"#;
        assert_eq!(first_video_id(page).as_deref(), Some("dQw4w9WgXcQ"));
    }

    #[test]
    fn short_ids_are_skipped() {
        let page = r#""videoId":"abc" ... "videoId":"jfKfPfyJRdk""#;
        assert_eq!(first_video_id(page).as_deref(), Some("jfKfPfyJRdk"));
    }

    #[test]
    fn no_id_in_page() {
        assert_eq!(first_video_id("<html>no results</html>"), None);
    }
}
