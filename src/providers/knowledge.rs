//! Short encyclopedia summaries from the Wikipedia REST API.

use reqwest::Url;
use serde::Deserialize;

use super::ProviderError;

#[derive(Debug, Deserialize)]
struct Summary {
    #[serde(default)]
    extract: String,
}

/// Fetch the summary for `topic` and cut it to `sentence_count` sentences.
pub async fn summarize(
    client: &reqwest::Client,
    base: &str,
    topic: &str,
    sentence_count: usize,
    strip_formatting: bool,
) -> Result<String, ProviderError> {
    let topic = topic.trim();
    if topic.is_empty() {
        return Err(ProviderError::NotFound("no topic given".into()));
    }

    let url = summary_url(base, topic)?;
    log::debug!("providers: knowledge lookup {url}");

    let resp = client.get(url).send().await?;
    if resp.status() == reqwest::StatusCode::NOT_FOUND {
        return Err(ProviderError::NotFound(format!("topic {topic:?}")));
    }
    let summary: Summary = resp.error_for_status()?.json().await?;

    if summary.extract.trim().is_empty() {
        return Err(ProviderError::NotFound(format!("topic {topic:?}")));
    }
    Ok(condense(&summary.extract, sentence_count, strip_formatting))
}

/// `{base}{Topic_With_Underscores}`, percent-encoded as one path segment.
pub fn summary_url(base: &str, topic: &str) -> Result<Url, ProviderError> {
    let mut url =
        Url::parse(base).map_err(|e| ProviderError::Parse(format!("bad URL {base:?}: {e}")))?;
    let title = topic.split_whitespace().collect::<Vec<_>>().join("_");

    url.path_segments_mut()
        .map_err(|()| ProviderError::Parse(format!("{base:?} cannot take a path")))?
        .pop_if_empty()
        .push(&title);
    Ok(url)
}

/// Keep the first `sentence_count` sentences of `text`.  A count of zero
/// keeps nothing.
///
/// With `strip_formatting`, parenthesised and bracketed asides are removed
/// first and whitespace is collapsed.
pub fn condense(text: &str, sentence_count: usize, strip_formatting: bool) -> String {
    if sentence_count == 0 {
        return String::new();
    }
    let text = if strip_formatting {
        strip_asides(text)
    } else {
        text.trim().to_string()
    };

    let mut end = text.len();
    let mut seen = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if matches!(c, '.' | '!' | '?') && chars.peek().map_or(true, |(_, n)| n.is_whitespace()) {
            seen += 1;
            if seen == sentence_count {
                end = i + c.len_utf8();
                break;
            }
        }
    }
    text[..end].trim().to_string()
}

/// Drop `(...)` and `[...]` groups, nested or not, and tidy the spacing.
fn strip_asides(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut depth = 0usize;
    for c in text.chars() {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }

    out.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace(" ,", ",")
        .replace(" .", ".")
}
