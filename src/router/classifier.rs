//! Keyword-table intent classifier.
//!
//! [`classify`] lowercases the utterance and walks [`KEYWORD_TABLE`] in
//! order.  The first entry whose keyword is contained in the utterance wins,
//! regardless of where in the utterance the keyword appears or whether a
//! lower-priority keyword occurs earlier in the text.  No match yields
//! [`Intent::Unknown`] with an empty argument.
//!
//! Each entry carries the [`ArgumentRule`] used to cut the residual argument
//! out of the *original* utterance, so casing such as `"Paris"` survives.

use std::fmt;

// ---------------------------------------------------------------------------
// Intent
// ---------------------------------------------------------------------------

/// The closed set of things the assistant knows how to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    Introduce,
    Time,
    PlayOnVideoSite,
    WebSearch,
    OpenRepositoryPage,
    SendMessage,
    OpenApplication,
    Weather,
    Presentation,
    Wiki,
    /// Terminal fallback when no keyword matched.
    Unknown,
}

impl Intent {
    /// Short label used in logs and the mic window.
    pub fn label(&self) -> &'static str {
        match self {
            Intent::Introduce => "Introduce",
            Intent::Time => "Time",
            Intent::PlayOnVideoSite => "PlayOnVideoSite",
            Intent::WebSearch => "WebSearch",
            Intent::OpenRepositoryPage => "OpenRepositoryPage",
            Intent::SendMessage => "SendMessage",
            Intent::OpenApplication => "OpenApplication",
            Intent::Weather => "Weather",
            Intent::Presentation => "Presentation",
            Intent::Wiki => "Wiki",
            Intent::Unknown => "Unknown",
        }
    }

    /// Keyword that selects this intent, `None` for [`Intent::Unknown`].
    pub fn keyword(&self) -> Option<&'static str> {
        KEYWORD_TABLE
            .iter()
            .find(|rule| rule.intent == *self)
            .map(|rule| rule.keyword)
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// ArgumentRule
// ---------------------------------------------------------------------------

/// How the residual argument is extracted once an entry has matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentRule {
    /// The intent takes no argument.
    Empty,
    /// Remove every occurrence of the keyword, collapse whitespace, trim.
    /// When `leading_verb` is set and the remainder starts with that word,
    /// the word is dropped too (`"play youtube lofi"` → `"lofi"`).
    StripKeyword { leading_verb: Option<&'static str> },
    /// Drop a fixed number of leading characters of the whole utterance,
    /// then trim.
    ///
    /// This is positional, not keyword-relative: it only yields the intended
    /// residue when the keyword is the utterance's first word.
    /// `"what is the weather in Paris"` keeps `"the weather in Paris"`.
    SkipChars(usize),
    /// Collect every secondary language keyword present, in
    /// [`INTRO_LANGUAGES`] order, space separated.
    Languages,
}

impl ArgumentRule {
    /// Apply the rule to `utterance` on behalf of `keyword`.
    pub fn extract(&self, utterance: &str, keyword: &str) -> String {
        match *self {
            ArgumentRule::Empty => String::new(),
            ArgumentRule::StripKeyword { leading_verb } => {
                let stripped = remove_keyword(utterance, keyword);
                let mut words: Vec<&str> = stripped.split_whitespace().collect();
                if let (Some(verb), Some(first)) = (leading_verb, words.first()) {
                    if first.eq_ignore_ascii_case(verb) {
                        words.remove(0);
                    }
                }
                words.join(" ")
            }
            ArgumentRule::SkipChars(n) => {
                let rest: String = utterance.chars().skip(n).collect();
                rest.trim().to_string()
            }
            ArgumentRule::Languages => {
                let normalized = utterance.to_ascii_lowercase();
                INTRO_LANGUAGES
                    .iter()
                    .filter(|lang| normalized.contains(**lang))
                    .copied()
                    .collect::<Vec<_>>()
                    .join(" ")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Keyword table
// ---------------------------------------------------------------------------

/// One row of the priority table.
#[derive(Debug, Clone, Copy)]
pub struct KeywordRule {
    pub keyword: &'static str,
    pub intent: Intent,
    pub argument: ArgumentRule,
}

/// Priority-ordered table, highest first.  Order here *is* the precedence.
pub static KEYWORD_TABLE: &[KeywordRule] = &[
    KeywordRule {
        keyword: "introduce",
        intent: Intent::Introduce,
        argument: ArgumentRule::Languages,
    },
    KeywordRule {
        keyword: "time",
        intent: Intent::Time,
        argument: ArgumentRule::Empty,
    },
    KeywordRule {
        keyword: "youtube",
        intent: Intent::PlayOnVideoSite,
        argument: ArgumentRule::StripKeyword {
            leading_verb: Some("play"),
        },
    },
    KeywordRule {
        keyword: "search",
        intent: Intent::WebSearch,
        argument: ArgumentRule::StripKeyword { leading_verb: None },
    },
    KeywordRule {
        keyword: "github",
        intent: Intent::OpenRepositoryPage,
        argument: ArgumentRule::SkipChars(7),
    },
    KeywordRule {
        keyword: "message",
        intent: Intent::SendMessage,
        argument: ArgumentRule::StripKeyword { leading_verb: None },
    },
    KeywordRule {
        keyword: "open",
        intent: Intent::OpenApplication,
        argument: ArgumentRule::SkipChars(4),
    },
    KeywordRule {
        keyword: "weather",
        intent: Intent::Weather,
        argument: ArgumentRule::SkipChars(8),
    },
    KeywordRule {
        keyword: "present",
        intent: Intent::Presentation,
        argument: ArgumentRule::Empty,
    },
    KeywordRule {
        keyword: "wiki",
        intent: Intent::Wiki,
        argument: ArgumentRule::SkipChars(4),
    },
];

/// Secondary keywords scanned by [`Intent::Introduce`], in playback order.
pub static INTRO_LANGUAGES: &[&str] = &["english", "chinese", "arabic", "urdu", "french"];

// ---------------------------------------------------------------------------
// classify
// ---------------------------------------------------------------------------

/// Result of classifying one utterance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub intent: Intent,
    /// Residual argument; may be empty.
    pub argument: String,
}

impl Classification {
    pub fn new(intent: Intent, argument: impl Into<String>) -> Self {
        Self {
            intent,
            argument: argument.into(),
        }
    }

    fn unknown() -> Self {
        Self::new(Intent::Unknown, String::new())
    }
}

/// Map an utterance to exactly one intent plus its argument.
///
/// ```
/// use voice_assistant::router::{classify, Intent};
///
/// let c = classify("open calculator");
/// assert_eq!(c.intent, Intent::OpenApplication);
/// assert_eq!(c.argument, "calculator");
/// ```
pub fn classify(utterance: &str) -> Classification {
    // Keywords are ASCII, so ASCII lowercasing keeps byte offsets aligned
    // with the original utterance.
    let normalized = utterance.to_ascii_lowercase();

    KEYWORD_TABLE
        .iter()
        .find(|rule| normalized.contains(rule.keyword))
        .map(|rule| Classification {
            intent: rule.intent,
            argument: rule.argument.extract(utterance, rule.keyword),
        })
        .unwrap_or_else(Classification::unknown)
}

/// Remove every ASCII-case-insensitive occurrence of `keyword`.
fn remove_keyword(utterance: &str, keyword: &str) -> String {
    let normalized = utterance.to_ascii_lowercase();
    let mut out = String::with_capacity(utterance.len());
    let mut cursor = 0;

    for (start, matched) in normalized.match_indices(keyword) {
        out.push_str(&utterance[cursor..start]);
        cursor = start + matched.len();
    }
    out.push_str(&utterance[cursor..]);
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // ---- single keyword ----

    #[test]
    fn video_scenario_drops_keyword_and_play_verb() {
        let c = classify("play youtube lofi beats");
        assert_eq!(c, Classification::new(Intent::PlayOnVideoSite, "lofi beats"));
    }

    #[test]
    fn video_keyword_removed_anywhere() {
        let c = classify("lofi beats on youtube");
        assert_eq!(c.argument, "lofi beats on");
    }

    #[test]
    fn search_strips_keyword_case_insensitively() {
        let c = classify("Search rust ownership");
        assert_eq!(c, Classification::new(Intent::WebSearch, "rust ownership"));
    }

    #[test]
    fn search_keeps_play_word() {
        let c = classify("search play dough recipes");
        assert_eq!(c.argument, "play dough recipes");
    }

    #[test]
    fn open_scenario_skips_four_chars() {
        let c = classify("open calculator");
        assert_eq!(c, Classification::new(Intent::OpenApplication, "calculator"));
    }

    #[test]
    fn github_skips_seven_chars() {
        let c = classify("github torvalds");
        assert_eq!(
            c,
            Classification::new(Intent::OpenRepositoryPage, "torvalds")
        );
    }

    #[test]
    fn message_argument_is_contact() {
        let c = classify("message mom");
        assert_eq!(c, Classification::new(Intent::SendMessage, "mom"));
    }

    #[test]
    fn weather_slice_is_positional() {
        let c = classify("what is the weather in Paris");
        assert_eq!(c.intent, Intent::Weather);
        assert_eq!(c.argument, "the weather in Paris");
        assert!(c.argument.ends_with("Paris"));
    }

    #[test]
    fn weather_as_first_word_yields_location() {
        let c = classify("weather Toronto");
        assert_eq!(c.argument, "Toronto");
    }

    #[test]
    fn wiki_skips_four_chars() {
        let c = classify("wiki Alan Turing");
        assert_eq!(c, Classification::new(Intent::Wiki, "Alan Turing"));
    }

    #[test]
    fn positional_slice_counts_characters_not_bytes() {
        let c = classify("wiki Émile Zola");
        assert_eq!(c.argument, "Émile Zola");
        let c = classify("wiki");
        assert_eq!(c.argument, "");
    }

    #[test]
    fn time_has_no_argument() {
        let c = classify("what time is it");
        assert_eq!(c, Classification::new(Intent::Time, ""));
    }

    #[test]
    fn presentation_matches_present() {
        assert_eq!(classify("start the presentation").intent, Intent::Presentation);
    }

    #[test]
    fn introduce_collects_languages_in_table_order() {
        let c = classify("introduce yourself in french and english");
        assert_eq!(c, Classification::new(Intent::Introduce, "english french"));
    }

    #[test]
    fn introduce_without_language_is_empty() {
        assert_eq!(classify("introduce yourself").argument, "");
    }

    // ---- precedence ----

    #[test]
    fn search_beats_weather_regardless_of_position() {
        assert_eq!(classify("weather search").intent, Intent::WebSearch);
        assert_eq!(classify("search weather").intent, Intent::WebSearch);
    }

    #[test]
    fn every_pair_resolves_to_higher_priority() {
        for (i, high) in KEYWORD_TABLE.iter().enumerate() {
            for low in &KEYWORD_TABLE[i + 1..] {
                let forward = format!("{} {}", low.keyword, high.keyword);
                let backward = format!("{} {}", high.keyword, low.keyword);
                assert_eq!(classify(&forward).intent, high.intent, "{forward}");
                assert_eq!(classify(&backward).intent, high.intent, "{backward}");
            }
        }
    }

    #[test]
    fn time_inside_youtube_query_wins() {
        // "time" outranks "youtube" even when it is part of the query.
        assert_eq!(classify("play youtube time lapse").intent, Intent::Time);
    }

    // ---- fallbacks and edge cases ----

    #[test]
    fn empty_utterance_is_unknown() {
        assert_eq!(classify(""), Classification::new(Intent::Unknown, ""));
    }

    #[test]
    fn unmatched_utterance_is_unknown_with_empty_argument() {
        assert_eq!(
            classify("make me a sandwich"),
            Classification::new(Intent::Unknown, "")
        );
    }

    #[test]
    fn keyword_only_yields_empty_argument() {
        assert_eq!(classify("youtube").argument, "");
        assert_eq!(classify("search").argument, "");
        assert_eq!(classify("message").argument, "");
        assert_eq!(classify("open").argument, "");
        assert_eq!(classify("github").argument, "");
    }

    #[test]
    fn uppercase_keywords_match() {
        assert_eq!(classify("YOUTUBE cats").intent, Intent::PlayOnVideoSite);
        assert_eq!(classify("YOUTUBE cats").argument, "cats");
    }

    #[test]
    fn keyword_lookup_per_intent() {
        assert_eq!(Intent::Weather.keyword(), Some("weather"));
        assert_eq!(Intent::Presentation.keyword(), Some("present"));
        assert_eq!(Intent::Unknown.keyword(), None);
    }

    #[test]
    fn remove_keyword_handles_repeats() {
        assert_eq!(remove_keyword("youtube a YouTube b", "youtube"), " a  b");
    }
}
