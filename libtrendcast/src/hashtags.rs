//! Hashtag extraction
//!
//! The extractor turns a video's title and description into `#`-prefixed
//! tags. Results are `BTreeSet`s so the rendered tag line is always in the
//! same (sorted) order for the same input.

use std::collections::BTreeSet;

/// Tags added to every post
pub const GENERAL_HASHTAGS: [&str; 6] = [
    "#trending",
    "#Turkey",
    "#USA",
    "#YouTube",
    "#viral",
    "#video",
];

/// Source of dynamic hashtags for a video
pub trait HashtagExtractor: Send + Sync {
    /// Extract tags from free text. Each tag carries its `#` marker.
    ///
    /// Must be a pure function of its inputs. Unusable input yields an empty set.
    fn extract(&self, title: &str, description: &str) -> BTreeSet<String>;
}

/// Union of the general tags with whatever `extractor` finds
pub fn hashtags_for(
    extractor: &dyn HashtagExtractor,
    general: &[String],
    title: &str,
    description: &str,
) -> BTreeSet<String> {
    let mut tags: BTreeSet<String> = general.iter().cloned().collect();
    tags.extend(extractor.extract(title, description));
    tags
}

/// Default general tags as owned strings, for configuration defaults
pub fn default_general_hashtags() -> Vec<String> {
    GENERAL_HASHTAGS.iter().map(|t| t.to_string()).collect()
}

const STOP_WORDS: &[&str] = &[
    "about", "after", "again", "also", "been", "before", "being", "could", "does", "each",
    "either", "every", "from", "have", "here", "into", "just", "like", "more", "most", "much",
    "only", "other", "over", "same", "should", "some", "such", "than", "that", "their", "them",
    "then", "there", "these", "they", "this", "those", "very", "what", "when", "where", "which",
    "while", "will", "with", "would", "your", "official", "video", "watch", "subscribe",
    "channel", "full", "episode", "bir", "için", "gibi", "daha", "çok", "olan", "ile",
];

/// Heuristic keyword extractor
///
/// Picks capitalized words longer than three characters that are not stop
/// words, in order of first appearance, up to `max_tags`.
#[derive(Debug, Clone)]
pub struct KeywordExtractor {
    max_tags: usize,
}

impl KeywordExtractor {
    pub fn new(max_tags: usize) -> Self {
        Self { max_tags }
    }
}

impl Default for KeywordExtractor {
    fn default() -> Self {
        Self::new(5)
    }
}

impl HashtagExtractor for KeywordExtractor {
    fn extract(&self, title: &str, description: &str) -> BTreeSet<String> {
        let text = format!("{} {}", title, description);
        let mut seen = BTreeSet::new();
        let mut tags = BTreeSet::new();

        for raw in text.split_whitespace() {
            if tags.len() >= self.max_tags {
                break;
            }

            let word: String = raw.chars().filter(|c| c.is_alphanumeric()).collect();
            if word.chars().count() <= 3 {
                continue;
            }
            if !word.chars().next().is_some_and(char::is_uppercase) {
                continue;
            }
            if word.chars().all(|c| c.is_numeric()) {
                continue;
            }

            let lowered = word.to_lowercase();
            if STOP_WORDS.contains(&lowered.as_str()) || !seen.insert(lowered) {
                continue;
            }

            tags.insert(format!("#{}", word));
        }

        tags
    }
}
