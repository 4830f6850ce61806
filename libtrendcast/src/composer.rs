//! Post composer
//!
//! Renders a video into the exact text that gets published. The rendered
//! text is also the deduplication key in the ledger, so every byte of the
//! template (emoji, separators, line breaks) is significant.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::types::VideoSnapshot;

/// Exact text of a post; compared byte for byte
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Payload(String);

impl Payload {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Payload {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Payload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Group digits in threes with `.` (Turkish convention): 1234567 -> "1.234.567"
pub fn format_view_count(view_count: u64) -> String {
    let digits = view_count.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(c);
    }
    out
}

/// Render a post for `video` with `hashtags` in their set (sorted) order
pub fn compose(video: &VideoSnapshot, hashtags: &BTreeSet<String>) -> Payload {
    let tags = hashtags
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ");

    Payload(format!(
        "🔥 YouTube'da Trend: {}\n📍 Trend Ülke: {}\n👀 İzle: {}\n👁️ Görüntülenme: {}\n{}",
        video.title,
        video.region.label(),
        video.url,
        format_view_count(video.view_count),
        tags
    ))
}
