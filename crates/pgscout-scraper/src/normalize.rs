//! Text normalization shared by the navigator and the extractors.

use std::collections::HashSet;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Turns free text into a lowercase, accent-free, underscore-joined token.
///
/// `"Ristoranti è Bar"` becomes `"ristoranti_e_bar"`. Characters outside
/// `[a-z0-9]` act as separators. Applying it to its own output is a no-op.
#[must_use]
pub fn slugify(text: &str) -> String {
    let folded: String = text
        .trim()
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() {
                c
            } else {
                ' '
            }
        })
        .collect();

    folded.split_whitespace().collect::<Vec<_>>().join("_")
}

/// Collapses internal whitespace runs to one space and trims the ends.
#[must_use]
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whitespace-collapses every label, drops empties and repeats (first one
/// wins), and keeps at most `limit` entries.
#[must_use]
pub fn dedup_labels<I, S>(labels: I, limit: usize) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    labels
        .into_iter()
        .map(|label| collapse_whitespace(label.as_ref()))
        .filter(|label| !label.is_empty())
        .filter(|label| seen.insert(label.clone()))
        .take(limit)
        .collect()
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
