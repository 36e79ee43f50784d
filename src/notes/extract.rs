//! Curated release-note extraction from free-form comments.
//!
//! Maintainers embed operator-authored notes by starting a comment with a
//! "release notes" marker; everything after the marker line is normalized
//! into a uniform two-space-indented bullet block.

use crate::github::Comment;

/// Case-insensitive marker that opens a curated release-note comment.
const NOTE_MARKER: &str = "release notes";

/// Scans comments in order and returns one normalized note block per
/// qualifying comment.
///
/// A block may be empty when the qualifying comment contained nothing but
/// the marker line. No qualifying comment at all means "no curated note",
/// which the issue classifier surfaces as an anomaly.
pub fn extract_release_notes(comments: &[Comment]) -> Vec<String> {
    comments
        .iter()
        .filter_map(|comment| note_block(&comment.body))
        .collect()
}

/// Returns the normalized note block for one comment body, or `None` when
/// the body does not start with the marker.
fn note_block(body: &str) -> Option<String> {
    let body = body.trim_start();
    if !starts_with_marker(body) {
        return None;
    }

    // Drop the marker line entirely, including any trailing content on it
    let rest = body.split_once('\n').map_or("", |(_, rest)| rest);
    Some(normalize_block(rest))
}

fn starts_with_marker(body: &str) -> bool {
    body.get(..NOTE_MARKER.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(NOTE_MARKER))
}

/// Normalizes note lines: blank lines are dropped, bulleted lines keep
/// their dash and gain the uniform indent, everything else is rewritten as
/// an indented bullet.
fn normalize_block(content: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    for raw in content.lines() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with('-') {
            lines.push(format!("  {line}"));
        } else {
            lines.push(format!("  - {line}"));
        }
    }
    lines.join("\n")
}
