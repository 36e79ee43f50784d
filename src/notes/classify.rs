//! Per-item classification: building the rendered entry for one issue or
//! pull request and deciding which chapters it belongs to.
//!
//! Classification is side-effect free with respect to the report: each call
//! returns the entry plus matched chapter titles, and the orchestration
//! layer merges those into the buckets. That keeps every item independently
//! testable and removes cross-iteration state.

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use super::contributors::resolve_contributors;
use super::extract::extract_release_notes;
use crate::config::Chapters;
use crate::github::{
    related_pull_requests, Issue, PullRequest, RelatedPullRequest, ReleaseDataProvider,
};

#[allow(clippy::unwrap_used)] // Compile-time constant regex pattern
static CLOSING_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:close[sd]?|fix(?:e[sd])?|resolve[sd]?)\b:?\s*#(?P<num>\d+)").unwrap()
});

/// Issue numbers referenced with a closing keyword (`closes #12`,
/// `Fixed #7`, `resolve #3`) in a PR body, in occurrence order without
/// duplicates.
pub fn linked_issue_numbers(body: &str) -> Vec<u64> {
    let mut numbers: Vec<u64> = Vec::new();
    for caps in CLOSING_REFERENCE.captures_iter(body) {
        if let Ok(number) = caps["num"].parse::<u64>() {
            if !numbers.contains(&number) {
                numbers.push(number);
            }
        }
    }
    numbers
}

/// One classified item, ready to render into chapter and anomaly buckets.
#[derive(Debug, Clone)]
pub struct ReleaseNoteEntry {
    /// Number of the owning issue or PR.
    pub number: u64,
    /// Title of the owning item.
    pub title: String,
    /// Resolved contributor identifiers, display order.
    pub contributors: Vec<String>,
    /// Related PRs, rendered as links after the contributor list.
    pub related: Vec<RelatedPullRequest>,
    /// Normalized curated note blocks, comment order.
    pub note_blocks: Vec<String>,
}

impl ReleaseNoteEntry {
    /// Whether any qualifying release-note comment was found.
    pub fn has_curated_note(&self) -> bool {
        !self.note_blocks.is_empty()
    }

    /// Renders the entry, optionally with the duplicate marker that flags
    /// second and later chapter matches.
    pub fn render(&self, duplicate: bool) -> String {
        let bullet = if duplicate {
            "- _**[Duplicate]**_ #"
        } else {
            "- #"
        };
        let mut text = format!(
            "{bullet}{} _{}_ implemented by {}",
            self.number,
            self.title,
            self.contributors.join(", ")
        );
        if !self.related.is_empty() {
            let links: Vec<String> = self
                .related
                .iter()
                .map(RelatedPullRequest::markdown_link)
                .collect();
            text.push_str(&format!(" in {}", links.join(", ")));
        }
        for block in self.note_blocks.iter().filter(|b| !b.is_empty()) {
            text.push('\n');
            text.push_str(block);
        }
        text
    }
}

/// Chapter titles whose label set intersects the item's labels, in
/// configuration order.
pub fn matched_chapter_titles(item_labels: &[String], chapters: &Chapters) -> Vec<String> {
    chapters
        .iter()
        .filter(|chapter| chapter.matches(item_labels))
        .map(|chapter| chapter.title.clone())
        .collect()
}

/// Result of classifying one item.
#[derive(Debug)]
pub struct Classification {
    /// The rendered-entry source for this item.
    pub entry: ReleaseNoteEntry,
    /// Chapter titles the item belongs to; first is canonical.
    pub matched_titles: Vec<String>,
}

/// Classifies one closed issue: resolves related PRs from the timeline,
/// contributors, and curated notes, then matches labels against chapters.
///
/// Collaborator faults for this item degrade to empty data so a single bad
/// issue never aborts the run.
pub async fn classify_issue(
    provider: &dyn ReleaseDataProvider,
    issue: &Issue,
    chapters: &Chapters,
) -> Classification {
    let (timeline, comments) = tokio::join!(
        provider.issue_timeline(issue.number),
        provider.issue_comments(issue.number),
    );
    let timeline = or_empty(timeline, issue.number, "timeline");
    let comments = or_empty(comments, issue.number, "comments");

    let related = related_pull_requests(&timeline);
    let related_numbers: Vec<u64> = related.iter().map(|pr| pr.number).collect();
    let contributors = resolve_contributors(provider, &issue.assignees, &related_numbers).await;
    let note_blocks = extract_release_notes(&comments);

    Classification {
        entry: ReleaseNoteEntry {
            number: issue.number,
            title: issue.title.clone(),
            contributors,
            related,
            note_blocks,
        },
        matched_titles: matched_chapter_titles(&issue.labels, chapters),
    }
}

/// Classifies one unlinked pull request from its own commits and review
/// comments. Chapter matching by the PR's own labels only happens when
/// `into_chapters` is enabled.
pub async fn classify_pull_request(
    provider: &dyn ReleaseDataProvider,
    pull: &PullRequest,
    chapters: &Chapters,
    into_chapters: bool,
) -> Classification {
    let comments = or_empty(
        provider.pull_request_review_comments(pull.number).await,
        pull.number,
        "review comments",
    );
    let contributors = resolve_contributors(provider, &pull.assignees, &[pull.number]).await;
    let note_blocks = extract_release_notes(&comments);

    let matched_titles = if into_chapters {
        matched_chapter_titles(&pull.labels, chapters)
    } else {
        Vec::new()
    };

    Classification {
        entry: ReleaseNoteEntry {
            number: pull.number,
            title: pull.title.clone(),
            contributors,
            related: Vec::new(),
            note_blocks,
        },
        matched_titles,
    }
}

/// Degrades a failed per-item collaborator call to empty data.
fn or_empty<T>(result: anyhow::Result<Vec<T>>, number: u64, phase: &str) -> Vec<T> {
    match result {
        Ok(items) => items,
        Err(e) => {
            warn!(item = number, phase, error = %e, "Collaborator call failed, treating as empty");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notes::contributors::MISSING_CONTRIBUTOR;

    fn entry(number: u64) -> ReleaseNoteEntry {
        ReleaseNoteEntry {
            number,
            title: "Fix the flux capacitor".to_string(),
            contributors: vec!["@alice".to_string(), "@bob".to_string()],
            related: vec![RelatedPullRequest {
                number: 10,
                url: "https://github.com/o/r/pull/10".to_string(),
            }],
            note_blocks: vec!["  - recalibrated".to_string()],
        }
    }

    // --- linked_issue_numbers ---

    #[test]
    fn linkage_matches_all_keyword_tenses() {
        assert_eq!(linked_issue_numbers("Closes #12"), vec![12]);
        assert_eq!(linked_issue_numbers("this fixed #7 for good"), vec![7]);
        assert_eq!(linked_issue_numbers("Resolve #3"), vec![3]);
        assert_eq!(linked_issue_numbers("fixes: #9"), vec![9]);
    }

    #[test]
    fn linkage_is_case_insensitive() {
        assert_eq!(linked_issue_numbers("CLOSES #2"), vec![2]);
    }

    #[test]
    fn linkage_ignores_bare_references() {
        assert!(linked_issue_numbers("see #12 and #7").is_empty());
        assert!(linked_issue_numbers("unfixable #5").is_empty());
    }

    #[test]
    fn linkage_deduplicates_and_keeps_order() {
        assert_eq!(
            linked_issue_numbers("closes #5, fixes #2, closes #5"),
            vec![5, 2]
        );
    }

    // --- ReleaseNoteEntry::render ---

    #[test]
    fn render_canonical_entry() {
        assert_eq!(
            entry(5).render(false),
            "- #5 _Fix the flux capacitor_ implemented by @alice, @bob \
             in [#10](https://github.com/o/r/pull/10)\n  - recalibrated"
        );
    }

    #[test]
    fn render_duplicate_entry_swaps_bullet_prefix() {
        let text = entry(5).render(true);
        assert!(text.starts_with("- _**[Duplicate]**_ #5 _Fix the flux capacitor_"));
    }

    #[test]
    fn render_without_related_prs_omits_in_clause() {
        let mut e = entry(6);
        e.related.clear();
        e.note_blocks.clear();
        assert_eq!(
            e.render(false),
            "- #6 _Fix the flux capacitor_ implemented by @alice, @bob"
        );
    }

    #[test]
    fn render_skips_empty_note_blocks() {
        let mut e = entry(7);
        e.note_blocks = vec![String::new()];
        assert!(!e.render(false).ends_with('\n'));
        assert!(e.has_curated_note());
    }

    #[test]
    fn sentinel_contributor_renders_verbatim() {
        let mut e = entry(8);
        e.contributors = vec![MISSING_CONTRIBUTOR.to_string()];
        e.related.clear();
        e.note_blocks.clear();
        assert_eq!(
            e.render(false),
            "- #8 _Fix the flux capacitor_ implemented by Missing Assignee or Contributor"
        );
    }

    // --- matched_chapter_titles ---

    #[test]
    fn chapter_matching_respects_configuration_order() {
        let chapters = Chapters::from_json(
            r#"[
                {"title": "Breaking Changes 💥", "label": "breaking-change"},
                {"title": "New Features 🎉", "label": "feature"},
                {"title": "Bugfixes 🛠", "label": "bug"}
            ]"#,
        )
        .unwrap();

        let titles = matched_chapter_titles(
            &["bug".to_string(), "breaking-change".to_string()],
            &chapters,
        );
        assert_eq!(titles, vec!["Breaking Changes 💥", "Bugfixes 🛠"]);
    }

    #[test]
    fn unmatched_labels_yield_no_titles() {
        let chapters =
            Chapters::from_json(r#"[{"title": "Bugfixes", "label": "bug"}]"#).unwrap();
        assert!(matched_chapter_titles(&["docs".to_string()], &chapters).is_empty());
    }
}
