//! Report buckets and final markdown assembly.
//!
//! Buckets are keyed by item number in ordered maps, so every section
//! renders in ascending numeric order regardless of processing order and
//! the document is deterministic for a given data set.

use std::collections::{BTreeMap, HashMap};

use super::classify::ReleaseNoteEntry;
use crate::config::Chapters;

/// The six completeness checks that feed the warning sections, in render
/// order. Discriminants index the bucket array directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnomalyKind {
    /// Closed issues with no related pull request.
    IssuesWithoutPullRequest = 0,
    /// Closed issues matching none of the configured chapters.
    IssuesWithoutUserLabels = 1,
    /// Closed issues with no curated release-note comment.
    IssuesWithoutReleaseNotes = 2,
    /// Merged PRs neither linked to an issue nor matching a chapter.
    MergedPrsWithoutIssue = 3,
    /// Merged PRs whose linked issue is still open.
    MergedPrsLinkedToOpenIssue = 4,
    /// Closed (unmerged) PRs not linked to an issue.
    ClosedPrsWithoutIssue = 5,
}

impl AnomalyKind {
    /// All kinds, in the fixed section render order.
    pub const ALL: [Self; 6] = [
        Self::IssuesWithoutPullRequest,
        Self::IssuesWithoutUserLabels,
        Self::IssuesWithoutReleaseNotes,
        Self::MergedPrsWithoutIssue,
        Self::MergedPrsLinkedToOpenIssue,
        Self::ClosedPrsWithoutIssue,
    ];

    /// Markdown section heading.
    pub fn heading(self) -> &'static str {
        match self {
            Self::IssuesWithoutPullRequest => "Closed Issues without Pull Request ⚠️",
            Self::IssuesWithoutUserLabels => "Closed Issues without User Defined Labels ⚠️",
            Self::IssuesWithoutReleaseNotes => "Closed Issues without Release Notes ⚠️",
            Self::MergedPrsWithoutIssue => "Merged PRs without Linked Issue and Custom Labels ⚠️",
            Self::MergedPrsLinkedToOpenIssue => "Merged PRs Linked to Open Issue ⚠️",
            Self::ClosedPrsWithoutIssue => "Closed PRs without Linked Issue and Custom Labels ⚠️",
        }
    }

    /// Placeholder sentence when the section is empty.
    pub fn all_clear(self) -> &'static str {
        match self {
            Self::IssuesWithoutPullRequest => "All closed issues linked to a Pull Request.",
            Self::IssuesWithoutUserLabels => {
                "All closed issues contain at least one of user defined labels."
            }
            Self::IssuesWithoutReleaseNotes => "All closed issues have release notes.",
            Self::MergedPrsWithoutIssue => "All merged PRs are linked to issues.",
            Self::MergedPrsLinkedToOpenIssue => "All merged PRs are linked to Closed issues.",
            Self::ClosedPrsWithoutIssue => "All closed PRs are linked to issues.",
        }
    }
}

/// Placeholder for an empty thematic chapter.
const NO_ENTRIES: &str = "No entries detected.";

/// Accumulated chapter and anomaly entries for one run.
#[derive(Debug, Default)]
pub struct ReportBuckets {
    chapter_entries: HashMap<String, BTreeMap<u64, String>>,
    anomalies: [BTreeMap<u64, String>; 6],
}

impl ReportBuckets {
    /// Creates empty buckets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Places one classified entry into its matched chapters: the first
    /// title receives the canonical text, every later title a
    /// duplicate-flagged variant. Duplicates stay visible, they are never
    /// suppressed.
    pub fn place_in_chapters(&mut self, matched_titles: &[String], entry: &ReleaseNoteEntry) {
        for (position, title) in matched_titles.iter().enumerate() {
            let text = entry.render(position > 0);
            self.chapter_entries
                .entry(title.clone())
                .or_default()
                .insert(entry.number, text);
        }
    }

    /// Records one anomaly occurrence.
    pub fn record_anomaly(&mut self, kind: AnomalyKind, number: u64, text: String) {
        self.anomaly_bucket_mut(kind).insert(number, text);
    }

    /// Entries for one chapter title, if any were placed.
    pub fn chapter(&self, title: &str) -> Option<&BTreeMap<u64, String>> {
        self.chapter_entries.get(title)
    }

    /// Entries recorded for one anomaly kind.
    pub fn anomaly(&self, kind: AnomalyKind) -> &BTreeMap<u64, String> {
        &self.anomalies[kind as usize]
    }

    fn anomaly_bucket_mut(&mut self, kind: AnomalyKind) -> &mut BTreeMap<u64, String> {
        &mut self.anomalies[kind as usize]
    }
}

/// Render-time display toggles.
#[derive(Debug, Clone, Copy)]
pub struct DisplayOptions {
    /// Render the anomaly sections at all.
    pub warnings: bool,
    /// Render placeholder text for empty sections instead of omitting them.
    pub print_empty_chapters: bool,
}

/// Assembles the final markdown document: chapters in configuration order,
/// then the anomaly sections, then the changelog link.
pub fn build_report(
    chapters: &Chapters,
    buckets: &ReportBuckets,
    options: DisplayOptions,
    changelog_url: &str,
) -> String {
    let mut document = String::new();

    for chapter in chapters.iter() {
        let entries = buckets.chapter(&chapter.title);
        push_section(
            &mut document,
            &chapter.title,
            entries,
            NO_ENTRIES,
            options.print_empty_chapters,
        );
    }

    if options.warnings {
        for kind in AnomalyKind::ALL {
            push_section(
                &mut document,
                kind.heading(),
                Some(buckets.anomaly(kind)),
                kind.all_clear(),
                options.print_empty_chapters,
            );
        }
    }

    document.push_str(&format!("#### Full Changelog\n{changelog_url}\n"));
    document
}

/// Appends one `###` section: sorted entries when present, the placeholder
/// when empty and print-empty is on, nothing otherwise.
fn push_section(
    document: &mut String,
    heading: &str,
    entries: Option<&BTreeMap<u64, String>>,
    placeholder: &str,
    print_empty: bool,
) {
    let body = entries
        .filter(|map| !map.is_empty())
        .map(|map| map.values().cloned().collect::<Vec<_>>().join("\n"));

    match body {
        Some(body) => document.push_str(&format!("### {heading}\n{body}\n\n")),
        None if print_empty => {
            document.push_str(&format!("### {heading}\n{placeholder}\n\n"));
        }
        None => {}
    }
}
