//! The categorization and aggregation engine.
//!
//! Orchestrates the full pipeline: activity window from the latest release,
//! per-issue and per-PR classification, anomaly collection, and final
//! markdown assembly.

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

pub mod classify;
pub mod contributors;
pub mod extract;
pub mod report;

pub use classify::{classify_issue, classify_pull_request, linked_issue_numbers, ReleaseNoteEntry};
pub use contributors::{resolve_contributors, MISSING_CONTRIBUTOR};
pub use extract::extract_release_notes;
pub use report::{build_report, AnomalyKind, DisplayOptions, ReportBuckets};

use crate::config::{GeneratorConfig, RepoId};
use crate::github::{IssueState, PullRequest, Release, ReleaseDataProvider};

/// Generates the complete release-notes markdown document.
///
/// Classification always runs in full; the `warnings` and
/// `print-empty-chapters` options only shape rendering. List-level provider
/// failures abort the run, per-item failures degrade to empty data inside
/// the classifiers.
pub async fn generate_release_notes(
    provider: &dyn ReleaseDataProvider,
    config: &GeneratorConfig,
) -> Result<String> {
    let release = provider
        .latest_release()
        .await
        .context("Failed to fetch the latest release")?;
    let since = release
        .as_ref()
        .map(|r| r.cutoff(config.use_published_at));
    match &release {
        Some(release) => info!(tag = %release.tag_name, "Generating notes since last release"),
        None => info!("No prior release, generating notes over the full history"),
    }

    let mut buckets = ReportBuckets::new();

    let issues = provider
        .closed_issues_since(since, &config.skip_release_notes_label)
        .await
        .context("Failed to list closed issues")?;
    info!(count = issues.len(), "Classifying closed issues");

    // The API returns newest activity first; process oldest-closed-first so
    // anomaly and chapter listings read chronologically
    for issue in issues.iter().rev() {
        let classification = classify_issue(provider, issue, &config.chapters).await;
        let entry = &classification.entry;
        debug!(
            issue = issue.number,
            chapters = classification.matched_titles.len(),
            related_prs = entry.related.len(),
            curated = entry.has_curated_note(),
            "Classified issue"
        );

        buckets.place_in_chapters(&classification.matched_titles, entry);

        // The three completeness checks are independent: one issue may
        // trigger all of them
        if classification.matched_titles.is_empty() {
            buckets.record_anomaly(
                AnomalyKind::IssuesWithoutUserLabels,
                issue.number,
                entry.render(false),
            );
        }
        if entry.related.is_empty() {
            buckets.record_anomaly(
                AnomalyKind::IssuesWithoutPullRequest,
                issue.number,
                entry.render(false),
            );
        }
        if !entry.has_curated_note() {
            buckets.record_anomaly(
                AnomalyKind::IssuesWithoutReleaseNotes,
                issue.number,
                entry.render(false),
            );
        }
    }

    let mut pulls = provider
        .pull_requests_since(since, &config.skip_release_notes_label)
        .await
        .context("Failed to list finished pull requests")?;
    pulls.sort_by_key(|pr| pr.created_at);
    info!(count = pulls.len(), "Classifying finished pull requests");

    for pull in pulls.iter().filter(|p| p.is_merged()) {
        classify_merged_pull(provider, pull, config, &mut buckets).await;
    }

    for pull in pulls.iter().filter(|p| !p.is_merged()) {
        let linked = linked_issue_numbers(&pull.body);
        if !linked.is_empty() {
            continue;
        }
        let classification = classify_pull_request(provider, pull, &config.chapters, false).await;
        buckets.record_anomaly(
            AnomalyKind::ClosedPrsWithoutIssue,
            pull.number,
            classification.entry.render(false),
        );
    }

    let changelog = changelog_url(&config.repository, release.as_ref(), &config.tag_name);
    let options = DisplayOptions {
        warnings: config.warnings,
        print_empty_chapters: config.print_empty_chapters,
    };
    Ok(build_report(&config.chapters, &buckets, options, &changelog))
}

/// Classifies one merged PR: unlinked ones go into chapters and/or the
/// "merged without issue" bucket; linked ones are checked against the state
/// of every referenced issue.
async fn classify_merged_pull(
    provider: &dyn ReleaseDataProvider,
    pull: &PullRequest,
    config: &GeneratorConfig,
    buckets: &mut ReportBuckets,
) {
    let linked = linked_issue_numbers(&pull.body);

    if linked.is_empty() {
        let classification = classify_pull_request(
            provider,
            pull,
            &config.chapters,
            config.chapters_to_pr_without_issue,
        )
        .await;
        buckets.place_in_chapters(&classification.matched_titles, &classification.entry);
        if classification.matched_titles.is_empty() {
            buckets.record_anomaly(
                AnomalyKind::MergedPrsWithoutIssue,
                pull.number,
                classification.entry.render(false),
            );
        }
        return;
    }

    // A merged PR whose referenced issue is still open will ship before the
    // issue is fully resolved
    for number in linked {
        match provider.issue(number).await {
            Ok(Some(issue)) if issue.state == IssueState::Open => {
                buckets.record_anomaly(
                    AnomalyKind::MergedPrsLinkedToOpenIssue,
                    pull.number,
                    format!("- #{} _{}_", pull.number, pull.title),
                );
                break;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(pr = pull.number, issue = number, error = %e,
                    "Failed to resolve linked issue, skipping open-issue check");
            }
        }
    }
}

/// Builds the full-changelog link: a compare URL between the two release
/// points, or the plain commit history up to the tag for a first release.
fn changelog_url(repo: &RepoId, previous: Option<&Release>, tag_name: &str) -> String {
    match previous {
        Some(previous) => format!(
            "https://github.com/{}/{}/compare/{}...{tag_name}",
            repo.owner, repo.name, previous.tag_name
        ),
        None => format!("https://github.com/{}/{}/commits/{tag_name}", repo.owner, repo.name),
    }
}
