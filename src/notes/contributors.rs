//! Contributor resolution: assignees, commit authors, and co-authors
//! resolved through email lookup.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::github::ReleaseDataProvider;

/// Sentinel rendered when no contributor can be determined for an item.
pub const MISSING_CONTRIBUTOR: &str = "Missing Assignee or Contributor";

#[allow(clippy::unwrap_used)] // Compile-time constant regex pattern
static CO_AUTHOR_TRAILER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*Co-authored-by:\s*(?P<name>[^<\r\n]+?)\s*<(?P<email>[^>\r\n]+)>").unwrap()
});

/// Parses `Co-authored-by: Name <email>` trailers from a commit message,
/// returning `(name, email)` pairs in message order.
pub fn co_author_trailers(message: &str) -> Vec<(String, String)> {
    CO_AUTHOR_TRAILER
        .captures_iter(message)
        .map(|caps| (caps["name"].to_string(), caps["email"].to_string()))
        .collect()
}

/// Resolves the contributor set for one work item.
///
/// Order is deterministic for display: assignees first (input order), then
/// commit authors and co-authors in discovery order across the related PRs.
/// Membership is a set: a handle discovered twice appears once, at its first
/// position. When nothing resolves, the single [`MISSING_CONTRIBUTOR`]
/// sentinel is returned.
///
/// Lookup misses and per-PR fetch failures degrade locally: an email with
/// no public account falls back to the literal co-author name, and a PR
/// whose commits cannot be listed contributes nothing.
pub async fn resolve_contributors(
    provider: &dyn ReleaseDataProvider,
    assignees: &[String],
    related_pr_numbers: &[u64],
) -> Vec<String> {
    let mut contributors: Vec<String> = Vec::new();

    for assignee in assignees {
        push_unique(&mut contributors, format!("@{assignee}"));
    }

    for &pr_number in related_pr_numbers {
        let commits = match provider.pull_request_commits(pr_number).await {
            Ok(commits) => commits,
            Err(e) => {
                warn!(pr = pr_number, error = %e, "Failed to list PR commits, contributing nothing");
                Vec::new()
            }
        };

        for commit in commits {
            if let Some(login) = &commit.author_login {
                push_unique(&mut contributors, format!("@{login}"));
            }

            for (name, email) in co_author_trailers(&commit.message) {
                let resolved = match provider.search_user_by_email(&email).await {
                    Ok(Some(account)) => format!("@{}", account.login),
                    Ok(None) => {
                        debug!(email, "No public account found for co-author email");
                        name
                    }
                    Err(e) => {
                        warn!(email, error = %e, "User search failed, using literal co-author name");
                        name
                    }
                };
                push_unique(&mut contributors, resolved);
            }
        }
    }

    if contributors.is_empty() {
        vec![MISSING_CONTRIBUTOR.to_string()]
    } else {
        contributors
    }
}

fn push_unique(contributors: &mut Vec<String>, candidate: String) {
    if !contributors.contains(&candidate) {
        contributors.push(candidate);
    }
}
