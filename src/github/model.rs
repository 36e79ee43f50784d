//! Domain models for repository activity, decoupled from the REST wire
//! format so the engine can run against any data provider.

use chrono::{DateTime, Utc};

/// A published release, marking the lower boundary of the activity window.
#[derive(Debug, Clone)]
pub struct Release {
    /// Release tag, e.g. `v1.2.0`.
    pub tag_name: String,
    /// When the release object was created.
    pub created_at: DateTime<Utc>,
    /// When the release was published, if it was.
    pub published_at: Option<DateTime<Utc>>,
}

impl Release {
    /// Returns the activity cutoff timestamp for this release.
    ///
    /// Falls back to the creation time when the publish time is requested
    /// but absent (draft releases).
    pub fn cutoff(&self, use_published_at: bool) -> DateTime<Utc> {
        if use_published_at {
            self.published_at.unwrap_or(self.created_at)
        } else {
            self.created_at
        }
    }
}

/// Issue lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueState {
    /// The issue is still open.
    Open,
    /// The issue has been closed.
    Closed,
}

/// A repository issue.
#[derive(Debug, Clone)]
pub struct Issue {
    /// Issue number, unique within the repository.
    pub number: u64,
    /// Issue title.
    pub title: String,
    /// Current lifecycle state.
    pub state: IssueState,
    /// Label names attached to the issue.
    pub labels: Vec<String>,
    /// Assignee handles, in assignment order.
    pub assignees: Vec<String>,
    /// When the issue was created.
    pub created_at: DateTime<Utc>,
    /// When the issue was closed, if it was.
    pub closed_at: Option<DateTime<Utc>>,
}

/// A pull request in a finished (closed or merged) state.
#[derive(Debug, Clone)]
pub struct PullRequest {
    /// PR number, unique within the repository.
    pub number: u64,
    /// PR title.
    pub title: String,
    /// Free-form PR body, scanned for closing-keyword issue references.
    pub body: String,
    /// Label names attached to the PR.
    pub labels: Vec<String>,
    /// Assignee handles, in assignment order.
    pub assignees: Vec<String>,
    /// When the PR was opened.
    pub created_at: DateTime<Utc>,
    /// When the PR was closed, if it was.
    pub closed_at: Option<DateTime<Utc>>,
    /// When the PR was merged; `None` means closed without merging.
    pub merged_at: Option<DateTime<Utc>>,
}

impl PullRequest {
    /// Returns whether this PR was merged (rather than just closed).
    pub fn is_merged(&self) -> bool {
        self.merged_at.is_some()
    }
}

/// One event from an issue's timeline.
#[derive(Debug, Clone)]
pub struct TimelineEvent {
    /// Event kind, e.g. `cross-referenced` or `labeled`.
    pub event: String,
    /// The referencing item, for cross-reference events.
    pub source: Option<TimelineSource>,
}

/// The item that referenced an issue in a timeline cross-reference.
#[derive(Debug, Clone)]
pub struct TimelineSource {
    /// Number of the referencing issue or PR.
    pub number: u64,
    /// Display URL of the referencing item.
    pub url: String,
    /// Whether the referencing item is a pull request.
    pub is_pull_request: bool,
}

/// A pull request linked to an issue via a timeline cross-reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedPullRequest {
    /// PR number.
    pub number: u64,
    /// Display URL used when rendering the link.
    pub url: String,
}

impl RelatedPullRequest {
    /// Renders the PR as a markdown link, `[#12](url)`.
    pub fn markdown_link(&self) -> String {
        format!("[#{}]({})", self.number, self.url)
    }
}

/// Extracts related pull requests from an issue's timeline: cross-reference
/// events whose source is a pull request, in timeline order.
pub fn related_pull_requests(events: &[TimelineEvent]) -> Vec<RelatedPullRequest> {
    events
        .iter()
        .filter(|e| e.event == "cross-referenced")
        .filter_map(|e| e.source.as_ref())
        .filter(|s| s.is_pull_request)
        .map(|s| RelatedPullRequest {
            number: s.number,
            url: s.url.clone(),
        })
        .collect()
}

/// An issue or review comment.
#[derive(Debug, Clone)]
pub struct Comment {
    /// Handle of the comment author.
    pub author: String,
    /// Comment body.
    pub body: String,
    /// When the comment was created.
    pub created_at: DateTime<Utc>,
}

/// One commit belonging to a pull request.
#[derive(Debug, Clone)]
pub struct Commit {
    /// Platform login of the commit author, when the commit is attributed
    /// to an account.
    pub author_login: Option<String>,
    /// Author name recorded in the commit itself.
    pub author_name: String,
    /// Author email recorded in the commit itself.
    pub author_email: String,
    /// Full commit message, scanned for co-author trailers.
    pub message: String,
}

/// A user account found by email search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAccount {
    /// Platform login of the account.
    pub login: String,
}
