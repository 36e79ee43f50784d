//! GitHub data access: the read-only queries the engine consumes, plus the
//! reqwest-backed client that answers them.

use std::future::Future;
use std::pin::Pin;

use anyhow::Result;
use chrono::{DateTime, Utc};

pub mod client;
pub mod error;
pub mod model;

pub use client::GithubClient;
pub use error::GithubError;
pub use model::{
    related_pull_requests, Comment, Commit, Issue, IssueState, PullRequest, Release,
    RelatedPullRequest, TimelineEvent, TimelineSource, UserAccount,
};

/// Boxed future returned by provider methods.
pub type ProviderFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Read-only repository activity queries consumed by the engine.
///
/// Implementations may pipeline or batch network calls internally; the
/// engine only relies on the result shapes. Failures cross this boundary as
/// errors and are degraded to empty data per item by the caller, except for
/// the top-level release fetch.
pub trait ReleaseDataProvider: Send + Sync {
    /// Latest published release, or `None` when the repository has no
    /// releases yet (the "first release" state, not an error).
    fn latest_release(&self) -> ProviderFuture<'_, Option<Release>>;

    /// Closed issues updated since the cutoff, oldest activity last (API
    /// order). Skip-labeled issues and PR-shaped entries are filtered out.
    fn closed_issues_since<'a>(
        &'a self,
        since: Option<DateTime<Utc>>,
        skip_label: &'a str,
    ) -> ProviderFuture<'a, Vec<Issue>>;

    /// A single issue by number, or `None` when it does not exist.
    fn issue(&self, number: u64) -> ProviderFuture<'_, Option<Issue>>;

    /// Timeline events for one issue.
    fn issue_timeline(&self, number: u64) -> ProviderFuture<'_, Vec<TimelineEvent>>;

    /// Comments on one issue, ordered by creation.
    fn issue_comments(&self, number: u64) -> ProviderFuture<'_, Vec<Comment>>;

    /// Finished (closed or merged) pull requests whose closing activity
    /// falls after the cutoff. Skip-labeled PRs are filtered out.
    fn pull_requests_since<'a>(
        &'a self,
        since: Option<DateTime<Utc>>,
        skip_label: &'a str,
    ) -> ProviderFuture<'a, Vec<PullRequest>>;

    /// Commits belonging to one pull request.
    fn pull_request_commits(&self, number: u64) -> ProviderFuture<'_, Vec<Commit>>;

    /// Review comments on one pull request, ordered by creation.
    fn pull_request_review_comments(&self, number: u64) -> ProviderFuture<'_, Vec<Comment>>;

    /// Zero-or-one public account whose profile email matches.
    fn search_user_by_email<'a>(&'a self, email: &'a str)
        -> ProviderFuture<'a, Option<UserAccount>>;
}
