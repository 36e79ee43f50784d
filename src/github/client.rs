//! Reqwest-backed GitHub REST client implementing [`ReleaseDataProvider`].
//!
//! The client owns wire-format concerns: headers, pagination, status
//! mapping, and conversion from REST payloads to the domain models. It does
//! not retry; transient failures surface as errors and the engine decides
//! how to degrade.

use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use super::error::GithubError;
use super::model::{
    Comment, Commit, Issue, IssueState, PullRequest, Release, TimelineEvent, TimelineSource,
    UserAccount,
};
use super::{ProviderFuture, ReleaseDataProvider};
use crate::config::RepoId;

/// Public GitHub REST API endpoint.
pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";

const PER_PAGE: usize = 100;

/// GitHub REST API client scoped to one repository.
pub struct GithubClient {
    /// HTTP client for API requests.
    client: Client,
    /// Bearer token used for authentication.
    token: String,
    /// API base URL (overridable for tests).
    base_url: Url,
    /// Repository all queries are scoped to.
    repo: RepoId,
}

impl GithubClient {
    /// Creates a client against the public GitHub API.
    pub fn new(repo: RepoId, token: String) -> Result<Self, GithubError> {
        Self::with_base_url(repo, token, DEFAULT_API_BASE_URL)
    }

    /// Creates a client against a custom API base URL.
    pub fn with_base_url(
        repo: RepoId,
        token: String,
        base_url: &str,
    ) -> Result<Self, GithubError> {
        // Url::join treats a path without a trailing slash as a file
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        let base_url =
            Url::parse(&normalized).map_err(|e| GithubError::InvalidBaseUrl(e.to_string()))?;

        Ok(Self {
            client: Client::new(),
            token,
            base_url,
            repo,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, GithubError> {
        self.base_url
            .join(path)
            .map_err(|e| GithubError::InvalidBaseUrl(e.to_string()))
    }

    fn request(&self, url: Url) -> RequestBuilder {
        self.client
            .get(url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", concat!("relnotes/", env!("CARGO_PKG_VERSION")))
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        what: &str,
    ) -> Result<T, GithubError> {
        let response = request
            .send()
            .await
            .map_err(|e| GithubError::NetworkError(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(GithubError::AuthFailed);
        }
        if status == StatusCode::NOT_FOUND {
            return Err(GithubError::NotFound(what.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GithubError::RequestFailed {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| GithubError::InvalidResponseFormat(e.to_string()))
    }

    /// Fetches every page of a list endpoint.
    async fn get_paged<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, GithubError> {
        let mut items: Vec<T> = Vec::new();
        let mut page = 1usize;
        loop {
            let request = self
                .request(self.endpoint(path)?)
                .query(query)
                .query(&[("per_page", PER_PAGE.to_string()), ("page", page.to_string())]);
            let batch: Vec<T> = self.send_json(request, path).await?;
            let batch_len = batch.len();
            items.extend(batch);
            if batch_len < PER_PAGE {
                break;
            }
            page += 1;
        }
        debug!(path, pages = page, count = items.len(), "Fetched paged resource");
        Ok(items)
    }

    async fn fetch_latest_release(&self) -> Result<Option<Release>, GithubError> {
        let path = format!("repos/{}/{}/releases/latest", self.repo.owner, self.repo.name);
        let request = self.request(self.endpoint(&path)?);
        match self.send_json::<RawRelease>(request, "latest release").await {
            Ok(raw) => {
                info!(tag = %raw.tag_name, created_at = %raw.created_at, "Found latest release");
                Ok(Some(raw.into()))
            }
            // No release yet is a valid "first release" state
            Err(GithubError::NotFound(_)) => {
                info!(repo = %self.repo, "No prior release found");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn fetch_closed_issues(
        &self,
        since: Option<DateTime<Utc>>,
        skip_label: &str,
    ) -> Result<Vec<Issue>, GithubError> {
        let path = format!("repos/{}/{}/issues", self.repo.owner, self.repo.name);
        let mut query = vec![("state", "closed".to_string())];
        if let Some(since) = since {
            query.push(("since", since.to_rfc3339()));
        }

        let raw: Vec<RawIssue> = self.get_paged(&path, &query).await?;
        let issues: Vec<Issue> = raw
            .into_iter()
            // The issues listing also returns PR-shaped entries
            .filter(|i| i.pull_request.is_none())
            .filter(|i| i.state == "closed")
            .filter(|i| !i.labels.iter().any(|l| l.name == skip_label))
            .map(Issue::from)
            .collect();
        info!(count = issues.len(), "Found closed issues since last release");
        Ok(issues)
    }

    async fn fetch_issue(&self, number: u64) -> Result<Option<Issue>, GithubError> {
        let path = format!(
            "repos/{}/{}/issues/{number}",
            self.repo.owner, self.repo.name
        );
        let request = self.request(self.endpoint(&path)?);
        match self
            .send_json::<RawIssue>(request, &format!("issue #{number}"))
            .await
        {
            Ok(raw) => Ok(Some(raw.into())),
            Err(GithubError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn fetch_issue_timeline(&self, number: u64) -> Result<Vec<TimelineEvent>, GithubError> {
        let path = format!(
            "repos/{}/{}/issues/{number}/timeline",
            self.repo.owner, self.repo.name
        );
        let raw: Vec<RawTimelineEvent> = self.get_paged(&path, &[]).await?;
        Ok(raw.into_iter().map(TimelineEvent::from).collect())
    }

    async fn fetch_issue_comments(&self, number: u64) -> Result<Vec<Comment>, GithubError> {
        let path = format!(
            "repos/{}/{}/issues/{number}/comments",
            self.repo.owner, self.repo.name
        );
        let raw: Vec<RawComment> = self.get_paged(&path, &[]).await?;
        Ok(raw.into_iter().map(Comment::from).collect())
    }

    async fn fetch_pull_requests(
        &self,
        since: Option<DateTime<Utc>>,
        skip_label: &str,
    ) -> Result<Vec<PullRequest>, GithubError> {
        let path = format!("repos/{}/{}/pulls", self.repo.owner, self.repo.name);
        let query = vec![
            ("state", "closed".to_string()),
            ("sort", "created".to_string()),
            ("direction", "asc".to_string()),
        ];

        let raw: Vec<RawPullRequest> = self.get_paged(&path, &query).await?;
        let pulls: Vec<PullRequest> = raw
            .into_iter()
            .filter(|p| !p.labels.iter().any(|l| l.name == skip_label))
            .map(PullRequest::from)
            // The pulls listing has no `since` filter; cut on finish time
            .filter(|p| match since {
                Some(cutoff) => p
                    .merged_at
                    .or(p.closed_at)
                    .is_some_and(|finished| finished >= cutoff),
                None => true,
            })
            .collect();
        info!(count = pulls.len(), "Found finished PRs since last release");
        Ok(pulls)
    }

    async fn fetch_pull_request_commits(&self, number: u64) -> Result<Vec<Commit>, GithubError> {
        let path = format!(
            "repos/{}/{}/pulls/{number}/commits",
            self.repo.owner, self.repo.name
        );
        let raw: Vec<RawPullCommit> = self.get_paged(&path, &[]).await?;
        Ok(raw.into_iter().map(Commit::from).collect())
    }

    async fn fetch_pull_request_review_comments(
        &self,
        number: u64,
    ) -> Result<Vec<Comment>, GithubError> {
        let path = format!(
            "repos/{}/{}/pulls/{number}/comments",
            self.repo.owner, self.repo.name
        );
        let raw: Vec<RawComment> = self.get_paged(&path, &[]).await?;
        Ok(raw.into_iter().map(Comment::from).collect())
    }

    async fn fetch_user_by_email(&self, email: &str) -> Result<Option<UserAccount>, GithubError> {
        debug!(email, "Searching for GitHub user by email");
        let request = self
            .request(self.endpoint("search/users")?)
            .query(&[("q", format!("{email} in:email"))]);
        let result: RawUserSearch = self.send_json(request, "user search").await?;
        Ok(result
            .items
            .into_iter()
            .next()
            .map(|u| UserAccount { login: u.login }))
    }
}

impl ReleaseDataProvider for GithubClient {
    fn latest_release(&self) -> ProviderFuture<'_, Option<Release>> {
        Box::pin(async move { Ok(self.fetch_latest_release().await?) })
    }

    fn closed_issues_since<'a>(
        &'a self,
        since: Option<DateTime<Utc>>,
        skip_label: &'a str,
    ) -> ProviderFuture<'a, Vec<Issue>> {
        Box::pin(async move { Ok(self.fetch_closed_issues(since, skip_label).await?) })
    }

    fn issue(&self, number: u64) -> ProviderFuture<'_, Option<Issue>> {
        Box::pin(async move { Ok(self.fetch_issue(number).await?) })
    }

    fn issue_timeline(&self, number: u64) -> ProviderFuture<'_, Vec<TimelineEvent>> {
        Box::pin(async move { Ok(self.fetch_issue_timeline(number).await?) })
    }

    fn issue_comments(&self, number: u64) -> ProviderFuture<'_, Vec<Comment>> {
        Box::pin(async move { Ok(self.fetch_issue_comments(number).await?) })
    }

    fn pull_requests_since<'a>(
        &'a self,
        since: Option<DateTime<Utc>>,
        skip_label: &'a str,
    ) -> ProviderFuture<'a, Vec<PullRequest>> {
        Box::pin(async move { Ok(self.fetch_pull_requests(since, skip_label).await?) })
    }

    fn pull_request_commits(&self, number: u64) -> ProviderFuture<'_, Vec<Commit>> {
        Box::pin(async move { Ok(self.fetch_pull_request_commits(number).await?) })
    }

    fn pull_request_review_comments(&self, number: u64) -> ProviderFuture<'_, Vec<Comment>> {
        Box::pin(async move { Ok(self.fetch_pull_request_review_comments(number).await?) })
    }

    fn search_user_by_email<'a>(
        &'a self,
        email: &'a str,
    ) -> ProviderFuture<'a, Option<UserAccount>> {
        Box::pin(async move { Ok(self.fetch_user_by_email(email).await?) })
    }
}

// --- Wire format ---

#[derive(Deserialize, Debug)]
struct RawLabel {
    name: String,
}

#[derive(Deserialize, Debug)]
struct RawUser {
    login: String,
}

#[derive(Deserialize, Debug)]
struct RawRelease {
    tag_name: String,
    created_at: DateTime<Utc>,
    published_at: Option<DateTime<Utc>>,
}

impl From<RawRelease> for Release {
    fn from(raw: RawRelease) -> Self {
        Self {
            tag_name: raw.tag_name,
            created_at: raw.created_at,
            published_at: raw.published_at,
        }
    }
}

#[derive(Deserialize, Debug)]
struct RawIssue {
    number: u64,
    title: String,
    state: String,
    #[serde(default)]
    labels: Vec<RawLabel>,
    #[serde(default)]
    assignees: Vec<RawUser>,
    created_at: DateTime<Utc>,
    closed_at: Option<DateTime<Utc>>,
    /// Present when the entry in an issues listing is actually a PR.
    pull_request: Option<serde_json::Value>,
}

impl From<RawIssue> for Issue {
    fn from(raw: RawIssue) -> Self {
        Self {
            number: raw.number,
            title: raw.title,
            state: if raw.state == "closed" {
                IssueState::Closed
            } else {
                IssueState::Open
            },
            labels: raw.labels.into_iter().map(|l| l.name).collect(),
            assignees: raw.assignees.into_iter().map(|u| u.login).collect(),
            created_at: raw.created_at,
            closed_at: raw.closed_at,
        }
    }
}

#[derive(Deserialize, Debug)]
struct RawPullRequest {
    number: u64,
    title: String,
    body: Option<String>,
    #[serde(default)]
    labels: Vec<RawLabel>,
    #[serde(default)]
    assignees: Vec<RawUser>,
    created_at: DateTime<Utc>,
    closed_at: Option<DateTime<Utc>>,
    merged_at: Option<DateTime<Utc>>,
}

impl From<RawPullRequest> for PullRequest {
    fn from(raw: RawPullRequest) -> Self {
        Self {
            number: raw.number,
            title: raw.title,
            body: raw.body.unwrap_or_default(),
            labels: raw.labels.into_iter().map(|l| l.name).collect(),
            assignees: raw.assignees.into_iter().map(|u| u.login).collect(),
            created_at: raw.created_at,
            closed_at: raw.closed_at,
            merged_at: raw.merged_at,
        }
    }
}

#[derive(Deserialize, Debug)]
struct RawTimelineEvent {
    event: String,
    source: Option<RawTimelineSource>,
}

#[derive(Deserialize, Debug)]
struct RawTimelineSource {
    issue: Option<RawSourceIssue>,
}

#[derive(Deserialize, Debug)]
struct RawSourceIssue {
    number: u64,
    html_url: String,
    pull_request: Option<serde_json::Value>,
}

impl From<RawTimelineEvent> for TimelineEvent {
    fn from(raw: RawTimelineEvent) -> Self {
        Self {
            event: raw.event,
            source: raw.source.and_then(|s| s.issue).map(|i| TimelineSource {
                number: i.number,
                url: i.html_url,
                is_pull_request: i.pull_request.is_some(),
            }),
        }
    }
}

#[derive(Deserialize, Debug)]
struct RawComment {
    user: Option<RawUser>,
    body: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<RawComment> for Comment {
    fn from(raw: RawComment) -> Self {
        Self {
            author: raw.user.map(|u| u.login).unwrap_or_default(),
            body: raw.body.unwrap_or_default(),
            created_at: raw.created_at,
        }
    }
}

#[derive(Deserialize, Debug)]
struct RawPullCommit {
    author: Option<RawUser>,
    commit: RawCommitDetail,
}

#[derive(Deserialize, Debug)]
struct RawCommitDetail {
    message: String,
    author: Option<RawCommitAuthor>,
}

#[derive(Deserialize, Debug)]
struct RawCommitAuthor {
    name: String,
    email: String,
}

impl From<RawPullCommit> for Commit {
    fn from(raw: RawPullCommit) -> Self {
        let (name, email) = raw
            .commit
            .author
            .map(|a| (a.name, a.email))
            .unwrap_or_default();
        Self {
            author_login: raw.author.map(|u| u.login),
            author_name: name,
            author_email: email,
            message: raw.commit.message,
        }
    }
}

#[derive(Deserialize, Debug)]
struct RawUserSearch {
    #[allow(dead_code)]
    total_count: u64,
    #[serde(default)]
    items: Vec<RawUser>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo() -> RepoId {
        RepoId::parse("owner/repo").unwrap()
    }

    #[test]
    fn base_url_gets_trailing_slash() {
        let client =
            GithubClient::with_base_url(repo(), "t".to_string(), "http://localhost:8080").unwrap();
        assert_eq!(
            client.endpoint("repos/owner/repo/pulls").unwrap().as_str(),
            "http://localhost:8080/repos/owner/repo/pulls"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let result = GithubClient::with_base_url(repo(), "t".to_string(), "not a url");
        assert!(matches!(result, Err(GithubError::InvalidBaseUrl(_))));
    }

    #[test]
    fn issue_listing_entry_converts() {
        let raw: RawIssue = serde_json::from_str(
            r#"{
                "number": 7,
                "title": "Crash on startup",
                "state": "closed",
                "labels": [{"name": "bug"}],
                "assignees": [{"login": "alice"}],
                "created_at": "2024-01-01T00:00:00Z",
                "closed_at": "2024-01-03T00:00:00Z",
                "pull_request": null
            }"#,
        )
        .unwrap();
        let issue = Issue::from(raw);
        assert_eq!(issue.number, 7);
        assert_eq!(issue.state, IssueState::Closed);
        assert_eq!(issue.labels, vec!["bug"]);
        assert_eq!(issue.assignees, vec!["alice"]);
    }

    #[test]
    fn commit_without_account_keeps_git_author() {
        let raw: RawPullCommit = serde_json::from_str(
            r#"{
                "author": null,
                "commit": {
                    "message": "fix: handle empty input",
                    "author": {"name": "Jane Doe", "email": "jane@example.com"}
                }
            }"#,
        )
        .unwrap();
        let commit = Commit::from(raw);
        assert!(commit.author_login.is_none());
        assert_eq!(commit.author_name, "Jane Doe");
        assert_eq!(commit.author_email, "jane@example.com");
    }
}
