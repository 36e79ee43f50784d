//! GitHub-specific error handling.

use thiserror::Error;

/// GitHub API specific errors.
#[derive(Error, Debug)]
pub enum GithubError {
    /// Token not found in environment variables.
    #[error("GitHub token not found. Set the GITHUB_TOKEN environment variable")]
    TokenNotFound,

    /// Authentication was rejected by the API.
    #[error("Authentication failed. Please check your GitHub token")]
    AuthFailed,

    /// The requested resource does not exist.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// The API returned a non-success status.
    #[error("GitHub API request failed: HTTP {status}: {body}")]
    RequestFailed {
        /// HTTP status code.
        status: u16,
        /// Response body, as returned by the API.
        body: String,
    },

    /// Response body could not be decoded.
    #[error("Invalid response format from GitHub API: {0}")]
    InvalidResponseFormat(String),

    /// Network connectivity error.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// The configured API base URL is not a valid URL.
    #[error("Invalid API base URL: {0}")]
    InvalidBaseUrl(String),
}

// Note: anyhow already has a blanket impl for thiserror::Error types
