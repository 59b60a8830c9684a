//! GitLab Client
//!
//! Main client for interacting with the GitLab v4 REST API, combining
//! credentials, the instance URL and HTTP functionality.

use super::auth::Credentials;
use super::error::{GitlabError, OperationKind};
use super::http::{GitlabHttpClient, HttpResponse};
use reqwest::Method;
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// Default GitLab instance
pub const DEFAULT_URL: &str = "https://gitlab.com";

/// REST API version prefix
pub const API_VERSION: &str = "4";

/// Main GitLab client
#[derive(Clone)]
pub struct GitlabClient {
    pub http: GitlabHttpClient,
    /// Instance URL without trailing slash, e.g. `https://gitlab.com`
    pub url: String,
    /// Default page size for list calls, if configured
    pub per_page: Option<u32>,
}

impl GitlabClient {
    /// Create a new GitLab client
    pub fn new(url: &str, credentials: Credentials) -> Result<Self, GitlabError> {
        Self::with_options(url, credentials, None, true)
    }

    /// Create a client with an explicit timeout and TLS verification policy
    pub fn with_options(
        url: &str,
        credentials: Credentials,
        timeout: Option<Duration>,
        ssl_verify: bool,
    ) -> Result<Self, GitlabError> {
        let parsed = Url::parse(url)
            .map_err(|e| GitlabError::InvalidUrl(format!("{url}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(GitlabError::InvalidUrl(format!(
                "unsupported scheme {}",
                parsed.scheme()
            )));
        }

        let http = GitlabHttpClient::new(credentials, timeout, ssl_verify)?;

        Ok(Self {
            http,
            url: url.trim_end_matches('/').to_string(),
            per_page: None,
        })
    }

    /// Base URL of the REST API, e.g. `https://gitlab.com/api/v4`
    pub fn api_url(&self) -> String {
        format!("{}/api/v{}", self.url, API_VERSION)
    }

    /// Build an absolute URL from an API path such as `/projects/1/issues`
    pub fn build_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!("{}{}", self.api_url(), path)
    }

    /// Issue a request against an API path (or an absolute next-page URL)
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<&Value>,
        kind: OperationKind,
    ) -> Result<HttpResponse, GitlabError> {
        let url = self.build_url(path);
        self.http.request(method, &url, path, query, body, kind).await
    }

    /// Make a GET request to the GitLab API
    pub async fn get(
        &self,
        path: &str,
        query: &[(String, String)],
        kind: OperationKind,
    ) -> Result<Value, GitlabError> {
        Ok(self.request(Method::GET, path, query, None, kind).await?.body)
    }

    /// Make a POST request to the GitLab API
    pub async fn post(
        &self,
        path: &str,
        body: Option<&Value>,
        kind: OperationKind,
    ) -> Result<Value, GitlabError> {
        Ok(self.request(Method::POST, path, &[], body, kind).await?.body)
    }

    /// Make a PUT request to the GitLab API
    pub async fn put(
        &self,
        path: &str,
        body: Option<&Value>,
        kind: OperationKind,
    ) -> Result<Value, GitlabError> {
        Ok(self.request(Method::PUT, path, &[], body, kind).await?.body)
    }

    /// Make a DELETE request to the GitLab API
    pub async fn delete(
        &self,
        path: &str,
        query: &[(String, String)],
        kind: OperationKind,
    ) -> Result<Value, GitlabError> {
        Ok(self.request(Method::DELETE, path, query, None, kind).await?.body)
    }
}

/// Format a GitLab API error for display
pub fn format_gitlab_error(error: &GitlabError) -> String {
    super::http::format_gitlab_error(error)
}
