//! HTTP utilities for GitLab REST API calls

use super::auth::Credentials;
use super::error::{GitlabError, OperationKind};
use reqwest::header::HeaderMap;
use reqwest::{Client, Method};
use serde_json::Value;
use std::time::Duration;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Sanitize response body for logging
/// Truncates long responses and strips control characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let mut end = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... [truncated, {} bytes total]", &body[..end], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// Pagination metadata returned by list endpoints
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageInfo {
    pub page: Option<u32>,
    pub next_page: Option<u32>,
    pub per_page: Option<u32>,
    pub total: Option<u64>,
    pub total_pages: Option<u32>,
    /// Absolute URL of the next page from the `Link` header
    pub next_url: Option<String>,
}

impl PageInfo {
    fn from_headers(headers: &HeaderMap) -> Self {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        Self {
            page: header("x-page").and_then(|v| v.parse().ok()),
            next_page: header("x-next-page").and_then(|v| v.parse().ok()),
            per_page: header("x-per-page").and_then(|v| v.parse().ok()),
            total: header("x-total").and_then(|v| v.parse().ok()),
            total_pages: header("x-total-pages").and_then(|v| v.parse().ok()),
            next_url: header("link").and_then(parse_next_link),
        }
    }

    pub fn has_next(&self) -> bool {
        self.next_url.is_some() || self.next_page.is_some()
    }
}

/// Extract the `rel="next"` target from an RFC 8288 `Link` header
pub fn parse_next_link(link: &str) -> Option<String> {
    link.split(',').find_map(|entry| {
        let mut parts = entry.split(';');
        let target = parts.next()?.trim();
        let is_next = parts.any(|p| {
            let p = p.trim();
            p == "rel=\"next\"" || p == "rel=next"
        });
        if !is_next {
            return None;
        }
        target
            .strip_prefix('<')
            .and_then(|t| t.strip_suffix('>'))
            .map(|t| t.to_string())
    })
}

/// Append `key=value` pairs to a URL, percent-encoding the values
pub fn add_query_params(url: &str, params: &[(String, String)]) -> String {
    if params.is_empty() {
        return url.to_string();
    }

    let query_parts: Vec<String> = params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect();

    if url.contains('?') {
        format!("{}&{}", url, query_parts.join("&"))
    } else {
        format!("{}?{}", url, query_parts.join("&"))
    }
}

/// True when the response declares a JSON body (`application/json`, `+json`)
fn is_json_content(headers: &HeaderMap) -> bool {
    headers
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|mime| {
            let mime = mime.trim().to_ascii_lowercase();
            mime == "application/json" || mime.ends_with("+json")
        })
        .unwrap_or(false)
}

/// Decoded response of a successful call
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub body: Value,
    pub page_info: PageInfo,
}

/// HTTP client wrapper for GitLab API calls
#[derive(Clone)]
pub struct GitlabHttpClient {
    client: Client,
    credentials: Credentials,
}

impl GitlabHttpClient {
    /// Create a new HTTP client
    pub fn new(
        credentials: Credentials,
        timeout: Option<Duration>,
        ssl_verify: bool,
    ) -> Result<Self, GitlabError> {
        let mut builder = Client::builder()
            .user_agent(concat!("glrest/", env!("CARGO_PKG_VERSION")))
            .danger_accept_invalid_certs(!ssl_verify);

        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            credentials,
        })
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Issue one request and decode its JSON body.
    ///
    /// `path` is only used to label errors; `url` is the absolute target.
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        path: &str,
        query: &[(String, String)],
        body: Option<&Value>,
        kind: OperationKind,
    ) -> Result<HttpResponse, GitlabError> {
        let url = add_query_params(url, query);
        tracing::debug!("{} {}", method, url);

        let mut request = self.credentials.apply(self.client.request(method, &url));
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;

        let status = response.status();
        let page_info = PageInfo::from_headers(response.headers());
        let is_json = is_json_content(response.headers());
        let response_body = response.text().await?;

        if !status.is_success() {
            // Security: Only log sanitized/truncated error body to avoid leaking sensitive data
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&response_body));
            return Err(GitlabError::from_status(status, path, kind, &response_body));
        }

        // Empty (204 No Content) or non-JSON answers such as "202 Accepted"
        let body = if response_body.trim().is_empty() {
            Value::Null
        } else if is_json {
            serde_json::from_str(&response_body)?
        } else {
            Value::String(response_body)
        };

        Ok(HttpResponse { body, page_info })
    }
}

/// Format a GitLab API error for display
/// Security: Avoids echoing raw API bodies for transport failures
pub fn format_gitlab_error(error: &GitlabError) -> String {
    match error {
        GitlabError::Authentication { .. } => {
            "Authentication failed. Check your access token.".to_string()
        }
        GitlabError::NotFound { path, .. } => format!("Resource not found: {}", path),
        GitlabError::Operation { status: 403, kind, .. } => {
            format!("Permission denied for {}.", kind)
        }
        GitlabError::Operation { status: 429, .. } => {
            "Rate limit exceeded. Please try again later.".to_string()
        }
        GitlabError::Operation { status, kind, .. } if *status >= 500 => {
            format!("GitLab failed to {} ({}). Please try again.", kind, status)
        }
        GitlabError::Http(_) => {
            "Request failed. Check your network connection and try again.".to_string()
        }
        other => {
            let error_str = other.to_string();
            let sanitized = error_str
                .chars()
                .filter(|c| c.is_ascii_graphic() || *c == ' ')
                .take(120)
                .collect::<String>();

            if sanitized.len() < error_str.len() {
                format!("{}...", sanitized)
            } else {
                sanitized
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderValue, CONTENT_TYPE};

    #[test]
    fn test_is_json_content() {
        let mut headers = HeaderMap::new();
        assert!(!is_json_content(&headers));

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json; charset=utf-8"));
        assert!(is_json_content(&headers));

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/problem+json"));
        assert!(is_json_content(&headers));

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        assert!(!is_json_content(&headers));
    }

    #[test]
    fn test_parse_next_link() {
        let link = r#"<https://gitlab.example.com/api/v4/projects/8/issues?page=1&per_page=3>; rel="prev", <https://gitlab.example.com/api/v4/projects/8/issues?page=3&per_page=3>; rel="next", <https://gitlab.example.com/api/v4/projects/8/issues?page=1&per_page=3>; rel="first""#;
        assert_eq!(
            parse_next_link(link).as_deref(),
            Some("https://gitlab.example.com/api/v4/projects/8/issues?page=3&per_page=3")
        );

        let last_page = r#"<https://gitlab.example.com/api/v4/issues?page=1>; rel="first""#;
        assert_eq!(parse_next_link(last_page), None);
    }

    #[test]
    fn test_add_query_params_encodes_values() {
        let params = vec![
            ("name_regex".to_string(), ".*".to_string()),
            ("older_than".to_string(), "1 month".to_string()),
        ];
        assert_eq!(
            add_query_params("http://h/api/v4/x", &params),
            "http://h/api/v4/x?name_regex=.%2A&older_than=1%20month"
        );
        assert_eq!(add_query_params("http://h/x?a=1", &params[..1]), "http://h/x?a=1&name_regex=.%2A");
        assert_eq!(add_query_params("http://h/x", &[]), "http://h/x");
    }

    #[test]
    fn test_sanitize_for_log_truncates() {
        let body = "a".repeat(1000);
        let sanitized = sanitize_for_log(&body);
        assert!(sanitized.contains("[truncated, 1000 bytes total]"));
        assert_eq!(sanitize_for_log("line\nbreak"), "linebreak");
    }

    #[test]
    fn test_format_gitlab_error() {
        let err = GitlabError::Authentication {
            message: "invalid token".to_string(),
        };
        assert_eq!(
            format_gitlab_error(&err),
            "Authentication failed. Check your access token."
        );

        let err = GitlabError::Operation {
            kind: OperationKind::Delete,
            status: 403,
            message: "403 Forbidden".to_string(),
        };
        assert_eq!(format_gitlab_error(&err), "Permission denied for delete.");

        let err = GitlabError::Operation {
            kind: OperationKind::Update,
            status: 502,
            message: "bad gateway".to_string(),
        };
        assert_eq!(
            format_gitlab_error(&err),
            "GitLab failed to update (502). Please try again."
        );
    }
}
