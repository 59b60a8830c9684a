//! Resource Fetcher
//!
//! Handles list calls: query building and pagination over GitLab's
//! `Link` / `X-Next-Page` headers.

use crate::gitlab::client::GitlabClient;
use crate::gitlab::error::{GitlabError, OperationKind};
use crate::gitlab::http::PageInfo;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Method;
use serde_json::{Map, Value};

/// Upper bound on pages followed by one `all` listing
const MAX_PAGES: usize = 10_000;

/// Pagination options of a list call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOptions {
    /// Fetch a specific page
    pub page: Option<u32>,
    /// Page size, falling back to the client's configured size
    pub per_page: Option<u32>,
    /// Follow next-page links until the collection is exhausted
    pub all: bool,
}

impl ListOptions {
    pub fn all() -> Self {
        Self {
            all: true,
            ..Self::default()
        }
    }

    pub fn page(page: u32) -> Self {
        Self {
            page: Some(page),
            ..Self::default()
        }
    }

    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = Some(per_page);
        self
    }
}

/// Builder for list filters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListParams(Map<String, Value>);

impl ListParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    /// Set a timestamp filter such as `created_after` (ISO 8601, UTC)
    pub fn set_time(self, key: &str, at: DateTime<Utc>) -> Self {
        self.set(key, at.to_rfc3339_opts(SecondsFormat::Secs, true))
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for ListParams {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Result of paginated fetch
#[derive(Debug, Clone)]
pub struct PaginatedResult {
    pub items: Vec<Value>,
    pub page_info: PageInfo,
}

fn into_items(body: Value, path: &str) -> Result<Vec<Value>, GitlabError> {
    match body {
        Value::Array(items) => Ok(items),
        Value::Null => Ok(Vec::new()),
        other => Err(GitlabError::UnexpectedResponse(format!(
            "expected a JSON array from {}, got {}",
            path,
            kind_of(&other)
        ))),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Fetch one page of a collection
pub async fn fetch_page(
    client: &GitlabClient,
    path: &str,
    query: &[(String, String)],
) -> Result<PaginatedResult, GitlabError> {
    let response = client
        .request(Method::GET, path, query, None, OperationKind::List)
        .await?;

    Ok(PaginatedResult {
        items: into_items(response.body, path)?,
        page_info: response.page_info,
    })
}

/// Fetch all pages of a collection (auto-paginate)
pub async fn fetch_all(
    client: &GitlabClient,
    path: &str,
    query: &[(String, String)],
) -> Result<Vec<Value>, GitlabError> {
    fetch_pages(client, path, query, MAX_PAGES).await
}

/// Follow next-page links, issuing at most `max_pages` requests
async fn fetch_pages(
    client: &GitlabClient,
    path: &str,
    query: &[(String, String)],
    max_pages: usize,
) -> Result<Vec<Value>, GitlabError> {
    let mut all_items = Vec::new();
    let mut result = fetch_page(client, path, query).await?;

    // The first page counts towards the cap
    for _ in 1..max_pages {
        let info = result.page_info.clone();
        all_items.extend(result.items);

        result = if let Some(next_url) = info.next_url {
            // The link already carries every query parameter
            fetch_page(client, &next_url, &[]).await?
        } else if let Some(next_page) = info.next_page {
            let mut next_query: Vec<(String, String)> =
                query.iter().filter(|(k, _)| k != "page").cloned().collect();
            next_query.push(("page".to_string(), next_page.to_string()));
            fetch_page(client, path, &next_query).await?
        } else {
            return Ok(all_items);
        };
    }

    if result.page_info.has_next() {
        tracing::warn!("Stopped following pages of {} after {} pages", path, max_pages);
    }
    all_items.extend(result.items);
    Ok(all_items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_list_params_builder() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        let params = ListParams::new()
            .set("state", "opened")
            .set("labels", json!(["bug"]))
            .set_time("created_after", at);

        assert_eq!(
            Value::Object(params.as_map().clone()),
            json!({"state": "opened", "labels": ["bug"], "created_after": "2024-03-01T12:30:00Z"})
        );
    }

    #[test]
    fn test_into_items_rejects_objects() {
        assert_eq!(into_items(json!([{"id": 1}]), "/issues").unwrap().len(), 1);
        assert!(into_items(Value::Null, "/issues").unwrap().is_empty());
        let err = into_items(json!({"message": "nope"}), "/issues").unwrap_err();
        assert!(err.to_string().contains("got object"));
    }

    #[tokio::test]
    async fn test_fetch_pages_stops_at_cap() {
        use crate::gitlab::auth::Credentials;
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        // Every page claims there is another one
        Mock::given(method("GET"))
            .and(path("/api/v4/issues"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{"id": 1}]))
                    .insert_header("X-Next-Page", "2"),
            )
            .expect(3)
            .mount(&server)
            .await;

        let client = GitlabClient::new(&server.uri(), Credentials::Anonymous).unwrap();
        let items = fetch_pages(&client, "/issues", &[], 3).await.unwrap();
        assert_eq!(items.len(), 3);
    }

    #[test]
    fn test_list_options_constructors() {
        assert!(ListOptions::all().all);
        assert_eq!(ListOptions::page(3).with_per_page(50).per_page, Some(50));
    }
}
