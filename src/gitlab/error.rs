//! GitLab API error types.

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::resource::path::PathError;

/// Maximum length of an error body carried into an error message
const MAX_ERROR_BODY_LENGTH: usize = 200;

/// Logical operation a request was made for.
///
/// Non-success statuses other than 401/404 are reported under the kind
/// of operation that triggered them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    List,
    Get,
    Create,
    Update,
    Delete,
    Subscribe,
    Unsubscribe,
    Todo,
    TimeTracking,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Get => "get",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Subscribe => "subscribe",
            Self::Unsubscribe => "unsubscribe",
            Self::Todo => "todo",
            Self::TimeTracking => "time_tracking",
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur when interacting with the GitLab API.
#[derive(Debug, Error)]
pub enum GitlabError {
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    #[error("Not found: {path}: {message}")]
    NotFound { path: String, message: String },

    #[error("GitLab {kind} error ({status}): {message}")]
    Operation {
        kind: OperationKind,
        status: u16,
        message: String,
    },

    #[error("Missing attributes for {operation}: {}", missing.join(", "))]
    MissingAttributes {
        operation: String,
        missing: Vec<String>,
    },

    #[error(transparent)]
    Path(#[from] PathError),

    #[error("Unknown resource: {0}")]
    UnknownResource(String),

    #[error("Resource {resource} does not support {operation}")]
    UnsupportedOperation { resource: String, operation: String },

    #[error("Resource {resource} has no action named {action}")]
    UnknownAction { resource: String, action: String },

    #[error("Object of {resource} has no identifier attribute {id_attr}")]
    MissingId { resource: String, id_attr: String },

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid GitLab URL: {0}")]
    InvalidUrl(String),

    #[error("Unexpected response shape: {0}")]
    UnexpectedResponse(String),
}

impl GitlabError {
    /// Classify an HTTP status code and response body into a typed error.
    pub fn from_status(status: StatusCode, path: &str, kind: OperationKind, body: &str) -> Self {
        let message = error_message(body);
        if status == StatusCode::UNAUTHORIZED {
            Self::Authentication { message }
        } else if status == StatusCode::NOT_FOUND {
            Self::NotFound {
                path: path.to_string(),
                message,
            }
        } else {
            Self::Operation {
                kind,
                status: status.as_u16(),
                message,
            }
        }
    }

    /// HTTP status carried by this error, if it came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Authentication { .. } => Some(401),
            Self::NotFound { .. } => Some(404),
            Self::Operation { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when the error was raised locally, before any request was sent.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Self::MissingAttributes { .. }
                | Self::Path(_)
                | Self::UnknownResource(_)
                | Self::UnsupportedOperation { .. }
                | Self::UnknownAction { .. }
                | Self::MissingId { .. }
                | Self::InvalidUrl(_)
        )
    }
}

/// Extract a readable message from an error body.
///
/// GitLab answers errors with `{"message": ...}` or `{"error": ...}`, where
/// `message` may itself be an object of field errors.
fn error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        let field = value.get("message").or_else(|| value.get("error"));
        match field {
            Some(Value::String(s)) => return s.clone(),
            Some(other) if !other.is_null() => return other.to_string(),
            _ => {}
        }
    }

    if body.len() > MAX_ERROR_BODY_LENGTH {
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}
