//! Declarative bindings for the GitLab v4 REST API.
//!
//! Resources (issues, container registry repositories and tags, iterations)
//! are described as data: a path template, the parent attributes that fill
//! it, and allow-lists for list filters and create/update attributes. A
//! generic [`resource::RestManager`] turns each call into one HTTP request
//! and wraps the JSON answer in a [`resource::RestObject`].
//!
//! ```ignore
//! use glrest::gitlab::{auth::Credentials, client::GitlabClient};
//! use glrest::resource::issues::project_issues;
//! use serde_json::json;
//!
//! let client = GitlabClient::new("https://gitlab.com", Credentials::from_env())?;
//! let issues = project_issues(&client, 42)?;
//! let mut issue = issues.create(json!({"title": "bug"}).as_object().unwrap()).await?;
//! issues.move_to(&mut issue, 43).await?;
//! ```

pub mod config;
pub mod gitlab;
pub mod resource;

pub use gitlab::client::GitlabClient;
pub use gitlab::error::GitlabError;
