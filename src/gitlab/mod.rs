//! GitLab API interaction module
//!
//! This module provides the transport used by the resource layer:
//! credentials, the HTTP client and the error taxonomy.
//!
//! # Module Structure
//!
//! - [`auth`] - Access token, OAuth and CI job token credentials
//! - [`client`] - Main GitLab client for making API requests
//! - [`http`] - HTTP utilities, pagination headers and error mapping
//! - [`error`] - Typed errors derived from HTTP statuses
//!
//! # Example
//!
//! ```ignore
//! use glrest::gitlab::{auth::Credentials, client::GitlabClient, error::OperationKind};
//!
//! async fn example() -> Result<(), glrest::gitlab::error::GitlabError> {
//!     let client = GitlabClient::new("https://gitlab.com", Credentials::from_env())?;
//!     let issues = client.get("/issues", &[], OperationKind::List).await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod error;
pub mod http;
