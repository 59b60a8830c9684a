//! Resource abstraction layer
//!
//! This module provides a data-driven approach to GitLab resources.
//! Resource definitions are loaded from JSON files at compile time, so a
//! new resource is a path template and a few attribute lists, not code.
//!
//! # Architecture
//!
//! - [`registry`] - Loads and caches resource definitions from embedded JSON
//! - [`path`] - Resolves path templates from parent object attributes
//! - [`attrs`] - Validates and filters create/update bodies and list filters
//! - [`object`] - Generic attribute-holding objects
//! - [`manager`] - CRUD dispatch, one HTTP request per operation
//! - [`fetcher`] - List pagination
//! - [`dispatch`] - Custom per-resource actions
//!
//! # Resource Definitions
//!
//! Resources are defined in JSON files under `src/resources/`:
//! - `issues.json` - Instance, group and project issues, issue links
//! - `container_registry.json` - Registry repositories and tags
//! - `iterations.json` - Group iterations
//!
//! # Example
//!
//! ```ignore
//! use glrest::resource::{issues::project_issues, ListOptions, ListParams};
//!
//! async fn open_bugs(client: &GitlabClient) -> Result<Vec<RestObject>, GitlabError> {
//!     let issues = project_issues(client, 42)?;
//!     let params = ListParams::new().set("state", "opened").set("labels", json!(["bug"]));
//!     issues.list(&params, &ListOptions::all()).await
//! }
//! ```

pub mod attrs;
pub mod container_registry;
pub mod dispatch;
pub mod fetcher;
pub mod issues;
pub mod iterations;
pub mod manager;
pub mod object;
pub mod path;
pub mod registry;

pub use fetcher::{ListOptions, ListParams};
pub use manager::RestManager;
pub use object::RestObject;
pub use registry::{get_all_resource_keys, get_resource, ResourceDef};
