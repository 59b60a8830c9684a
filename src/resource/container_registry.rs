//! Container registry repositories and tags

use super::manager::RestManager;
use super::object::RestObject;
use crate::gitlab::client::GitlabClient;
use crate::gitlab::error::GitlabError;
use serde_json::{Map, Value};
use std::ops::Deref;

/// Registry repositories of a project
pub fn project_registry_repositories(
    client: &GitlabClient,
    project_id: impl Into<Value>,
) -> Result<RegistryRepositoryManager, GitlabError> {
    let inner = RestManager::new(
        client,
        "project-registry-repositories",
        Some(&RestObject::lazy("projects", project_id)),
    )?;
    Ok(RegistryRepositoryManager { inner })
}

#[derive(Debug, Clone)]
pub struct RegistryRepositoryManager {
    inner: RestManager,
}

impl Deref for RegistryRepositoryManager {
    type Target = RestManager;

    fn deref(&self) -> &RestManager {
        &self.inner
    }
}

impl RegistryRepositoryManager {
    /// Tags of one repository; the repository must carry `id` and `project_id`
    pub fn tags(&self, repository: &RestObject) -> Result<RegistryTagManager, GitlabError> {
        let inner = self.inner.child(repository, "project-registry-tags")?;
        Ok(RegistryTagManager { inner })
    }
}

/// Parameters of a bulk tag deletion
///
/// GitLab applies `name_regex` first, then spares tags matching
/// `name_regex_keep`, the `keep_n` most recent ones and those newer than
/// `older_than`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkDelete {
    /// Regex of tag names to delete; `.*` deletes everything
    pub name_regex: String,
    /// Number of latest tags of a name to keep
    pub keep_n: Option<u32>,
    /// Regex of tag names to keep, overriding `name_regex`
    pub name_regex_keep: Option<String>,
    /// Only delete tags older than this, e.g. `1h`, `1d`, `1month`
    pub older_than: Option<String>,
}

impl Default for BulkDelete {
    fn default() -> Self {
        Self {
            name_regex: ".*".to_string(),
            keep_n: None,
            name_regex_keep: None,
            older_than: None,
        }
    }
}

impl BulkDelete {
    fn to_params(&self) -> Map<String, Value> {
        let mut params = Map::new();
        params.insert("name_regex".to_string(), Value::from(self.name_regex.clone()));
        if let Some(keep_n) = self.keep_n {
            params.insert("keep_n".to_string(), Value::from(keep_n));
        }
        if let Some(keep) = &self.name_regex_keep {
            params.insert("name_regex_keep".to_string(), Value::from(keep.clone()));
        }
        if let Some(older_than) = &self.older_than {
            params.insert("older_than".to_string(), Value::from(older_than.clone()));
        }
        params
    }
}

#[derive(Debug, Clone)]
pub struct RegistryTagManager {
    inner: RestManager,
}

impl Deref for RegistryTagManager {
    type Target = RestManager;

    fn deref(&self) -> &RestManager {
        &self.inner
    }
}

impl RegistryTagManager {
    /// Delete tags in bulk with one DELETE on the tags collection
    pub async fn delete_in_bulk(&self, options: &BulkDelete) -> Result<(), GitlabError> {
        self.inner.action("delete_in_bulk", &options.to_params()).await?;
        Ok(())
    }
}
