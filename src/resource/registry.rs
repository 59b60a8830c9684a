//! Resource Registry - Load resource definitions from JSON
//!
//! This module loads all GitLab resource definitions from embedded JSON files
//! and provides lookup functions for the rest of the crate.

use super::attrs::{AttrType, RequiredOptional};
use crate::gitlab::error::{GitlabError, OperationKind};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

/// Embedded resource JSON files (compiled into the binary)
const RESOURCE_FILES: &[&str] = &[
    include_str!("../resources/issues.json"),
    include_str!("../resources/container_registry.json"),
    include_str!("../resources/iterations.json"),
];

/// Generic operations a manager may expose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    List,
    Get,
    Create,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Get => "get",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    /// Error kind reported when the server rejects this operation
    pub fn error_kind(&self) -> OperationKind {
        match self {
            Self::List => OperationKind::List,
            Self::Get => OperationKind::Get,
            Self::Create => OperationKind::Create,
            Self::Update => OperationKind::Update,
            Self::Delete => OperationKind::Delete,
        }
    }
}

/// HTTP verb of a custom action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn to_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Whether an action addresses the collection or a single object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionTarget {
    Manager,
    Object,
}

/// Where action parameters travel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamsIn {
    Query,
    #[default]
    Body,
}

/// Action definition from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct ActionDef {
    /// Key identifier for the action
    pub key: String,
    pub display_name: String,
    pub method: HttpMethod,
    pub target: ActionTarget,
    /// Path segment appended after the manager or object path
    #[serde(default)]
    pub suffix: Option<String>,
    #[serde(default)]
    pub params_in: ParamsIn,
    #[serde(default)]
    pub required: Vec<String>,
    #[serde(default)]
    pub optional: Vec<String>,
    /// Values sent when the caller does not supply them
    #[serde(default)]
    pub defaults: Map<String, Value>,
    /// Replace the object's attributes with the response
    #[serde(default)]
    pub updates_object: bool,
    pub error_kind: OperationKind,
}

impl ActionDef {
    /// Required and optional parameters as a filtering schema
    pub fn schema(&self) -> RequiredOptional {
        let mut optional = self.optional.clone();
        for key in self.defaults.keys() {
            if !optional.contains(key) && !self.required.contains(key) {
                optional.push(key.clone());
            }
        }
        RequiredOptional {
            required: self.required.clone(),
            optional,
        }
    }
}

fn default_id_attr() -> Option<String> {
    Some("id".to_string())
}

/// Resource definition from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceDef {
    pub display_name: String,
    /// Path template, e.g. `/projects/{project_id}/issues`
    pub path: String,
    /// Kind of object managers of this resource hang off (`projects`, `groups`, ...)
    #[serde(default)]
    pub parent: Option<String>,
    /// Placeholder -> attribute of the parent object
    #[serde(default)]
    pub from_parent_attrs: BTreeMap<String, String>,
    #[serde(default = "default_id_attr")]
    pub id_attr: Option<String>,
    #[serde(default)]
    pub short_print_attr: Option<String>,
    pub operations: Vec<Operation>,
    #[serde(default)]
    pub list_filters: Vec<String>,
    #[serde(default)]
    pub create_attrs: RequiredOptional,
    #[serde(default)]
    pub update_attrs: RequiredOptional,
    #[serde(default)]
    pub types: BTreeMap<String, AttrType>,
    #[serde(default)]
    pub actions: Vec<ActionDef>,
    /// Resource keys of managers reachable from an object of this resource
    #[serde(default)]
    pub children: Vec<String>,
}

impl ResourceDef {
    pub fn supports(&self, op: Operation) -> bool {
        self.operations.contains(&op)
    }

    pub fn get_action(&self, key: &str) -> Option<&ActionDef> {
        self.actions.iter().find(|a| a.key == key)
    }
}

/// Root structure of resources/*.json
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceConfig {
    #[serde(default)]
    pub resources: HashMap<String, ResourceDef>,
}

/// Global registry loaded from JSON
static REGISTRY: OnceLock<ResourceConfig> = OnceLock::new();

/// Get the resource registry (loads from embedded JSON on first access)
pub fn get_registry() -> &'static ResourceConfig {
    REGISTRY.get_or_init(|| {
        let mut final_config = ResourceConfig {
            resources: HashMap::new(),
        };

        for content in RESOURCE_FILES {
            let partial: ResourceConfig = serde_json::from_str(content)
                .unwrap_or_else(|e| panic!("Failed to parse embedded resource JSON: {}", e));
            final_config.resources.extend(partial.resources);
        }

        final_config
    })
}

/// Get a resource definition by key
pub fn get_resource(key: &str) -> Option<&'static ResourceDef> {
    get_registry().resources.get(key)
}

/// Get a resource definition by key, failing with [`GitlabError::UnknownResource`]
pub fn require_resource(key: &str) -> Result<&'static ResourceDef, GitlabError> {
    get_resource(key).ok_or_else(|| GitlabError::UnknownResource(key.to_string()))
}

/// Get all resource keys, sorted
pub fn get_all_resource_keys() -> Vec<&'static str> {
    let mut keys: Vec<&'static str> = get_registry()
        .resources
        .keys()
        .map(|s| s.as_str())
        .collect();
    keys.sort_unstable();
    keys
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::path::placeholders;

    #[test]
    fn test_registry_loads_successfully() {
        let registry = get_registry();
        assert_eq!(registry.resources.len(), 7, "Registry should have every resource");
    }

    #[test]
    fn test_project_issues_resource_exists() {
        let resource = get_resource("project-issues").expect("project issues should exist");
        assert_eq!(resource.display_name, "Project Issues");
        assert_eq!(resource.id_attr.as_deref(), Some("iid"));
        assert_eq!(resource.create_attrs.required, vec!["title"]);
        assert!(resource.update_attrs.required.is_empty());
        assert!(resource.update_attrs.allows("state_event"));
        assert_eq!(resource.types.get("labels"), Some(&AttrType::List));
    }

    #[test]
    fn test_placeholders_match_parent_attrs() {
        for (key, def) in &get_registry().resources {
            let names = placeholders(&def.path).unwrap();
            let mut names_sorted = names.clone();
            names_sorted.sort();
            let mapped: Vec<String> = def.from_parent_attrs.keys().cloned().collect();
            assert_eq!(names_sorted, mapped, "placeholders of {key} must all come from the parent");
        }
    }

    #[test]
    fn test_children_and_parents_are_registered() {
        for (key, def) in &get_registry().resources {
            for child in &def.children {
                let child_def = get_resource(child)
                    .unwrap_or_else(|| panic!("{key} lists unknown child {child}"));
                assert_eq!(child_def.parent.as_deref(), Some(key.as_str()));
            }
        }
    }

    #[test]
    fn test_tag_bulk_delete_action() {
        let tags = get_resource("project-registry-tags").unwrap();
        let action = tags.get_action("delete_in_bulk").unwrap();
        assert_eq!(action.method, HttpMethod::Delete);
        assert_eq!(action.target, ActionTarget::Manager);
        assert_eq!(action.params_in, ParamsIn::Query);
        assert_eq!(action.defaults.get("name_regex"), Some(&Value::String(".*".to_string())));
        assert!(action.schema().allows("keep_n"));
        assert!(!action.schema().allows("sudo"));
    }

    #[test]
    fn test_registry_repositories_operations() {
        let repos = get_resource("project-registry-repositories").unwrap();
        assert!(repos.supports(Operation::List));
        assert!(repos.supports(Operation::Delete));
        assert!(!repos.supports(Operation::Create));
    }

    #[test]
    fn test_get_all_resource_keys() {
        let keys = get_all_resource_keys();
        assert!(keys.contains(&"group-iterations"));
        assert!(keys.windows(2).all(|w| w[0] <= w[1]));
        assert!(require_resource("project-wikis").is_err());
    }
}
