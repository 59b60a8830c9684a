//! Action Dispatch
//!
//! Maps declared custom actions (bulk tag deletion, moving an issue, ...) to
//! single REST calls.

use super::attrs::filter;
use super::manager::RestManager;
use super::object::RestObject;
use super::path::value_to_string;
use super::registry::{ActionTarget, ParamsIn};
use crate::gitlab::error::GitlabError;
use serde_json::{Map, Value};

/// Execute a declared action of the manager's resource.
///
/// Object actions need the object the action applies to; manager actions
/// ignore it.
pub async fn execute_action(
    manager: &RestManager,
    action_key: &str,
    object: Option<&RestObject>,
    params: &Map<String, Value>,
) -> Result<Value, GitlabError> {
    let Some(action) = manager.def().get_action(action_key) else {
        return Err(GitlabError::UnknownAction {
            resource: manager.key().to_string(),
            action: action_key.to_string(),
        });
    };

    let base = match action.target {
        ActionTarget::Manager => manager.path().to_string(),
        ActionTarget::Object => {
            let Some(obj) = object else {
                return Err(GitlabError::UnsupportedOperation {
                    resource: manager.key().to_string(),
                    operation: format!("{} without an object", action.key),
                });
            };
            let id = obj.get_id().ok_or_else(|| GitlabError::MissingId {
                resource: manager.key().to_string(),
                id_attr: manager.def().id_attr.clone().unwrap_or_default(),
            })?;
            manager.object_path(&id)
        }
    };

    let path = match action.suffix.as_deref() {
        Some(suffix) => format!("{}/{}", base, suffix),
        None => base,
    };

    let mut merged = action.defaults.clone();
    for (k, v) in params {
        merged.insert(k.clone(), v.clone());
    }
    let data = filter(&merged, &action.schema()).map_err(|missing| GitlabError::MissingAttributes {
        operation: action.key.clone(),
        missing,
    })?;

    tracing::info!(
        "execute_action: resource={}, action={}, path={}",
        manager.key(),
        action.key,
        path
    );

    let (query, body) = match action.params_in {
        ParamsIn::Query => (to_query(&data), None),
        ParamsIn::Body if data.is_empty() => (Vec::new(), None),
        ParamsIn::Body => (Vec::new(), Some(Value::Object(data))),
    };

    let response = manager
        .client()
        .request(
            action.method.to_reqwest(),
            &path,
            &query,
            body.as_ref(),
            action.error_kind,
        )
        .await?;

    Ok(response.body)
}

fn to_query(data: &Map<String, Value>) -> Vec<(String, String)> {
    data.iter()
        .filter_map(|(k, v)| value_to_string(v).map(|s| (k.clone(), s)))
        .collect()
}
