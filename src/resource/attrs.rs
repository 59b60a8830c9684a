//! Attribute filtering
//!
//! Create/update bodies are checked against a `{required, optional}` schema
//! before anything is sent; list queries are reduced to the declared filters.

use super::path::value_to_string;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Query keys accepted by every list call
pub const PAGINATION_PARAMS: &[&str] = &["page", "per_page"];

/// Allowed attributes for a create or update call
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct RequiredOptional {
    #[serde(default)]
    pub required: Vec<String>,
    #[serde(default)]
    pub optional: Vec<String>,
}

impl RequiredOptional {
    pub fn is_empty(&self) -> bool {
        self.required.is_empty() && self.optional.is_empty()
    }

    pub fn allows(&self, name: &str) -> bool {
        self.required.iter().any(|r| r == name) || self.optional.iter().any(|o| o == name)
    }

    /// Required attributes absent from `attrs`, in declaration order.
    ///
    /// Only presence counts: an explicit `null` is sent as given.
    pub fn missing(&self, attrs: &Map<String, Value>) -> Vec<String> {
        self.required
            .iter()
            .filter(|r| !attrs.contains_key(r.as_str()))
            .cloned()
            .collect()
    }
}

/// How an attribute is encoded on the wire
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AttrType {
    /// Arrays are sent as a comma separated string (`labels=bug,ui`)
    List,
}

/// Validate a create/update body against its schema.
///
/// Returns the body reduced to the declared attributes, or the names of every
/// missing required attribute. An empty schema means the resource declares
/// nothing, and the body is passed through untouched.
pub fn filter(attrs: &Map<String, Value>, schema: &RequiredOptional) -> Result<Map<String, Value>, Vec<String>> {
    if schema.is_empty() {
        return Ok(attrs.clone());
    }

    let missing = schema.missing(attrs);
    if !missing.is_empty() {
        return Err(missing);
    }

    let mut kept = Map::new();
    for (key, value) in attrs {
        if schema.allows(key) {
            kept.insert(key.clone(), value.clone());
        } else {
            tracing::debug!("dropping undeclared attribute {}", key);
        }
    }
    Ok(kept)
}

/// Apply list-typed encodings to a body (`["a", "b"]` -> `"a,b"`)
pub fn encode_types(attrs: &mut Map<String, Value>, types: &BTreeMap<String, AttrType>) {
    for (key, attr_type) in types {
        let Some(value) = attrs.get_mut(key) else {
            continue;
        };
        match attr_type {
            AttrType::List => {
                if let Value::Array(items) = value {
                    let joined = join_list(items);
                    *value = Value::String(joined);
                }
            }
        }
    }
}

fn join_list(items: &[Value]) -> String {
    items
        .iter()
        .filter_map(value_to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Reduce list parameters to the declared filters and render them as query pairs.
///
/// Pagination keys are always kept. `null` values are dropped; list-typed
/// attributes given as arrays are comma joined, other arrays are repeated as
/// `key[]=value`.
pub fn filter_query(
    params: &Map<String, Value>,
    list_filters: &[String],
    types: &BTreeMap<String, AttrType>,
) -> Vec<(String, String)> {
    let mut query = Vec::new();

    for (key, value) in params {
        let declared = list_filters.iter().any(|f| f == key) || PAGINATION_PARAMS.contains(&key.as_str());
        if !declared {
            tracing::debug!("dropping undeclared list filter {}", key);
            continue;
        }

        match value {
            Value::Null => {}
            Value::Array(items) if types.get(key) == Some(&AttrType::List) => {
                query.push((key.clone(), join_list(items)));
            }
            Value::Array(items) => {
                for item in items.iter().filter_map(value_to_string) {
                    query.push((format!("{}[]", key), item));
                }
            }
            other => {
                if let Some(s) = value_to_string(other) {
                    query.push((key.clone(), s));
                }
            }
        }
    }

    query
}
