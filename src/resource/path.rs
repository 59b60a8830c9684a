//! Path templating
//!
//! Resource paths are templates such as
//! `/projects/{project_id}/registry/repositories/{repository_id}/tags`.
//! Placeholders are bound from attributes of a parent object; every value is
//! percent-encoded as a single path segment.

use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Placeholder name -> resolved (unencoded) value
pub type Bindings = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("Unresolved placeholder {{{placeholder}}} in {template}")]
    Unbound {
        template: String,
        placeholder: String,
    },

    #[error("Parent object has no attribute {attr} required for {{{placeholder}}}")]
    MissingParentAttr { placeholder: String, attr: String },

    #[error("Manager for {template} needs a parent object")]
    MissingParent { template: String },

    #[error("Malformed path template: {0}")]
    Malformed(String),
}

/// Render a JSON scalar as a path or query value
pub fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Encode a single identifier as a path segment (`a/b` -> `a%2Fb`)
pub fn encode_segment(raw: &str) -> String {
    urlencoding::encode(raw).into_owned()
}

/// Names of all placeholders in a template, in order of appearance
pub fn placeholders(template: &str) -> Result<Vec<String>, PathError> {
    let mut names = Vec::new();
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        let after = &rest[start + 1..];
        let Some(end) = after.find('}') else {
            return Err(PathError::Malformed(template.to_string()));
        };
        let name = &after[..end];
        if name.is_empty() || name.contains('{') {
            return Err(PathError::Malformed(template.to_string()));
        }
        names.push(name.to_string());
        rest = &after[end + 1..];
    }

    if rest.contains('}') {
        return Err(PathError::Malformed(template.to_string()));
    }

    Ok(names)
}

/// Resolve a template against its bindings
pub fn resolve(template: &str, bindings: &Bindings) -> Result<String, PathError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let Some(end) = after.find('}') else {
            return Err(PathError::Malformed(template.to_string()));
        };
        let name = &after[..end];
        if name.is_empty() || name.contains('{') {
            return Err(PathError::Malformed(template.to_string()));
        }
        let value = bindings.get(name).ok_or_else(|| PathError::Unbound {
            template: template.to_string(),
            placeholder: name.to_string(),
        })?;
        out.push_str(&encode_segment(value));
        rest = &after[end + 1..];
    }

    if rest.contains('}') {
        return Err(PathError::Malformed(template.to_string()));
    }
    out.push_str(rest);

    Ok(out)
}

/// Copy the named parent attributes into placeholder bindings.
///
/// `from_parent_attrs` maps placeholder -> parent attribute name, e.g.
/// `{"project_id": "project_id", "repository_id": "id"}` for tags under a
/// registry repository.
pub fn bindings_from_parent(
    from_parent_attrs: &BTreeMap<String, String>,
    parent: &serde_json::Map<String, Value>,
) -> Result<Bindings, PathError> {
    from_parent_attrs
        .iter()
        .map(|(placeholder, attr)| {
            parent
                .get(attr)
                .and_then(value_to_string)
                .map(|v| (placeholder.clone(), v))
                .ok_or_else(|| PathError::MissingParentAttr {
                    placeholder: placeholder.clone(),
                    attr: attr.clone(),
                })
        })
        .collect()
}
