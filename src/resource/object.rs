//! Generic resource objects
//!
//! A [`RestObject`] is a snapshot of one server-side entity: its JSON
//! attributes plus any local changes not yet saved.

use super::path::value_to_string;
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq)]
pub struct RestObject {
    resource_key: String,
    id_attr: Option<String>,
    short_print_attr: Option<String>,
    attrs: Map<String, Value>,
    updated: Map<String, Value>,
}

impl RestObject {
    pub fn new(
        resource_key: &str,
        id_attr: Option<&str>,
        short_print_attr: Option<&str>,
        attrs: Map<String, Value>,
    ) -> Self {
        Self {
            resource_key: resource_key.to_string(),
            id_attr: id_attr.map(str::to_string),
            short_print_attr: short_print_attr.map(str::to_string),
            attrs,
            updated: Map::new(),
        }
    }

    /// An object carrying only its identifier, usable as a parent without a fetch.
    ///
    /// Projects and groups are addressed this way: `RestObject::lazy("projects", 42)`.
    pub fn lazy(resource_key: &str, id: impl Into<Value>) -> Self {
        let mut attrs = Map::new();
        attrs.insert("id".to_string(), id.into());
        Self::new(resource_key, Some("id"), None, attrs)
    }

    pub fn resource_key(&self) -> &str {
        &self.resource_key
    }

    pub fn id_attr(&self) -> Option<&str> {
        self.id_attr.as_deref()
    }

    /// Current value of the identifier attribute, rendered for a URL
    pub fn get_id(&self) -> Option<String> {
        let id_attr = self.id_attr.as_deref()?;
        self.attr(id_attr).and_then(value_to_string)
    }

    /// Attribute value, preferring unsaved local changes
    pub fn attr(&self, name: &str) -> Option<&Value> {
        self.updated.get(name).or_else(|| self.attrs.get(name))
    }

    pub fn attr_str(&self, name: &str) -> Option<&str> {
        self.attr(name).and_then(Value::as_str)
    }

    pub fn attr_i64(&self, name: &str) -> Option<i64> {
        self.attr(name).and_then(Value::as_i64)
    }

    /// Record a local change, sent by the next save
    pub fn set(&mut self, name: &str, value: impl Into<Value>) {
        self.updated.insert(name.to_string(), value.into());
    }

    /// Changes recorded since the last server snapshot
    pub fn updated_data(&self) -> &Map<String, Value> {
        &self.updated
    }

    /// Replace attributes with a server response and forget local changes.
    ///
    /// Non-object responses leave the object untouched.
    pub fn update_attrs(&mut self, server_data: Value) {
        if let Value::Object(map) = server_data {
            self.attrs = map;
            self.updated.clear();
        }
    }

    /// Server attributes merged with unsaved changes
    pub fn to_json(&self) -> Value {
        let mut merged = self.attrs.clone();
        for (k, v) in &self.updated {
            merged.insert(k.clone(), v.clone());
        }
        Value::Object(merged)
    }

    /// Attributes as last received from the server
    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attrs
    }

    /// One-line summary, e.g. `iid: 3` and `title: crash on save`
    pub fn short_print(&self) -> String {
        let mut parts = Vec::new();
        if let (Some(id_attr), Some(id)) = (self.id_attr.as_deref(), self.get_id()) {
            parts.push(format!("{}: {}", id_attr, id));
        }
        if let Some(short) = self.short_print_attr.as_deref() {
            if let Some(v) = self.attr(short).and_then(value_to_string) {
                parts.push(format!("{}: {}", short, v));
            }
        }
        if parts.is_empty() {
            parts.push(self.to_json().to_string());
        }
        parts.join("\n")
    }
}
