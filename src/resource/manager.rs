//! Resource managers
//!
//! A [`RestManager`] binds one resource definition to a concrete collection
//! path and turns CRUD calls into single HTTP requests.

use super::attrs::{encode_types, filter, filter_query, RequiredOptional};
use super::dispatch;
use super::fetcher::{self, ListOptions, ListParams};
use super::object::RestObject;
use super::path::{bindings_from_parent, encode_segment, resolve, Bindings, PathError};
use super::registry::{require_resource, Operation, ResourceDef};
use crate::gitlab::client::GitlabClient;
use crate::gitlab::error::GitlabError;
use crate::gitlab::http::PageInfo;
use serde_json::{Map, Value};

#[derive(Clone)]
pub struct RestManager {
    client: GitlabClient,
    key: String,
    def: &'static ResourceDef,
    bindings: Bindings,
    path: String,
}

impl std::fmt::Debug for RestManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestManager")
            .field("key", &self.key)
            .field("path", &self.path)
            .finish()
    }
}

impl RestManager {
    /// Create a manager, copying path bindings from the parent object
    pub fn new(
        client: &GitlabClient,
        key: &str,
        parent: Option<&RestObject>,
    ) -> Result<Self, GitlabError> {
        let def = require_resource(key)?;

        let bindings = match parent {
            Some(parent) => bindings_from_parent(&def.from_parent_attrs, parent.attributes())?,
            None if def.from_parent_attrs.is_empty() => Bindings::new(),
            None => {
                return Err(PathError::MissingParent {
                    template: def.path.clone(),
                }
                .into())
            }
        };

        Self::with_bindings(client, key, bindings)
    }

    /// Create a manager from explicit placeholder bindings
    pub fn with_bindings(
        client: &GitlabClient,
        key: &str,
        bindings: Bindings,
    ) -> Result<Self, GitlabError> {
        let def = require_resource(key)?;
        let path = resolve(&def.path, &bindings)?;

        Ok(Self {
            client: client.clone(),
            key: key.to_string(),
            def,
            bindings,
            path,
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn def(&self) -> &'static ResourceDef {
        self.def
    }

    pub fn client(&self) -> &GitlabClient {
        &self.client
    }

    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    /// Resolved collection path, e.g. `/projects/42/issues`
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Path of a single object of this collection
    pub fn object_path(&self, id: &str) -> String {
        format!("{}/{}", self.path, encode_segment(id))
    }

    /// Wrap a JSON response as an object of this resource
    pub fn wrap(&self, data: Value) -> Result<RestObject, GitlabError> {
        match data {
            Value::Object(map) => Ok(RestObject::new(
                &self.key,
                self.def.id_attr.as_deref(),
                self.def.short_print_attr.as_deref(),
                map,
            )),
            other => Err(GitlabError::UnexpectedResponse(format!(
                "expected a JSON object for {}, got {}",
                self.key, other
            ))),
        }
    }

    /// Wrap a JSON response as an object of another resource sharing this client
    pub fn wrap_as(&self, key: &str, data: Value) -> Result<RestObject, GitlabError> {
        let def = require_resource(key)?;
        match data {
            Value::Object(map) => Ok(RestObject::new(
                key,
                def.id_attr.as_deref(),
                def.short_print_attr.as_deref(),
                map,
            )),
            other => Err(GitlabError::UnexpectedResponse(format!(
                "expected a JSON object for {}, got {}",
                key, other
            ))),
        }
    }

    fn ensure(&self, op: Operation) -> Result<(), GitlabError> {
        if self.def.supports(op) {
            Ok(())
        } else {
            Err(GitlabError::UnsupportedOperation {
                resource: self.key.clone(),
                operation: op.as_str().to_string(),
            })
        }
    }

    fn object_id(&self, obj: &RestObject) -> Result<String, GitlabError> {
        obj.get_id().ok_or_else(|| GitlabError::MissingId {
            resource: self.key.clone(),
            id_attr: self.def.id_attr.clone().unwrap_or_default(),
        })
    }

    fn list_query(&self, params: &ListParams, options: &ListOptions) -> Vec<(String, String)> {
        let mut query = filter_query(params.as_map(), &self.def.list_filters, &self.def.types);
        query.retain(|(k, _)| k != "page" && k != "per_page");

        if let Some(page) = options.page {
            query.push(("page".to_string(), page.to_string()));
        }
        if let Some(per_page) = options.per_page.or(self.client.per_page) {
            query.push(("per_page".to_string(), per_page.to_string()));
        }
        query
    }

    /// List objects, optionally following every page
    pub async fn list(
        &self,
        params: &ListParams,
        options: &ListOptions,
    ) -> Result<Vec<RestObject>, GitlabError> {
        self.ensure(Operation::List)?;
        let query = self.list_query(params, options);

        let items = if options.all {
            fetcher::fetch_all(&self.client, &self.path, &query).await?
        } else {
            fetcher::fetch_page(&self.client, &self.path, &query).await?.items
        };

        items.into_iter().map(|item| self.wrap(item)).collect()
    }

    /// List one page together with its pagination metadata
    pub async fn list_page(
        &self,
        params: &ListParams,
        options: &ListOptions,
    ) -> Result<(Vec<RestObject>, PageInfo), GitlabError> {
        self.ensure(Operation::List)?;
        let query = self.list_query(params, options);
        let page = fetcher::fetch_page(&self.client, &self.path, &query).await?;

        let objects = page
            .items
            .into_iter()
            .map(|item| self.wrap(item))
            .collect::<Result<Vec<_>, _>>()?;
        Ok((objects, page.page_info))
    }

    /// Retrieve a single object by identifier
    pub async fn get(&self, id: &str) -> Result<RestObject, GitlabError> {
        self.ensure(Operation::Get)?;
        let data = self
            .client
            .get(&self.object_path(id), &[], Operation::Get.error_kind())
            .await?;
        self.wrap(data)
    }

    fn prepare_body(
        &self,
        data: &Map<String, Value>,
        schema: &RequiredOptional,
        op: Operation,
    ) -> Result<Value, GitlabError> {
        let mut body = filter(data, schema).map_err(|missing| GitlabError::MissingAttributes {
            operation: op.as_str().to_string(),
            missing,
        })?;
        encode_types(&mut body, &self.def.types);
        Ok(Value::Object(body))
    }

    /// Create an object and return the raw server response
    pub async fn create_raw(&self, data: &Map<String, Value>) -> Result<Value, GitlabError> {
        self.ensure(Operation::Create)?;
        let body = self.prepare_body(data, &self.def.create_attrs, Operation::Create)?;
        self.client
            .post(&self.path, Some(&body), Operation::Create.error_kind())
            .await
    }

    /// Create an object
    pub async fn create(&self, data: &Map<String, Value>) -> Result<RestObject, GitlabError> {
        let response = self.create_raw(data).await?;
        self.wrap(response)
    }

    /// Update an object by identifier and return the server's new state
    pub async fn update(&self, id: &str, data: &Map<String, Value>) -> Result<Value, GitlabError> {
        self.ensure(Operation::Update)?;
        let body = self.prepare_body(data, &self.def.update_attrs, Operation::Update)?;
        self.client
            .put(&self.object_path(id), Some(&body), Operation::Update.error_kind())
            .await
    }

    /// Send pending local changes of an object; no request when nothing changed
    pub async fn save(&self, obj: &mut RestObject) -> Result<(), GitlabError> {
        if obj.updated_data().is_empty() {
            return Ok(());
        }
        let id = self.object_id(obj)?;
        let changes = obj.updated_data().clone();
        let server_data = self.update(&id, &changes).await?;
        obj.update_attrs(server_data);
        Ok(())
    }

    /// Delete an object by identifier
    pub async fn delete(&self, id: &str) -> Result<(), GitlabError> {
        self.ensure(Operation::Delete)?;
        self.client
            .delete(&self.object_path(id), &[], Operation::Delete.error_kind())
            .await?;
        Ok(())
    }

    /// Delete the given object
    pub async fn delete_object(&self, obj: &RestObject) -> Result<(), GitlabError> {
        let id = self.object_id(obj)?;
        self.delete(&id).await
    }

    /// Manager of a child resource bound to one object of this resource
    pub fn child(&self, obj: &RestObject, key: &str) -> Result<RestManager, GitlabError> {
        if !self.def.children.iter().any(|c| c == key) {
            return Err(GitlabError::UnsupportedOperation {
                resource: self.key.clone(),
                operation: format!("child manager {}", key),
            });
        }
        RestManager::new(&self.client, key, Some(obj))
    }

    /// Run a declared action against the collection
    pub async fn action(&self, key: &str, params: &Map<String, Value>) -> Result<Value, GitlabError> {
        dispatch::execute_action(self, key, None, params).await
    }

    /// Run a declared action against one object.
    ///
    /// Actions declared with `updates_object` refresh the object from the response.
    pub async fn object_action(
        &self,
        obj: &mut RestObject,
        key: &str,
        params: &Map<String, Value>,
    ) -> Result<Value, GitlabError> {
        let response = dispatch::execute_action(self, key, Some(&*obj), params).await?;
        let updates = self
            .def
            .get_action(key)
            .map(|a| a.updates_object)
            .unwrap_or(false);
        if updates {
            obj.update_attrs(response.clone());
        }
        Ok(response)
    }
}
