//! Shared state behind a fake client: storage, registered resources and hooks

use crate::action::Action;
use crate::apis::OciResource;
use crate::client_utils::field_at_path;
use crate::field_selectors::IndexerFunc;
use crate::interceptor;
use crate::registry::{ResourceMetadata, ResourceRegistry};
use crate::tracker::{ObjectTracker, GVK, GVR};
use crate::validator::SchemaValidator;
use crate::{Error, Result};
use kube::Resource;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

/// Handle on the in-memory API server behind a fake `kube::Client`
///
/// Obtained from [`ClientBuilder::build_with_fake`](crate::ClientBuilder::build_with_fake).
/// Use it to inspect the requests a controller made and the objects it left behind.
#[derive(Clone)]
pub struct FakeClient {
    pub(crate) tracker: Arc<ObjectTracker>,
    pub(crate) registry: Arc<ResourceRegistry>,
    /// Custom field selector indexes per kind
    pub(crate) indexes: Arc<RwLock<HashMap<GVK, HashMap<String, IndexerFunc>>>>,
    pub(crate) return_managed_fields: bool,
    pub(crate) interceptors: Option<Arc<interceptor::Funcs>>,
    pub(crate) validator: Option<Arc<dyn SchemaValidator>>,
    pub(crate) actions: Arc<Mutex<Vec<Action>>>,
}

impl FakeClient {
    pub fn new() -> Self {
        Self {
            tracker: Arc::new(ObjectTracker::new()),
            registry: Arc::new(ResourceRegistry::new()),
            indexes: Arc::new(RwLock::new(HashMap::new())),
            return_managed_fields: false,
            interceptors: None,
            validator: None,
            actions: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn tracker(&self) -> &Arc<ObjectTracker> {
        &self.tracker
    }

    pub fn registry(&self) -> &Arc<ResourceRegistry> {
        &self.registry
    }

    /// Every request served so far, oldest first
    pub fn actions(&self) -> Vec<Action> {
        self.actions.lock().expect("FakeClient lock poisoned").clone()
    }

    pub fn clear_actions(&self) {
        self.actions.lock().expect("FakeClient lock poisoned").clear();
    }

    pub(crate) fn record(&self, action: Action) {
        self.actions
            .lock()
            .expect("FakeClient lock poisoned")
            .push(action);
    }

    /// Read an object straight from storage, bypassing interceptors
    pub fn get<K: OciResource>(&self, namespace: &str, name: &str) -> Result<K> {
        let value = self.tracker.get(&gvr_of::<K>(), namespace, name)?;
        Ok(serde_json::from_value(value)?)
    }

    /// Read all objects of a kind straight from storage
    pub fn list<K: OciResource>(&self, namespace: Option<&str>) -> Result<Vec<K>> {
        self.tracker
            .list(&gvr_of::<K>(), namespace)?
            .into_iter()
            .map(|v| serde_json::from_value(v).map_err(Error::from))
            .collect()
    }

    pub fn get_index(&self, gvk: &GVK, field: &str) -> Option<IndexerFunc> {
        self.indexes
            .read()
            .expect("FakeClient lock poisoned")
            .get(gvk)?
            .get(field)
            .cloned()
    }

    pub(crate) fn indexes_for(&self, gvk: &GVK) -> HashMap<String, IndexerFunc> {
        self.indexes
            .read()
            .expect("FakeClient lock poisoned")
            .get(gvk)
            .cloned()
            .unwrap_or_default()
    }

    /// Metadata of a served resource, or the API server's 404
    pub(crate) fn resolve(&self, group: &str, version: &str, plural: &str) -> Result<Arc<ResourceMetadata>> {
        self.registry
            .lookup(group, version, plural)
            .ok_or_else(|| Error::ResourceNotRegistered {
                group: group.to_string(),
                version: version.to_string(),
                resource: plural.to_string(),
            })
    }

    pub(crate) fn validate(&self, resource: &ResourceMetadata, value: &Value) -> Result<()> {
        match &self.validator {
            Some(validator) => validator.validate(resource, value),
            None => Ok(()),
        }
    }

    /// Reject changes to `metadata.name`, `metadata.namespace` and the kind's immutable fields
    ///
    /// Optional fields that were unset may be set later.
    #[doc(hidden)]
    pub fn validate_immutable_fields(
        &self,
        resource: &ResourceMetadata,
        old: &Value,
        new: &Value,
    ) -> Result<()> {
        let fields = ["metadata.name", "metadata.namespace"]
            .into_iter()
            .chain(resource.immutable_fields.iter().map(String::as_str));

        for field in fields {
            if let Some(old_value) = field_at_path(old, field) {
                if field_at_path(new, field) != Some(old_value) {
                    return Err(Error::ImmutableField {
                        field: field.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    pub(crate) fn strip_managed_fields(&self, value: &mut Value) {
        if self.return_managed_fields {
            return;
        }
        if let Some(meta) = value.get_mut("metadata").and_then(Value::as_object_mut) {
            meta.remove("managedFields");
        }
    }
}

impl Default for FakeClient {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn gvr_of<K: Resource<DynamicType = ()>>() -> GVR {
    GVR::new(K::group(&()), K::version(&()), K::plural(&()))
}

pub(crate) fn gvk_of<K: Resource<DynamicType = ()>>() -> GVK {
    GVK::new(K::group(&()), K::version(&()), K::kind(&()))
}
