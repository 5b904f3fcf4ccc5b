//! Resource registry for custom resource definitions (CRDs)
//!
//! Similar to how Kubernetes requires CRDs to be installed before they can be
//! used, the fake client only serves resources that were registered, either one by
//! one or all OCI manager kinds at once.

use crate::apis::OciResource;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::CustomResourceExt;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Metadata for a registered resource type
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceMetadata {
    /// The Kind name (e.g., "Subnet")
    pub kind: String,
    /// The API group (e.g., "ocicore.oracle.com")
    pub group: String,
    /// The served version (e.g., "v1alpha1")
    pub version: String,
    /// The plural name (e.g., "subnets")
    pub plural: String,
    /// Whether the resource is namespaced
    pub namespaced: bool,
    /// Whether the CRD declares a status subresource
    pub status_subresource: bool,
    /// Dotted paths that may not change after creation
    pub immutable_fields: Vec<String>,
    /// Dotted paths accepted by field selectors
    pub selectable_fields: Vec<String>,
    /// The `openAPIV3Schema` of the served version
    pub schema: Option<Value>,
}

impl ResourceMetadata {
    /// Extract metadata from a CRD, using its storage version.
    pub fn from_crd(crd: &CustomResourceDefinition) -> Self {
        let spec = &crd.spec;
        let version = spec
            .versions
            .iter()
            .find(|v| v.storage)
            .or_else(|| spec.versions.first());

        Self {
            kind: spec.names.kind.clone(),
            group: spec.group.clone(),
            version: version.map(|v| v.name.clone()).unwrap_or_default(),
            plural: spec.names.plural.clone(),
            namespaced: spec.scope == "Namespaced",
            status_subresource: version
                .and_then(|v| v.subresources.as_ref())
                .is_some_and(|s| s.status.is_some()),
            immutable_fields: Vec::new(),
            selectable_fields: Vec::new(),
            schema: version
                .and_then(|v| v.schema.as_ref())
                .and_then(|s| s.open_api_v3_schema.as_ref())
                .and_then(|s| serde_json::to_value(s).ok()),
        }
    }

    /// Metadata of an OCI manager kind, including its field rules.
    pub fn of<K: OciResource>() -> Self {
        let mut meta = Self::from_crd(&K::crd());
        meta.immutable_fields = K::IMMUTABLE_FIELDS.iter().map(|f| f.to_string()).collect();
        meta.selectable_fields = K::SELECTABLE_FIELDS.iter().map(|f| f.to_string()).collect();
        meta
    }

    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }
}

/// Registry for custom resource types
///
/// Stores metadata about registered CRDs to enable URL parsing and discovery.
#[derive(Debug, Default)]
pub struct ResourceRegistry {
    /// Lookup by (group, version, plural) -> ResourceMetadata
    resources: RwLock<HashMap<(String, String, String), Arc<ResourceMetadata>>>,
}

impl ResourceRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            resources: RwLock::new(HashMap::new()),
        }
    }

    /// Register a resource type from its generated CRD
    pub fn register<K: CustomResourceExt>(&self) {
        self.register_metadata(ResourceMetadata::from_crd(&K::crd()));
    }

    pub fn register_metadata(&self, metadata: ResourceMetadata) {
        let key = (
            metadata.group.clone(),
            metadata.version.clone(),
            metadata.plural.clone(),
        );
        self.resources
            .write()
            .expect("ResourceRegistry lock poisoned")
            .insert(key, Arc::new(metadata));
    }

    /// Look up a resource by (group, version, plural)
    pub fn lookup(&self, group: &str, version: &str, plural: &str) -> Option<Arc<ResourceMetadata>> {
        self.resources
            .read()
            .expect("ResourceRegistry lock poisoned")
            .get(&(group.to_string(), version.to_string(), plural.to_string()))
            .cloned()
    }

    /// Look up a resource by (group, version, kind)
    pub fn lookup_by_kind(
        &self,
        group: &str,
        version: &str,
        kind: &str,
    ) -> Option<Arc<ResourceMetadata>> {
        self.resources
            .read()
            .expect("ResourceRegistry lock poisoned")
            .values()
            .find(|m| m.group == group && m.version == version && m.kind == kind)
            .cloned()
    }

    /// Get the plural for a given kind
    pub fn kind_to_plural(&self, group: &str, version: &str, kind: &str) -> Option<String> {
        self.lookup_by_kind(group, version, kind)
            .map(|m| m.plural.clone())
    }

    /// Every registered resource
    pub fn all(&self) -> Vec<Arc<ResourceMetadata>> {
        self.resources
            .read()
            .expect("ResourceRegistry lock poisoned")
            .values()
            .cloned()
            .collect()
    }
}
