//! Builder for constructing fake clients with various options

use crate::apis::{self, OciResource};
use crate::client::{gvk_of, FakeClient};
use crate::client_utils::{extract_gvk, extract_namespace};
use crate::field_selectors::IndexerFunc;
use crate::interceptor;
use crate::registry::{ResourceMetadata, ResourceRegistry};
use crate::tracker::{ObjectTracker, GVK, GVR};
use crate::{Error, Result};
use kube::{CustomResourceExt, Resource};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};
use tracing::debug;

/// Builder for creating fake clients
///
/// Only registered resources are served, like CRDs that must be installed in a
/// real cluster. Everything else answers 404.
///
/// # Example
///
/// ```rust,no_run
/// use oci_manager_client::ClientBuilder;
/// use oci_manager_client::apis::ocicore::v1alpha1::{Subnet, SubnetSpec};
/// use kube::Api;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let subnet = Subnet::new("web", SubnetSpec::default());
///     let client = ClientBuilder::new()
///         .with_oci_resources()
///         .with_object(subnet)
///         .build()
///         .await?;
///
///     let subnets: Api<Subnet> = Api::default_namespaced(client);
///     subnets.get("web").await?;
///     Ok(())
/// }
/// ```
pub struct ClientBuilder {
    resources: Vec<ResourceMetadata>,
    initial_objects: Vec<Value>,
    with_status_subresource: Vec<GVK>,
    indexes: HashMap<GVK, HashMap<String, IndexerFunc>>,
    return_managed_fields: bool,
    fixture_dir: Option<PathBuf>,
    interceptors: Option<interceptor::Funcs>,
    #[cfg(feature = "validation")]
    schema_validation: bool,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self {
            resources: Vec::new(),
            initial_objects: Vec::new(),
            with_status_subresource: Vec::new(),
            indexes: HashMap::new(),
            return_managed_fields: false,
            fixture_dir: None,
            interceptors: None,
            #[cfg(feature = "validation")]
            schema_validation: false,
        }
    }

    /// Serve every OCI manager kind, with its immutable and selectable fields
    pub fn with_oci_resources(mut self) -> Self {
        self.resources.extend(apis::all_resources().iter().cloned());
        self
    }

    /// Serve one OCI manager kind
    pub fn with_oci_resource<K: OciResource>(mut self) -> Self {
        self.resources.push(ResourceMetadata::of::<K>());
        self
    }

    /// Serve any custom resource from its generated CRD
    pub fn with_resource<K: CustomResourceExt>(mut self) -> Self {
        self.resources.push(ResourceMetadata::from_crd(&K::crd()));
        self
    }

    /// Add an initial object, stored as-is when the client is built
    pub fn with_object<K>(mut self, obj: K) -> Self
    where
        K: Resource + Serialize,
    {
        if let Ok(value) = serde_json::to_value(&obj) {
            self.initial_objects.push(value);
        }
        self
    }

    pub fn with_objects<K>(mut self, objects: impl IntoIterator<Item = K>) -> Self
    where
        K: Resource + Serialize,
    {
        for obj in objects {
            self = self.with_object(obj);
        }
        self
    }

    /// Add initial objects from JSON values
    pub fn with_runtime_objects(mut self, objects: Vec<Value>) -> Self {
        self.initial_objects.extend(objects);
        self
    }

    /// Enable the status subresource for a type
    ///
    /// Kinds whose CRD declares a status subresource have it enabled already.
    /// With a status subresource, regular updates keep the stored status and
    /// status updates keep everything else.
    pub fn with_status_subresource<K>(mut self) -> Self
    where
        K: Resource<DynamicType = ()>,
    {
        self.with_status_subresource.push(gvk_of::<K>());
        self
    }

    /// Register an index so field selectors can use `field`
    ///
    /// ```rust,no_run
    /// use oci_manager_client::ClientBuilder;
    /// use oci_manager_client::apis::ocicore::v1alpha1::Subnet;
    /// use std::sync::Arc;
    ///
    /// let builder = ClientBuilder::new()
    ///     .with_oci_resources()
    ///     .with_index::<Subnet>(
    ///         "spec.availabilityDomain",
    ///         Arc::new(|obj| {
    ///             obj["spec"]["availabilityDomain"]
    ///                 .as_str()
    ///                 .map(|s| vec![s.to_string()])
    ///                 .unwrap_or_default()
    ///         }),
    ///     );
    /// ```
    pub fn with_index<K>(mut self, field: impl Into<String>, indexer: IndexerFunc) -> Self
    where
        K: Resource<DynamicType = ()>,
    {
        self.indexes
            .entry(gvk_of::<K>())
            .or_default()
            .insert(field.into(), indexer);
        self
    }

    /// Keep `metadata.managedFields` in responses; stripped by default
    pub fn with_return_managed_fields(mut self) -> Self {
        self.return_managed_fields = true;
        self
    }

    /// Hook into individual verbs to override results or inject errors
    ///
    /// ```rust,no_run
    /// use oci_manager_client::{interceptor, ClientBuilder, Error};
    ///
    /// let builder = ClientBuilder::new()
    ///     .with_oci_resources()
    ///     .with_interceptor_funcs(interceptor::Funcs::new().create(|ctx| {
    ///         if ctx.object["metadata"]["name"] == "trigger-error" {
    ///             return Err(Error::Internal("injected error".into()));
    ///         }
    ///         Ok(None)
    ///     }));
    /// ```
    pub fn with_interceptor_funcs(mut self, interceptors: interceptor::Funcs) -> Self {
        self.interceptors = Some(interceptors);
        self
    }

    /// Validate written objects against each CRD's `openAPIV3Schema`
    #[cfg(feature = "validation")]
    pub fn with_schema_validation(mut self) -> Self {
        self.schema_validation = true;
        self
    }

    /// Base directory for `load_fixture` paths
    pub fn with_fixture_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.fixture_dir = Some(dir.into());
        self
    }

    /// Load objects from a YAML file, single or multi-document (`---`)
    ///
    /// Objects without a namespace land in `default`.
    pub fn load_fixture(mut self, path: impl AsRef<Path>) -> Result<Self> {
        let fixture_path = match &self.fixture_dir {
            Some(dir) => dir.join(path),
            None => path.as_ref().to_path_buf(),
        };

        let content = std::fs::read_to_string(&fixture_path).map_err(|e| {
            Error::Internal(format!("Failed to read fixture file {:?}: {}", fixture_path, e))
        })?;

        use serde::Deserialize;
        for document in serde_yaml::Deserializer::from_str(&content) {
            let mut value = Value::deserialize(document).map_err(|e| {
                Error::Internal(format!("Failed to parse YAML in {:?}: {}", fixture_path, e))
            })?;

            // Empty documents, e.g. a trailing `---`
            if value.is_null() {
                continue;
            }

            if let Some(metadata) = value.get_mut("metadata").and_then(|m| m.as_object_mut()) {
                metadata
                    .entry("namespace")
                    .or_insert_with(|| Value::String("default".to_string()));
            }

            self.initial_objects.push(value);
        }

        Ok(self)
    }

    pub fn load_fixtures<P>(mut self, paths: impl IntoIterator<Item = P>) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        for path in paths {
            self = self.load_fixture(path)?;
        }
        Ok(self)
    }

    /// # Panics
    ///
    /// Panics if the fixture file cannot be loaded or parsed.
    pub fn load_fixture_or_panic(self, path: impl AsRef<Path>) -> Self {
        self.load_fixture(path).expect("Failed to load fixture")
    }

    /// # Panics
    ///
    /// Panics if any fixture file cannot be loaded or parsed.
    pub fn load_fixtures_or_panic<P>(self, paths: impl IntoIterator<Item = P>) -> Self
    where
        P: AsRef<Path>,
    {
        self.load_fixtures(paths).expect("Failed to load fixtures")
    }

    /// Build a `kube::Client` backed by the in-memory API server
    ///
    /// # Errors
    ///
    /// Returns an error if an initial object is of an unregistered kind or
    /// cannot be stored.
    pub async fn build(self) -> Result<kube::Client> {
        self.build_with_fake().await.map(|(client, _)| client)
    }

    /// Like [`build`](Self::build), also returning the handle for inspecting
    /// recorded actions and stored objects
    pub async fn build_with_fake(self) -> Result<(kube::Client, FakeClient)> {
        let registry = ResourceRegistry::new();
        let tracker = ObjectTracker::new();

        for resource in self.resources {
            if resource.status_subresource {
                tracker.add_status_subresource(GVK::new(
                    &resource.group,
                    &resource.version,
                    &resource.kind,
                ));
            }
            registry.register_metadata(resource);
        }
        for gvk in self.with_status_subresource {
            tracker.add_status_subresource(gvk);
        }

        // add() keeps caller-provided resource versions, like seeding a cluster
        for obj in self.initial_objects {
            let gvk = extract_gvk(&obj)?;
            let resource = registry
                .lookup_by_kind(&gvk.group, &gvk.version, &gvk.kind)
                .ok_or_else(|| Error::ResourceNotRegistered {
                    group: gvk.group.clone(),
                    version: gvk.version.clone(),
                    resource: format!("{} (kind)", gvk.kind),
                })?;
            let gvr = GVR::new(&resource.group, &resource.version, &resource.plural);
            let namespace = if resource.namespaced {
                extract_namespace(&obj)
            } else {
                String::new()
            };

            tracker
                .add(&gvr, &gvk, obj, &namespace)
                .map_err(|e| Error::Internal(format!("Failed to add initial object: {}", e)))?;
        }

        let fake_client = FakeClient {
            tracker: Arc::new(tracker),
            registry: Arc::new(registry),
            indexes: Arc::new(RwLock::new(self.indexes)),
            return_managed_fields: self.return_managed_fields,
            interceptors: self.interceptors.map(Arc::new),
            validator: None,
            actions: Arc::new(Mutex::new(Vec::new())),
        };

        #[cfg(feature = "validation")]
        let fake_client = if self.schema_validation {
            FakeClient {
                validator: Some(Arc::new(crate::validator::CrdSchemaValidator::new())),
                ..fake_client
            }
        } else {
            fake_client
        };

        debug!(
            "Built fake client serving {} resources",
            fake_client.registry.all().len()
        );

        let service = crate::mock_service::MockService::new(fake_client.clone());
        let kube_client = kube::Client::new(service, "default");

        Ok((kube_client, fake_client))
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
