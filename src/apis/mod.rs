//! Custom resource types of the OCI manager API groups.
//!
//! Every kind is a namespaced `CustomResource` with a kind-specific spec and the
//! shared [`ResourceStatus`] as its status subresource.

use crate::registry::ResourceMetadata;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use k8s_openapi::NamespaceResourceScope;
use kube::{CustomResourceExt, Resource};
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;

/// Implements [`OciResource`] for a generated custom resource type.
macro_rules! oci_resource {
    ($kind:ty { immutable: [$($imm:literal),* $(,)?], selectable: [$($sel:literal),* $(,)?] $(,)? }) => {
        impl $crate::apis::OciResource for $kind {
            const IMMUTABLE_FIELDS: &'static [&'static str] = &[$($imm),*];
            const SELECTABLE_FIELDS: &'static [&'static str] = &[$($sel),*];

            fn resource_status(&self) -> Option<&$crate::apis::ResourceStatus> {
                self.status.as_ref()
            }
        }
    };
}

mod common;

pub mod cloud {
    //! `cloud.k8s.io`: provider-neutral abstractions.
    pub mod v1alpha1;
}

pub mod ocice {
    //! `ocice.oracle.com`: Container Engine clusters and node pools.
    pub mod v1alpha1;
}

pub mod ocicore {
    //! `ocicore.oracle.com`: core networking, compute and block storage.
    pub mod v1alpha1;
}

pub mod ocilb {
    //! `ocilb.oracle.com`: load balancers and their components.
    pub mod v1alpha1;
}

pub use common::{ResourceState, ResourceStatus};

/// Behaviour shared by every OCI manager custom resource.
pub trait OciResource:
    CustomResourceExt
    + Resource<DynamicType = (), Scope = NamespaceResourceScope>
    + Clone
    + Debug
    + Serialize
    + DeserializeOwned
    + Send
    + Sync
    + 'static
{
    /// Dotted JSON paths that may not change once the object exists.
    const IMMUTABLE_FIELDS: &'static [&'static str] = &[];

    /// Dotted JSON paths usable in field selectors besides `metadata.name`
    /// and `metadata.namespace`.
    const SELECTABLE_FIELDS: &'static [&'static str] = &[];

    fn resource_status(&self) -> Option<&ResourceStatus>;

    /// Lifecycle state reported by the status subresource, if any.
    fn state(&self) -> Option<ResourceState> {
        self.resource_status().and_then(|s| s.state)
    }
}

/// Expands `$m!` with the path of every kind, in API group order.
macro_rules! all_kinds {
    ($m:ident) => {
        $m!(
            cloud::v1alpha1::Network,
            cloud::v1alpha1::Storage,
            cloud::v1alpha1::Compute,
            cloud::v1alpha1::Security,
            cloud::v1alpha1::LoadBalancer,
            ocice::v1alpha1::Cluster,
            ocice::v1alpha1::NodePool,
            ocicore::v1alpha1::DhcpOption,
            ocicore::v1alpha1::Instance,
            ocicore::v1alpha1::InternetGateway,
            ocicore::v1alpha1::RouteTable,
            ocicore::v1alpha1::SecurityRuleSet,
            ocicore::v1alpha1::Subnet,
            ocicore::v1alpha1::Vcn,
            ocicore::v1alpha1::Volume,
            ocicore::v1alpha1::VolumeBackup,
            ocilb::v1alpha1::LoadBalancer,
            ocilb::v1alpha1::BackendSet,
            ocilb::v1alpha1::Backend,
            ocilb::v1alpha1::Listener,
            ocilb::v1alpha1::Certificate,
        )
    };
}

macro_rules! collect_metadata {
    ($($ty:ty),* $(,)?) => {
        vec![$(ResourceMetadata::of::<$ty>()),*]
    };
}

macro_rules! collect_crds {
    ($($ty:ty),* $(,)?) => {
        vec![$(<$ty as CustomResourceExt>::crd()),*]
    };
}

static ALL_RESOURCES: Lazy<Vec<ResourceMetadata>> = Lazy::new(|| all_kinds!(collect_metadata));

/// Registration metadata for every kind of every API group.
pub fn all_resources() -> &'static [ResourceMetadata] {
    &ALL_RESOURCES
}

/// The `CustomResourceDefinition` of every kind.
pub fn crds() -> Vec<CustomResourceDefinition> {
    all_kinds!(collect_crds)
}
