use crate::apis::ResourceStatus;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const GROUP: &str = "cloud.k8s.io";
pub const VERSION: &str = "v1alpha1";

/// A private network spread over one or more availability domains.
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[kube(
    group = "cloud.k8s.io",
    version = "v1alpha1",
    kind = "Network",
    namespaced,
    status = "ResourceStatus",
    derive = "PartialEq",
    printcolumn = r#"{"name":"CIDR","type":"string","jsonPath":".spec.cidrBlock"}"#,
    printcolumn = r#"{"name":"State","type":"string","jsonPath":".status.state"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSpec {
    pub cidr_block: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub availability_domains: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns_label: Option<String>,
}

/// Block storage attached by claim.
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[kube(
    group = "cloud.k8s.io",
    version = "v1alpha1",
    kind = "Storage",
    namespaced,
    status = "ResourceStatus",
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct StorageSpec {
    pub availability_domain: String,
    pub size_in_gbs: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_policy: Option<String>,
}

/// A group of identical instances placed on a network.
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[kube(
    group = "cloud.k8s.io",
    version = "v1alpha1",
    kind = "Compute",
    namespaced,
    status = "ResourceStatus",
    derive = "PartialEq",
    printcolumn = r#"{"name":"Replicas","type":"integer","jsonPath":".spec.replicas"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ComputeSpec {
    /// Name of the `Network` in the same namespace.
    pub network: String,
    pub replicas: i32,
    pub shape: String,
    pub image: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ssh_keys: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub security_selector: BTreeMap<String, String>,
}

/// Firewall rules applied to the networks it selects.
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[kube(
    group = "cloud.k8s.io",
    version = "v1alpha1",
    kind = "Security",
    plural = "securities",
    namespaced,
    status = "ResourceStatus",
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct SecuritySpec {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub network_selector: BTreeMap<String, String>,
    /// Rules in `protocol source port` form, e.g. `tcp 0.0.0.0/0 443`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ingress: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub egress: Vec<String>,
}

/// A load balancer in front of a `Compute`.
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[kube(
    group = "cloud.k8s.io",
    version = "v1alpha1",
    kind = "LoadBalancer",
    namespaced,
    status = "ResourceStatus",
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancerSpec {
    /// Name of the `Compute` in the same namespace.
    pub compute: String,
    pub shape: String,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance_mode: Option<String>,
}

oci_resource!(Network {
    immutable: ["spec.cidrBlock", "spec.dnsLabel"],
    selectable: [],
});
oci_resource!(Storage {
    immutable: ["spec.availabilityDomain"],
    selectable: ["spec.availabilityDomain"],
});
oci_resource!(Compute {
    immutable: ["spec.network"],
    selectable: ["spec.network"],
});
oci_resource!(Security {
    immutable: [],
    selectable: [],
});
oci_resource!(LoadBalancer {
    immutable: ["spec.isPrivate"],
    selectable: ["spec.compute"],
});
