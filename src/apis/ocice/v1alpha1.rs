use crate::apis::ResourceStatus;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const GROUP: &str = "ocice.oracle.com";
pub const VERSION: &str = "v1alpha1";

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[kube(
    group = "ocice.oracle.com",
    version = "v1alpha1",
    kind = "Cluster",
    namespaced,
    status = "ResourceStatus",
    derive = "PartialEq",
    printcolumn = r#"{"name":"Version","type":"string","jsonPath":".spec.kubernetesVersion"}"#,
    printcolumn = r#"{"name":"State","type":"string","jsonPath":".status.state"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSpec {
    pub compartment_ref: String,
    pub vcn_ref: String,
    pub kubernetes_version: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub service_lb_subnet_refs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pods_cidr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub services_cidr: Option<String>,
}

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[kube(
    group = "ocice.oracle.com",
    version = "v1alpha1",
    kind = "NodePool",
    namespaced,
    status = "ResourceStatus",
    derive = "PartialEq",
    printcolumn = r#"{"name":"Cluster","type":"string","jsonPath":".spec.clusterRef"}"#,
    printcolumn = r#"{"name":"State","type":"string","jsonPath":".status.state"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct NodePoolSpec {
    pub compartment_ref: String,
    pub cluster_ref: String,
    pub kubernetes_version: String,
    pub node_image_name: String,
    pub node_shape: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subnet_refs: Vec<String>,
    pub quantity_per_subnet: i32,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub initial_node_labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_public_key: Option<String>,
}

oci_resource!(Cluster {
    immutable: ["spec.compartmentRef", "spec.vcnRef"],
    selectable: ["spec.vcnRef"],
});
oci_resource!(NodePool {
    immutable: ["spec.compartmentRef", "spec.clusterRef"],
    selectable: ["spec.clusterRef"],
});
