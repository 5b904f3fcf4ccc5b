use crate::apis::ResourceStatus;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const GROUP: &str = "ocilb.oracle.com";
pub const VERSION: &str = "v1alpha1";

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[kube(
    group = "ocilb.oracle.com",
    version = "v1alpha1",
    kind = "LoadBalancer",
    namespaced,
    status = "ResourceStatus",
    derive = "PartialEq",
    printcolumn = r#"{"name":"Shape","type":"string","jsonPath":".spec.shapeName"}"#,
    printcolumn = r#"{"name":"State","type":"string","jsonPath":".status.state"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancerSpec {
    pub compartment_ref: String,
    /// e.g. `100Mbps`.
    pub shape_name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subnet_refs: Vec<String>,
    #[serde(default)]
    pub is_private: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthChecker {
    /// `HTTP` or `TCP`.
    pub protocol: String,
    pub port: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_code: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_in_millis: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_in_millis: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retries: Option<i32>,
}

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[kube(
    group = "ocilb.oracle.com",
    version = "v1alpha1",
    kind = "BackendSet",
    namespaced,
    status = "ResourceStatus",
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct BackendSetSpec {
    pub load_balancer_ref: String,
    /// `ROUND_ROBIN`, `LEAST_CONNECTIONS` or `IP_HASH`.
    pub policy: String,
    pub health_checker: HealthChecker,
}

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[kube(
    group = "ocilb.oracle.com",
    version = "v1alpha1",
    kind = "Backend",
    namespaced,
    status = "ResourceStatus",
    derive = "PartialEq",
    printcolumn = r#"{"name":"Address","type":"string","jsonPath":".spec.ipAddress"}"#,
    printcolumn = r#"{"name":"Port","type":"integer","jsonPath":".spec.port"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct BackendSpec {
    pub load_balancer_ref: String,
    pub backend_set_ref: String,
    pub ip_address: String,
    pub port: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<i32>,
    #[serde(default)]
    pub backup: bool,
    #[serde(default)]
    pub drain: bool,
    #[serde(default)]
    pub offline: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SslConfiguration {
    pub certificate_ref: String,
    #[serde(default)]
    pub verify_peer_certificate: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verify_depth: Option<i32>,
}

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[kube(
    group = "ocilb.oracle.com",
    version = "v1alpha1",
    kind = "Listener",
    namespaced,
    status = "ResourceStatus",
    derive = "PartialEq",
    printcolumn = r#"{"name":"Port","type":"integer","jsonPath":".spec.port"}"#,
    printcolumn = r#"{"name":"Protocol","type":"string","jsonPath":".spec.protocol"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ListenerSpec {
    pub load_balancer_ref: String,
    pub default_backend_set_ref: String,
    pub port: i32,
    /// `HTTP` or `TCP`.
    pub protocol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssl_configuration: Option<SslConfiguration>,
}

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[kube(
    group = "ocilb.oracle.com",
    version = "v1alpha1",
    kind = "Certificate",
    namespaced,
    status = "ResourceStatus",
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct CertificateSpec {
    pub load_balancer_ref: String,
    pub certificate_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_certificate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_certificate: Option<String>,
    /// Name of the `Secret` holding the private key and passphrase.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key_secret_ref: Option<String>,
}

oci_resource!(LoadBalancer {
    immutable: ["spec.compartmentRef", "spec.isPrivate"],
    selectable: ["spec.compartmentRef"],
});
oci_resource!(BackendSet {
    immutable: ["spec.loadBalancerRef"],
    selectable: ["spec.loadBalancerRef"],
});
oci_resource!(Backend {
    immutable: ["spec.loadBalancerRef", "spec.backendSetRef", "spec.ipAddress", "spec.port"],
    selectable: ["spec.loadBalancerRef", "spec.backendSetRef"],
});
oci_resource!(Listener {
    immutable: ["spec.loadBalancerRef"],
    selectable: ["spec.loadBalancerRef"],
});
oci_resource!(Certificate {
    immutable: ["spec.loadBalancerRef", "spec.certificateName"],
    selectable: ["spec.loadBalancerRef"],
});
