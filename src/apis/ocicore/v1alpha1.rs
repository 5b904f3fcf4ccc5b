use crate::apis::ResourceStatus;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const GROUP: &str = "ocicore.oracle.com";
pub const VERSION: &str = "v1alpha1";

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DhcpOptionEntry {
    /// `DomainNameServer` or `SearchDomain`.
    #[serde(rename = "type")]
    pub option_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom_dns_servers: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub search_domain_names: Vec<String>,
}

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[kube(
    group = "ocicore.oracle.com",
    version = "v1alpha1",
    kind = "DhcpOption",
    namespaced,
    status = "ResourceStatus",
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct DhcpOptionSpec {
    pub compartment_ref: String,
    pub vcn_ref: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<DhcpOptionEntry>,
}

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[kube(
    group = "ocicore.oracle.com",
    version = "v1alpha1",
    kind = "Instance",
    namespaced,
    status = "ResourceStatus",
    derive = "PartialEq",
    printcolumn = r#"{"name":"Shape","type":"string","jsonPath":".spec.shape"}"#,
    printcolumn = r#"{"name":"State","type":"string","jsonPath":".status.state"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct InstanceSpec {
    pub compartment_ref: String,
    pub availability_domain: String,
    pub shape: String,
    pub image: String,
    pub subnet_ref: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname_label: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[kube(
    group = "ocicore.oracle.com",
    version = "v1alpha1",
    kind = "InternetGateway",
    plural = "internetgatewaies",
    namespaced,
    status = "ResourceStatus",
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct InternetGatewaySpec {
    pub compartment_ref: String,
    pub vcn_ref: String,
    #[serde(default)]
    pub is_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RouteRule {
    pub destination: String,
    /// Name of the gateway the traffic is routed to.
    pub network_entity_ref: String,
}

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[kube(
    group = "ocicore.oracle.com",
    version = "v1alpha1",
    kind = "RouteTable",
    namespaced,
    status = "ResourceStatus",
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct RouteTableSpec {
    pub compartment_ref: String,
    pub vcn_ref: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub route_rules: Vec<RouteRule>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PortRange {
    pub min: i32,
    pub max: i32,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecurityRule {
    /// IANA protocol number or `all`.
    pub protocol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(default)]
    pub is_stateless: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tcp_port_range: Option<PortRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub udp_port_range: Option<PortRange>,
}

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[kube(
    group = "ocicore.oracle.com",
    version = "v1alpha1",
    kind = "SecurityRuleSet",
    namespaced,
    status = "ResourceStatus",
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct SecurityRuleSetSpec {
    pub compartment_ref: String,
    pub vcn_ref: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ingress_security_rules: Vec<SecurityRule>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub egress_security_rules: Vec<SecurityRule>,
}

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[kube(
    group = "ocicore.oracle.com",
    version = "v1alpha1",
    kind = "Subnet",
    namespaced,
    status = "ResourceStatus",
    derive = "PartialEq",
    printcolumn = r#"{"name":"VCN","type":"string","jsonPath":".spec.vcnRef"}"#,
    printcolumn = r#"{"name":"CIDR","type":"string","jsonPath":".spec.cidrBlock"}"#,
    printcolumn = r#"{"name":"State","type":"string","jsonPath":".status.state"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct SubnetSpec {
    pub compartment_ref: String,
    pub vcn_ref: String,
    pub availability_domain: String,
    pub cidr_block: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_table_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security_rule_set_refs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dhcp_option_ref: Option<String>,
    #[serde(default)]
    pub prohibit_public_ip_on_vnic: bool,
}

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[kube(
    group = "ocicore.oracle.com",
    version = "v1alpha1",
    kind = "Vcn",
    namespaced,
    status = "ResourceStatus",
    derive = "PartialEq",
    printcolumn = r#"{"name":"CIDR","type":"string","jsonPath":".spec.cidrBlock"}"#,
    printcolumn = r#"{"name":"State","type":"string","jsonPath":".status.state"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct VcnSpec {
    pub compartment_ref: String,
    pub cidr_block: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[kube(
    group = "ocicore.oracle.com",
    version = "v1alpha1",
    kind = "Volume",
    namespaced,
    status = "ResourceStatus",
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct VolumeSpec {
    pub compartment_ref: String,
    pub availability_domain: String,
    pub size_in_gbs: i64,
    /// Restore from this `VolumeBackup` when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_backup_ref: Option<String>,
}

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[kube(
    group = "ocicore.oracle.com",
    version = "v1alpha1",
    kind = "VolumeBackup",
    namespaced,
    status = "ResourceStatus",
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct VolumeBackupSpec {
    pub volume_ref: String,
    /// `FULL` or `INCREMENTAL`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

oci_resource!(DhcpOption {
    immutable: ["spec.compartmentRef", "spec.vcnRef"],
    selectable: ["spec.vcnRef"],
});
oci_resource!(Instance {
    immutable: ["spec.compartmentRef", "spec.availabilityDomain", "spec.subnetRef"],
    selectable: ["spec.subnetRef", "spec.availabilityDomain"],
});
oci_resource!(InternetGateway {
    immutable: ["spec.compartmentRef", "spec.vcnRef"],
    selectable: ["spec.vcnRef"],
});
oci_resource!(RouteTable {
    immutable: ["spec.compartmentRef", "spec.vcnRef"],
    selectable: ["spec.vcnRef"],
});
oci_resource!(SecurityRuleSet {
    immutable: ["spec.compartmentRef", "spec.vcnRef"],
    selectable: ["spec.vcnRef"],
});
oci_resource!(Subnet {
    immutable: [
        "spec.compartmentRef",
        "spec.vcnRef",
        "spec.availabilityDomain",
        "spec.cidrBlock",
        "spec.dnsLabel",
    ],
    selectable: ["spec.vcnRef", "spec.availabilityDomain"],
});
oci_resource!(Vcn {
    immutable: ["spec.compartmentRef", "spec.cidrBlock", "spec.dnsLabel"],
    selectable: ["spec.compartmentRef"],
});
oci_resource!(Volume {
    immutable: ["spec.compartmentRef", "spec.availabilityDomain", "spec.volumeBackupRef"],
    selectable: ["spec.availabilityDomain"],
});
oci_resource!(VolumeBackup {
    immutable: ["spec.volumeRef", "spec.backupType"],
    selectable: ["spec.volumeRef"],
});

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apis::OciResource;
    use kube::Resource;

    #[test]
    fn test_subnet_resource_literals() {
        assert_eq!(Subnet::group(&()), GROUP);
        assert_eq!(Subnet::version(&()), VERSION);
        assert_eq!(Subnet::kind(&()), "Subnet");
        assert_eq!(Subnet::plural(&()), "subnets");
        assert_eq!(VolumeBackup::plural(&()), "volumebackups");
        assert_eq!(InternetGateway::plural(&()), "internetgatewaies");
    }

    #[test]
    fn test_subnet_serializes_camel_case() {
        let subnet = Subnet::new(
            "subnet-a",
            SubnetSpec {
                compartment_ref: "dev".to_string(),
                vcn_ref: "vcn-1".to_string(),
                availability_domain: "AD-1".to_string(),
                cidr_block: "10.0.1.0/24".to_string(),
                ..Default::default()
            },
        );
        let value = serde_json::to_value(&subnet).unwrap();
        assert_eq!(value["apiVersion"], "ocicore.oracle.com/v1alpha1");
        assert_eq!(value["kind"], "Subnet");
        assert_eq!(value["spec"]["vcnRef"], "vcn-1");
        assert_eq!(value["spec"]["cidrBlock"], "10.0.1.0/24");
        assert!(value["spec"].get("routeTableRef").is_none());
        assert!(subnet.state().is_none());
    }

    #[test]
    fn test_dhcp_option_entry_uses_type_key() {
        let entry = DhcpOptionEntry {
            option_type: "DomainNameServer".to_string(),
            server_type: Some("VcnLocalPlusInternet".to_string()),
            ..Default::default()
        };
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["type"], "DomainNameServer");
        assert_eq!(value["serverType"], "VcnLocalPlusInternet");
    }
}
