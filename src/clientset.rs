//! Typed clients for every OCI manager API group
//!
//! A `Clientset` hands out `kube::Api` handles per kind, so the same controller
//! code runs against a real cluster or a client from [`ClientBuilder`](crate::ClientBuilder).

use crate::apis::{cloud, ocice, ocicore, ocilb, OciResource};
use crate::Result;
use kube::{Api, Client};

macro_rules! group_client {
    (
        $(#[$doc:meta])*
        $name:ident { $($method:ident => $kind:ty),* $(,)? }
    ) => {
        $(#[$doc])*
        #[derive(Clone)]
        pub struct $name {
            client: Client,
        }

        impl $name {
            pub fn new(client: Client) -> Self {
                Self { client }
            }

            $(
                pub fn $method(&self, namespace: &str) -> Api<$kind> {
                    Api::namespaced(self.client.clone(), namespace)
                }
            )*
        }
    };
}

group_client!(
    /// `cloud.k8s.io/v1alpha1`
    CloudV1alpha1Client {
        networks => cloud::v1alpha1::Network,
        storages => cloud::v1alpha1::Storage,
        computes => cloud::v1alpha1::Compute,
        securities => cloud::v1alpha1::Security,
        load_balancers => cloud::v1alpha1::LoadBalancer,
    }
);

group_client!(
    /// `ocice.oracle.com/v1alpha1`
    OciceV1alpha1Client {
        clusters => ocice::v1alpha1::Cluster,
        node_pools => ocice::v1alpha1::NodePool,
    }
);

group_client!(
    /// `ocicore.oracle.com/v1alpha1`
    OcicoreV1alpha1Client {
        dhcp_options => ocicore::v1alpha1::DhcpOption,
        instances => ocicore::v1alpha1::Instance,
        internet_gateways => ocicore::v1alpha1::InternetGateway,
        route_tables => ocicore::v1alpha1::RouteTable,
        security_rule_sets => ocicore::v1alpha1::SecurityRuleSet,
        subnets => ocicore::v1alpha1::Subnet,
        vcns => ocicore::v1alpha1::Vcn,
        volumes => ocicore::v1alpha1::Volume,
        volume_backups => ocicore::v1alpha1::VolumeBackup,
    }
);

group_client!(
    /// `ocilb.oracle.com/v1alpha1`
    OcilbV1alpha1Client {
        load_balancers => ocilb::v1alpha1::LoadBalancer,
        backend_sets => ocilb::v1alpha1::BackendSet,
        backends => ocilb::v1alpha1::Backend,
        listeners => ocilb::v1alpha1::Listener,
        certificates => ocilb::v1alpha1::Certificate,
    }
);

/// Entry point to the typed clients of all API groups
///
/// ```rust,no_run
/// use oci_manager_client::{ClientBuilder, Clientset};
/// use kube::api::ListParams;
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let client = ClientBuilder::new().with_oci_resources().build().await?;
/// let clientset = Clientset::new(client);
///
/// let subnets = clientset.ocicore_v1alpha1().subnets("dev");
/// for subnet in subnets.list(&ListParams::default()).await? {
///     println!("{:?}", subnet.spec.cidr_block);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Clientset {
    client: Client,
}

impl Clientset {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Connect using the local kubeconfig or the in-cluster service account
    pub async fn try_default() -> Result<Self> {
        Ok(Self::new(Client::try_default().await?))
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn cloud_v1alpha1(&self) -> CloudV1alpha1Client {
        CloudV1alpha1Client::new(self.client.clone())
    }

    pub fn ocice_v1alpha1(&self) -> OciceV1alpha1Client {
        OciceV1alpha1Client::new(self.client.clone())
    }

    pub fn ocicore_v1alpha1(&self) -> OcicoreV1alpha1Client {
        OcicoreV1alpha1Client::new(self.client.clone())
    }

    pub fn ocilb_v1alpha1(&self) -> OcilbV1alpha1Client {
        OcilbV1alpha1Client::new(self.client.clone())
    }

    /// Any kind in one namespace
    pub fn namespaced<K: OciResource>(&self, namespace: &str) -> Api<K> {
        Api::namespaced(self.client.clone(), namespace)
    }

    /// Any kind across all namespaces
    pub fn all<K: OciResource>(&self) -> Api<K> {
        Api::all(self.client.clone())
    }
}

impl From<Client> for Clientset {
    fn from(client: Client) -> Self {
        Self::new(client)
    }
}
