//! Factory handing out one shared informer per kind
//!
//! ```rust,no_run
//! use oci_manager_client::{ClientBuilder, SharedInformerFactory};
//! use kube::core::Selector;
//! use std::time::Duration;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ClientBuilder::new().with_oci_resources().build().await?;
//! let factory = SharedInformerFactory::new(client, Duration::from_secs(30));
//!
//! let subnets = factory.ocicore().v1alpha1().subnets();
//! factory.start();
//! factory.wait_for_cache_sync().await;
//!
//! let dev = subnets.lister().namespaced("dev").list(&Selector::default());
//! println!("{} subnets in dev", dev.len());
//!
//! factory.shutdown().await;
//! # Ok(())
//! # }
//! ```

use crate::apis::{cloud, ocice, ocicore, ocilb};
use crate::indexer::{meta_namespace_index_func, Indexers, NAMESPACE_INDEX};
use crate::informer::SharedIndexInformer;
use crate::lister::Lister;
use futures::future::BoxFuture;
use futures::FutureExt;
use k8s_openapi::NamespaceResourceScope;
use kube::runtime::watcher;
use kube::{Api, Client, Resource};
use serde::de::DeserializeOwned;
use std::any::{Any, TypeId};
use std::collections::{BTreeMap, HashMap};
use std::fmt::Debug;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

type TweakListOptions = Arc<dyn Fn(&mut watcher::Config) + Send + Sync>;

/// Type-erased view of a `SharedIndexInformer<K>`
trait ErasedInformer: Send + Sync {
    fn name(&self) -> String;
    fn has_synced(&self) -> bool;
    fn wait_for_sync(&self) -> BoxFuture<'static, bool>;
    fn spawn(&self, shutdown: watch::Receiver<bool>) -> JoinHandle<()>;
    fn as_any(&self) -> &dyn Any;
}

impl<K> ErasedInformer for SharedIndexInformer<K>
where
    K: Resource<DynamicType = ()> + Clone + DeserializeOwned + Debug + Send + Sync + 'static,
{
    fn name(&self) -> String {
        format!("{}.{}", K::plural(&()), K::group(&()))
    }

    fn has_synced(&self) -> bool {
        SharedIndexInformer::has_synced(self)
    }

    fn wait_for_sync(&self) -> BoxFuture<'static, bool> {
        let informer = self.clone();
        async move { informer.wait_for_sync().await }.boxed()
    }

    fn spawn(&self, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        let informer = self.clone();
        tokio::spawn(async move {
            informer
                .run(async move {
                    let _ = shutdown.wait_for(|stop| *stop).await;
                })
                .await
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Shares informers between every consumer in a process
///
/// All informers watch the same namespace (or all namespaces) with the same
/// list options.
pub struct SharedInformerFactory {
    client: Client,
    namespace: Option<String>,
    default_resync: Duration,
    custom_resync: HashMap<TypeId, Duration>,
    tweak_list_options: Option<TweakListOptions>,
    informers: Mutex<HashMap<TypeId, Arc<dyn ErasedInformer>>>,
    started: Mutex<HashMap<TypeId, JoinHandle<()>>>,
    shutdown: watch::Sender<bool>,
}

impl SharedInformerFactory {
    /// A zero `default_resync` disables resync
    pub fn new(client: Client, default_resync: Duration) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            client,
            namespace: None,
            default_resync,
            custom_resync: HashMap::new(),
            tweak_list_options: None,
            informers: Mutex::new(HashMap::new()),
            started: Mutex::new(HashMap::new()),
            shutdown,
        }
    }

    /// Limit every informer to one namespace
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Adjust the list/watch options, e.g. to set a label selector
    pub fn with_tweak_list_options(
        mut self,
        tweak: impl Fn(&mut watcher::Config) + Send + Sync + 'static,
    ) -> Self {
        self.tweak_list_options = Some(Arc::new(tweak));
        self
    }

    pub fn with_custom_resync<K: 'static>(mut self, period: Duration) -> Self {
        self.custom_resync.insert(TypeId::of::<K>(), period);
        self
    }

    /// The shared informer of `K`, created with a namespace index on first use
    pub fn informer_for<K>(&self) -> SharedIndexInformer<K>
    where
        K: Resource<DynamicType = (), Scope = NamespaceResourceScope>
            + Clone
            + DeserializeOwned
            + Debug
            + Send
            + Sync
            + 'static,
    {
        let type_id = TypeId::of::<K>();
        let mut informers = self.informers.lock().expect("SharedInformerFactory lock poisoned");
        if let Some(informer) = informers
            .get(&type_id)
            .and_then(|i| i.as_any().downcast_ref::<SharedIndexInformer<K>>())
        {
            return informer.clone();
        }

        let api: Api<K> = match &self.namespace {
            Some(ns) => Api::namespaced(self.client.clone(), ns),
            None => Api::all(self.client.clone()),
        };
        let mut config = watcher::Config::default();
        if let Some(tweak) = &self.tweak_list_options {
            tweak(&mut config);
        }
        let resync = self
            .custom_resync
            .get(&type_id)
            .copied()
            .unwrap_or(self.default_resync);

        let mut indexers = Indexers::new();
        indexers.insert(NAMESPACE_INDEX.to_string(), meta_namespace_index_func::<K>());

        let informer = SharedIndexInformer::with_indexers(api, config, Some(resync), indexers);
        debug!(kind = %K::kind(&()), "Created shared informer");
        informers.insert(type_id, Arc::new(informer.clone()));
        informer
    }

    /// Run every informer that is not running yet
    pub fn start(&self) {
        let informers = self.informers.lock().expect("SharedInformerFactory lock poisoned");
        let mut started = self.started.lock().expect("SharedInformerFactory lock poisoned");
        for (type_id, informer) in informers.iter() {
            if started.contains_key(type_id) {
                continue;
            }
            started.insert(*type_id, informer.spawn(self.shutdown.subscribe()));
        }
    }

    /// Wait for every started informer to sync, keyed by `plural.group`
    ///
    /// An informer that is still unsynced at shutdown reports `false`.
    pub async fn wait_for_cache_sync(&self) -> BTreeMap<String, bool> {
        let pending: Vec<_> = {
            let informers = self.informers.lock().expect("SharedInformerFactory lock poisoned");
            let started = self.started.lock().expect("SharedInformerFactory lock poisoned");
            informers
                .iter()
                .filter(|(type_id, _)| started.contains_key(*type_id))
                .map(|(_, informer)| informer.clone())
                .collect()
        };

        let mut result = BTreeMap::new();
        for informer in pending {
            let mut shutdown = self.shutdown.subscribe();
            let synced = tokio::select! {
                synced = informer.wait_for_sync() => synced,
                _ = shutdown.wait_for(|stop| *stop) => informer.has_synced(),
            };
            result.insert(informer.name(), synced);
        }
        result
    }

    /// Stop every informer and wait for them to finish
    pub async fn shutdown(&self) {
        self.shutdown.send_replace(true);
        let handles: Vec<_> = self
            .started
            .lock()
            .expect("SharedInformerFactory lock poisoned")
            .drain()
            .map(|(_, handle)| handle)
            .collect();
        for handle in handles {
            if let Err(err) = handle.await {
                warn!(error = %err, "Informer task failed");
            }
        }
    }

    pub fn cloud(&self) -> CloudInformers<'_> {
        CloudInformers { factory: self }
    }

    pub fn ocice(&self) -> OciceInformers<'_> {
        OciceInformers { factory: self }
    }

    pub fn ocicore(&self) -> OcicoreInformers<'_> {
        OcicoreInformers { factory: self }
    }

    pub fn ocilb(&self) -> OcilbInformers<'_> {
        OcilbInformers { factory: self }
    }
}

/// Informer and lister of one kind
pub struct ResourceInformer<K> {
    informer: SharedIndexInformer<K>,
}

impl<K> ResourceInformer<K>
where
    K: Resource<DynamicType = ()> + Clone + DeserializeOwned + Debug + Send + Sync + 'static,
{
    pub fn informer(&self) -> SharedIndexInformer<K> {
        self.informer.clone()
    }

    pub fn lister(&self) -> Lister<K> {
        self.informer.lister()
    }
}

macro_rules! group_informers {
    ($group:ident, $version:ident { $($method:ident => $kind:ty),* $(,)? }) => {
        pub struct $group<'a> {
            factory: &'a SharedInformerFactory,
        }

        impl<'a> $group<'a> {
            pub fn v1alpha1(&self) -> $version<'a> {
                $version { factory: self.factory }
            }
        }

        pub struct $version<'a> {
            factory: &'a SharedInformerFactory,
        }

        impl $version<'_> {
            $(
                pub fn $method(&self) -> ResourceInformer<$kind> {
                    ResourceInformer {
                        informer: self.factory.informer_for::<$kind>(),
                    }
                }
            )*
        }
    };
}

group_informers!(CloudInformers, CloudV1alpha1Informers {
    networks => cloud::v1alpha1::Network,
    storages => cloud::v1alpha1::Storage,
    computes => cloud::v1alpha1::Compute,
    securities => cloud::v1alpha1::Security,
    load_balancers => cloud::v1alpha1::LoadBalancer,
});

group_informers!(OciceInformers, OciceV1alpha1Informers {
    clusters => ocice::v1alpha1::Cluster,
    node_pools => ocice::v1alpha1::NodePool,
});

group_informers!(OcicoreInformers, OcicoreV1alpha1Informers {
    dhcp_options => ocicore::v1alpha1::DhcpOption,
    instances => ocicore::v1alpha1::Instance,
    internet_gateways => ocicore::v1alpha1::InternetGateway,
    route_tables => ocicore::v1alpha1::RouteTable,
    security_rule_sets => ocicore::v1alpha1::SecurityRuleSet,
    subnets => ocicore::v1alpha1::Subnet,
    vcns => ocicore::v1alpha1::Vcn,
    volumes => ocicore::v1alpha1::Volume,
    volume_backups => ocicore::v1alpha1::VolumeBackup,
});

group_informers!(OcilbInformers, OcilbV1alpha1Informers {
    load_balancers => ocilb::v1alpha1::LoadBalancer,
    backend_sets => ocilb::v1alpha1::BackendSet,
    backends => ocilb::v1alpha1::Backend,
    listeners => ocilb::v1alpha1::Listener,
    certificates => ocilb::v1alpha1::Certificate,
});
