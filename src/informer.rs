//! Shared index informer: a local cache kept in sync with the API server
//!
//! The list and watch machinery (resume from the last resource version, relist
//! on `410 Gone`, backoff on errors) comes from `kube::runtime::watcher`. The
//! informer feeds its events into an [`Indexer`] and notifies the registered
//! event handlers.

use crate::indexer::{Delta, Indexer, Indexers};
use crate::lister::Lister;
use crate::Result;
use futures::StreamExt;
use kube::runtime::{watcher, WatchStreamExt};
use kube::{Api, Resource, ResourceExt};
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use std::future::Future;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Receives notifications about changes to the objects of an informer
///
/// Handlers run on the informer task and must not block.
pub trait ResourceEventHandler<K>: Send + Sync {
    fn on_add(&self, _obj: &K) {}

    /// Also called with `old == new` on every resync
    fn on_update(&self, _old: &K, _new: &K) {}

    fn on_delete(&self, _obj: &K) {}
}

type AddFunc<K> = Box<dyn Fn(&K) + Send + Sync>;
type UpdateFunc<K> = Box<dyn Fn(&K, &K) + Send + Sync>;
type DeleteFunc<K> = Box<dyn Fn(&K) + Send + Sync>;

/// [`ResourceEventHandler`] built from closures; unset callbacks do nothing
///
/// ```rust
/// use oci_manager_client::informer::ResourceEventHandlerFuncs;
/// use oci_manager_client::apis::ocicore::v1alpha1::Subnet;
/// use kube::ResourceExt;
///
/// let handler = ResourceEventHandlerFuncs::<Subnet>::new()
///     .add_func(|subnet| println!("added {}", subnet.name_any()))
///     .delete_func(|subnet| println!("deleted {}", subnet.name_any()));
/// ```
pub struct ResourceEventHandlerFuncs<K> {
    add: Option<AddFunc<K>>,
    update: Option<UpdateFunc<K>>,
    delete: Option<DeleteFunc<K>>,
}

impl<K> ResourceEventHandlerFuncs<K> {
    pub fn new() -> Self {
        Self {
            add: None,
            update: None,
            delete: None,
        }
    }

    pub fn add_func(mut self, f: impl Fn(&K) + Send + Sync + 'static) -> Self {
        self.add = Some(Box::new(f));
        self
    }

    pub fn update_func(mut self, f: impl Fn(&K, &K) + Send + Sync + 'static) -> Self {
        self.update = Some(Box::new(f));
        self
    }

    pub fn delete_func(mut self, f: impl Fn(&K) + Send + Sync + 'static) -> Self {
        self.delete = Some(Box::new(f));
        self
    }
}

impl<K> Default for ResourceEventHandlerFuncs<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> ResourceEventHandler<K> for ResourceEventHandlerFuncs<K> {
    fn on_add(&self, obj: &K) {
        if let Some(f) = &self.add {
            f(obj)
        }
    }

    fn on_update(&self, old: &K, new: &K) {
        if let Some(f) = &self.update {
            f(old, new)
        }
    }

    fn on_delete(&self, obj: &K) {
        if let Some(f) = &self.delete {
            f(obj)
        }
    }
}

type Handlers<K> = RwLock<Vec<Arc<dyn ResourceEventHandler<K>>>>;

struct Inner<K> {
    api: Api<K>,
    config: watcher::Config,
    indexer: Indexer<K>,
    handlers: Handlers<K>,
    resync_period: Option<Duration>,
    synced: watch::Sender<bool>,
}

/// Informer over one kind, shared by every consumer of that kind
///
/// Cloning is cheap; clones share the cache, the handlers and the sync state.
pub struct SharedIndexInformer<K> {
    inner: Arc<Inner<K>>,
}

impl<K> Clone for SharedIndexInformer<K> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<K> SharedIndexInformer<K>
where
    K: Resource<DynamicType = ()> + Clone + DeserializeOwned + Debug + Send + Sync + 'static,
{
    /// `resync_period` of `None` or zero disables resync
    pub fn new(api: Api<K>, config: watcher::Config, resync_period: Option<Duration>) -> Self {
        Self::with_indexers(api, config, resync_period, Indexers::new())
    }

    pub fn with_indexers(
        api: Api<K>,
        config: watcher::Config,
        resync_period: Option<Duration>,
        indexers: Indexers<K>,
    ) -> Self {
        let (synced, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                api,
                config,
                indexer: Indexer::new(indexers),
                handlers: RwLock::new(Vec::new()),
                resync_period: resync_period.filter(|p| !p.is_zero()),
                synced,
            }),
        }
    }

    pub fn indexer(&self) -> Indexer<K> {
        self.inner.indexer.clone()
    }

    pub fn lister(&self) -> Lister<K> {
        Lister::new(self.indexer())
    }

    pub fn add_indexers(&self, indexers: Indexers<K>) -> Result<()> {
        self.inner.indexer.add_indexers(indexers)
    }

    /// Register a handler; it is told about every object already cached
    pub fn add_event_handler(&self, handler: impl ResourceEventHandler<K> + 'static) {
        let handler: Arc<dyn ResourceEventHandler<K>> = Arc::new(handler);
        let mut handlers = self.inner.handlers.write().expect("Informer lock poisoned");
        for obj in self.inner.indexer.list() {
            handler.on_add(&obj);
        }
        handlers.push(handler);
    }

    /// Whether the first full list has been stored
    pub fn has_synced(&self) -> bool {
        *self.inner.synced.borrow()
    }

    /// Wait until the first full list has been stored
    pub async fn wait_for_sync(&self) -> bool {
        let mut rx = self.inner.synced.subscribe();
        let synced = rx.wait_for(|synced| *synced).await.is_ok();
        synced
    }

    pub fn resync_period(&self) -> Option<Duration> {
        self.inner.resync_period
    }

    /// List and watch until `shutdown` completes or the watch stream ends
    pub async fn run<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let kind = K::kind(&());
        info!(kind = %kind, "Starting informer");

        let stream = watcher(self.inner.api.clone(), self.inner.config.clone()).default_backoff();
        futures::pin_mut!(stream);
        futures::pin_mut!(shutdown);

        let mut resync = self.inner.resync_period.map(|period| {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });
        let mut init_buffer = Vec::new();

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = tick(&mut resync) => self.resync(),
                event = stream.next() => match event {
                    Some(Ok(event)) => self.handle_event(event, &mut init_buffer),
                    Some(Err(err)) => warn!(kind = %kind, error = %err, "Watch failed, retrying"),
                    None => break,
                },
            }
        }

        info!(kind = %kind, "Stopped informer");
    }

    fn handle_event(&self, event: watcher::Event<K>, init_buffer: &mut Vec<K>) {
        // Handlers stay locked while the cache changes so a handler added
        // concurrently sees every object exactly once.
        let handlers = self.inner.handlers.read().expect("Informer lock poisoned");

        match event {
            watcher::Event::Init => init_buffer.clear(),
            watcher::Event::InitApply(obj) => init_buffer.push(obj),
            watcher::Event::InitDone => {
                let deltas = self.inner.indexer.replace(std::mem::take(init_buffer));
                debug!(
                    kind = %K::kind(&()),
                    objects = self.inner.indexer.len(),
                    "Relisted"
                );
                for delta in &deltas {
                    for handler in handlers.iter() {
                        match delta {
                            Delta::Added(obj) => handler.on_add(obj),
                            Delta::Updated { old, new } => handler.on_update(old, new),
                            Delta::Deleted(obj) => handler.on_delete(obj),
                        }
                    }
                }
                self.inner.synced.send_replace(true);
            }
            watcher::Event::Apply(obj) => {
                let new = obj.clone();
                match self.inner.indexer.add(obj) {
                    Some(old) => handlers.iter().for_each(|h| h.on_update(&old, &new)),
                    None => handlers.iter().for_each(|h| h.on_add(&new)),
                }
            }
            watcher::Event::Delete(obj) => {
                if self.inner.indexer.delete(&obj).is_none() {
                    debug!(name = %obj.name_any(), "Deleted object was not cached");
                }
                handlers.iter().for_each(|h| h.on_delete(&obj));
            }
        }
    }

    fn resync(&self) {
        if !self.has_synced() {
            return;
        }
        let handlers = self.inner.handlers.read().expect("Informer lock poisoned");
        for obj in self.inner.indexer.list() {
            for handler in handlers.iter() {
                handler.on_update(&obj, &obj);
            }
        }
    }
}

async fn tick(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}
