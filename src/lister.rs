//! Read-only views over an informer's cache

use crate::indexer::{Indexer, NAMESPACE_INDEX};
use crate::{Error, Result};
use kube::core::{Selector, SelectorExt};
use kube::{Resource, ResourceExt};
use std::sync::Arc;

/// Lists cached objects across all namespaces
pub struct Lister<K> {
    indexer: Indexer<K>,
}

impl<K> Clone for Lister<K> {
    fn clone(&self) -> Self {
        Self {
            indexer: self.indexer.clone(),
        }
    }
}

impl<K> Lister<K>
where
    K: Resource<DynamicType = ()>,
{
    pub fn new(indexer: Indexer<K>) -> Self {
        Self { indexer }
    }

    /// Objects whose labels match `selector`; `Selector::default()` matches all
    pub fn list(&self, selector: &Selector) -> Vec<Arc<K>> {
        list_all(&self.indexer, selector)
    }

    pub fn namespaced(&self, namespace: impl Into<String>) -> NamespaceLister<K> {
        NamespaceLister {
            indexer: self.indexer.clone(),
            namespace: namespace.into(),
        }
    }
}

/// Lists and gets cached objects of one namespace
pub struct NamespaceLister<K> {
    indexer: Indexer<K>,
    namespace: String,
}

impl<K> NamespaceLister<K>
where
    K: Resource<DynamicType = ()>,
{
    pub fn list(&self, selector: &Selector) -> Vec<Arc<K>> {
        list_all_by_namespace(&self.indexer, &self.namespace, selector)
    }

    pub fn get(&self, name: &str) -> Result<Arc<K>> {
        let key = format!("{}/{}", self.namespace, name);
        self.indexer.get_by_key(&key).ok_or_else(|| Error::NotFound {
            kind: format!("{}.{}", K::kind(&()).to_lowercase(), K::group(&())),
            name: name.to_string(),
            namespace: self.namespace.clone(),
        })
    }
}

pub fn list_all<K>(indexer: &Indexer<K>, selector: &Selector) -> Vec<Arc<K>>
where
    K: Resource<DynamicType = ()>,
{
    indexer
        .list()
        .into_iter()
        .filter(|obj| selector.matches(obj.labels()))
        .collect()
}

/// Uses the namespace index when the indexer has one, a full scan otherwise
pub fn list_all_by_namespace<K>(
    indexer: &Indexer<K>,
    namespace: &str,
    selector: &Selector,
) -> Vec<Arc<K>>
where
    K: Resource<DynamicType = ()>,
{
    let candidates = match indexer.by_index(NAMESPACE_INDEX, namespace) {
        Ok(objects) => objects,
        Err(_) => indexer
            .list()
            .into_iter()
            .filter(|obj| obj.namespace().as_deref() == Some(namespace))
            .collect(),
    };

    candidates
        .into_iter()
        .filter(|obj| selector.matches(obj.labels()))
        .collect()
}
