//! Thread-safe local object cache with secondary indexes
//!
//! Objects are keyed by `namespace/name` (just `name` for cluster-scoped
//! objects). Index functions map an object to any number of index values; the
//! indexer keeps a reverse lookup from each value to the keys that produced it.

use crate::{Error, Result};
use kube::{Resource, ResourceExt};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, RwLock};

/// Maps an object to the values it is indexed under
pub type IndexFunc<K> = Arc<dyn Fn(&K) -> Vec<String> + Send + Sync>;

/// Named index functions
pub type Indexers<K> = HashMap<String, IndexFunc<K>>;

/// Name of the index over `metadata.namespace`
pub const NAMESPACE_INDEX: &str = "namespace";

/// Cache key of an object: `namespace/name`, or `name` when cluster-scoped
pub fn meta_namespace_key<K: Resource>(obj: &K) -> String {
    match obj.namespace() {
        Some(ns) if !ns.is_empty() => format!("{}/{}", ns, obj.name_any()),
        _ => obj.name_any(),
    }
}

/// Indexes an object by its namespace
pub fn meta_namespace_index_func<K: Resource>() -> IndexFunc<K> {
    Arc::new(|obj: &K| obj.namespace().into_iter().collect())
}

/// Change produced by [`Indexer::replace`]
#[derive(Debug, Clone)]
pub enum Delta<K> {
    Added(Arc<K>),
    Updated { old: Arc<K>, new: Arc<K> },
    Deleted(Arc<K>),
}

struct IndexerState<K> {
    items: HashMap<String, Arc<K>>,
    indexers: Indexers<K>,
    /// index name -> index value -> keys
    indices: HashMap<String, HashMap<String, BTreeSet<String>>>,
}

impl<K> IndexerState<K> {
    fn index_item(&mut self, key: &str, obj: &K) {
        for (name, func) in &self.indexers {
            let index = self.indices.entry(name.clone()).or_default();
            for value in func(obj) {
                index.entry(value).or_default().insert(key.to_string());
            }
        }
    }

    fn unindex_item(&mut self, key: &str, obj: &K) {
        for (name, func) in &self.indexers {
            let Some(index) = self.indices.get_mut(name) else {
                continue;
            };
            for value in func(obj) {
                if let Some(keys) = index.get_mut(&value) {
                    keys.remove(key);
                    if keys.is_empty() {
                        index.remove(&value);
                    }
                }
            }
        }
    }

    fn upsert(&mut self, key: String, obj: Arc<K>) -> Option<Arc<K>> {
        let old = self.items.insert(key.clone(), obj.clone());
        if let Some(old) = &old {
            self.unindex_item(&key, old);
        }
        self.index_item(&key, &obj);
        old
    }

    fn remove(&mut self, key: &str) -> Option<Arc<K>> {
        let old = self.items.remove(key)?;
        self.unindex_item(key, &old);
        Some(old)
    }

    fn keys_for(&self, index_name: &str, value: &str) -> Option<Vec<String>> {
        let index = self.indices.get(index_name)?;
        Some(
            index
                .get(value)
                .map(|keys| keys.iter().cloned().collect())
                .unwrap_or_default(),
        )
    }
}

/// Local cache of objects of one kind
///
/// Cloning is cheap and shares the underlying store.
pub struct Indexer<K> {
    state: Arc<RwLock<IndexerState<K>>>,
}

impl<K> Clone for Indexer<K> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<K> Default for Indexer<K>
where
    K: Resource<DynamicType = ()>,
{
    fn default() -> Self {
        Self::new(Indexers::new())
    }
}

impl<K> Indexer<K>
where
    K: Resource<DynamicType = ()>,
{
    pub fn new(indexers: Indexers<K>) -> Self {
        Self {
            state: Arc::new(RwLock::new(IndexerState {
                items: HashMap::new(),
                indexers,
                indices: HashMap::new(),
            })),
        }
    }

    /// Insert or replace an object, returning the previous one
    pub fn add(&self, obj: K) -> Option<Arc<K>> {
        let key = meta_namespace_key(&obj);
        self.state
            .write()
            .expect("Indexer lock poisoned")
            .upsert(key, Arc::new(obj))
    }

    pub fn update(&self, obj: K) -> Option<Arc<K>> {
        self.add(obj)
    }

    /// Remove an object, returning the cached copy
    pub fn delete(&self, obj: &K) -> Option<Arc<K>> {
        self.delete_by_key(&meta_namespace_key(obj))
    }

    pub fn delete_by_key(&self, key: &str) -> Option<Arc<K>> {
        self.state.write().expect("Indexer lock poisoned").remove(key)
    }

    /// Swap the whole contents for `objects` in one step
    ///
    /// Deltas are ordered: additions and updates in input order, then deletions
    /// of keys not present anymore.
    pub fn replace(&self, objects: impl IntoIterator<Item = K>) -> Vec<Delta<K>> {
        let mut state = self.state.write().expect("Indexer lock poisoned");
        let mut previous = std::mem::take(&mut state.items);
        state.indices.clear();

        let mut deltas = Vec::new();
        for obj in objects {
            let key = meta_namespace_key(&obj);
            let obj = Arc::new(obj);
            state.index_item(&key, &obj);
            state.items.insert(key.clone(), obj.clone());
            match previous.remove(&key) {
                Some(old) => deltas.push(Delta::Updated { old, new: obj }),
                None => deltas.push(Delta::Added(obj)),
            }
        }

        let mut gone: Vec<_> = previous.into_iter().collect();
        gone.sort_by(|a, b| a.0.cmp(&b.0));
        deltas.extend(gone.into_iter().map(|(_, obj)| Delta::Deleted(obj)));
        deltas
    }

    pub fn get(&self, obj: &K) -> Option<Arc<K>> {
        self.get_by_key(&meta_namespace_key(obj))
    }

    pub fn get_by_key(&self, key: &str) -> Option<Arc<K>> {
        self.state
            .read()
            .expect("Indexer lock poisoned")
            .items
            .get(key)
            .cloned()
    }

    /// Every cached object, ordered by key
    pub fn list(&self) -> Vec<Arc<K>> {
        let state = self.state.read().expect("Indexer lock poisoned");
        let mut items: Vec<_> = state.items.iter().collect();
        items.sort_by(|a, b| a.0.cmp(b.0));
        items.into_iter().map(|(_, obj)| obj.clone()).collect()
    }

    pub fn list_keys(&self) -> Vec<String> {
        let state = self.state.read().expect("Indexer lock poisoned");
        let mut keys: Vec<_> = state.items.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.state.read().expect("Indexer lock poisoned").items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Objects sharing at least one value of `index_name` with `obj`
    pub fn index(&self, index_name: &str, obj: &K) -> Result<Vec<Arc<K>>> {
        let state = self.state.read().expect("Indexer lock poisoned");
        let func = state
            .indexers
            .get(index_name)
            .ok_or_else(|| index_not_found::<K>(index_name))?;

        let mut keys = BTreeSet::new();
        for value in func(obj) {
            if let Some(found) = state.keys_for(index_name, &value) {
                keys.extend(found);
            }
        }
        Ok(keys
            .iter()
            .filter_map(|key| state.items.get(key).cloned())
            .collect())
    }

    /// Objects indexed under `value`
    pub fn by_index(&self, index_name: &str, value: &str) -> Result<Vec<Arc<K>>> {
        let state = self.state.read().expect("Indexer lock poisoned");
        if !state.indexers.contains_key(index_name) {
            return Err(index_not_found::<K>(index_name));
        }
        Ok(state
            .keys_for(index_name, value)
            .unwrap_or_default()
            .iter()
            .filter_map(|key| state.items.get(key).cloned())
            .collect())
    }

    /// Keys of the objects indexed under `value`
    pub fn index_keys(&self, index_name: &str, value: &str) -> Result<Vec<String>> {
        let state = self.state.read().expect("Indexer lock poisoned");
        if !state.indexers.contains_key(index_name) {
            return Err(index_not_found::<K>(index_name));
        }
        Ok(state.keys_for(index_name, value).unwrap_or_default())
    }

    /// Every value currently present in an index
    pub fn list_index_func_values(&self, index_name: &str) -> Vec<String> {
        let state = self.state.read().expect("Indexer lock poisoned");
        let mut values: Vec<_> = state
            .indices
            .get(index_name)
            .map(|index| index.keys().cloned().collect())
            .unwrap_or_default();
        values.sort();
        values
    }

    pub fn has_index(&self, index_name: &str) -> bool {
        self.state
            .read()
            .expect("Indexer lock poisoned")
            .indexers
            .contains_key(index_name)
    }

    /// Register more indexes; cached objects are indexed right away
    pub fn add_indexers(&self, indexers: Indexers<K>) -> Result<()> {
        let mut state = self.state.write().expect("Indexer lock poisoned");
        if let Some(name) = indexers.keys().find(|name| state.indexers.contains_key(*name)) {
            return Err(Error::InvalidRequest(format!("indexer conflict: {}", name)));
        }

        for (name, func) in indexers {
            let mut index: HashMap<String, BTreeSet<String>> = HashMap::new();
            for (key, obj) in &state.items {
                for value in func(obj) {
                    index.entry(value).or_default().insert(key.clone());
                }
            }
            state.indices.insert(name.clone(), index);
            state.indexers.insert(name, func);
        }
        Ok(())
    }
}

fn index_not_found<K: Resource<DynamicType = ()>>(index_name: &str) -> Error {
    Error::IndexNotFound {
        kind: K::kind(&()).to_string(),
        field: index_name.to_string(),
    }
}
