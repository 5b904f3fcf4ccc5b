use crate::utils::{
    deletion_timestamp_equal, ensure_metadata, has_finalizers, parse_resource_version,
    should_be_deleted,
};
use crate::{Error, Result};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, Time};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::broadcast;
use tracing::{debug, trace};

/// Number of watch events retained for resuming watches.
pub const WATCH_HISTORY_LIMIT: usize = 1000;

#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GVR {
    pub group: String,
    pub version: String,
    pub resource: String,
}

impl GVR {
    pub fn new(
        group: impl Into<String>,
        version: impl Into<String>,
        resource: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
            resource: resource.into(),
        }
    }
}

#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GVK {
    pub group: String,
    pub version: String,
    pub kind: String,
}

impl GVK {
    pub fn new(
        group: impl Into<String>,
        version: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
            kind: kind.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredObject {
    pub data: Value,
    pub gvk: GVK,
    pub metadata: ObjectMeta,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventType {
    Added,
    Modified,
    Deleted,
}

/// A single change, in the order it was applied to the tracker
#[derive(Debug, Clone)]
pub struct WatchRecord {
    pub revision: u64,
    pub gvr: GVR,
    pub namespace: String,
    pub event_type: EventType,
    pub object: Value,
}

impl WatchRecord {
    /// Wire form of a watch event
    pub fn to_watch_event(&self) -> Value {
        serde_json::json!({
            "type": self.event_type,
            "object": self.object,
        })
    }

    fn matches(&self, gvr: &GVR, namespace: Option<&str>) -> bool {
        &self.gvr == gvr && namespace.is_none_or(|ns| ns == self.namespace)
    }
}

/// Starting point of a watch: events to replay, then the live feed
pub struct WatchStart {
    pub backlog: Vec<WatchRecord>,
    pub receiver: broadcast::Receiver<WatchRecord>,
    /// Revision the backlog is complete up to
    pub revision: u64,
}

type ObjectsByName = HashMap<String, StoredObject>;
type ObjectsByNamespace = HashMap<String, ObjectsByName>;
type ObjectStorage = HashMap<GVR, ObjectsByNamespace>;

#[derive(Default)]
struct TrackerState {
    objects: ObjectStorage,
    /// Last revision handed out
    revision: u64,
    history: VecDeque<WatchRecord>,
    /// Revision of the newest event dropped from history
    compacted: u64,
}

impl TrackerState {
    fn next_revision(&mut self) -> u64 {
        self.revision += 1;
        self.revision
    }

    fn lookup(&self, gvr: &GVR, namespace: &str, name: &str) -> Option<&StoredObject> {
        self.objects.get(gvr)?.get(namespace)?.get(name)
    }

    fn insert(&mut self, gvr: &GVR, namespace: &str, name: &str, stored: StoredObject) -> bool {
        self.objects
            .entry(gvr.clone())
            .or_default()
            .entry(namespace.to_string())
            .or_default()
            .insert(name.to_string(), stored)
            .is_some()
    }

    fn remove(&mut self, gvr: &GVR, namespace: &str, name: &str) -> Option<StoredObject> {
        self.objects.get_mut(gvr)?.get_mut(namespace)?.remove(name)
    }
}

/// In-memory object storage with a global, strictly increasing revision
pub struct ObjectTracker {
    state: RwLock<TrackerState>,
    with_status_subresource: RwLock<HashSet<GVK>>,
    events: broadcast::Sender<WatchRecord>,
}

impl ObjectTracker {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(WATCH_HISTORY_LIMIT);
        Self {
            state: RwLock::new(TrackerState::default()),
            with_status_subresource: RwLock::new(HashSet::new()),
            events,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, TrackerState> {
        self.state.read().expect("ObjectTracker lock poisoned")
    }

    fn write(&self) -> RwLockWriteGuard<'_, TrackerState> {
        self.state.write().expect("ObjectTracker lock poisoned")
    }

    pub fn add_status_subresource(&self, gvk: GVK) {
        self.with_status_subresource
            .write()
            .expect("ObjectTracker lock poisoned")
            .insert(gvk);
    }

    pub fn has_status_subresource(&self, gvk: &GVK) -> bool {
        self.with_status_subresource
            .read()
            .expect("ObjectTracker lock poisoned")
            .contains(gvk)
    }

    fn register_status_if_present(&self, gvk: &GVK, object: &Value) {
        if object.get("status").is_some() && !self.has_status_subresource(gvk) {
            self.add_status_subresource(gvk.clone());
        }
    }

    /// Current revision, used as the list resourceVersion
    pub fn revision(&self) -> u64 {
        self.read().revision
    }

    /// Seed or replace an object without create/update validation
    pub fn add(&self, gvr: &GVR, gvk: &GVK, mut object: Value, namespace: &str) -> Result<Value> {
        trace!("Adding object: {:?} in namespace: {}", gvr, namespace);

        let mut meta = self.extract_metadata(&object)?;

        let name = meta
            .name
            .clone()
            .ok_or_else(|| Error::InvalidRequest("Object name is required".to_string()))?;

        if meta.deletion_timestamp.is_some() && !has_finalizers(&meta) {
            return Err(Error::InvalidRequest(format!(
                "refusing to add object {} with metadata.deletionTimestamp but no finalizers",
                name
            )));
        }

        self.register_status_if_present(gvk, &object);

        let mut state = self.write();
        let provided = parse_resource_version(meta.resource_version.as_deref().unwrap_or(""))?;
        let revision = if provided > 0 {
            // Keep the caller's version and never hand out a lower one later
            state.revision = (state.revision + 1).max(provided);
            state.revision
        } else {
            let revision = state.next_revision();
            meta.resource_version = Some(revision.to_string());
            revision
        };

        ensure_metadata(&mut meta, namespace);
        object["metadata"] = serde_json::to_value(&meta)?;

        let stored = StoredObject {
            data: object.clone(),
            gvk: gvk.clone(),
            metadata: meta,
        };
        let replaced = state.insert(gvr, namespace, &name, stored);
        let event_type = if replaced {
            EventType::Modified
        } else {
            EventType::Added
        };
        self.record(&mut state, revision, gvr, namespace, event_type, &object);

        debug!("Added object: {}/{}", namespace, name);
        Ok(object)
    }

    pub fn create(
        &self,
        gvr: &GVR,
        gvk: &GVK,
        mut object: Value,
        namespace: &str,
    ) -> Result<Value> {
        trace!("Creating object: {:?} in namespace: {}", gvr, namespace);

        let mut meta = self.extract_metadata(&object)?;

        let name = meta
            .name
            .clone()
            .ok_or_else(|| Error::InvalidRequest("Object name is required".to_string()))?;

        if meta
            .resource_version
            .as_ref()
            .is_some_and(|rv| !rv.is_empty())
        {
            return Err(Error::InvalidRequest(
                "resourceVersion can not be set for Create requests".to_string(),
            ));
        }

        self.register_status_if_present(gvk, &object);

        let mut state = self.write();
        if state.lookup(gvr, namespace, &name).is_some() {
            return Err(Error::AlreadyExists {
                kind: gvk.kind.clone(),
                name,
                namespace: namespace.to_string(),
            });
        }

        let revision = state.next_revision();
        meta.resource_version = Some(revision.to_string());
        meta.generation = Some(1);
        meta.deletion_timestamp = None;
        ensure_metadata(&mut meta, namespace);

        object["metadata"] = serde_json::to_value(&meta)?;

        let stored = StoredObject {
            data: object.clone(),
            gvk: gvk.clone(),
            metadata: meta,
        };
        state.insert(gvr, namespace, &name, stored);
        self.record(&mut state, revision, gvr, namespace, EventType::Added, &object);

        debug!("Created object: {}/{}", namespace, name);
        Ok(object)
    }

    pub fn get(&self, gvr: &GVR, namespace: &str, name: &str) -> Result<Value> {
        trace!("Getting object: {:?} {}/{}", gvr, namespace, name);

        self.read()
            .lookup(gvr, namespace, name)
            .map(|stored| stored.data.clone())
            .ok_or_else(|| Error::NotFound {
                kind: gvr.resource.clone(),
                name: name.to_string(),
                namespace: namespace.to_string(),
            })
    }

    pub fn update(
        &self,
        gvr: &GVR,
        gvk: &GVK,
        mut object: Value,
        namespace: &str,
        is_status: bool,
    ) -> Result<Value> {
        trace!("Updating object: {:?} in namespace: {}", gvr, namespace);

        let meta = self.extract_metadata(&object)?;
        let name = meta
            .name
            .clone()
            .ok_or_else(|| Error::InvalidRequest("Object name is required".to_string()))?;

        let mut state = self.write();
        let (existing, existing_meta) = match state.lookup(gvr, namespace, &name) {
            Some(stored) => (stored.data.clone(), stored.metadata.clone()),
            None => {
                return Err(Error::NotFound {
                    kind: gvr.resource.clone(),
                    name,
                    namespace: namespace.to_string(),
                })
            }
        };

        if let Some(provided_rv) = &meta.resource_version {
            if let Some(current_rv) = &existing_meta.resource_version {
                if provided_rv != current_rv && !provided_rv.is_empty() {
                    return Err(Error::Conflict(format!(
                        "the object has been modified; resource version mismatch: expected {}, got {}",
                        current_rv, provided_rv
                    )));
                }
            }
        }

        if self.has_status_subresource(gvk) {
            if is_status {
                match existing.get("spec") {
                    Some(spec) => object["spec"] = spec.clone(),
                    None => {
                        if let Some(obj) = object.as_object_mut() {
                            obj.remove("spec");
                        }
                    }
                }
            } else {
                match existing.get("status") {
                    Some(status) => object["status"] = status.clone(),
                    None => {
                        if let Some(obj) = object.as_object_mut() {
                            obj.remove("status");
                        }
                    }
                }
            }
        }

        let mut new_meta = self.extract_metadata(&object)?;
        if !deletion_timestamp_equal(
            &new_meta.deletion_timestamp,
            &existing_meta.deletion_timestamp,
        ) {
            return Err(Error::InvalidRequest(
                "metadata.deletionTimestamp field is immutable".to_string(),
            ));
        }

        let generation = existing_meta.generation.unwrap_or(1);
        let spec_changed = !is_status && object.get("spec") != existing.get("spec");
        new_meta.generation = Some(if spec_changed {
            generation + 1
        } else {
            generation
        });

        let revision = state.next_revision();
        new_meta.resource_version = Some(revision.to_string());
        new_meta.uid = existing_meta.uid;
        new_meta.creation_timestamp = existing_meta.creation_timestamp;
        if new_meta.namespace.is_none() && !namespace.is_empty() {
            new_meta.namespace = Some(namespace.to_string());
        }

        object["metadata"] = serde_json::to_value(&new_meta)?;

        if should_be_deleted(&new_meta) {
            state.remove(gvr, namespace, &name);
            self.record(&mut state, revision, gvr, namespace, EventType::Deleted, &object);
            debug!("Finalized and deleted object: {}/{}", namespace, name);
            return Ok(object);
        }

        let stored = StoredObject {
            data: object.clone(),
            gvk: gvk.clone(),
            metadata: new_meta,
        };
        state.insert(gvr, namespace, &name, stored);
        self.record(&mut state, revision, gvr, namespace, EventType::Modified, &object);

        debug!("Updated object: {}/{}", namespace, name);
        Ok(object)
    }

    /// Delete an object, or mark it for deletion while finalizers remain
    pub fn delete(&self, gvr: &GVR, namespace: &str, name: &str) -> Result<Value> {
        trace!("Deleting object: {:?} {}/{}", gvr, namespace, name);

        let mut state = self.write();
        let stored = state
            .lookup(gvr, namespace, name)
            .cloned()
            .ok_or_else(|| Error::NotFound {
                kind: gvr.resource.clone(),
                name: name.to_string(),
                namespace: namespace.to_string(),
            })?;

        if has_finalizers(&stored.metadata) {
            if stored.metadata.deletion_timestamp.is_some() {
                return Ok(stored.data);
            }

            let revision = state.next_revision();
            let mut meta = stored.metadata;
            meta.deletion_timestamp = Some(Time(chrono::Utc::now()));
            meta.resource_version = Some(revision.to_string());

            let mut object = stored.data;
            object["metadata"] = serde_json::to_value(&meta)?;
            state.insert(
                gvr,
                namespace,
                name,
                StoredObject {
                    data: object.clone(),
                    gvk: stored.gvk,
                    metadata: meta,
                },
            );
            self.record(&mut state, revision, gvr, namespace, EventType::Modified, &object);

            debug!("Marked object for deletion: {}/{}", namespace, name);
            return Ok(object);
        }

        state.remove(gvr, namespace, name);
        let revision = state.next_revision();
        let mut object = stored.data;
        object["metadata"]["resourceVersion"] = Value::String(revision.to_string());
        self.record(&mut state, revision, gvr, namespace, EventType::Deleted, &object);

        debug!("Deleted object: {}/{}", namespace, name);
        Ok(object)
    }

    /// List objects ordered by namespace then name
    pub fn list(&self, gvr: &GVR, namespace: Option<&str>) -> Result<Vec<Value>> {
        trace!("Listing objects: {:?} in namespace: {:?}", gvr, namespace);

        let state = self.read();
        let Some(gvr_objects) = state.objects.get(gvr) else {
            return Ok(Vec::new());
        };

        let mut entries: Vec<(&String, &String, &StoredObject)> = gvr_objects
            .iter()
            .filter(|(ns, _)| namespace.is_none_or(|wanted| wanted == ns.as_str()))
            .flat_map(|(ns, objects)| objects.iter().map(move |(name, obj)| (ns, name, obj)))
            .collect();
        entries.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

        Ok(entries
            .into_iter()
            .map(|(_, _, stored)| stored.data.clone())
            .collect())
    }

    /// Begin a watch after `resource_version`
    ///
    /// Without a resource version (or with "0") the current objects are
    /// replayed as ADDED events.
    pub fn watch(
        &self,
        gvr: &GVR,
        namespace: Option<&str>,
        resource_version: Option<&str>,
    ) -> Result<WatchStart> {
        let from = parse_resource_version(resource_version.unwrap_or(""))?;

        // Subscribing under the lock keeps the backlog and the live feed contiguous
        let state = self.read();
        let receiver = self.events.subscribe();

        let backlog: Vec<WatchRecord> = if from == 0 {
            let mut backlog = Vec::new();
            if let Some(gvr_objects) = state.objects.get(gvr) {
                for (ns, objects) in gvr_objects {
                    if namespace.is_some_and(|wanted| wanted != ns) {
                        continue;
                    }
                    for (name, stored) in objects {
                        let revision = stored
                            .metadata
                            .resource_version
                            .as_deref()
                            .and_then(|rv| rv.parse().ok())
                            .unwrap_or(state.revision);
                        backlog.push((
                            (ns, name),
                            WatchRecord {
                                revision,
                                gvr: gvr.clone(),
                                namespace: ns.clone(),
                                event_type: EventType::Added,
                                object: stored.data.clone(),
                            },
                        ));
                    }
                }
            }
            // Initial ADDED events come in key order, like a list
            backlog.sort_by(|a, b| a.0.cmp(&b.0));
            backlog.into_iter().map(|(_, record)| record).collect()
        } else {
            if from < state.compacted {
                return Err(Error::Expired(format!(
                    "requested {}, oldest available {}",
                    from,
                    state.compacted + 1
                )));
            }
            state
                .history
                .iter()
                .filter(|r| r.revision > from && r.matches(gvr, namespace))
                .cloned()
                .collect()
        };

        trace!(
            "Watching {:?} in namespace {:?} from {} ({} replayed)",
            gvr,
            namespace,
            from,
            backlog.len()
        );

        Ok(WatchStart {
            backlog,
            receiver,
            revision: state.revision,
        })
    }

    fn record(
        &self,
        state: &mut TrackerState,
        revision: u64,
        gvr: &GVR,
        namespace: &str,
        event_type: EventType,
        object: &Value,
    ) {
        let record = WatchRecord {
            revision,
            gvr: gvr.clone(),
            namespace: namespace.to_string(),
            event_type,
            object: object.clone(),
        };

        state.history.push_back(record.clone());
        while state.history.len() > WATCH_HISTORY_LIMIT {
            if let Some(dropped) = state.history.pop_front() {
                state.compacted = dropped.revision;
            }
        }

        // No receivers is not an error
        let _ = self.events.send(record);
    }

    fn extract_metadata(&self, object: &Value) -> Result<ObjectMeta> {
        let meta_value = object
            .get("metadata")
            .ok_or_else(|| Error::MetadataError("Object missing metadata field".to_string()))?;

        serde_json::from_value(meta_value.clone())
            .map_err(|e| Error::MetadataError(format!("Failed to parse metadata: {}", e)))
    }
}

impl Default for ObjectTracker {
    fn default() -> Self {
        Self::new()
    }
}
