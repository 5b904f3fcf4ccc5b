use crate::{Error, Result};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, Time};

/// Parse a stored `metadata.resourceVersion`; the empty string is revision 0.
pub fn parse_resource_version(rv: &str) -> Result<u64> {
    if rv.is_empty() {
        return Ok(0);
    }
    rv.parse()
        .map_err(|_| Error::InvalidRequest(format!("Invalid resource version: {}", rv)))
}

pub fn should_be_deleted(meta: &ObjectMeta) -> bool {
    meta.deletion_timestamp.is_some() && meta.finalizers.as_ref().is_none_or(Vec::is_empty)
}

pub fn has_finalizers(meta: &ObjectMeta) -> bool {
    meta.finalizers.as_ref().is_some_and(|f| !f.is_empty())
}

pub fn ensure_metadata(meta: &mut ObjectMeta, namespace: &str) {
    // Cluster-scoped objects never carry a namespace
    if namespace.is_empty() {
        meta.namespace = None;
    } else if meta.namespace.is_none() {
        meta.namespace = Some(namespace.to_string());
    }
    if meta.creation_timestamp.is_none() {
        meta.creation_timestamp = Some(Time(chrono::Utc::now()));
    }
    if meta.uid.is_none() {
        meta.uid = Some(uuid::Uuid::new_v4().to_string());
    }
    if meta.generation.is_none() {
        meta.generation = Some(1);
    }
}

pub fn deletion_timestamp_equal(a: &Option<Time>, b: &Option<Time>) -> bool {
    match (a, b) {
        // Serialized timestamps only keep whole seconds
        (Some(a), Some(b)) => a.0.timestamp() == b.0.timestamp(),
        (None, None) => true,
        _ => false,
    }
}
