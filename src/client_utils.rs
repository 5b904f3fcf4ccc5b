use crate::{tracker::GVK, Error, Result};
use serde_json::Value;

pub fn extract_gvk(value: &Value) -> Result<GVK> {
    let api_version = value
        .get("apiVersion")
        .and_then(|v| v.as_str())
        .ok_or_else(|| Error::InvalidRequest("Missing apiVersion".to_string()))?;

    let kind = value
        .get("kind")
        .and_then(|v| v.as_str())
        .ok_or_else(|| Error::InvalidRequest("Missing kind".to_string()))?;

    let (group, version) = if let Some((g, v)) = api_version.split_once('/') {
        (g.to_string(), v.to_string())
    } else {
        ("".to_string(), api_version.to_string())
    };

    Ok(GVK::new(group, version, kind))
}

/// Namespace from object metadata, `default` when absent
pub fn extract_namespace(obj: &Value) -> String {
    obj.get("metadata")
        .and_then(|m| m.get("namespace"))
        .and_then(|n| n.as_str())
        .unwrap_or("default")
        .to_string()
}

pub fn extract_name(obj: &Value) -> Option<&str> {
    obj.get("metadata")
        .and_then(|m| m.get("name"))
        .and_then(|n| n.as_str())
}

/// Look up a dotted path such as `spec.vcnRef`
pub fn field_at_path<'a>(obj: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(obj, |current, segment| current.get(segment))
}

/// Render a scalar field the way field selectors compare it
pub fn field_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
