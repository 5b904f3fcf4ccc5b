//! Label selector parsing and matching
//!
//! Parses the Kubernetes label selector string syntax into a `kube::core::Selector`:
//! - Equality: `key=value` or `key==value`
//! - Inequality: `key!=value`
//! - Set-based: `key in (value1,value2)` or `key notin (value1,value2)`
//! - Existence: `key` or `!key`
//!
//! Requirements separated by commas are ANDed.

use crate::{Error, Result};
use kube::core::{Expression, Selector, SelectorExt};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Split a selector string by commas, but not inside parentheses
fn split_preserving_parentheses(selector: &str) -> Vec<&str> {
    let mut result = Vec::new();
    let mut start = 0;
    let mut depth = 0;

    for (i, ch) in selector.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth -= 1,
            ',' if depth == 0 => {
                result.push(&selector[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }

    if start < selector.len() {
        result.push(&selector[start..]);
    }

    result
}

fn invalid(requirement: &str, why: &str) -> Error {
    Error::InvalidRequest(format!(
        "unable to parse requirement {:?}: {}",
        requirement, why
    ))
}

fn set_values(requirement: &str, rest: &str) -> Result<BTreeSet<String>> {
    let rest = rest.trim();
    let inner = rest
        .strip_prefix('(')
        .and_then(|r| r.strip_suffix(')'))
        .ok_or_else(|| invalid(requirement, "expected a parenthesized value list"))?;

    Ok(inner
        .split(',')
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect())
}

fn key(requirement: &str, key: &str) -> Result<String> {
    let key = key.trim();
    if key.is_empty() {
        return Err(invalid(requirement, "empty label key"));
    }
    Ok(key.to_string())
}

fn parse_requirement(requirement: &str) -> Result<Expression> {
    if let Some((k, rest)) = requirement.split_once(" notin ") {
        return Ok(Expression::NotIn(
            key(requirement, k)?,
            set_values(requirement, rest)?,
        ));
    }
    if let Some((k, rest)) = requirement.split_once(" in ") {
        return Ok(Expression::In(
            key(requirement, k)?,
            set_values(requirement, rest)?,
        ));
    }
    if let Some((k, v)) = requirement.split_once("!=") {
        return Ok(Expression::NotEqual(key(requirement, k)?, v.trim().to_string()));
    }
    if let Some(k) = requirement.strip_prefix('!') {
        return Ok(Expression::DoesNotExist(key(requirement, k)?));
    }
    if let Some((k, v)) = requirement
        .split_once("==")
        .or_else(|| requirement.split_once('='))
    {
        return Ok(Expression::Equal(key(requirement, k)?, v.trim().to_string()));
    }
    Ok(Expression::Exists(key(requirement, requirement)?))
}

/// Parse a label selector string; the empty string selects everything
///
/// # Examples
///
/// ```
/// use oci_manager_client::label_selector::parse_label_selector;
///
/// let selector = parse_label_selector("tier=web,env in (prod,staging)").unwrap();
/// assert!(parse_label_selector("env in prod").is_err());
/// # let _ = selector;
/// ```
pub fn parse_label_selector(selector: &str) -> Result<Selector> {
    split_preserving_parentheses(selector)
        .into_iter()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(parse_requirement)
        .collect::<Result<Vec<_>>>()
        .map(Selector::from_iter)
}

/// Match labels against a label selector string
///
/// ```
/// use std::collections::BTreeMap;
/// use oci_manager_client::label_selector::matches_label_selector;
///
/// let labels = BTreeMap::from([("tier".to_string(), "web".to_string())]);
/// assert!(matches_label_selector(&labels, "tier=web").unwrap());
/// assert!(!matches_label_selector(&labels, "tier notin (web)").unwrap());
/// ```
pub fn matches_label_selector(labels: &BTreeMap<String, String>, selector: &str) -> Result<bool> {
    Ok(parse_label_selector(selector)?.matches(labels))
}

/// Labels of a JSON object; missing labels are an empty set
pub fn labels_of(obj: &Value) -> BTreeMap<String, String> {
    obj.get("metadata")
        .and_then(|m| m.get("labels"))
        .and_then(Value::as_object)
        .map(|labels| {
            labels
                .iter()
                .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
                .collect()
        })
        .unwrap_or_default()
}

pub fn matches_object(obj: &Value, selector: &Selector) -> bool {
    selector.matches(&labels_of(obj))
}
