//! Field selector support for filtering custom resources
//!
//! Every kind can be filtered on `metadata.name` and `metadata.namespace`. Beyond
//! that, a field is selectable when the kind lists it in its selectable fields, or
//! when a custom index was registered for it on the fake client.

use crate::client_utils::{field_as_string, field_at_path};
use crate::{Error, Result};
use serde_json::Value;
use std::sync::Arc;

/// Index function that extracts values from an object for field selection
pub type IndexerFunc = Arc<dyn Fn(&Value) -> Vec<String> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldOperator {
    Equals,
    NotEquals,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRequirement {
    pub field: String,
    pub operator: FieldOperator,
    pub value: String,
}

impl FieldRequirement {
    /// Evaluate against the values an object has for the field
    pub fn matches(&self, values: &[String]) -> bool {
        let found = values.iter().any(|v| v == &self.value);
        match self.operator {
            FieldOperator::Equals => found,
            FieldOperator::NotEquals => !found,
        }
    }
}

/// Parse `a=b,c==d,e!=f`; the empty string selects everything
pub fn parse_field_selector(selector: &str) -> Result<Vec<FieldRequirement>> {
    selector
        .split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(|requirement| {
            let (field, operator, value) = if let Some((f, v)) = requirement.split_once("!=") {
                (f, FieldOperator::NotEquals, v)
            } else if let Some((f, v)) = requirement.split_once("==") {
                (f, FieldOperator::Equals, v)
            } else if let Some((f, v)) = requirement.split_once('=') {
                (f, FieldOperator::Equals, v)
            } else {
                return Err(Error::InvalidRequest(format!(
                    "invalid field selector requirement {:?}: expected field=value",
                    requirement
                )));
            };

            let field = field.trim();
            if field.is_empty() {
                return Err(Error::InvalidRequest(format!(
                    "invalid field selector requirement {:?}: empty field",
                    requirement
                )));
            }

            Ok(FieldRequirement {
                field: field.to_string(),
                operator,
                value: value.trim().to_string(),
            })
        })
        .collect()
}

/// Values of a built-in selectable field, `None` if the field is not selectable
///
/// An absent optional field yields no values rather than `None`.
pub fn extract_selectable_field_value(
    obj: &Value,
    field: &str,
    selectable_fields: &[String],
) -> Option<Vec<String>> {
    let builtin = matches!(field, "metadata.name" | "metadata.namespace");
    if !builtin && !selectable_fields.iter().any(|f| f == field) {
        return None;
    }

    Some(
        field_at_path(obj, field)
            .and_then(field_as_string)
            .into_iter()
            .collect(),
    )
}

/// Check an object against parsed requirements
///
/// `index_for` returns the custom index registered for a field, if any.
pub fn matches_field_selector<'a>(
    obj: &Value,
    requirements: &[FieldRequirement],
    kind: &str,
    selectable_fields: &[String],
    index_for: impl Fn(&str) -> Option<&'a IndexerFunc>,
) -> Result<bool> {
    for requirement in requirements {
        let values = match extract_selectable_field_value(obj, &requirement.field, selectable_fields)
        {
            Some(values) => values,
            None => match index_for(&requirement.field) {
                Some(index) => index(obj),
                None => {
                    return Err(Error::IndexNotFound {
                        kind: kind.to_string(),
                        field: requirement.field.clone(),
                    })
                }
            },
        };

        if !requirement.matches(&values) {
            return Ok(false);
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn subnet() -> Value {
        json!({
            "metadata": {"name": "web", "namespace": "dev"},
            "spec": {"vcnRef": "main-vcn", "availabilityDomain": "AD-1", "prohibitPublicIpOnVnic": true}
        })
    }

    fn selectable() -> Vec<String> {
        vec!["spec.vcnRef".to_string(), "spec.prohibitPublicIpOnVnic".to_string()]
    }

    #[test]
    fn test_parse_operators() {
        let reqs = parse_field_selector("metadata.name=web, spec.vcnRef==v,spec.x!=y").unwrap();
        assert_eq!(reqs.len(), 3);
        assert_eq!(reqs[0].operator, FieldOperator::Equals);
        assert_eq!(reqs[1].field, "spec.vcnRef");
        assert_eq!(reqs[1].operator, FieldOperator::Equals);
        assert_eq!(reqs[2].operator, FieldOperator::NotEquals);
        assert_eq!(reqs[2].value, "y");

        assert!(parse_field_selector("").unwrap().is_empty());
        assert!(parse_field_selector("metadata.name").is_err());
        assert!(parse_field_selector("=web").is_err());
    }

    #[test]
    fn test_builtin_and_selectable_fields() {
        let obj = subnet();
        let none = |_: &str| None;

        let reqs = parse_field_selector("metadata.name=web,metadata.namespace=dev").unwrap();
        assert!(matches_field_selector(&obj, &reqs, "Subnet", &selectable(), none).unwrap());

        let reqs = parse_field_selector("spec.vcnRef!=main-vcn").unwrap();
        assert!(!matches_field_selector(&obj, &reqs, "Subnet", &selectable(), none).unwrap());

        let reqs = parse_field_selector("spec.prohibitPublicIpOnVnic=true").unwrap();
        assert!(matches_field_selector(&obj, &reqs, "Subnet", &selectable(), none).unwrap());
    }

    #[test]
    fn test_unknown_field_without_index_fails() {
        let reqs = parse_field_selector("spec.availabilityDomain=AD-1").unwrap();
        let err =
            matches_field_selector(&subnet(), &reqs, "Subnet", &selectable(), |_| None).unwrap_err();
        assert!(matches!(err, Error::IndexNotFound { .. }));
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_custom_index() {
        let mut indexes: HashMap<String, IndexerFunc> = HashMap::new();
        indexes.insert(
            "spec.availabilityDomain".to_string(),
            Arc::new(|obj: &Value| {
                obj["spec"]["availabilityDomain"]
                    .as_str()
                    .map(|s| vec![s.to_string()])
                    .unwrap_or_default()
            }),
        );

        let reqs = parse_field_selector("spec.availabilityDomain=AD-1").unwrap();
        assert!(
            matches_field_selector(&subnet(), &reqs, "Subnet", &selectable(), |f| indexes.get(f))
                .unwrap()
        );
    }

    #[test]
    fn test_absent_optional_field() {
        let obj = json!({"metadata": {"name": "web"}, "spec": {}});
        let reqs = parse_field_selector("spec.vcnRef!=main-vcn").unwrap();
        assert!(matches_field_selector(&obj, &reqs, "Subnet", &selectable(), |_| None).unwrap());
    }
}
