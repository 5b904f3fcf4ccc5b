use crate::error::Result;
use crate::registry::ResourceMetadata;
use serde_json::Value;

/// Validates objects written through the fake client
pub trait SchemaValidator: Send + Sync {
    /// Validate a full object of the given resource type
    fn validate(&self, resource: &ResourceMetadata, value: &Value) -> Result<()>;
}

#[cfg(feature = "validation")]
mod crd_schema_validator {
    use super::*;
    use crate::client_utils::extract_name;
    use crate::error::Error;
    use jsonschema::JSONSchema;
    use std::collections::HashMap;
    use std::sync::{Arc, RwLock};

    /// Validates against the `openAPIV3Schema` carried by each registered CRD
    ///
    /// Schemas are compiled on first use and cached per resource.
    #[derive(Default)]
    pub struct CrdSchemaValidator {
        schemas: RwLock<HashMap<String, Arc<JSONSchema>>>,
    }

    impl CrdSchemaValidator {
        pub fn new() -> Self {
            Self::default()
        }

        fn compiled(&self, resource: &ResourceMetadata) -> Result<Option<Arc<JSONSchema>>> {
            let key = format!("{}/{}", resource.api_version(), resource.plural);
            if let Some(schema) = self
                .schemas
                .read()
                .expect("CrdSchemaValidator lock poisoned")
                .get(&key)
            {
                return Ok(Some(schema.clone()));
            }

            let Some(schema) = &resource.schema else {
                return Ok(None);
            };

            let compiled = JSONSchema::compile(schema).map_err(|e| {
                Error::Internal(format!("Failed to compile schema for {}: {}", key, e))
            })?;
            let compiled = Arc::new(compiled);

            self.schemas
                .write()
                .expect("CrdSchemaValidator lock poisoned")
                .insert(key, compiled.clone());
            Ok(Some(compiled))
        }
    }

    impl SchemaValidator for CrdSchemaValidator {
        fn validate(&self, resource: &ResourceMetadata, value: &Value) -> Result<()> {
            let Some(schema) = self.compiled(resource)? else {
                return Ok(());
            };

            if let Err(errors) = schema.validate(value) {
                let message = errors
                    .map(|e| format!("{}: {}", e.instance_path, e))
                    .collect::<Vec<_>>()
                    .join("; ");

                return Err(Error::Invalid {
                    kind: resource.kind.clone(),
                    name: extract_name(value).unwrap_or_default().to_string(),
                    message,
                });
            }

            Ok(())
        }
    }

}

#[cfg(feature = "validation")]
pub use crd_schema_validator::CrdSchemaValidator;
