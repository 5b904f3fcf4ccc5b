#[cfg(test)]
mod tests {
    use crate::utils::*;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, Time};

    #[test]
    fn test_parse_resource_version() {
        assert_eq!(parse_resource_version("").unwrap(), 0);
        assert_eq!(parse_resource_version("1").unwrap(), 1);
        assert_eq!(parse_resource_version("42").unwrap(), 42);
        assert!(parse_resource_version("abc").is_err());
    }

    #[test]
    fn test_should_be_deleted() {
        let mut meta = ObjectMeta::default();
        assert!(!should_be_deleted(&meta));

        meta.deletion_timestamp = Some(Time(chrono::Utc::now()));
        assert!(should_be_deleted(&meta));

        meta.finalizers = Some(vec!["ocicore.oracle.com/cleanup".to_string()]);
        assert!(!should_be_deleted(&meta));
        assert!(has_finalizers(&meta));
    }

    #[test]
    fn test_ensure_metadata_sets_defaults() {
        let mut meta = ObjectMeta {
            name: Some("vcn-1".to_string()),
            ..Default::default()
        };
        ensure_metadata(&mut meta, "dev");

        assert_eq!(meta.namespace.as_deref(), Some("dev"));
        assert!(meta.uid.is_some());
        assert!(meta.creation_timestamp.is_some());
        assert_eq!(meta.generation, Some(1));

        let mut cluster_scoped = ObjectMeta {
            namespace: Some("dev".to_string()),
            ..Default::default()
        };
        ensure_metadata(&mut cluster_scoped, "");
        assert!(cluster_scoped.namespace.is_none());
    }
}
