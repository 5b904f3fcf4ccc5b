#[cfg(test)]
mod tests {
    use crate::tracker::*;
    use serde_json::json;

    fn subnet_gvr() -> GVR {
        GVR::new("ocicore.oracle.com", "v1alpha1", "subnets")
    }

    fn subnet_gvk() -> GVK {
        GVK::new("ocicore.oracle.com", "v1alpha1", "Subnet")
    }

    fn subnet(name: &str, namespace: &str) -> serde_json::Value {
        json!({
            "apiVersion": "ocicore.oracle.com/v1alpha1",
            "kind": "Subnet",
            "metadata": {
                "name": name,
                "namespace": namespace,
            },
            "spec": {
                "compartmentRef": "dev",
                "vcnRef": "main-vcn",
                "cidrBlock": "10.0.1.0/24",
            }
        })
    }

    fn rv(obj: &serde_json::Value) -> u64 {
        obj["metadata"]["resourceVersion"]
            .as_str()
            .unwrap()
            .parse()
            .unwrap()
    }

    #[test]
    fn test_add_sets_globally_increasing_resource_version() {
        let tracker = ObjectTracker::new();

        let first = tracker
            .add(&subnet_gvr(), &subnet_gvk(), subnet("a", "default"), "default")
            .unwrap();
        let second = tracker
            .add(&subnet_gvr(), &subnet_gvk(), subnet("b", "default"), "default")
            .unwrap();

        assert!(rv(&second) > rv(&first));
        let retrieved = tracker.get(&subnet_gvr(), "default", "a").unwrap();
        assert_eq!(rv(&retrieved), rv(&first));
        assert_eq!(retrieved["metadata"]["generation"], 1);
    }

    #[test]
    fn test_add_preserves_existing_resource_version() {
        let tracker = ObjectTracker::new();
        let mut obj = subnet("a", "default");
        obj["metadata"]["resourceVersion"] = json!("42");

        let added = tracker
            .add(&subnet_gvr(), &subnet_gvk(), obj, "default")
            .unwrap();
        assert_eq!(added["metadata"]["resourceVersion"], "42");

        // Later writes never reuse a lower version
        let created = tracker
            .create(&subnet_gvr(), &subnet_gvk(), subnet("b", "default"), "default")
            .unwrap();
        assert!(rv(&created) > 42);
    }

    #[test]
    fn test_add_replaces_existing_object() {
        let tracker = ObjectTracker::new();
        tracker
            .add(&subnet_gvr(), &subnet_gvk(), subnet("a", "default"), "default")
            .unwrap();

        let mut replacement = subnet("a", "default");
        replacement["spec"]["cidrBlock"] = json!("10.0.9.0/24");
        let added = tracker
            .add(&subnet_gvr(), &subnet_gvk(), replacement, "default")
            .unwrap();

        assert_eq!(added["spec"]["cidrBlock"], "10.0.9.0/24");
        assert_eq!(tracker.list(&subnet_gvr(), None).unwrap().len(), 1);
    }

    #[test]
    fn test_create_sets_resource_version_1() {
        let tracker = ObjectTracker::new();

        let created = tracker
            .create(&subnet_gvr(), &subnet_gvk(), subnet("a", "default"), "default")
            .unwrap();
        assert_eq!(created["metadata"]["resourceVersion"], "1");
        assert_eq!(created["metadata"]["generation"], 1);
        assert!(created["metadata"]["uid"].is_string());
        assert!(created["metadata"]["creationTimestamp"].is_string());
    }

    #[test]
    fn test_create_twice_is_already_exists() {
        let tracker = ObjectTracker::new();
        tracker
            .create(&subnet_gvr(), &subnet_gvk(), subnet("a", "default"), "default")
            .unwrap();

        let err = tracker
            .create(&subnet_gvr(), &subnet_gvk(), subnet("a", "default"), "default")
            .unwrap_err();
        assert!(matches!(err, crate::Error::AlreadyExists { .. }));
        assert_eq!(err.status_code(), 409);

        // Same name in another namespace is fine
        assert!(tracker
            .create(&subnet_gvr(), &subnet_gvk(), subnet("a", "other"), "other")
            .is_ok());
    }

    #[test]
    fn test_create_errors_if_resource_version_set() {
        let tracker = ObjectTracker::new();
        let mut obj = subnet("a", "default");
        obj["metadata"]["resourceVersion"] = json!("1");

        let result = tracker.create(&subnet_gvr(), &subnet_gvk(), obj, "default");
        match result {
            Err(crate::Error::InvalidRequest(msg)) => {
                assert!(msg.contains("resourceVersion can not be set"))
            }
            other => panic!("expected InvalidRequest, got {:?}", other),
        }
    }

    #[test]
    fn test_add_errors_if_deletion_timestamp_without_finalizers() {
        let tracker = ObjectTracker::new();
        let mut obj = subnet("a", "default");
        obj["metadata"]["deletionTimestamp"] = json!("2024-01-01T00:00:00Z");

        match tracker.add(&subnet_gvr(), &subnet_gvk(), obj, "default") {
            Err(crate::Error::InvalidRequest(msg)) => {
                assert!(msg.contains("deletionTimestamp but no finalizers"))
            }
            other => panic!("expected InvalidRequest, got {:?}", other),
        }
    }

    #[test]
    fn test_add_allows_deletion_timestamp_with_finalizers() {
        let tracker = ObjectTracker::new();
        let mut obj = subnet("a", "default");
        obj["metadata"]["deletionTimestamp"] = json!("2024-01-01T00:00:00Z");
        obj["metadata"]["finalizers"] = json!(["oci.oracle.com/cleanup"]);

        assert!(tracker
            .add(&subnet_gvr(), &subnet_gvk(), obj, "default")
            .is_ok());
    }

    #[test]
    fn test_update_bumps_resource_version() {
        let tracker = ObjectTracker::new();
        tracker
            .create(&subnet_gvr(), &subnet_gvk(), subnet("a", "default"), "default")
            .unwrap();

        let mut obj = subnet("a", "default");
        obj["metadata"]["resourceVersion"] = json!("1");
        obj["spec"]["dnsLabel"] = json!("web");

        let updated = tracker
            .update(&subnet_gvr(), &subnet_gvk(), obj, "default", false)
            .unwrap();
        assert_eq!(updated["metadata"]["resourceVersion"], "2");
        assert_eq!(updated["metadata"]["generation"], 2);
        assert_eq!(updated["spec"]["dnsLabel"], "web");
    }

    #[test]
    fn test_update_with_stale_resource_version_conflicts() {
        let tracker = ObjectTracker::new();
        tracker
            .create(&subnet_gvr(), &subnet_gvk(), subnet("a", "default"), "default")
            .unwrap();

        let mut obj = subnet("a", "default");
        obj["metadata"]["resourceVersion"] = json!("7");

        let err = tracker
            .update(&subnet_gvr(), &subnet_gvk(), obj, "default", false)
            .unwrap_err();
        assert!(err.is_conflict());
    }

    #[test]
    fn test_update_missing_object_is_not_found() {
        let tracker = ObjectTracker::new();
        let err = tracker
            .update(&subnet_gvr(), &subnet_gvk(), subnet("a", "default"), "default", false)
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_generation_not_incremented_on_status_update() {
        let tracker = ObjectTracker::new();
        tracker.add_status_subresource(subnet_gvk());
        tracker
            .create(&subnet_gvr(), &subnet_gvk(), subnet("a", "default"), "default")
            .unwrap();

        let mut obj = subnet("a", "default");
        obj["metadata"]["resourceVersion"] = json!("1");
        obj["status"] = json!({"state": "AVAILABLE"});

        let updated = tracker
            .update(&subnet_gvr(), &subnet_gvk(), obj, "default", true)
            .unwrap();
        assert_eq!(updated["metadata"]["generation"], 1);
        assert_eq!(updated["status"]["state"], "AVAILABLE");
    }

    #[test]
    fn test_generation_unchanged_when_only_labels_change() {
        let tracker = ObjectTracker::new();
        tracker
            .create(&subnet_gvr(), &subnet_gvk(), subnet("a", "default"), "default")
            .unwrap();

        let mut obj = subnet("a", "default");
        obj["metadata"]["labels"] = json!({"tier": "web"});

        let updated = tracker
            .update(&subnet_gvr(), &subnet_gvk(), obj, "default", false)
            .unwrap();
        assert_eq!(updated["metadata"]["generation"], 1);
        assert_eq!(updated["metadata"]["resourceVersion"], "2");
    }

    #[test]
    fn test_status_subresource_ignores_status_on_regular_update() {
        let tracker = ObjectTracker::new();

        let mut obj = subnet("a", "default");
        obj["status"] = json!({"state": "PROVISIONING"});
        tracker
            .create(&subnet_gvr(), &subnet_gvk(), obj, "default")
            .unwrap();
        assert!(tracker.has_status_subresource(&subnet_gvk()));

        let mut obj = subnet("a", "default");
        obj["spec"]["dnsLabel"] = json!("web");
        obj["status"] = json!({"state": "AVAILABLE"});

        let updated = tracker
            .update(&subnet_gvr(), &subnet_gvk(), obj, "default", false)
            .unwrap();
        assert_eq!(updated["spec"]["dnsLabel"], "web");
        assert_eq!(updated["status"]["state"], "PROVISIONING");
    }

    #[test]
    fn test_status_update_ignores_spec() {
        let tracker = ObjectTracker::new();
        tracker.add_status_subresource(subnet_gvk());
        tracker
            .create(&subnet_gvr(), &subnet_gvk(), subnet("a", "default"), "default")
            .unwrap();

        let mut obj = subnet("a", "default");
        obj["spec"]["cidrBlock"] = json!("192.168.0.0/16");
        obj["status"] = json!({"state": "AVAILABLE"});

        let updated = tracker
            .update(&subnet_gvr(), &subnet_gvk(), obj, "default", true)
            .unwrap();
        assert_eq!(updated["spec"]["cidrBlock"], "10.0.1.0/24");
        assert_eq!(updated["status"]["state"], "AVAILABLE");
    }

    #[test]
    fn test_no_auto_register_without_status_field() {
        let tracker = ObjectTracker::new();
        tracker
            .create(&subnet_gvr(), &subnet_gvk(), subnet("a", "default"), "default")
            .unwrap();
        assert!(!tracker.has_status_subresource(&subnet_gvk()));
    }

    #[test]
    fn test_delete_removes_object() {
        let tracker = ObjectTracker::new();
        tracker
            .create(&subnet_gvr(), &subnet_gvk(), subnet("a", "default"), "default")
            .unwrap();

        let deleted = tracker.delete(&subnet_gvr(), "default", "a").unwrap();
        assert_eq!(deleted["metadata"]["resourceVersion"], "2");
        assert!(tracker.get(&subnet_gvr(), "default", "a").unwrap_err().is_not_found());
        assert!(tracker.delete(&subnet_gvr(), "default", "a").is_err());
    }

    #[test]
    fn test_delete_with_finalizers_marks_for_deletion() {
        let tracker = ObjectTracker::new();
        let mut obj = subnet("a", "default");
        obj["metadata"]["finalizers"] = json!(["oci.oracle.com/cleanup"]);
        tracker
            .create(&subnet_gvr(), &subnet_gvk(), obj, "default")
            .unwrap();

        let marked = tracker.delete(&subnet_gvr(), "default", "a").unwrap();
        assert!(marked["metadata"]["deletionTimestamp"].is_string());

        // Still present until the finalizer is removed
        let mut current = tracker.get(&subnet_gvr(), "default", "a").unwrap();
        current["metadata"]["finalizers"] = json!([]);
        tracker
            .update(&subnet_gvr(), &subnet_gvk(), current, "default", false)
            .unwrap();

        assert!(tracker.get(&subnet_gvr(), "default", "a").is_err());
    }

    #[test]
    fn test_list_is_sorted_and_filtered_by_namespace() {
        let tracker = ObjectTracker::new();
        for (name, ns) in [("c", "default"), ("a", "default"), ("b", "other")] {
            tracker
                .create(&subnet_gvr(), &subnet_gvk(), subnet(name, ns), ns)
                .unwrap();
        }

        let default_list = tracker.list(&subnet_gvr(), Some("default")).unwrap();
        let names: Vec<_> = default_list
            .iter()
            .map(|o| o["metadata"]["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["a", "c"]);

        assert_eq!(tracker.list(&subnet_gvr(), None).unwrap().len(), 3);
    }

    #[test]
    fn test_list_empty_returns_empty_list() {
        let tracker = ObjectTracker::new();
        assert!(tracker.list(&subnet_gvr(), Some("default")).unwrap().is_empty());
        assert!(tracker.list(&subnet_gvr(), None).unwrap().is_empty());
    }

    #[test]
    fn test_resource_version_global_across_types() {
        let tracker = ObjectTracker::new();
        let vcn_gvr = GVR::new("ocicore.oracle.com", "v1alpha1", "vcns");
        let vcn_gvk = GVK::new("ocicore.oracle.com", "v1alpha1", "Vcn");
        let vcn = json!({
            "apiVersion": "ocicore.oracle.com/v1alpha1",
            "kind": "Vcn",
            "metadata": {"name": "main-vcn", "namespace": "default"},
            "spec": {"compartmentRef": "dev", "cidrBlock": "10.0.0.0/16"}
        });

        let created_vcn = tracker.create(&vcn_gvr, &vcn_gvk, vcn, "default").unwrap();
        let created_subnet = tracker
            .create(&subnet_gvr(), &subnet_gvk(), subnet("a", "default"), "default")
            .unwrap();

        assert!(rv(&created_subnet) > rv(&created_vcn));
        assert_eq!(tracker.revision(), rv(&created_subnet));
    }

    #[test]
    fn test_watch_without_version_replays_current_objects() {
        let tracker = ObjectTracker::new();
        tracker
            .create(&subnet_gvr(), &subnet_gvk(), subnet("a", "default"), "default")
            .unwrap();
        tracker
            .create(&subnet_gvr(), &subnet_gvk(), subnet("b", "other"), "other")
            .unwrap();

        let start = tracker.watch(&subnet_gvr(), Some("default"), None).unwrap();
        assert_eq!(start.backlog.len(), 1);
        assert_eq!(start.backlog[0].event_type, EventType::Added);
        assert_eq!(start.revision, 2);

        let start = tracker.watch(&subnet_gvr(), None, Some("0")).unwrap();
        assert_eq!(start.backlog.len(), 2);
    }

    #[test]
    fn test_watch_replay_is_in_key_order() {
        let tracker = ObjectTracker::new();
        for (name, namespace) in [("z", "a-b"), ("b", "a"), ("a", "a")] {
            tracker
                .create(&subnet_gvr(), &subnet_gvk(), subnet(name, namespace), namespace)
                .unwrap();
        }

        let start = tracker.watch(&subnet_gvr(), None, None).unwrap();
        let keys: Vec<_> = start
            .backlog
            .iter()
            .map(|r| format!("{}/{}", r.namespace, r.object["metadata"]["name"].as_str().unwrap()))
            .collect();
        assert_eq!(keys, vec!["a/a", "a/b", "a-b/z"]);
    }

    #[test]
    fn test_watch_from_version_replays_history() {
        let tracker = ObjectTracker::new();
        tracker
            .create(&subnet_gvr(), &subnet_gvk(), subnet("a", "default"), "default")
            .unwrap();
        tracker
            .create(&subnet_gvr(), &subnet_gvk(), subnet("b", "default"), "default")
            .unwrap();
        tracker.delete(&subnet_gvr(), "default", "a").unwrap();

        let start = tracker.watch(&subnet_gvr(), None, Some("1")).unwrap();
        let types: Vec<_> = start.backlog.iter().map(|r| r.event_type).collect();
        assert_eq!(types, vec![EventType::Added, EventType::Deleted]);

        let event = start.backlog[1].to_watch_event();
        assert_eq!(event["type"], "DELETED");
        assert_eq!(event["object"]["metadata"]["name"], "a");
    }

    #[test]
    fn test_watch_from_compacted_version_is_expired() {
        let tracker = ObjectTracker::new();
        for i in 0..(WATCH_HISTORY_LIMIT + 5) {
            tracker
                .add(
                    &subnet_gvr(),
                    &subnet_gvk(),
                    subnet(&format!("s-{}", i), "default"),
                    "default",
                )
                .unwrap();
        }

        let err = tracker
            .watch(&subnet_gvr(), None, Some("2"))
            .err()
            .unwrap();
        assert!(matches!(err, crate::Error::Expired(_)));
        assert_eq!(err.status_code(), 410);

        // The most recent window is still available
        let recent = (WATCH_HISTORY_LIMIT + 1).to_string();
        assert!(tracker.watch(&subnet_gvr(), None, Some(&recent)).is_ok());
    }

    #[tokio::test]
    async fn test_watch_receives_live_events() {
        let tracker = ObjectTracker::new();
        let mut start = tracker.watch(&subnet_gvr(), None, None).unwrap();
        assert!(start.backlog.is_empty());

        tracker
            .create(&subnet_gvr(), &subnet_gvk(), subnet("a", "default"), "default")
            .unwrap();

        let record = start.receiver.recv().await.unwrap();
        assert_eq!(record.event_type, EventType::Added);
        assert_eq!(record.revision, 1);
        assert_eq!(record.object["metadata"]["name"], "a");
    }
}
