#[cfg(test)]
mod tests {
    use crate::apis::ocicore::v1alpha1::{Subnet, SubnetSpec, Vcn, VcnSpec};
    use crate::apis::ocilb::v1alpha1::{BackendSet, LoadBalancer};
    use crate::apis::{ResourceState, ResourceStatus};
    use crate::{interceptor, ClientBuilder, Error};
    use kube::api::{ListParams, PostParams};
    use kube::Api;
    use serde_json::json;

    fn subnet(name: &str, namespace: &str) -> Subnet {
        let mut subnet = Subnet::new(
            name,
            SubnetSpec {
                compartment_ref: "dev".to_string(),
                vcn_ref: "main".to_string(),
                availability_domain: "AD-1".to_string(),
                cidr_block: "10.0.1.0/24".to_string(),
                ..Default::default()
            },
        );
        subnet.metadata.namespace = Some(namespace.to_string());
        subnet
    }

    #[tokio::test]
    async fn test_builder_with_objects() {
        let client = ClientBuilder::new()
            .with_oci_resources()
            .with_object(subnet("web", "dev"))
            .build()
            .await
            .unwrap();

        let subnets: Api<Subnet> = Api::namespaced(client, "dev");
        let retrieved = subnets.get("web").await.unwrap();

        assert_eq!(retrieved.metadata.name, Some("web".to_string()));
        assert_eq!(retrieved.spec.cidr_block, "10.0.1.0/24");
        assert_eq!(retrieved.metadata.resource_version, Some("1".to_string()));
    }

    #[tokio::test]
    async fn test_builder_object_without_namespace_lands_in_default() {
        let vcn = Vcn::new(
            "main",
            VcnSpec {
                compartment_ref: "dev".to_string(),
                cidr_block: "10.0.0.0/16".to_string(),
                ..Default::default()
            },
        );
        let client = ClientBuilder::new()
            .with_oci_resources()
            .with_objects(vec![vcn])
            .build()
            .await
            .unwrap();

        let vcns: Api<Vcn> = Api::default_namespaced(client);
        let vcn = vcns.get("main").await.unwrap();
        assert_eq!(vcn.metadata.namespace, Some("default".to_string()));
    }

    #[tokio::test]
    async fn test_builder_keeps_seeded_resource_version() {
        let mut seeded = subnet("web", "dev");
        seeded.metadata.resource_version = Some("41".to_string());

        let (_client, fake) = ClientBuilder::new()
            .with_oci_resources()
            .with_object(seeded)
            .build_with_fake()
            .await
            .unwrap();

        let stored: Subnet = fake.get("dev", "web").unwrap();
        assert_eq!(stored.metadata.resource_version, Some("41".to_string()));
        assert_eq!(fake.tracker().revision(), 41);
    }

    #[tokio::test]
    async fn test_builder_rejects_unregistered_initial_object() {
        let result = ClientBuilder::new()
            .with_object(subnet("web", "dev"))
            .build()
            .await;

        match result {
            Err(Error::ResourceNotRegistered { group, .. }) => {
                assert_eq!(group, "ocicore.oracle.com")
            }
            Err(e) => panic!("Expected ResourceNotRegistered, got: {:?}", e),
            Ok(_) => panic!("Expected ResourceNotRegistered"),
        }
    }

    #[tokio::test]
    async fn test_builder_with_runtime_objects() {
        let client = ClientBuilder::new()
            .with_oci_resource::<Vcn>()
            .with_runtime_objects(vec![json!({
                "apiVersion": "ocicore.oracle.com/v1alpha1",
                "kind": "Vcn",
                "metadata": {"name": "main", "namespace": "net"},
                "spec": {"compartmentRef": "dev", "cidrBlock": "10.0.0.0/16"}
            })])
            .build()
            .await
            .unwrap();

        let vcns: Api<Vcn> = Api::namespaced(client, "net");
        assert_eq!(vcns.get("main").await.unwrap().spec.compartment_ref, "dev");
    }

    #[tokio::test]
    async fn test_builder_status_subresource_from_crd() {
        let (_client, fake) = ClientBuilder::new()
            .with_oci_resources()
            .build_with_fake()
            .await
            .unwrap();

        assert!(fake.tracker().has_status_subresource(&crate::tracker::GVK::new(
            "ocicore.oracle.com",
            "v1alpha1",
            "Subnet"
        )));
    }

    #[tokio::test]
    async fn test_builder_with_status_subresource() {
        use kube::CustomResource;
        use schemars::JsonSchema;
        use serde::{Deserialize, Serialize};

        #[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema)]
        #[kube(group = "example.com", version = "v1", kind = "Probe", namespaced)]
        struct ProbeSpec {
            target: String,
        }

        let (_client, fake) = ClientBuilder::new()
            .with_resource::<Probe>()
            .with_status_subresource::<Probe>()
            .build_with_fake()
            .await
            .unwrap();

        assert!(fake
            .tracker()
            .has_status_subresource(&crate::tracker::GVK::new("example.com", "v1", "Probe")));
    }

    #[tokio::test]
    async fn test_seeded_status_is_kept() {
        let mut seeded = subnet("web", "dev");
        seeded.status = Some(ResourceStatus {
            state: Some(ResourceState::Available),
            id: Some("ocid1.subnet.oc1..aaaa".to_string()),
            ..Default::default()
        });

        let client = ClientBuilder::new()
            .with_oci_resources()
            .with_object(seeded)
            .build()
            .await
            .unwrap();

        let subnets: Api<Subnet> = Api::namespaced(client, "dev");
        let subnet = subnets.get("web").await.unwrap();
        assert_eq!(
            subnet.status.and_then(|s| s.state),
            Some(ResourceState::Available)
        );
    }

    #[tokio::test]
    async fn test_load_fixture_single_document() {
        let client = ClientBuilder::new()
            .with_oci_resources()
            .with_fixture_dir("fixtures")
            .load_fixture("vcn.yaml")
            .unwrap()
            .build()
            .await
            .unwrap();

        // Namespace defaults to "default"
        let vcns: Api<Vcn> = Api::namespaced(client, "default");
        let vcn = vcns.get("main").await.unwrap();

        assert_eq!(vcn.spec.cidr_block, "10.0.0.0/16");
        assert_eq!(vcn.spec.dns_label.as_deref(), Some("main"));
        assert_eq!(
            vcn.metadata.labels.as_ref().unwrap().get("env").unwrap(),
            "dev"
        );
    }

    #[tokio::test]
    async fn test_load_fixture_multi_document() {
        let client = ClientBuilder::new()
            .with_oci_resources()
            .with_fixture_dir("fixtures")
            .load_fixture("subnets.yaml")
            .unwrap()
            .build()
            .await
            .unwrap();

        let default_subnets: Api<Subnet> = Api::namespaced(client.clone(), "default");
        let web = default_subnets.get("web").await.unwrap();
        assert_eq!(web.spec.availability_domain, "AD-1");

        // Second document carries its own namespace; trailing `---` is ignored
        let data_subnets: Api<Subnet> = Api::namespaced(client, "data");
        let db = data_subnets.get("db").await.unwrap();
        assert!(db.spec.prohibit_public_ip_on_vnic);
    }

    #[tokio::test]
    async fn test_load_fixtures_across_groups() {
        let client = ClientBuilder::new()
            .with_oci_resources()
            .with_fixture_dir("fixtures")
            .load_fixtures(["vcn.yaml", "subnets.yaml", "load_balancer.yaml"])
            .unwrap()
            .build()
            .await
            .unwrap();

        let subnets: Api<Subnet> = Api::all(client.clone());
        assert_eq!(subnets.list(&ListParams::default()).await.unwrap().items.len(), 2);

        let lbs: Api<LoadBalancer> = Api::namespaced(client.clone(), "default");
        assert_eq!(lbs.get("public").await.unwrap().spec.shape_name, "100Mbps");

        let backend_sets: Api<BackendSet> = Api::namespaced(client, "default");
        let backend_set = backend_sets.get("web").await.unwrap();
        assert_eq!(backend_set.spec.health_checker.port, 8080);
    }

    #[tokio::test]
    async fn test_load_fixture_or_panic() {
        let client = ClientBuilder::new()
            .with_oci_resources()
            .with_fixture_dir("fixtures")
            .load_fixture_or_panic("vcn.yaml")
            .load_fixtures_or_panic(["subnets.yaml"])
            .build()
            .await
            .unwrap();

        let vcns: Api<Vcn> = Api::namespaced(client, "default");
        assert!(vcns.get_opt("main").await.unwrap().is_some());
    }

    #[test]
    #[should_panic(expected = "Failed to load fixture")]
    fn test_load_fixture_or_panic_missing_file() {
        ClientBuilder::new()
            .with_fixture_dir("fixtures")
            .load_fixture_or_panic("nonexistent.yaml");
    }

    #[test]
    fn test_load_fixtures_error_names_missing_file() {
        let result = ClientBuilder::new()
            .with_fixture_dir("fixtures")
            .load_fixtures(["vcn.yaml", "nonexistent.yaml", "subnets.yaml"]);

        match result {
            Err(e) => assert!(e.to_string().contains("nonexistent.yaml")),
            Ok(_) => panic!("Expected missing fixture to fail"),
        }
    }

    #[tokio::test]
    async fn test_fixture_of_unregistered_kind_fails_build() {
        let result = ClientBuilder::new()
            .with_oci_resource::<Subnet>()
            .with_fixture_dir("fixtures")
            .load_fixture_or_panic("load_balancer.yaml")
            .build()
            .await;

        assert!(matches!(result, Err(Error::ResourceNotRegistered { .. })));
    }

    #[tokio::test]
    async fn test_interceptor_error_injection() {
        let client = ClientBuilder::new()
            .with_oci_resources()
            .with_interceptor_funcs(interceptor::Funcs::new().create(|ctx| {
                if ctx.object["metadata"]["name"] == "trigger-error" {
                    return Err(Error::Internal("injected error".into()));
                }
                Ok(None)
            }))
            .build()
            .await
            .unwrap();

        let subnets: Api<Subnet> = Api::namespaced(client, "dev");
        assert!(subnets
            .create(&PostParams::default(), &subnet("web", "dev"))
            .await
            .is_ok());

        match subnets
            .create(&PostParams::default(), &subnet("trigger-error", "dev"))
            .await
        {
            Err(kube::Error::Api(ae)) => {
                assert_eq!(ae.code, 500);
                assert!(ae.message.contains("injected error"));
            }
            other => panic!("Expected injected error, got: {:?}", other),
        }

        // The failed create left nothing behind
        assert!(subnets.get_opt("trigger-error").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_crd_registration() {
        use kube::CustomResource;
        use schemars::JsonSchema;
        use serde::{Deserialize, Serialize};

        #[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema)]
        #[kube(
            group = "example.com",
            version = "v1",
            kind = "Tunnel",
            plural = "tunnels",
            namespaced
        )]
        struct TunnelSpec {
            peer: String,
        }

        let client = ClientBuilder::new()
            .with_resource::<Tunnel>()
            .build()
            .await
            .unwrap();

        let tunnels: Api<Tunnel> = Api::namespaced(client, "default");
        let created = tunnels
            .create(
                &PostParams::default(),
                &Tunnel::new(
                    "ipsec",
                    TunnelSpec {
                        peer: "203.0.113.7".to_string(),
                    },
                ),
            )
            .await
            .unwrap();
        assert_eq!(created.spec.peer, "203.0.113.7");

        let list = tunnels.list(&ListParams::default()).await.unwrap();
        assert_eq!(list.items.len(), 1);
    }

    #[tokio::test]
    async fn test_unregistered_resource_fails() {
        // Only Vcn is served
        let client = ClientBuilder::new()
            .with_oci_resource::<Vcn>()
            .build()
            .await
            .unwrap();

        let subnets: Api<Subnet> = Api::namespaced(client, "dev");
        match subnets
            .create(&PostParams::default(), &subnet("web", "dev"))
            .await
        {
            Ok(_) => panic!("Expected ResourceNotRegistered error"),
            Err(kube::Error::Api(ae)) => {
                assert_eq!(ae.code, 404);
                assert_eq!(ae.reason, "NotFound");
                assert!(
                    ae.message.contains("could not find the requested resource"),
                    "unexpected message: {}",
                    ae.message
                );
            }
            Err(e) => panic!("Expected Api error, got: {:?}", e),
        }
    }

    #[cfg(feature = "validation")]
    #[tokio::test]
    async fn test_schema_validation_rejects_invalid_objects() {
        let client = ClientBuilder::new()
            .with_oci_resources()
            .with_schema_validation()
            .build()
            .await
            .unwrap();

        let subnets: kube::Api<kube::core::DynamicObject> = kube::Api::namespaced_with(
            client,
            "dev",
            &kube::discovery::ApiResource::erase::<Subnet>(&()),
        );
        let invalid: kube::core::DynamicObject = serde_json::from_value(json!({
            "apiVersion": "ocicore.oracle.com/v1alpha1",
            "kind": "Subnet",
            "metadata": {"name": "web"},
            "spec": {"compartmentRef": "dev", "vcnRef": "main", "availabilityDomain": "AD-1", "cidrBlock": 42}
        }))
        .unwrap();

        match subnets.create(&PostParams::default(), &invalid).await {
            Err(kube::Error::Api(ae)) => assert_eq!(ae.code, 422),
            other => panic!("Expected 422, got: {:?}", other),
        }
    }
}
