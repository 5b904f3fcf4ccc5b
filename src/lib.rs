//! Clients, fake clients, informers and listers for the OCI manager custom resources.
//!
//! The fake client is modelled on controller-runtime's fake client: a real
//! `kube::Client` whose HTTP traffic is answered by an in-memory API server, so
//! controller code runs unchanged in unit tests.
//!
//! # Examples
//!
//! ## Typed clients over the fake client
//!
//! ```rust
//! use oci_manager_client::{ClientBuilder, Clientset};
//! use oci_manager_client::apis::ocicore::v1alpha1::{Vcn, VcnSpec};
//! use kube::api::PostParams;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ClientBuilder::new().with_oci_resources().build().await?;
//! let clientset = Clientset::new(client);
//! let vcns = clientset.ocicore_v1alpha1().vcns("dev");
//!
//! let vcn = Vcn::new(
//!     "main",
//!     VcnSpec {
//!         compartment_ref: "dev".to_string(),
//!         cidr_block: "10.0.0.0/16".to_string(),
//!         ..Default::default()
//!     },
//! );
//! vcns.create(&PostParams::default(), &vcn).await?;
//!
//! assert_eq!(vcns.get("main").await?.spec.cidr_block, "10.0.0.0/16");
//! # Ok(())
//! # }
//! ```
//!
//! ## Inspecting requests
//!
//! ```rust
//! use oci_manager_client::{ClientBuilder, Verb};
//! use oci_manager_client::apis::ocicore::v1alpha1::Subnet;
//! use kube::Api;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let (client, fake) = ClientBuilder::new().with_oci_resources().build_with_fake().await?;
//! let subnets: Api<Subnet> = Api::namespaced(client, "dev");
//!
//! assert!(subnets.get_opt("web").await?.is_none());
//! assert!(fake.actions()[0].matches(Verb::Get, "subnets"));
//! # Ok(())
//! # }
//! ```

pub mod action;
pub mod apis;
mod builder;
mod client;
mod client_utils;
pub mod clientset;
mod error;
pub mod factory;
pub mod field_selectors;
pub mod indexer;
pub mod informer;
pub mod interceptor;
pub mod label_selector;
pub mod lister;
mod mock_service;
pub mod registry;
pub mod tracker;
mod utils;
pub mod validator;

#[cfg(test)]
mod builder_test;
#[cfg(test)]
mod tracker_test;
#[cfg(test)]
mod utils_test;

pub use action::{Action, Verb};
pub use apis::{OciResource, ResourceState, ResourceStatus};
pub use builder::ClientBuilder;
pub use client::FakeClient;
pub use clientset::Clientset;
pub use error::{Error, Result};
pub use factory::{ResourceInformer, SharedInformerFactory};
pub use indexer::Indexer;
pub use informer::{ResourceEventHandler, ResourceEventHandlerFuncs, SharedIndexInformer};
pub use kube::Client;
pub use lister::{Lister, NamespaceLister};
