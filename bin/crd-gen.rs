//! CustomResourceDefinition generator for the OCI manager API groups
//!
//! Renders the CRD of every kind from the Rust types, so the manifests
//! installed in a cluster always match what the clients serialize.
//!
//! # Usage
//!
//! Print every CRD as one multi-document YAML stream:
//! ```bash
//! cargo run --bin crd-gen
//! ```
//!
//! Write one file per CRD:
//! ```bash
//! cargo run --bin crd-gen -- --output-dir config/crd
//! ```
//!
//! Only one API group:
//! ```bash
//! cargo run --bin crd-gen -- --group ocilb.oracle.com
//! ```

use clap::Parser;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use oci_manager_client::apis;
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "crd-gen")]
#[command(about = "Generate CustomResourceDefinition manifests", long_about = None)]
struct Args {
    /// Write `<crd name>.yaml` files here instead of printing to stdout
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Only emit CRDs of this API group (e.g. ocicore.oracle.com)
    #[arg(short, long)]
    group: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let crds: Vec<CustomResourceDefinition> = apis::crds()
        .into_iter()
        .filter(|crd| args.group.as_deref().is_none_or(|g| crd.spec.group == g))
        .collect();
    if crds.is_empty() {
        return Err(format!("No CRDs in group {}", args.group.unwrap_or_default()).into());
    }

    match &args.output_dir {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            for crd in &crds {
                let name = crd.metadata.name.as_deref().ok_or("CRD without a name")?;
                let path = dir.join(format!("{}.yaml", name));
                fs::write(&path, serde_yaml::to_string(crd)?)?;
                println!("Wrote {}", path.display());
            }
        }
        None => {
            for (i, crd) in crds.iter().enumerate() {
                if i > 0 {
                    println!("---");
                }
                print!("{}", serde_yaml::to_string(crd)?);
            }
        }
    }

    Ok(())
}
