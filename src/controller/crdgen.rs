//! # CRD Generator
//!
//! Prints the `Pattern` CustomResourceDefinition as YAML.
//!
//! ```bash
//! cargo run --bin crdgen > config/crd/bases/gitops.hybrid-cloud-patterns.io_patterns.yaml
//! cargo run --bin crdgen | kubectl apply -f -
//! ```
//!
//! Subscription and Application are owned by OLM and Argo CD and are not
//! generated here.

use kube::core::CustomResourceExt;
use patterns_operator::crd::Pattern;

fn main() {
    let crd = Pattern::crd();

    match serde_yaml::to_string(&crd) {
        Ok(yaml) => {
            println!("# This file is auto-generated by crdgen");
            println!("# DO NOT EDIT THIS FILE MANUALLY");
            println!("# Change the Pattern types in src/crd/ and regenerate");
            println!("---");
            print!("{yaml}");
        }
        Err(e) => {
            eprintln!("Failed to serialize CRD to YAML: {e}");
            std::process::exit(1);
        }
    }
}
