//! # Errors
//!
//! Error type shared by the reconciler components. Every variant's `Display`
//! text is what ends up in `status.lastError`, so messages are kept short and
//! user-facing.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Any failed call against the Kubernetes API
    #[error("{0}")]
    Kube(#[from] kube::Error),

    /// A live cluster fact could not be read or was empty
    #[error("unable to read {resource}: {reason}")]
    ClusterFact {
        resource: &'static str,
        reason: String,
    },

    #[error("Invalid TargetRepo: {0}")]
    InvalidTargetRepo(String),

    /// A namespace created by another operator is not there yet
    #[error("waiting for creation")]
    WaitingForNamespace(String),

    /// A same-named dependent exists but is not owned by this Pattern
    #[error("we no longer own {kind} {name:?}")]
    NotOwned { kind: &'static str, name: String },

    /// An object lacks the name, namespace or uid an API call needs
    #[error("object is missing its name, namespace or uid")]
    MissingIdentity,

    /// A typed object could not be turned into JSON for a patch
    #[error("failed to encode patch: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to clean up staging directory: {0}")]
    Staging(#[source] std::io::Error),
}

impl Error {
    pub(crate) fn cluster_fact(resource: &'static str, reason: impl Into<String>) -> Self {
        Error::ClusterFact {
            resource,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_messages() {
        assert_eq!(
            Error::WaitingForNamespace("openshift-gitops".to_string()).to_string(),
            "waiting for creation"
        );
        assert_eq!(
            Error::NotOwned {
                kind: "Application",
                name: "edge".to_string()
            }
            .to_string(),
            "we no longer own Application \"edge\""
        );
        assert_eq!(
            Error::InvalidTargetRepo("git@github.com:org/repo.git".to_string()).to_string(),
            "Invalid TargetRepo: git@github.com:org/repo.git"
        );
    }
}
