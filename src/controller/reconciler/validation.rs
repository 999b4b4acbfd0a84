//! # Validation
//!
//! Checks run on the effective Pattern before and after the dependent
//! resources are converged.

use crate::crd::Pattern;
use crate::error::Error;

/// Checks that must pass before anything is written to the cluster
pub fn pre_validation(pattern: &Pattern) -> Result<(), Error> {
    validate_target_repo(&pattern.spec.git_spec.target_repo)
}

/// Reject SSH-style repository URLs; Argo CD is given the URL as-is and has
/// no credentials for them
pub fn validate_target_repo(target_repo: &str) -> Result<(), Error> {
    if target_repo.starts_with("git@") {
        return Err(Error::InvalidTargetRepo(target_repo.to_string()));
    }
    Ok(())
}

/// Checks on the deployed pattern (values files and the like)
///
/// Currently nothing is checked.
pub fn post_validation(_pattern: &Pattern) -> Result<(), Error> {
    Ok(())
}
