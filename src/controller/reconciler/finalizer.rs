//! # Finalizer
//!
//! Marker handling and deletion-time cleanup for Patterns.
//!
//! The marker keeps a deleted Pattern around until the controller has removed
//! its local staging directory. Dependents carry owner references and are
//! left to the garbage collector.

use crate::constants::PATTERN_FINALIZER;
use crate::controller::reconciler::client::PatternStore;
use crate::controller::reconciler::defaults::staging_dir;
use crate::crd::Pattern;
use crate::error::Error;
use std::path::{Component, Path};
use tracing::{debug, info, warn};

#[must_use]
pub fn has_marker(finalizers: &[String]) -> bool {
    finalizers.iter().any(|f| f == PATTERN_FINALIZER)
}

/// Finalizer list with the marker appended (unchanged if already present)
#[must_use]
pub fn add_marker(finalizers: &[String]) -> Vec<String> {
    let mut updated = finalizers.to_vec();
    if !has_marker(finalizers) {
        updated.push(PATTERN_FINALIZER.to_string());
    }
    updated
}

/// Finalizer list with every copy of the marker removed
#[must_use]
pub fn remove_marker(finalizers: &[String]) -> Vec<String> {
    finalizers
        .iter()
        .filter(|f| *f != PATTERN_FINALIZER)
        .cloned()
        .collect()
}

pub(crate) fn finalizers(pattern: &Pattern) -> &[String] {
    pattern.metadata.finalizers.as_deref().unwrap_or_default()
}

/// Clean up a Pattern that is being deleted and release the marker
///
/// Staging-directory removal is best effort. Persisting the released
/// finalizer list is not: its failure is returned.
pub async fn finalize_pattern(store: &dyn PatternStore, pattern: &Pattern) -> Result<(), Error> {
    if !has_marker(finalizers(pattern)) {
        debug!("Finalizer already released, nothing to clean up");
        return Ok(());
    }

    info!("Finalizing pattern; anything deployed by Argo CD can now be cleaned up manually");

    if let Some(path) = pattern.status.as_ref().and_then(|s| s.path.as_deref()) {
        let staging = staging_dir(pattern);
        if Path::new(path) == staging {
            match remove_staging_dir(&staging) {
                Ok(true) => info!("Removed staging directory {}", path),
                Ok(false) => debug!("No staging directory to remove at {}", path),
                Err(e) => warn!("Could not remove staging directory {}: {}", path, e),
            }
        } else {
            warn!(
                "Leaving {} in place, only {} is cleaned up",
                path,
                staging.display()
            );
        }
    }

    let mut released = pattern.clone();
    released.metadata.finalizers = Some(remove_marker(finalizers(pattern)));
    store.update(&released).await?;
    Ok(())
}

/// Remove `path` if it sits strictly below the process temp dir
///
/// Returns whether anything was removed. Paths with `..` are refused.
fn remove_staging_dir(path: &Path) -> Result<bool, Error> {
    let below_temp = path
        .strip_prefix(std::env::temp_dir())
        .is_ok_and(|rest| {
            rest.components().next().is_some()
                && rest.components().all(|c| matches!(c, Component::Normal(_)))
        });
    if !below_temp || !path.exists() {
        return Ok(false);
    }
    std::fs::remove_dir_all(path).map_err(Error::Staging)?;
    Ok(true)
}
