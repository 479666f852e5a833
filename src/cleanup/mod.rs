//! Workspace removal cleanup
//!
//! Reacts to workspace-removal events by deleting the storage resources the
//! removed workspace owned. Which cleaner runs depends on configuration:
//! when every workspace gets its own isolated project the whole project is
//! dropped; when workspaces share a project only the workspace's own claim
//! is deleted. Exactly one variant is registered per process.

mod claim;
mod project;

pub use claim::ClaimCleaner;
pub use project::ProjectCleaner;

use crate::cluster::ClusterClientFactoryRef;
use crate::error::Result;
use crate::events::RemovalEventBus;
use crate::settings::StorageSettings;
use crate::strategy::ClaimStrategy;
use std::sync::Arc;
use tracing::{info, warn};

/// Wire the cleanup subscriber matching the configuration.
///
/// Called once at process startup. Registers at most one handler:
///
/// - storage disabled: nothing;
/// - no shared project (each workspace runs in its own): [`ProjectCleaner`];
/// - shared project + per-workspace claims: [`ClaimCleaner`] bound to that
///   project;
/// - shared project + shared claim: nothing — deleting a shared claim on a
///   single workspace removal is not defined, the claim outlives workspaces;
/// - shared project + unknown strategy name: configuration error.
pub fn register_cleanup(
    settings: &StorageSettings,
    factory: ClusterClientFactoryRef,
    bus: &RemovalEventBus,
) -> Result<()> {
    if !settings.enabled {
        info!("workspace storage disabled, no cleanup registered");
        return Ok(());
    }

    let project = match &settings.isolated_project {
        None => {
            let _dispatch = bus.subscribe(Arc::new(ProjectCleaner::new(factory)));
            info!("registered whole-project cleanup");
            return Ok(());
        }
        Some(project) => project,
    };

    match ClaimStrategy::resolve(&settings.strategy)? {
        ClaimStrategy::PerWorkspace => {
            let _dispatch = bus.subscribe(Arc::new(ClaimCleaner::new(
                project.clone(),
                settings.claim_name.clone(),
                factory,
            )));
            info!(project = %project, "registered per-workspace claim cleanup");
        }
        ClaimStrategy::Shared => {
            warn!(
                project = %project,
                "shared-claim cleanup on workspace removal is not implemented, \
                 the shared claim is never reclaimed"
            );
        }
    }

    Ok(())
}
