//! Whole-project cleanup
//!
//! Used when every workspace runs in its own isolated project: removing the
//! workspace removes the project, and with it every resource inside.

use crate::cluster::ClusterClientFactoryRef;
use crate::error::Result;
use crate::events::{RemovalHandler, WorkspaceRemovedEvent};
use async_trait::async_trait;
use tracing::info;

/// Deletes the removed workspace's project.
///
/// By the project-per-workspace convention the project name equals the
/// workspace id.
pub struct ProjectCleaner {
    factory: ClusterClientFactoryRef,
}

impl ProjectCleaner {
    pub fn new(factory: ClusterClientFactoryRef) -> Self {
        Self { factory }
    }
}

#[async_trait]
impl RemovalHandler for ProjectCleaner {
    async fn handle(&self, event: WorkspaceRemovedEvent) -> Result<()> {
        let client = self.factory.create().await?;
        client.delete_project(&event.workspace_id).await?;
        info!(workspace = %event.workspace_id, "removed workspace project");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "project-cleaner"
    }
}
