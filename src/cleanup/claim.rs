//! Per-workspace claim cleanup
//!
//! Used when all workspaces share one project: only the removed workspace's
//! own claim is deleted, everything else in the project stays.

use crate::cluster::ClusterClientFactoryRef;
use crate::error::Result;
use crate::events::{RemovalHandler, WorkspaceRemovedEvent};
use crate::strategy::ClaimStrategy;
use async_trait::async_trait;
use tracing::{debug, info};

/// Deletes the removed workspace's claim from the shared project.
///
/// The claim name is re-derived with the same formula provisioning used, so
/// the claim created on workspace start is the one deleted here. A workspace
/// that never provisioned storage simply has no matching claim; that is not
/// an error.
pub struct ClaimCleaner {
    project: String,
    claim_name: String,
    factory: ClusterClientFactoryRef,
}

impl ClaimCleaner {
    pub fn new(
        project: impl Into<String>,
        claim_name: impl Into<String>,
        factory: ClusterClientFactoryRef,
    ) -> Self {
        Self {
            project: project.into(),
            claim_name: claim_name.into(),
            factory,
        }
    }
}

#[async_trait]
impl RemovalHandler for ClaimCleaner {
    async fn handle(&self, event: WorkspaceRemovedEvent) -> Result<()> {
        let claim_id =
            ClaimStrategy::PerWorkspace.claim_identity(&self.claim_name, &event.workspace_id);

        let client = self.factory.create().await?;
        let claims = client.list_claims(&self.project).await?;

        let owned = claims
            .iter()
            .any(|claim| claim.metadata.name.as_deref() == Some(claim_id.as_str()));
        if !owned {
            debug!(
                workspace = %event.workspace_id,
                claim = %claim_id,
                "no claim to clean up"
            );
            return Ok(());
        }

        client.delete_claim(&self.project, &claim_id).await?;
        info!(
            workspace = %event.workspace_id,
            claim = %claim_id,
            project = %self.project,
            "removed workspace claim"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "claim-cleaner"
    }
}
