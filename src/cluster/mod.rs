//! Cluster-facing ports
//!
//! These traits define the boundary between the cleanup handlers and the
//! cluster API. A handle is acquired from the factory for every use and
//! dropped when the use ends; nothing is retained between events.

mod kube;

pub use self::kube::{KubeClientFactory, KubeClusterClient};

use crate::error::Result;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::PersistentVolumeClaim;
use std::sync::Arc;

/// Port for the scoped cluster operations the cleanup path needs
#[async_trait]
pub trait ClusterOps: Send + Sync {
    /// Delete the isolation project (namespace) with the given name
    async fn delete_project(&self, name: &str) -> Result<()>;

    /// List the claims in a namespace
    async fn list_claims(&self, namespace: &str) -> Result<Vec<PersistentVolumeClaim>>;

    /// Delete a single claim by name
    async fn delete_claim(&self, namespace: &str, name: &str) -> Result<()>;
}

/// Port for acquiring short-lived cluster client handles
#[async_trait]
pub trait ClusterClientFactory: Send + Sync {
    /// Acquire a handle for one use; release by dropping it
    async fn create(&self) -> Result<Box<dyn ClusterOps>>;
}

pub type ClusterClientFactoryRef = Arc<dyn ClusterClientFactory>;

// =============================================================================
// Test Support
// =============================================================================

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use crate::error::Error;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use std::collections::BTreeSet;
    use std::sync::Mutex;

    /// One recorded cluster call
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub(crate) enum ClusterCall {
        DeleteProject(String),
        ListClaims(String),
        DeleteClaim { namespace: String, name: String },
    }

    /// Shared state behind every handle a [`MockClusterFactory`] produces
    #[derive(Default)]
    pub(crate) struct MockClusterState {
        pub calls: Mutex<Vec<ClusterCall>>,
        /// Claim names reported by `list_claims`
        pub claims: Mutex<Vec<String>>,
        /// Workspace/project names whose deletion fails
        pub fail_deletes: Mutex<BTreeSet<String>>,
    }

    pub(crate) struct MockClusterFactory {
        pub state: Arc<MockClusterState>,
    }

    impl MockClusterFactory {
        pub(crate) fn new() -> (Arc<Self>, Arc<MockClusterState>) {
            let state = Arc::new(MockClusterState::default());
            (
                Arc::new(Self {
                    state: state.clone(),
                }),
                state,
            )
        }
    }

    #[async_trait]
    impl ClusterClientFactory for MockClusterFactory {
        async fn create(&self) -> Result<Box<dyn ClusterOps>> {
            Ok(Box::new(MockCluster {
                state: self.state.clone(),
            }))
        }
    }

    struct MockCluster {
        state: Arc<MockClusterState>,
    }

    #[async_trait]
    impl ClusterOps for MockCluster {
        async fn delete_project(&self, name: &str) -> Result<()> {
            self.state
                .calls
                .lock()
                .unwrap()
                .push(ClusterCall::DeleteProject(name.to_string()));
            if self.state.fail_deletes.lock().unwrap().contains(name) {
                return Err(Error::Cleanup {
                    workspace_id: name.to_string(),
                    reason: "induced delete failure".into(),
                });
            }
            Ok(())
        }

        async fn list_claims(&self, namespace: &str) -> Result<Vec<PersistentVolumeClaim>> {
            self.state
                .calls
                .lock()
                .unwrap()
                .push(ClusterCall::ListClaims(namespace.to_string()));
            let claims = self
                .state
                .claims
                .lock()
                .unwrap()
                .iter()
                .map(|name| PersistentVolumeClaim {
                    metadata: ObjectMeta {
                        name: Some(name.clone()),
                        ..Default::default()
                    },
                    ..Default::default()
                })
                .collect();
            Ok(claims)
        }

        async fn delete_claim(&self, namespace: &str, name: &str) -> Result<()> {
            self.state
                .calls
                .lock()
                .unwrap()
                .push(ClusterCall::DeleteClaim {
                    namespace: namespace.to_string(),
                    name: name.to_string(),
                });
            if self.state.fail_deletes.lock().unwrap().contains(name) {
                return Err(Error::Cleanup {
                    workspace_id: name.to_string(),
                    reason: "induced delete failure".into(),
                });
            }
            self.state.claims.lock().unwrap().retain(|c| c != name);
            Ok(())
        }
    }
}
