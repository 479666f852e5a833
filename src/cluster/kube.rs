//! Kubernetes-backed cluster client
//!
//! Implements the cluster ports over `kube`. Delete calls treat a missing
//! resource as success: removal events are delivered at least once, so a
//! second delivery finds the resource already gone.

use super::{ClusterClientFactory, ClusterOps};
use crate::error::{Error, Result};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Namespace, PersistentVolumeClaim};
use kube::api::{Api, DeleteParams, ListParams};
use kube::Client;
use tracing::debug;

/// Map a delete result, accepting "not found" as done
fn ignore_not_found<T>(result: std::result::Result<T, kube::Error>) -> Result<()> {
    match result {
        Ok(_) => Ok(()),
        Err(kube::Error::Api(e)) if e.code == 404 => Ok(()),
        Err(e) => Err(Error::Kube(e)),
    }
}

// =============================================================================
// Client
// =============================================================================

/// One short-lived handle to the cluster API
pub struct KubeClusterClient {
    client: Client,
}

#[async_trait]
impl ClusterOps for KubeClusterClient {
    async fn delete_project(&self, name: &str) -> Result<()> {
        debug!(project = %name, "deleting project");
        let namespaces: Api<Namespace> = Api::all(self.client.clone());
        ignore_not_found(namespaces.delete(name, &DeleteParams::default()).await)
    }

    async fn list_claims(&self, namespace: &str) -> Result<Vec<PersistentVolumeClaim>> {
        let claims: Api<PersistentVolumeClaim> =
            Api::namespaced(self.client.clone(), namespace);
        let list = claims.list(&ListParams::default()).await?;
        Ok(list.items)
    }

    async fn delete_claim(&self, namespace: &str, name: &str) -> Result<()> {
        debug!(claim = %name, namespace = %namespace, "deleting claim");
        let claims: Api<PersistentVolumeClaim> =
            Api::namespaced(self.client.clone(), namespace);
        ignore_not_found(claims.delete(name, &DeleteParams::default()).await)
    }
}

// =============================================================================
// Factory
// =============================================================================

/// Produces a [`KubeClusterClient`] per use from one shared connection config
pub struct KubeClientFactory {
    client: Client,
}

impl KubeClientFactory {
    /// Connect using the in-cluster or local kubeconfig, whichever applies
    pub async fn try_default() -> Result<Self> {
        let client = Client::try_default().await?;
        Ok(Self { client })
    }

    /// Wrap an existing client
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ClusterClientFactory for KubeClientFactory {
    async fn create(&self) -> Result<Box<dyn ClusterOps>> {
        Ok(Box::new(KubeClusterClient {
            client: self.client.clone(),
        }))
    }
}
