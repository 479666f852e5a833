//! Workspace environment model
//!
//! The in-memory aggregate assembled for one workspace start: the declared
//! machines (named containers) and the orchestration objects (pods, claims)
//! that will be submitted to the cluster. Provisioners only ever add entries
//! to it; nothing here is removed or overwritten.

use k8s_openapi::api::core::v1::{PersistentVolumeClaim, Pod};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Server reference marking the container that hosts the workspace agent.
///
/// A machine exposing this server holds the workspace's persisted data and is
/// the mount target for workspace claims.
pub const SERVER_WORKSPACE_AGENT_HTTP: &str = "wsagent/http";

// =============================================================================
// Machine Model
// =============================================================================

/// Configuration of a single server exposed by a machine
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Port the server listens on, e.g. "4401/tcp"
    pub port: Option<String>,
    /// Protocol spoken by the server, e.g. "http"
    pub protocol: Option<String>,
    /// Path component of the server endpoint
    pub path: Option<String>,
}

/// Declared configuration of one machine (named container) of a workspace
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineConfig {
    /// Servers exposed by this machine, keyed by reference
    pub servers: BTreeMap<String, ServerConfig>,
    /// Free-form machine attributes
    pub attributes: BTreeMap<String, String>,
}

impl MachineConfig {
    /// Whether this machine hosts the workspace agent and therefore needs
    /// the workspace claim mounted
    pub fn needs_workspace_storage(&self) -> bool {
        self.servers.contains_key(SERVER_WORKSPACE_AGENT_HTTP)
    }
}

/// Split a machine name into its pod and container components.
///
/// Machine names follow the `<pod>/<container>` convention; both components
/// must be non-empty. Returns `None` for names that do not follow it.
pub fn split_machine_name(machine_name: &str) -> Option<(&str, &str)> {
    machine_name
        .split_once('/')
        .filter(|(pod, container)| !pod.is_empty() && !container.is_empty())
}

// =============================================================================
// Workspace Environment
// =============================================================================

/// Orchestration objects being assembled for one workspace start.
///
/// Exclusively owned by the single provisioning call for that workspace;
/// concurrent workspace starts each hold their own instance.
#[derive(Debug, Clone, Default)]
pub struct WorkspaceEnvironment {
    claims: BTreeMap<String, PersistentVolumeClaim>,
    pods: BTreeMap<String, Pod>,
}

impl WorkspaceEnvironment {
    /// Create an empty environment
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims registered for this workspace, keyed by claim name
    pub fn claims(&self) -> &BTreeMap<String, PersistentVolumeClaim> {
        &self.claims
    }

    /// Mutable view of the claims map
    pub fn claims_mut(&mut self) -> &mut BTreeMap<String, PersistentVolumeClaim> {
        &mut self.claims
    }

    /// Pods of this workspace, keyed by pod name
    pub fn pods(&self) -> &BTreeMap<String, Pod> {
        &self.pods
    }

    /// Mutable view of the pods map
    pub fn pods_mut(&mut self) -> &mut BTreeMap<String, Pod> {
        &mut self.pods
    }

    /// Register a pod under its name
    pub fn add_pod(&mut self, name: impl Into<String>, pod: Pod) {
        self.pods.insert(name.into(), pod);
    }
}
