//! Persistent claim provisioner
//!
//! Registers the workspace claim in the environment and mounts it into every
//! machine that hosts the workspace agent. The operation is idempotent:
//! claims, volumes, and mounts are checked by name before insertion, so
//! re-running it produces no duplicates.

use crate::environment::{split_machine_name, MachineConfig, WorkspaceEnvironment};
use crate::error::{Error, Result};
use crate::metrics;
use crate::settings::StorageSettings;
use crate::strategy::ClaimStrategy;
use k8s_openapi::api::core::v1::{
    PersistentVolumeClaim, PersistentVolumeClaimSpec, PersistentVolumeClaimVolumeSource, Volume,
    VolumeMount, VolumeResourceRequirements,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::BTreeMap;
use tracing::debug;

/// Provisions workspace claims into environments under assembly
pub struct ClaimProvisioner {
    settings: StorageSettings,
    strategy: ClaimStrategy,
}

impl ClaimProvisioner {
    /// Create a provisioner for the given settings and resolved strategy
    pub fn new(settings: StorageSettings, strategy: ClaimStrategy) -> Self {
        Self { settings, strategy }
    }

    /// Bind the workspace claim into the environment.
    ///
    /// A disabled subsystem returns immediately without touching the
    /// environment. Otherwise the claim is registered under its
    /// strategy-derived name (reused if already present) and mounted into
    /// every machine whose servers reference the workspace agent. A machine
    /// that needs the mount but has no matching pod or container fails the
    /// whole workspace start.
    pub fn provision(
        &self,
        machines: &BTreeMap<String, MachineConfig>,
        env: &mut WorkspaceEnvironment,
        workspace_id: &str,
    ) -> Result<()> {
        if !self.settings.enabled {
            return Ok(());
        }

        let claim_id = self
            .strategy
            .claim_identity(&self.settings.claim_name, workspace_id);

        if !env.claims().contains_key(&claim_id) {
            env.claims_mut()
                .insert(claim_id.clone(), self.build_claim(&claim_id));
            metrics::claims_provisioned().inc();
            debug!(claim = %claim_id, workspace = %workspace_id, "registered workspace claim");
        }

        for (machine_name, machine) in machines {
            if !machine.needs_workspace_storage() {
                continue;
            }
            self.mount_into_machine(machine_name, &claim_id, env)?;
        }

        Ok(())
    }

    /// Append the claim-backed volume and its mount for one machine.
    ///
    /// All lookups complete before the first mutation, so a failed machine
    /// leaves no partial volume or mount behind.
    fn mount_into_machine(
        &self,
        machine_name: &str,
        claim_id: &str,
        env: &mut WorkspaceEnvironment,
    ) -> Result<()> {
        let (pod_name, container_name) =
            split_machine_name(machine_name).ok_or_else(|| Error::Provisioning {
                machine: machine_name.to_string(),
                reason: "machine name does not follow the <pod>/<container> convention"
                    .to_string(),
            })?;

        let pod = env
            .pods_mut()
            .get_mut(pod_name)
            .ok_or_else(|| Error::Provisioning {
                machine: machine_name.to_string(),
                reason: format!("no pod '{}' in the workspace environment", pod_name),
            })?;

        let spec = pod.spec.as_mut().ok_or_else(|| Error::Provisioning {
            machine: machine_name.to_string(),
            reason: format!("pod '{}' has no spec", pod_name),
        })?;

        let container_idx = spec
            .containers
            .iter()
            .position(|c| c.name == container_name)
            .ok_or_else(|| Error::Provisioning {
                machine: machine_name.to_string(),
                reason: format!(
                    "no container '{}' in pod '{}'",
                    container_name, pod_name
                ),
            })?;

        let volumes = spec.volumes.get_or_insert_with(Vec::new);
        if !volumes.iter().any(|v| v.name == claim_id) {
            volumes.push(Volume {
                name: claim_id.to_string(),
                persistent_volume_claim: Some(PersistentVolumeClaimVolumeSource {
                    claim_name: claim_id.to_string(),
                    read_only: None,
                }),
                ..Default::default()
            });
        }

        let mounts = spec.containers[container_idx]
            .volume_mounts
            .get_or_insert_with(Vec::new);
        if !mounts.iter().any(|m| m.name == claim_id) {
            mounts.push(VolumeMount {
                name: claim_id.to_string(),
                mount_path: self.settings.mount_path.clone(),
                ..Default::default()
            });
        }

        debug!(machine = %machine_name, claim = %claim_id, "mounted workspace claim");
        Ok(())
    }

    /// Build the claim descriptor from the configured size and access mode
    fn build_claim(&self, claim_id: &str) -> PersistentVolumeClaim {
        let mut requests = BTreeMap::new();
        requests.insert(
            "storage".to_string(),
            Quantity(self.settings.size_request.clone()),
        );

        PersistentVolumeClaim {
            metadata: ObjectMeta {
                name: Some(claim_id.to_string()),
                ..Default::default()
            },
            spec: Some(PersistentVolumeClaimSpec {
                access_modes: Some(vec![self.settings.access_mode.clone()]),
                resources: Some(VolumeResourceRequirements {
                    requests: Some(requests),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            status: None,
        }
    }
}
