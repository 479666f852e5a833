//! Claim provisioning
//!
//! Runs once per workspace start, synchronously, on the environment-assembly
//! path: computes the claims the workspace needs and binds them into the pod
//! specs of the machines that host the workspace agent.

mod claim;

pub use claim::ClaimProvisioner;
