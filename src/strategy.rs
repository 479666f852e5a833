//! Claim strategies
//!
//! A strategy decides whether every workspace gets its own persistent claim
//! or all workspaces share a single one. It is resolved once at startup from
//! a configuration string and drives both provisioning and cleanup.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Policy governing how persistent claims are shared across workspaces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClaimStrategy {
    /// One claim per workspace, its name suffixed with the workspace id
    PerWorkspace,
    /// One claim shared by every workspace in the project
    Shared,
}

impl ClaimStrategy {
    /// All supported strategies, in resolution order
    pub const ALL: [ClaimStrategy; 2] = [ClaimStrategy::PerWorkspace, ClaimStrategy::Shared];

    /// Canonical configuration name of this strategy
    pub fn canonical_name(&self) -> &'static str {
        match self {
            ClaimStrategy::PerWorkspace => "onePerWorkspace",
            ClaimStrategy::Shared => "onePerProject",
        }
    }

    /// Resolve a configured strategy name, case-insensitively
    pub fn resolve(name: &str) -> Result<ClaimStrategy> {
        ClaimStrategy::ALL
            .iter()
            .copied()
            .find(|strategy| strategy.canonical_name().eq_ignore_ascii_case(name))
            .ok_or_else(|| {
                Error::Configuration(format!("Unsupported claim strategy '{}' configured", name))
            })
    }

    /// Name of the claim owned by a workspace under this strategy.
    ///
    /// Provisioning and cleanup both derive claim names through here, so a
    /// claim created on workspace start is found again on workspace removal.
    pub fn claim_identity(&self, claim_name: &str, workspace_id: &str) -> String {
        match self {
            ClaimStrategy::PerWorkspace => format!("{}-{}", claim_name, workspace_id),
            ClaimStrategy::Shared => claim_name.to_string(),
        }
    }
}

impl std::fmt::Display for ClaimStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.canonical_name())
    }
}

impl FromStr for ClaimStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ClaimStrategy::resolve(s)
    }
}
