//! Operator metrics
//!
//! Process-wide prometheus counters for the provisioning and cleanup paths,
//! exposed by the `/metrics` server spawned from `main`.

use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};
use std::sync::OnceLock;

static CLAIMS_PROVISIONED: OnceLock<IntCounter> = OnceLock::new();
static CLEANUPS: OnceLock<IntCounterVec> = OnceLock::new();
static CLEANUP_FAILURES: OnceLock<IntCounterVec> = OnceLock::new();

/// Claims registered into workspace environments
pub fn claims_provisioned() -> &'static IntCounter {
    CLAIMS_PROVISIONED.get_or_init(|| {
        register_int_counter!(
            "workspace_storage_claims_provisioned_total",
            "Total number of claims registered into workspace environments"
        )
        .expect("register claims_provisioned counter")
    })
}

/// Completed cleanups, labeled by handler
pub fn cleanups() -> &'static IntCounterVec {
    CLEANUPS.get_or_init(|| {
        register_int_counter_vec!(
            "workspace_storage_cleanups_total",
            "Total number of completed workspace cleanups",
            &["handler"]
        )
        .expect("register cleanups counter")
    })
}

/// Failed cleanups, labeled by handler
pub fn cleanup_failures() -> &'static IntCounterVec {
    CLEANUP_FAILURES.get_or_init(|| {
        register_int_counter_vec!(
            "workspace_storage_cleanup_failures_total",
            "Total number of failed workspace cleanups",
            &["handler"]
        )
        .expect("register cleanup_failures counter")
    })
}

/// Touch every counter so it is exported before its first increment
pub fn init() {
    claims_provisioned();
    cleanups();
    cleanup_failures();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_register_once() {
        init();
        // a second init must reuse the registered collectors
        init();

        // counters are process-global and other tests increment them too,
        // so only monotonicity is asserted
        let before = claims_provisioned().get();
        claims_provisioned().inc();
        assert!(claims_provisioned().get() >= before + 1);

        cleanups().with_label_values(&["project-cleaner"]).inc();
        assert!(cleanups().with_label_values(&["project-cleaner"]).get() >= 1);
    }
}
