//! Process exit codes

/// General error - unspecified failure
pub const ERROR: i32 = 1;

/// Configuration file missing or invalid
pub const CONFIG_ERROR: i32 = 2;

/// Cluster unreachable or the Installation CRD is not registered
pub const CLUSTER_ERROR: i32 = 3;

/// A one-shot reconcile recorded a failed attempt
pub const RECONCILE_FAILED: i32 = 4;
