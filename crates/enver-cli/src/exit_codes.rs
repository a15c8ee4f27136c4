//! Standard exit codes for CLI operations
//!
//! These exit codes follow Unix conventions and sysexits.h where applicable.

/// General error - unspecified failure, or one or more executions failed
pub const ERROR: i32 = 1;

/// Configuration error - `.enver.yaml` is missing, malformed or inconsistent
pub const CONFIG_ERROR: i32 = 2;

/// Cluster error - kubeconfig, API or exec failure
pub const CLUSTER_ERROR: i32 = 3;

/// IO error - file not found, permission denied, etc.
pub const IO_ERROR: i32 = 5;

/// Usage error - invalid arguments or options (following sysexits.h convention)
pub const USAGE_ERROR: i32 = 64;
