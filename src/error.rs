use thiserror::Error;

/// Rejected configuration values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("reconcile_interval_secs must be greater than zero")]
    ZeroReconcileInterval,

    #[error("event_capacity must be greater than zero")]
    ZeroEventCapacity,

    #[error("master_env_var must not be empty")]
    EmptyMasterEnvVar,
}
