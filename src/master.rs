//! Source of truth for the master control-plane address.
//!
//! The deployment owns this value, not the catalog.  An empty string
//! means no master is configured, i.e. this instance is the master.

use std::env;

/// Reads the currently configured master address.
pub trait MasterAddressSource: Send + Sync {
    fn current_master_address(&self) -> String;
}

/// Reads the master address from a process environment variable.
#[derive(Debug, Clone)]
pub struct EnvMasterSource {
    var: String,
}

impl EnvMasterSource {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }

    pub fn var(&self) -> &str {
        &self.var
    }
}

impl Default for EnvMasterSource {
    fn default() -> Self {
        Self::new("MASTER_OSM_IP")
    }
}

impl MasterAddressSource for EnvMasterSource {
    fn current_master_address(&self) -> String {
        // Unset and non-unicode values both count as "no master".
        env::var(&self.var).unwrap_or_default()
    }
}
