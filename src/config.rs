use figment::{
    providers::{Env, Format, Json, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::error::ConfigError;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub cluster_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub own_address: Option<String>,
    pub master_env_var: String,
    pub reconcile_interval_secs: u64,
    pub event_capacity: usize,
    pub static_peers: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cluster_id: "local".into(),
            own_address: None,
            master_env_var: "MASTER_OSM_IP".into(),
            reconcile_interval_secs: 10,
            event_capacity: 64,
            static_peers: HashMap::new(),
        }
    }
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let config: Config = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file("meshcat.toml"))
            .merge(Json::file("meshcat.json"))
            .merge(Env::prefixed("MESHCAT_"))
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reconcile_interval_secs == 0 {
            return Err(ConfigError::ZeroReconcileInterval);
        }
        if self.event_capacity == 0 {
            return Err(ConfigError::ZeroEventCapacity);
        }
        if self.master_env_var.trim().is_empty() {
            return Err(ConfigError::EmptyMasterEnvVar);
        }
        Ok(())
    }

    pub fn reconcile_interval(&self) -> Duration {
        Duration::from_secs(self.reconcile_interval_secs)
    }
}
