//! Per-cluster pod inventories.
//!
//! How inventories are computed is someone else's business.  The catalog
//! only needs to tell them when a cluster has been evicted, which is the
//! [`InventorySink`] contract.

use std::collections::HashMap;

use async_trait::async_trait;
use log::info;
use serde_json::Value;
use tokio::sync::RwLock;

/// Receives eviction notices from the catalog.
#[async_trait]
pub trait InventorySink: Send + Sync {
    /// Drop every piece of inventory held for `cluster_id`.
    async fn remove_cluster(&self, cluster_id: &str);
}

/// Opaque inventory values keyed by cluster identifier.
#[derive(Debug)]
pub struct InventoryMap {
    name: &'static str,
    entries: RwLock<HashMap<String, Value>>,
}

impl InventoryMap {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Stores `inventory` for the cluster.  `None` removes the cluster.
    pub async fn update(&self, cluster_id: &str, inventory: Option<Value>) {
        let mut entries = self.entries.write().await;
        match inventory {
            Some(value) => {
                entries.insert(cluster_id.to_string(), value);
            }
            None => {
                if entries.remove(cluster_id).is_some() {
                    info!("[{}] removed inventory for clusterId:{}", self.name, cluster_id);
                }
            }
        }
    }

    pub async fn get(&self, cluster_id: &str) -> Option<Value> {
        self.entries.read().await.get(cluster_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl InventorySink for InventoryMap {
    async fn remove_cluster(&self, cluster_id: &str) {
        self.update(cluster_id, None).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn update_none_removes_cluster() {
        let map = InventoryMap::new("cluster-pods");
        assert_eq!(map.name(), "cluster-pods");
        map.update("c1", Some(json!({"pods": ["a", "b"]}))).await;
        map.update("c2", Some(json!({"pods": []}))).await;
        assert_eq!(map.len().await, 2);

        map.update("c1", None).await;
        assert!(map.get("c1").await.is_none());
        assert_eq!(map.len().await, 1);
    }

    #[tokio::test]
    async fn remove_cluster_through_sink() {
        let map = InventoryMap::new("all-pods");
        map.update("c1", Some(json!(["p1"]))).await;

        let sink: &dyn InventorySink = &map;
        sink.remove_cluster("c1").await;
        sink.remove_cluster("unknown").await;
        assert!(map.is_empty().await);
    }
}
