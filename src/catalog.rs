//! Registry of remote clusters and of the master control-plane instance.
//!
//! Peers are reported by address.  An empty address counts as a missed
//! report; after [`EVICTION_THRESHOLD`] consecutive misses the peer is
//! evicted and its pod inventories are dropped.  The master is tracked as
//! an ordinary peer under [`MASTER_CLUSTER_ID`].
//!
//! All mutable state sits behind a single lock, held for the whole of
//! each operation including eviction notices.  The catalog owns no
//! timer: callers decide how often to report peers and to reconcile the
//! master address.

use std::collections::HashMap;
use std::sync::Arc;

use log::{info, warn};
use tokio::sync::RwLock;

use crate::events::EventBus;
use crate::inventory::InventorySink;
use crate::master::MasterAddressSource;
use crate::types::{MeshServicePort, PeerChange, PubSubMessage, RemotePeer};

/// Reserved cluster identifier for the master control-plane instance.
pub const MASTER_CLUSTER_ID: &str = "master";

/// Consecutive missed reports after which a peer is evicted.
pub const EVICTION_THRESHOLD: u32 = 3;

const GATEWAY_PREFIX: &str = "gateway";

#[derive(Debug, Default)]
struct CatalogState {
    own_address: String,
    // Empty means this instance is the master.
    master_address: String,
    remote_peers: HashMap<String, RemotePeer>,
}

impl CatalogState {
    fn apply_peer_update(&mut self, cluster_id: &str, address: &str) -> PeerChange {
        if cluster_id.is_empty() {
            return PeerChange::Ignored;
        }

        if address.is_empty() {
            let Some(peer) = self.remote_peers.get_mut(cluster_id) else {
                return PeerChange::Absent;
            };
            peer.fail_count += 1;
            if peer.fail_count >= EVICTION_THRESHOLD {
                self.remote_peers.remove(cluster_id);
                info!("[UpdateRemotePeer] Delete clusterId:{}", cluster_id);
                return PeerChange::Evicted;
            }
            warn!(
                "[UpdateRemotePeer] clusterId:{} missed report, failCount:{}",
                cluster_id, peer.fail_count
            );
            return PeerChange::Degraded(peer.fail_count);
        }

        match self.remote_peers.get(cluster_id) {
            Some(peer) if peer.address == address => PeerChange::Unchanged,
            Some(_) => {
                info!(
                    "[UpdateRemotePeer] update IP:{} clusterId:{}",
                    address, cluster_id
                );
                self.remote_peers
                    .insert(cluster_id.to_string(), RemotePeer::new(address));
                PeerChange::Replaced
            }
            None => {
                info!(
                    "[UpdateRemotePeer] create IP:{} clusterId:{}",
                    address, cluster_id
                );
                self.remote_peers
                    .insert(cluster_id.to_string(), RemotePeer::new(address));
                PeerChange::Created
            }
        }
    }

    fn reconcile_master(&mut self, current: String) -> Option<PeerChange> {
        if current == self.master_address {
            return None;
        }
        info!("[ReconcileMasterAddress] masterAddress:{}", current);
        let change = self.apply_peer_update(MASTER_CLUSTER_ID, &current);
        self.master_address = current;
        Some(change)
    }
}

/// Liveness and address registry for peer clusters.
///
/// Construct once at start-up and share as `Arc<Catalog>`.
pub struct Catalog {
    cluster_id: String,
    state: RwLock<CatalogState>,
    master_source: Arc<dyn MasterAddressSource>,
    cluster_pods: Arc<dyn InventorySink>,
    all_pods: Arc<dyn InventorySink>,
    events: EventBus,
}

impl Catalog {
    /// Creates an empty catalog and immediately reconciles the master
    /// address from `master_source`.
    pub fn new(
        cluster_id: impl Into<String>,
        master_source: Arc<dyn MasterAddressSource>,
        events: EventBus,
        cluster_pods: Arc<dyn InventorySink>,
        all_pods: Arc<dyn InventorySink>,
    ) -> Self {
        let mut state = CatalogState::default();
        // Nothing is registered yet, so this can only create the master entry.
        state.reconcile_master(master_source.current_master_address());

        Self {
            cluster_id: cluster_id.into(),
            state: RwLock::new(state),
            master_source,
            cluster_pods,
            all_pods,
            events,
        }
    }

    pub fn cluster_id(&self) -> &str {
        &self.cluster_id
    }

    /// Caches this instance's own address, overwriting any previous value.
    pub async fn register_own_address(&self, address: &str) {
        info!("[RegisterOwnAddress] ownAddress:{}", address);
        self.state.write().await.own_address = address.to_string();
    }

    pub async fn own_address(&self) -> String {
        self.state.read().await.own_address.clone()
    }

    /// Re-reads the master address and, if it moved, feeds it through the
    /// peer registry under [`MASTER_CLUSTER_ID`].  Returns whether the
    /// cached address changed.
    pub async fn reconcile_master_address(&self) -> bool {
        let mut state = self.state.write().await;
        let current = self.master_source.current_master_address();
        match state.reconcile_master(current) {
            Some(change) => {
                self.after_update(MASTER_CLUSTER_ID, change).await;
                true
            }
            None => false,
        }
    }

    pub async fn master_address(&self) -> String {
        self.state.read().await.master_address.clone()
    }

    pub async fn is_master(&self) -> bool {
        self.state.read().await.master_address.is_empty()
    }

    /// Records a liveness report for `cluster_id`.  An empty `address`
    /// counts as a missed report.  Malformed input is a silent no-op.
    pub async fn update_remote_peer(&self, cluster_id: &str, address: &str) -> PeerChange {
        let mut state = self.state.write().await;
        let change = state.apply_peer_update(cluster_id, address);
        self.after_update(cluster_id, change).await;
        change
    }

    /// Snapshot of the registry at call time.
    pub async fn list_remote_peers(&self) -> HashMap<String, RemotePeer> {
        self.state.read().await.remote_peers.clone()
    }

    pub async fn remote_peer(&self, cluster_id: &str) -> Option<RemotePeer> {
        self.state.read().await.remote_peers.get(cluster_id).cloned()
    }

    pub fn is_gateway_service(&self, svc: &MeshServicePort) -> bool {
        svc.name.starts_with(GATEWAY_PREFIX)
    }

    /// Asks dependent proxies to be reconfigured.
    pub fn notify_broadcast_needed(&self) {
        self.events.publish(PubSubMessage::proxy_broadcast());
    }

    // Called with the state write guard held, so an eviction and its
    // inventory removal are one step. Sinks must not call back into the catalog.
    async fn after_update(&self, cluster_id: &str, change: PeerChange) {
        if change == PeerChange::Evicted {
            self.cluster_pods.remove_cluster(cluster_id).await;
            self.all_pods.remove_cluster(cluster_id).await;
        }
    }
}
