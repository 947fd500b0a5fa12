//! Data structures shared between the catalog and its collaborators.
//!
//! These types are serialised using [`serde`](https://serde.rs/) so they
//! can be logged or handed to other subsystems as JSON.  They describe
//! remote peers, the reports that drive the registry and the events the
//! catalog publishes.

use serde::{Deserialize, Serialize};

/// Registry entry for a remote cluster.
///
/// The cluster identifier is the map key and is not repeated here.
/// `address` is never empty: a peer without an address is either absent
/// from the registry or carries a non-zero `fail_count`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemotePeer {
    pub address: String,
    pub fail_count: u32,
}

impl RemotePeer {
    /// Fresh binding for an address, with no failures recorded.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            fail_count: 0,
        }
    }
}

/// A service port as seen by the mesh.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MeshServicePort {
    pub namespace: String,
    pub name: String,
    pub port: u16,
    pub target_port: u16,
    pub protocol: String,
}

/// A liveness report for a remote cluster.
///
/// Sent by whatever polls the peers.  `Unreachable` is the same as
/// reporting an empty address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeerReport {
    Reachable { cluster_id: String, address: String },
    Unreachable { cluster_id: String },
}

impl PeerReport {
    /// Splits the report into the `(cluster_id, address)` pair the
    /// registry consumes.  Unreachable peers map to an empty address.
    pub fn into_parts(self) -> (String, String) {
        match self {
            PeerReport::Reachable {
                cluster_id,
                address,
            } => (cluster_id, address),
            PeerReport::Unreachable { cluster_id } => (cluster_id, String::new()),
        }
    }
}

/// Kinds of announcement carried on the event bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Announcement {
    /// Dependent proxy configuration must be recomputed and pushed.
    ScheduleProxyBroadcast,
}

/// A message published on the event bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PubSubMessage {
    pub announcement: Announcement,
    pub old_obj: Option<serde_json::Value>,
    pub new_obj: Option<serde_json::Value>,
}

impl PubSubMessage {
    /// Payload-free proxy broadcast request.
    pub fn proxy_broadcast() -> Self {
        Self {
            announcement: Announcement::ScheduleProxyBroadcast,
            old_obj: None,
            new_obj: None,
        }
    }
}

/// Outcome of a single registry update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerChange {
    /// Empty cluster identifier.
    Ignored,
    /// Empty address for a cluster that is not registered.
    Absent,
    /// First address seen for the cluster.
    Created,
    /// Address changed; the fail count was discarded.
    Replaced,
    /// Same address as the stored one.
    Unchanged,
    /// Empty address for a registered cluster, below the threshold.
    Degraded(u32),
    /// Empty address reached the threshold; the entry was removed.
    Evicted,
}

impl PeerChange {
    /// Whether the change alters the set of reachable peer addresses.
    pub fn requires_broadcast(&self) -> bool {
        matches!(
            self,
            PeerChange::Created | PeerChange::Replaced | PeerChange::Evicted
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreachable_report_maps_to_empty_address() {
        let report = PeerReport::Unreachable {
            cluster_id: "c1".into(),
        };
        assert_eq!(report.into_parts(), ("c1".to_string(), String::new()));
    }

    #[test]
    fn only_structural_changes_require_broadcast() {
        assert!(PeerChange::Created.requires_broadcast());
        assert!(PeerChange::Replaced.requires_broadcast());
        assert!(PeerChange::Evicted.requires_broadcast());
        assert!(!PeerChange::Unchanged.requires_broadcast());
        assert!(!PeerChange::Degraded(1).requires_broadcast());
        assert!(!PeerChange::Ignored.requires_broadcast());
        assert!(!PeerChange::Absent.requires_broadcast());
    }

    #[test]
    fn proxy_broadcast_serialises_without_payload() {
        let json = serde_json::to_value(PubSubMessage::proxy_broadcast()).unwrap();
        assert_eq!(json["announcement"], "ScheduleProxyBroadcast");
        assert!(json["old_obj"].is_null());
        assert!(json["new_obj"].is_null());
    }
}
