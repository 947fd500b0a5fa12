//! Peer-cluster catalog for a multi-cluster mesh control plane.
//!
//! The [`catalog::Catalog`] tracks this instance's own address, the
//! master control-plane address and the liveness of remote clusters.
//! Peers that miss three consecutive reports are evicted together with
//! their pod inventories.

pub mod catalog;
pub mod config;
pub mod error;
pub mod events;
pub mod inventory;
pub mod master;
pub mod reconcile;
pub mod types;

pub use catalog::{Catalog, EVICTION_THRESHOLD, MASTER_CLUSTER_ID};
pub use config::Config;
pub use events::EventBus;
pub use types::{MeshServicePort, PeerChange, PeerReport, PubSubMessage, RemotePeer};
