//! Caller-side drivers for the catalog.
//!
//! The catalog never schedules itself.  These loops supply the cadence:
//! one re-reads the master address on a fixed interval, the other applies
//! peer reports as they arrive from whoever probes the peers.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::catalog::Catalog;
use crate::types::PeerReport;

/// Reconciles the master address every `period`.  Runs until aborted.
pub async fn run_reconciler(catalog: Arc<Catalog>, period: Duration) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        if catalog.reconcile_master_address().await {
            catalog.notify_broadcast_needed();
        }
    }
}

/// Spawns [`run_report_intake`] and returns the sender feeding it.  The
/// consumer is running before the caller can send anything.
pub fn start_report_intake(
    catalog: Arc<Catalog>,
    capacity: usize,
) -> (mpsc::Sender<PeerReport>, JoinHandle<()>) {
    let (report_tx, report_rx) = mpsc::channel(capacity);
    let handle = tokio::spawn(run_report_intake(report_rx, catalog));
    (report_tx, handle)
}

/// Applies peer reports until the channel closes.
pub async fn run_report_intake(mut report_rx: mpsc::Receiver<PeerReport>, catalog: Arc<Catalog>) {
    while let Some(report) = report_rx.recv().await {
        let (cluster_id, address) = report.into_parts();
        let change = catalog.update_remote_peer(&cluster_id, &address).await;
        debug!("Applied report for {}: {:?}", cluster_id, change);
        if change.requires_broadcast() {
            catalog.notify_broadcast_needed();
        }
    }
    info!("Peer report channel closed, shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MASTER_CLUSTER_ID;
    use crate::events::EventBus;
    use crate::inventory::InventoryMap;
    use crate::master::MasterAddressSource;
    use crate::types::{Announcement, RemotePeer};
    use tokio::sync::broadcast::error::TryRecvError;

    struct FixedMaster(&'static str);

    impl MasterAddressSource for FixedMaster {
        fn current_master_address(&self) -> String {
            self.0.to_string()
        }
    }

    fn catalog(master: &'static str, events: &EventBus) -> Arc<Catalog> {
        Arc::new(Catalog::new(
            "east",
            Arc::new(FixedMaster(master)),
            events.clone(),
            Arc::new(InventoryMap::new("cluster-pods")),
            Arc::new(InventoryMap::new("all-pods")),
        ))
    }

    #[tokio::test]
    async fn intake_applies_reports_and_broadcasts_structural_changes() {
        let events = EventBus::new(16);
        let mut rx = events.subscribe();
        let catalog = catalog("", &events);

        let (tx, report_rx) = mpsc::channel(16);
        let reports = vec![
            PeerReport::Reachable {
                cluster_id: "c1".into(),
                address: "10.0.0.1".into(),
            },
            PeerReport::Reachable {
                cluster_id: "c1".into(),
                address: "10.0.0.1".into(),
            },
            PeerReport::Reachable {
                cluster_id: "c2".into(),
                address: "10.0.0.2".into(),
            },
            PeerReport::Unreachable {
                cluster_id: "c2".into(),
            },
            PeerReport::Unreachable {
                cluster_id: "c2".into(),
            },
            PeerReport::Unreachable {
                cluster_id: "c2".into(),
            },
        ];
        for report in reports {
            tx.send(report).await.unwrap();
        }
        drop(tx);

        run_report_intake(report_rx, Arc::clone(&catalog)).await;

        let peers = catalog.list_remote_peers().await;
        assert_eq!(peers.len(), 1);
        assert_eq!(peers["c1"], RemotePeer::new("10.0.0.1"));

        // create c1, create c2, evict c2
        let mut broadcasts = 0;
        while let Ok(msg) = rx.try_recv() {
            assert_eq!(msg.announcement, Announcement::ScheduleProxyBroadcast);
            broadcasts += 1;
        }
        assert_eq!(broadcasts, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn reconciler_only_broadcasts_on_change() {
        let events = EventBus::new(16);
        let mut rx = events.subscribe();
        let catalog = catalog("10.0.0.9", &events);

        let handle = tokio::spawn(run_reconciler(
            Arc::clone(&catalog),
            Duration::from_secs(1),
        ));
        tokio::time::sleep(Duration::from_secs(5)).await;
        handle.abort();

        // Construction already picked up the master address.
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
        assert!(catalog.remote_peer(MASTER_CLUSTER_ID).await.is_some());
        assert!(!catalog.is_master().await);
    }

    #[tokio::test]
    async fn seeding_more_reports_than_capacity_does_not_block() {
        let events = EventBus::new(16);
        let catalog = catalog("", &events);
        let (tx, handle) = start_report_intake(Arc::clone(&catalog), 4);

        let seeded = tokio::time::timeout(Duration::from_secs(5), async {
            for i in 0..200 {
                tx.send(PeerReport::Reachable {
                    cluster_id: format!("c{}", i),
                    address: format!("10.0.{}.{}", i / 256, i % 256),
                })
                .await
                .unwrap();
            }
        })
        .await;
        assert!(seeded.is_ok(), "seeding stalled on a full channel");

        drop(tx);
        handle.await.unwrap();
        assert_eq!(catalog.list_remote_peers().await.len(), 200);
    }
}
