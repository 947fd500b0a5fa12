//! Meshcat daemon entry point.

use std::sync::Arc;

use log::{error, info, warn};
use tokio::signal;
use tokio::sync::broadcast::error::RecvError;

use meshcat::inventory::InventoryMap;
use meshcat::master::EnvMasterSource;
use meshcat::reconcile::{run_reconciler, start_report_intake};
use meshcat::{Catalog, Config, EventBus, PeerReport};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    env_logger::init();

    // Load configuration
    let cfg = Config::load()?;
    info!("Starting meshcat daemon with config: {:?}", cfg);

    // Event bus
    let events = EventBus::new(cfg.event_capacity);
    let mut event_rx = events.subscribe();

    // Pod inventories
    let cluster_pods = Arc::new(InventoryMap::new("cluster-pods"));
    let all_pods = Arc::new(InventoryMap::new("all-pods"));
    info!(
        "Eviction targets: {}, {}",
        cluster_pods.name(),
        all_pods.name()
    );

    // Catalog
    let catalog = Arc::new(Catalog::new(
        cfg.cluster_id.clone(),
        Arc::new(EnvMasterSource::new(cfg.master_env_var.clone())),
        events.clone(),
        cluster_pods,
        all_pods,
    ));
    if let Some(ref addr) = cfg.own_address {
        catalog.register_own_address(addr).await;
    }
    info!(
        "Cluster {} is {}",
        catalog.cluster_id(),
        if catalog.is_master().await { "master" } else { "a replica" }
    );

    // Peer reports
    let (report_tx, intake_handle) = start_report_intake(Arc::clone(&catalog), 128);
    for (cluster_id, address) in cfg.static_peers.clone() {
        report_tx
            .send(PeerReport::Reachable {
                cluster_id,
                address,
            })
            .await
            .map_err(|_| anyhow::anyhow!("Channel closed"))?;
    }

    // Master reconciliation
    let reconcile_handle = tokio::spawn(run_reconciler(
        Arc::clone(&catalog),
        cfg.reconcile_interval(),
    ));

    // Event logger
    let events_handle = tokio::spawn(async move {
        loop {
            match event_rx.recv().await {
                Ok(msg) => info!("Event: {:?}", msg.announcement),
                Err(RecvError::Lagged(n)) => warn!("Event logger lagged by {} messages", n),
                Err(RecvError::Closed) => break,
            }
        }
    });

    // Graceful Shutdown
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Received Ctrl+C, shutting down...");
        }
        Err(err) => {
            error!("Unable to listen for shutdown signal: {}", err);
        }
    }

    // Abort tasks
    drop(report_tx);
    intake_handle.abort();
    reconcile_handle.abort();
    events_handle.abort();

    info!("Shutdown complete.");
    Ok(())
}
