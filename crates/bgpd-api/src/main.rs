//! Demonstration walk-through of the API bridge: configure the daemon, add
//! neighbors, watch session transitions, stream a batch of path updates and
//! read the resulting table.
//!
//! Run with `RUST_LOG=info cargo run -p bgpd-api` (or `RUST_LOG=debug` for
//! per-request flow).

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{error, info};

use actor_bridge::tracing::setup_tracing;
use bgpd_api::lifecycle::ApiSystem;
use bgpd_api::model::{Family, GlobalConfig, Neighbor, Path};
use bgpd_api::payload::{ChangeOp, NeighborChange};
use bgpd_api::{ApiError, PathUpdate, Scope, SoftResetDirection};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    setup_tracing();
    info!("starting bgpd api demo");

    let system = ApiSystem::start();
    let api = &system.service;

    api.apply_global_config(GlobalConfig {
        asn: 64512,
        router_id: "192.0.2.1".to_string(),
        listen_port: 179,
    })
    .await?;

    for (address, asn) in [("198.51.100.1", 64513), ("198.51.100.2", 64514)] {
        api.apply_neighbor(NeighborChange {
            op: ChangeOp::Add,
            neighbor: Neighbor::new(address, asn, 64512),
        })
        .await?;
    }

    // Watch session transitions in the background.
    let (events_tx, mut events_rx) = mpsc::channel(16);
    let watcher_api = system.service.clone();
    let watcher = tokio::spawn(async move {
        let mut sink = events_tx;
        watcher_api.watch_peer_states("", &mut sink).await
    });
    // Give the subscription a moment to reach the daemon ahead of the
    // transitions below.
    tokio::time::sleep(Duration::from_millis(20)).await;

    api.enable_neighbor("198.51.100.1").await?;
    api.enable_neighbor("198.51.100.2").await?;
    api.soft_reset_neighbor("198.51.100.1", SoftResetDirection::Inbound)
        .await?;

    let updates = tokio_stream::iter(vec![
        path_update("203.0.113.0/24", "198.51.100.1"),
        path_update("203.0.113.128/25", "198.51.100.2"),
        path_update("198.18.0.0/15", "198.51.100.1"),
    ]);
    api.apply_paths(updates).await?;
    info!("path updates acknowledged");

    let (table_tx, mut table_rx) = mpsc::channel(32);
    {
        let mut sink = table_tx;
        api.table(Scope::Global, "", Family::Ipv4Unicast, &mut sink)
            .await?;
    }
    while let Some(destination) = table_rx.recv().await {
        info!(
            prefix = %destination.prefix,
            paths = destination.paths.len(),
            "route"
        );
    }

    system.shutdown().await;

    // The subscription completes once the daemon is gone.
    match watcher.await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => error!(error = %err, "peer watch failed"),
        Err(err) => error!(error = %err, "peer watch task panicked"),
    }
    while let Ok(event) = events_rx.try_recv() {
        info!(
            neighbor = %event.address,
            state = ?event.session_state,
            "observed transition"
        );
    }

    info!("demo complete");
    Ok(())
}

fn path_update(prefix: &str, next_hop: &str) -> PathUpdate {
    PathUpdate {
        scope: Scope::Global,
        vrf: String::new(),
        path: Path::announce(Family::Ipv4Unicast, prefix, next_hop),
    }
}
