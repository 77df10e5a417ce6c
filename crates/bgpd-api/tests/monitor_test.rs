use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_stream::iter;

use bgpd_api::lifecycle::ApiSystem;
use bgpd_api::model::{Family, Neighbor, Path, SessionState};
use bgpd_api::payload::{ChangeOp, NeighborChange};
use bgpd_api::service::Deliver;
use bgpd_api::{ApiError, ApiService, PathUpdate, Scope};

async fn add_neighbor(api: &ApiService, address: &str) {
    api.apply_neighbor(NeighborChange {
        op: ChangeOp::Add,
        neighbor: Neighbor::new(address, 64513, 64512),
    })
    .await
    .expect("failed to add neighbor");
}

/// Accepts a fixed number of items, then reports a sink failure.
struct FailAfter {
    delivered: Vec<Neighbor>,
    limit: usize,
}

#[async_trait]
impl Deliver<Neighbor> for FailAfter {
    async fn deliver(&mut self, item: Neighbor) -> Result<(), ApiError> {
        if self.delivered.len() == self.limit {
            return Err(ApiError::SinkClosed);
        }
        self.delivered.push(item);
        Ok(())
    }
}

#[tokio::test]
async fn peer_watcher_observes_transitions_and_completes_on_shutdown() {
    let system = ApiSystem::start();
    add_neighbor(&system.service, "198.51.100.1").await;

    let (events_tx, mut events_rx) = mpsc::channel(16);
    let api = system.service.clone();
    let watcher = tokio::spawn(async move {
        let mut sink = events_tx;
        api.watch_peer_states("", &mut sink).await
    });
    sleep(Duration::from_millis(50)).await;

    system.service.enable_neighbor("198.51.100.1").await.unwrap();
    system.service.disable_neighbor("198.51.100.1").await.unwrap();

    system.shutdown().await;

    // The daemon dropped its watcher list on exit, closing the stream
    // cleanly with the events already delivered.
    watcher.await.unwrap().unwrap();
    let first = events_rx.recv().await.unwrap();
    assert_eq!(first.session_state, SessionState::Established);
    let second = events_rx.recv().await.unwrap();
    assert_eq!(second.session_state, SessionState::Idle);
    assert!(events_rx.recv().await.is_none());
}

#[tokio::test]
async fn peer_watcher_filters_by_neighbor_address() {
    let system = ApiSystem::start();
    add_neighbor(&system.service, "198.51.100.1").await;
    add_neighbor(&system.service, "198.51.100.2").await;

    let (events_tx, mut events_rx) = mpsc::channel(16);
    let api = system.service.clone();
    let watcher = tokio::spawn(async move {
        let mut sink = events_tx;
        api.watch_peer_states("198.51.100.2", &mut sink).await
    });
    sleep(Duration::from_millis(50)).await;

    system.service.enable_neighbor("198.51.100.1").await.unwrap();
    system.service.enable_neighbor("198.51.100.2").await.unwrap();

    system.shutdown().await;
    watcher.await.unwrap().unwrap();

    let only = events_rx.recv().await.unwrap();
    assert_eq!(only.address, "198.51.100.2");
    assert!(events_rx.recv().await.is_none());
}

#[tokio::test]
async fn sink_failure_cancels_the_subscription_and_the_daemon_survives() {
    let system = ApiSystem::start();
    add_neighbor(&system.service, "198.51.100.1").await;

    let api = system.service.clone();
    let watcher = tokio::spawn(async move {
        let mut sink = FailAfter {
            delivered: Vec::new(),
            limit: 5,
        };
        let result = api.watch_peer_states("", &mut sink).await;
        (sink.delivered, result)
    });
    sleep(Duration::from_millis(50)).await;

    // enable = 1 transition, each reset = 2 (down, back up): 7 events total,
    // so the sixth forward attempt fails mid-subscription.
    system.service.enable_neighbor("198.51.100.1").await.unwrap();
    for _ in 0..3 {
        system.service.reset_neighbor("198.51.100.1").await.unwrap();
    }

    let (delivered, result) = watcher.await.unwrap();
    assert_eq!(delivered.len(), 5);
    assert!(matches!(result, Err(ApiError::SinkClosed)));

    // The daemon dropped the dead watcher and keeps serving.
    system.service.reset_neighbor("198.51.100.1").await.unwrap();
    let neighbor = system.service.neighbor("198.51.100.1").await.unwrap();
    assert_eq!(neighbor.session_state, SessionState::Established);

    system.shutdown().await;
}

#[tokio::test]
async fn best_path_watcher_sees_route_changes_until_its_consumer_goes_away() {
    let system = ApiSystem::start();

    let (events_tx, mut events_rx) = mpsc::channel(4);
    let api = system.service.clone();
    let watcher = tokio::spawn(async move {
        let mut sink = events_tx;
        api.watch_best_paths(Scope::Global, &mut sink).await
    });
    sleep(Duration::from_millis(50)).await;

    let updates = iter(vec![PathUpdate {
        scope: Scope::Global,
        vrf: String::new(),
        path: Path::announce(Family::Ipv4Unicast, "203.0.113.0/24", "198.51.100.1"),
    }]);
    system.service.apply_paths(updates).await.unwrap();

    let event = events_rx.recv().await.unwrap();
    assert_eq!(event.prefix, "203.0.113.0/24");

    // The consumer walks away; the next change must cancel the subscription
    // instead of wedging the daemon.
    drop(events_rx);
    let updates = iter(vec![PathUpdate {
        scope: Scope::Global,
        vrf: String::new(),
        path: Path::announce(Family::Ipv4Unicast, "198.18.0.0/15", "198.51.100.2"),
    }]);
    system.service.apply_paths(updates).await.unwrap();

    let result = watcher.await.unwrap();
    assert!(matches!(result, Err(ApiError::SinkClosed)));

    system.shutdown().await;
}
