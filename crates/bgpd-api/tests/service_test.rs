use tokio::sync::mpsc;
use tokio_stream::iter;

use actor_bridge::mock::{Script, ScriptedActor};
use bgpd_api::lifecycle::ApiSystem;
use bgpd_api::model::{
    DefinedSet, DefinedSetKind, Destination, DumpOptions, Family, GlobalConfig, Neighbor, Path,
    Policy, PolicyAssignment, PolicyDirection, Roa, RouteAction, RpkiServer, Statement,
};
use bgpd_api::payload::{
    Body, ChangeOp, DefinedSetChange, NeighborChange, PolicyAssignmentChange, PolicyChange,
    StatementChange, VrfChange,
};
use bgpd_api::{ApiError, ApiService, Op, PathUpdate, Scope};
use bgpd_api::model::Vrf;

fn announce(prefix: &str, next_hop: &str) -> PathUpdate {
    PathUpdate {
        scope: Scope::Global,
        vrf: String::new(),
        path: Path::announce(Family::Ipv4Unicast, prefix, next_hop),
    }
}

fn withdraw(prefix: &str) -> PathUpdate {
    PathUpdate {
        scope: Scope::Global,
        vrf: String::new(),
        path: Path::withdraw(Family::Ipv4Unicast, prefix),
    }
}

async fn add_neighbor(api: &ApiService, address: &str, asn: u32) {
    api.apply_neighbor(NeighborChange {
        op: ChangeOp::Add,
        neighbor: Neighbor::new(address, asn, 64512),
    })
    .await
    .expect("failed to add neighbor");
}

async fn collect_table(api: &ApiService, scope: Scope, name: &str) -> Vec<Destination> {
    let (tx, mut rx) = mpsc::channel(64);
    {
        let mut sink = tx;
        api.table(scope, name, Family::Ipv4Unicast, &mut sink)
            .await
            .expect("table read failed");
    }
    let mut items = Vec::new();
    while let Some(item) = rx.recv().await {
        items.push(item);
    }
    items
}

#[tokio::test]
async fn global_config_roundtrip() {
    let system = ApiSystem::start();
    let config = GlobalConfig {
        asn: 64512,
        router_id: "192.0.2.1".to_string(),
        listen_port: 179,
    };
    system.service.apply_global_config(config.clone()).await.unwrap();
    assert_eq!(system.service.global_config().await.unwrap(), config);
    system.shutdown().await;
}

#[tokio::test]
async fn neighbor_read_returns_the_stored_record() {
    let system = ApiSystem::start();
    add_neighbor(&system.service, "10.0.0.1", 64513).await;

    let neighbor = system.service.neighbor("10.0.0.1").await.unwrap();
    assert_eq!(neighbor.address, "10.0.0.1");
    assert_eq!(neighbor.peer_asn, 64513);

    let err = system.service.neighbor("10.0.0.99").await.unwrap_err();
    assert!(matches!(err, ApiError::NeighborNotFound(addr) if addr == "10.0.0.99"));
    system.shutdown().await;
}

#[tokio::test]
async fn concurrent_unary_requests_stay_isolated() {
    let system = ApiSystem::start();
    add_neighbor(&system.service, "10.0.0.1", 64513).await;
    add_neighbor(&system.service, "10.0.0.2", 64514).await;

    let (first, second) = tokio::join!(
        system.service.neighbor("10.0.0.1"),
        system.service.neighbor("10.0.0.2"),
    );
    assert_eq!(first.unwrap().peer_asn, 64513);
    assert_eq!(second.unwrap().peer_asn, 64514);
    system.shutdown().await;
}

#[tokio::test]
async fn mutation_stream_applies_every_item_then_acknowledges() {
    let system = ApiSystem::start();
    let updates = iter(vec![
        announce("203.0.113.0/24", "198.51.100.1"),
        announce("203.0.113.128/25", "198.51.100.1"),
        announce("198.18.0.0/15", "198.51.100.2"),
    ]);

    system.service.apply_paths(updates).await.unwrap();

    let table = collect_table(&system.service, Scope::Global, "").await;
    assert_eq!(table.len(), 3);
    system.shutdown().await;
}

#[tokio::test]
async fn mutation_aborts_on_unsupported_scope_without_losing_earlier_items() {
    let system = ApiSystem::start();
    let bad = PathUpdate {
        scope: Scope::Local,
        vrf: String::new(),
        path: Path::announce(Family::Ipv4Unicast, "198.18.0.0/15", "198.51.100.2"),
    };
    let updates = iter(vec![announce("203.0.113.0/24", "198.51.100.1"), bad,
        announce("203.0.113.128/25", "198.51.100.1")]);

    let err = system.service.apply_paths(updates).await.unwrap_err();
    assert!(matches!(err, ApiError::UnsupportedScope { scope: Scope::Local, .. }));

    // Item 1 was acknowledged and stays applied; item 3 was never submitted.
    let table = collect_table(&system.service, Scope::Global, "").await;
    assert_eq!(table.len(), 1);
    assert_eq!(table[0].prefix, "203.0.113.0/24");
    system.shutdown().await;
}

#[tokio::test]
async fn mutation_aborts_when_the_daemon_rejects_an_item() {
    let system = ApiSystem::start();
    let updates = iter(vec![
        announce("203.0.113.0/24", "198.51.100.1"),
        withdraw("192.0.2.0/24"), // never announced
        announce("203.0.113.128/25", "198.51.100.1"),
    ]);

    let err = system.service.apply_paths(updates).await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidPath(_)));

    let table = collect_table(&system.service, Scope::Global, "").await;
    assert_eq!(table.len(), 1);
    system.shutdown().await;
}

#[tokio::test]
async fn policy_objects_roundtrip_through_the_daemon() {
    let system = ApiSystem::start();
    let api = &system.service;

    api.apply_defined_set(DefinedSetChange {
        op: ChangeOp::Add,
        set: DefinedSet {
            kind: DefinedSetKind::Prefix,
            name: "martians".to_string(),
            members: vec!["10.0.0.0/8".to_string(), "192.168.0.0/16".to_string()],
        },
    })
    .await
    .unwrap();

    api.apply_statement(StatementChange {
        op: ChangeOp::Add,
        statement: Statement {
            name: "drop-martians".to_string(),
            prefix_set: Some("martians".to_string()),
            neighbor_set: None,
            action: RouteAction::Reject,
        },
    })
    .await
    .unwrap();

    api.apply_policy(PolicyChange {
        op: ChangeOp::Add,
        policy: Policy {
            name: "import-hygiene".to_string(),
            statements: vec!["drop-martians".to_string()],
        },
    })
    .await
    .unwrap();

    api.apply_policy_assignment(PolicyAssignmentChange {
        op: ChangeOp::Add,
        assignment: PolicyAssignment {
            name: "global".to_string(),
            direction: PolicyDirection::Import,
            policies: vec!["import-hygiene".to_string()],
            default_action: RouteAction::Accept,
        },
    })
    .await
    .unwrap();

    let set = api.defined_set(DefinedSetKind::Prefix, "martians").await.unwrap();
    assert_eq!(set.members.len(), 2);

    let statement = api.statement("drop-martians").await.unwrap();
    assert_eq!(statement.action, RouteAction::Reject);

    let policy = api.policy("import-hygiene").await.unwrap();
    assert_eq!(policy.statements, vec!["drop-martians".to_string()]);

    let assignment = api
        .policy_assignment("global", PolicyDirection::Import)
        .await
        .unwrap();
    assert_eq!(assignment.policies.len(), 1);

    let (tx, mut rx) = mpsc::channel(16);
    {
        let mut sink = tx;
        api.defined_sets(&mut sink).await.unwrap();
    }
    assert!(rx.recv().await.is_some());

    system.shutdown().await;
}

#[tokio::test]
async fn policy_objects_validate_their_references() {
    let system = ApiSystem::start();
    let api = &system.service;

    // A statement may not reference a defined set that does not exist.
    let err = api
        .apply_statement(StatementChange {
            op: ChangeOp::Add,
            statement: Statement {
                name: "dangling".to_string(),
                prefix_set: Some("no-such-set".to_string()),
                neighbor_set: None,
                action: RouteAction::Accept,
            },
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ApiError::ObjectNotFound { kind: "defined set", .. }
    ));

    let err = api
        .apply_policy(PolicyChange {
            op: ChangeOp::Remove,
            policy: Policy {
                name: "ghost".to_string(),
                statements: Vec::new(),
            },
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::ObjectNotFound { kind: "policy", .. }));

    system.shutdown().await;
}

#[tokio::test]
async fn vrf_tables_are_isolated_from_the_global_table() {
    let system = ApiSystem::start();
    let api = &system.service;

    api.apply_vrf(VrfChange {
        op: ChangeOp::Add,
        vrf: Vrf::new("blue", "64512:100"),
    })
    .await
    .unwrap();

    let updates = iter(vec![PathUpdate {
        scope: Scope::Vrf,
        vrf: "blue".to_string(),
        path: Path::announce(Family::Ipv4Unicast, "172.16.0.0/12", "198.51.100.1"),
    }]);
    api.apply_paths(updates).await.unwrap();

    let vrf_table = collect_table(api, Scope::Vrf, "blue").await;
    assert_eq!(vrf_table.len(), 1);
    assert_eq!(vrf_table[0].prefix, "172.16.0.0/12");

    let global = collect_table(api, Scope::Global, "").await;
    assert!(global.is_empty());

    let (tx, mut rx) = mpsc::channel(8);
    {
        let mut sink = tx;
        api.vrfs(&mut sink).await.unwrap();
    }
    assert_eq!(rx.recv().await.unwrap().name, "blue");

    system.shutdown().await;
}

#[tokio::test]
async fn reading_an_unknown_vrf_fails_without_delivering_items() {
    let system = ApiSystem::start();
    let (tx, mut rx) = mpsc::channel(8);
    let err = {
        let mut sink = tx;
        system
            .service
            .table(Scope::Vrf, "ghost", Family::Ipv4Unicast, &mut sink)
            .await
            .unwrap_err()
    };
    assert!(matches!(err, ApiError::VrfNotFound(name) if name == "ghost"));
    assert!(rx.recv().await.is_none());
    system.shutdown().await;
}

#[tokio::test]
async fn adjacency_views_follow_path_sources() {
    let system = ApiSystem::start();
    let api = &system.service;

    let mut learned = Path::announce(Family::Ipv4Unicast, "203.0.113.0/24", "198.51.100.1");
    learned.source = Some("198.51.100.1".to_string());
    let updates = iter(vec![
        PathUpdate { scope: Scope::Global, vrf: String::new(), path: learned },
        announce("198.18.0.0/15", "192.0.2.1"),
    ]);
    api.apply_paths(updates).await.unwrap();

    let adj_in = collect_table(api, Scope::AdjIn, "198.51.100.1").await;
    assert_eq!(adj_in.len(), 1);
    assert_eq!(adj_in[0].prefix, "203.0.113.0/24");

    let adj_out = collect_table(api, Scope::AdjOut, "198.51.100.1").await;
    assert_eq!(adj_out.len(), 1);
    assert_eq!(adj_out[0].prefix, "198.18.0.0/15");

    system.shutdown().await;
}

#[tokio::test]
async fn empty_streams_complete_successfully() {
    let system = ApiSystem::start();
    let (tx, mut rx) = mpsc::channel::<RpkiServer>(8);
    {
        let mut sink = tx;
        system.service.rpki_servers(&mut sink).await.unwrap();
    }
    assert!(rx.recv().await.is_none());
    system.shutdown().await;
}

#[tokio::test]
async fn seeded_rpki_cache_is_streamed() {
    let system = ApiSystem::start_with(|daemon| {
        daemon.with_rpki_cache(
            vec![RpkiServer {
                address: "192.0.2.10".to_string(),
                port: 323,
                serial: 42,
                received_ipv4: 120_000,
                received_ipv6: 30_000,
            }],
            vec![Roa {
                family: Family::Ipv4Unicast,
                prefix: "203.0.113.0/24".to_string(),
                max_prefix_len: 24,
                asn: 64513,
            }],
        )
    });

    let (tx, mut rx) = mpsc::channel(8);
    {
        let mut sink = tx;
        system.service.rpki_servers(&mut sink).await.unwrap();
    }
    assert_eq!(rx.recv().await.unwrap().serial, 42);

    let (tx, mut rx) = mpsc::channel(8);
    {
        let mut sink = tx;
        system.service.roas(Family::Ipv4Unicast, &mut sink).await.unwrap();
    }
    assert_eq!(rx.recv().await.unwrap().asn, 64513);

    system.shutdown().await;
}

#[tokio::test]
async fn table_dumps_chunk_the_table_and_validate_scope() {
    let system = ApiSystem::start();
    let api = &system.service;
    let updates = iter(vec![
        announce("203.0.113.0/24", "198.51.100.1"),
        announce("203.0.113.128/25", "198.51.100.1"),
        announce("198.18.0.0/15", "198.51.100.2"),
    ]);
    api.apply_paths(updates).await.unwrap();

    let (tx, mut rx) = mpsc::channel(8);
    {
        let mut sink = tx;
        api.dump_table(Scope::Global, DumpOptions { interval: 60 }, &mut sink)
            .await
            .unwrap();
    }
    let record = rx.recv().await.unwrap();
    assert_eq!(record.table, "global");
    assert_eq!(record.interval, 60);
    assert_eq!(record.entries.len(), 3);
    assert!(rx.recv().await.is_none());

    let (tx, _rx) = mpsc::channel(8);
    let err = {
        let mut sink = tx;
        api.dump_table(Scope::AdjIn, DumpOptions::default(), &mut sink)
            .await
            .unwrap_err()
    };
    assert!(matches!(err, ApiError::UnsupportedScope { scope: Scope::AdjIn, .. }));

    system.shutdown().await;
}

#[tokio::test]
async fn unsupported_scopes_are_rejected_before_the_daemon_sees_anything() {
    let (dispatcher, log) = ScriptedActor::new().spawn();
    let api = ApiService::new(dispatcher);

    let (tx, _rx) = mpsc::channel(8);
    let mut sink = tx;
    let err = api
        .clone()
        .watch_best_paths(Scope::Vrf, &mut sink)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::UnsupportedScope { scope: Scope::Vrf, .. }));

    let (tx, _rx) = mpsc::channel(8);
    let mut sink = tx;
    let err = api
        .dump_table(Scope::AdjOut, DumpOptions::default(), &mut sink)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::UnsupportedScope { scope: Scope::AdjOut, .. }));

    // The actor observed zero activity for the rejected calls.
    assert!(log.ops().is_empty());
}

#[tokio::test]
async fn a_mismatched_reply_payload_fails_loudly() {
    // A daemon that answers a neighbor read with a bare ack violates the
    // operation contract; the caller must see that, not a silent success.
    let (dispatcher, _log) = ScriptedActor::new()
        .on(Op::Neighbor, Script::Reply(vec![Body::Ack]))
        .spawn();
    let api = ApiService::new(dispatcher);

    let err = api.neighbor("10.0.0.1").await.unwrap_err();
    assert!(matches!(
        err,
        ApiError::PayloadContract { expected: "Neighbor", got: "Ack" }
    ));
}
