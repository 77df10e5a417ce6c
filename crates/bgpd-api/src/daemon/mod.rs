//! # Reference Daemon
//!
//! An in-memory implementation of the actor side of the bridge contract: the
//! single serialized consumer of the request queue, owning all authoritative
//! state without any locking. The demo binary and the integration tests run
//! against it; a production daemon would replace it behind the same inbox.
//!
//! The contract it honors, per operation shape:
//! - unary tags answer with exactly one reply or one terminal error;
//! - list tags send zero or more replies, then close the channel;
//! - monitor tags register a watcher whose later event sends race the
//!   consumer's end-signal, and the watcher is discarded the moment a send
//!   is interrupted – the daemon never blocks on an abandoned subscriber.

pub mod rib;

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use actor_bridge::{Envelope, Inbox, Responder};

use crate::error::ApiError;
use crate::model::{
    AdminState, DefinedSet, Destination, DumpOptions, Family, GlobalConfig, Neighbor, Policy,
    PolicyAssignment, PolicyDirection, Roa, RpkiServer, SessionState, Statement, TableDump, Vrf,
};
use crate::op::Op;
use crate::payload::{Bgp, Body, ChangeOp, Payload};

use rib::Rib;

/// Destinations per archival dump record.
const DUMP_CHUNK: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WatchKind {
    BestPath,
    PeerState,
}

struct Watcher {
    kind: WatchKind,
    /// Neighbor filter for peer-state watchers; empty matches every origin.
    key: String,
    responder: Responder<Bgp>,
}

struct VrfTable {
    vrf: Vrf,
    rib: Rib,
}

/// The single serialized owner of daemon state.
pub struct Daemon {
    inbox: Inbox<Bgp>,
    global: GlobalConfig,
    neighbors: BTreeMap<String, Neighbor>,
    rib: Rib,
    vrfs: BTreeMap<String, VrfTable>,
    defined_sets: BTreeMap<String, DefinedSet>,
    statements: BTreeMap<String, Statement>,
    policies: BTreeMap<String, Policy>,
    assignments: BTreeMap<(String, PolicyDirection), PolicyAssignment>,
    rpki_servers: Vec<RpkiServer>,
    roas: Vec<Roa>,
    watchers: Vec<Watcher>,
    dump_seq: u64,
}

impl Daemon {
    pub fn new(inbox: Inbox<Bgp>) -> Self {
        Self {
            inbox,
            global: GlobalConfig::default(),
            neighbors: BTreeMap::new(),
            rib: Rib::default(),
            vrfs: BTreeMap::new(),
            defined_sets: BTreeMap::new(),
            statements: BTreeMap::new(),
            policies: BTreeMap::new(),
            assignments: BTreeMap::new(),
            rpki_servers: Vec::new(),
            roas: Vec::new(),
            watchers: Vec::new(),
            dump_seq: 0,
        }
    }

    /// Seeds the validation cache, which has no mutation operation of its
    /// own (it is fed by RPKI sessions in a production daemon).
    pub fn with_rpki_cache(mut self, servers: Vec<RpkiServer>, roas: Vec<Roa>) -> Self {
        self.rpki_servers = servers;
        self.roas = roas;
        self
    }

    /// Consumes the inbox until every dispatcher clone is dropped.
    pub async fn run(mut self) {
        info!("daemon started");
        while let Some(envelope) = self.inbox.recv().await {
            self.handle(envelope).await;
        }
        info!(
            neighbors = self.neighbors.len(),
            routes = self.rib.len(),
            "daemon stopped"
        );
    }

    async fn handle(&mut self, envelope: Envelope<Bgp>) {
        let Envelope {
            op,
            key,
            filter,
            request,
            responder,
        } = envelope;
        debug!(?op, key = %key, "request");

        match op {
            // --- Unary configuration and object reads ---
            Op::GlobalConfig => answer(responder, Ok(Body::Global(self.global.clone()))).await,
            Op::Neighbor => answer(responder, self.get_neighbor(&key)).await,
            Op::DefinedSet => answer(responder, self.get_defined_set(&key, request)).await,
            Op::Statement => {
                answer(
                    responder,
                    fetch(&self.statements, "statement", &key).map(Body::Statement),
                )
                .await
            }
            Op::Policy => {
                answer(
                    responder,
                    fetch(&self.policies, "policy", &key).map(Body::Policy),
                )
                .await
            }
            Op::PolicyAssignment => {
                answer(responder, self.get_assignment(&key, request)).await
            }

            // --- Unary mutations ---
            Op::ModGlobalConfig => answer(responder, self.mod_global(request)).await,
            Op::ModNeighbor => answer(responder, self.mod_neighbor(request)).await,
            Op::ModVrf => answer(responder, self.mod_vrf(request)).await,
            Op::ModDefinedSet => answer(responder, self.mod_defined_set(request)).await,
            Op::ModStatement => answer(responder, self.mod_statement(request)).await,
            Op::ModPolicy => answer(responder, self.mod_policy(request)).await,
            Op::ModPolicyAssignment => answer(responder, self.mod_assignment(request)).await,
            Op::ModPath => {
                match self.mod_path(&key, request) {
                    Ok(changed) => {
                        answer(responder, Ok(Body::Ack)).await;
                        // Only the global table is watchable.
                        if let Some(destination) = changed {
                            self.broadcast(WatchKind::BestPath, "", Body::Destination(destination))
                                .await;
                        }
                    }
                    Err(err) => answer(responder, Err(err)).await,
                }
            }

            // --- Neighbor lifecycle controls ---
            Op::NeighborReset => self.reset_neighbor(&key, responder).await,
            Op::NeighborSoftReset | Op::NeighborSoftResetIn | Op::NeighborSoftResetOut => {
                // Route refresh has no visible effect on the in-memory view.
                answer(responder, self.get_neighbor(&key).map(|_| Body::Ack)).await
            }
            Op::NeighborShutdown | Op::NeighborDisable => {
                self.set_neighbor_state(&key, AdminState::Down, SessionState::Idle, responder)
                    .await
            }
            Op::NeighborEnable => {
                self.set_neighbor_state(&key, AdminState::Up, SessionState::Established, responder)
                    .await
            }

            // --- Server-streamed reads ---
            Op::NeighborList => {
                let items = self.neighbors.values().cloned().map(Body::Neighbor).collect();
                send_all(responder, items).await;
            }
            Op::GlobalRib => {
                let items = wrap_destinations(self.rib.destinations(filter));
                send_all(responder, items).await;
            }
            Op::LocalRib => {
                let items = wrap_destinations(self.rib.best_only(filter));
                send_all(responder, items).await;
            }
            Op::AdjRibIn => {
                let items = wrap_destinations(self.rib.learned_from(&key, filter));
                send_all(responder, items).await;
            }
            Op::AdjRibOut => {
                let items = wrap_destinations(self.rib.advertised_to(&key, filter));
                send_all(responder, items).await;
            }
            Op::VrfRib => reply_stream(responder, self.vrf_rib(&key, filter)).await,
            Op::VrfList => {
                let items = self
                    .vrfs
                    .values()
                    .map(|table| Body::Vrf(table.vrf.clone()))
                    .collect();
                send_all(responder, items).await;
            }
            Op::Rpki => {
                let items = self.rpki_servers.iter().cloned().map(Body::RpkiServer).collect();
                send_all(responder, items).await;
            }
            Op::Roa => {
                let items = self
                    .roas
                    .iter()
                    .filter(|roa| filter.is_none_or(|f| roa.family == f))
                    .cloned()
                    .map(Body::Roa)
                    .collect();
                send_all(responder, items).await;
            }
            Op::DefinedSetList => {
                let items = self.defined_sets.values().cloned().map(Body::DefinedSet).collect();
                send_all(responder, items).await;
            }
            Op::StatementList => {
                let items = self.statements.values().cloned().map(Body::Statement).collect();
                send_all(responder, items).await;
            }
            Op::PolicyList => {
                let items = self.policies.values().cloned().map(Body::Policy).collect();
                send_all(responder, items).await;
            }
            Op::DumpGlobalRib => reply_stream(responder, self.dump("global", request, false)).await,
            Op::DumpLocalRib => reply_stream(responder, self.dump("local", request, true)).await,

            // --- Event subscriptions ---
            Op::MonitorBestChanged => self.watchers.push(Watcher {
                kind: WatchKind::BestPath,
                key: String::new(),
                responder,
            }),
            Op::MonitorPeerState => self.watchers.push(Watcher {
                kind: WatchKind::PeerState,
                key,
                responder,
            }),
        }
    }

    // --- Unary handlers ---

    fn get_neighbor(&self, address: &str) -> Result<Body, ApiError> {
        self.neighbors
            .get(address)
            .cloned()
            .map(Body::Neighbor)
            .ok_or_else(|| ApiError::NeighborNotFound(address.to_string()))
    }

    fn get_defined_set(&self, name: &str, request: Option<Payload>) -> Result<Body, ApiError> {
        let kind = match request {
            Some(Payload::DefinedSetQuery(kind)) => kind,
            other => return Err(request_contract("DefinedSetQuery", &other)),
        };
        let set = fetch(&self.defined_sets, "defined set", name)?;
        if set.kind != kind {
            return Err(ApiError::ObjectNotFound {
                kind: "defined set",
                name: name.to_string(),
            });
        }
        Ok(Body::DefinedSet(set))
    }

    fn get_assignment(&self, name: &str, request: Option<Payload>) -> Result<Body, ApiError> {
        let direction = match request {
            Some(Payload::AssignmentQuery(direction)) => direction,
            other => return Err(request_contract("AssignmentQuery", &other)),
        };
        self.assignments
            .get(&(name.to_string(), direction))
            .cloned()
            .map(Body::PolicyAssignment)
            .ok_or_else(|| ApiError::ObjectNotFound {
                kind: "policy assignment",
                name: name.to_string(),
            })
    }

    fn mod_global(&mut self, request: Option<Payload>) -> Result<Body, ApiError> {
        match request {
            Some(Payload::Global(config)) => {
                info!(asn = config.asn, router_id = %config.router_id, "global config applied");
                self.global = config;
                Ok(Body::Ack)
            }
            other => Err(request_contract("Global", &other)),
        }
    }

    fn mod_neighbor(&mut self, request: Option<Payload>) -> Result<Body, ApiError> {
        let change = match request {
            Some(Payload::NeighborChange(change)) => change,
            other => return Err(request_contract("NeighborChange", &other)),
        };
        let address = change.neighbor.address.clone();
        match change.op {
            ChangeOp::Add => {
                if self.neighbors.contains_key(&address) {
                    return Err(ApiError::DuplicateObject {
                        kind: "neighbor",
                        name: address,
                    });
                }
                info!(neighbor = %address, asn = change.neighbor.peer_asn, "neighbor added");
                self.neighbors.insert(address, change.neighbor);
            }
            ChangeOp::Remove => {
                if self.neighbors.remove(&address).is_none() {
                    return Err(ApiError::NeighborNotFound(address));
                }
                info!(neighbor = %address, "neighbor removed");
            }
            ChangeOp::Replace => {
                self.neighbors.insert(address, change.neighbor);
            }
        }
        Ok(Body::Ack)
    }

    fn mod_vrf(&mut self, request: Option<Payload>) -> Result<Body, ApiError> {
        let change = match request {
            Some(Payload::VrfChange(change)) => change,
            other => return Err(request_contract("VrfChange", &other)),
        };
        let name = change.vrf.name.clone();
        match change.op {
            ChangeOp::Add => {
                if self.vrfs.contains_key(&name) {
                    return Err(ApiError::DuplicateObject {
                        kind: "vrf",
                        name,
                    });
                }
                info!(vrf = %name, rd = %change.vrf.rd, "vrf added");
                self.vrfs.insert(
                    name,
                    VrfTable {
                        vrf: change.vrf,
                        rib: Rib::default(),
                    },
                );
            }
            ChangeOp::Remove => {
                if self.vrfs.remove(&name).is_none() {
                    return Err(ApiError::VrfNotFound(name));
                }
                info!(vrf = %name, "vrf removed");
            }
            ChangeOp::Replace => {
                let rib = self
                    .vrfs
                    .remove(&name)
                    .map(|table| table.rib)
                    .unwrap_or_default();
                self.vrfs.insert(name, VrfTable { vrf: change.vrf, rib });
            }
        }
        Ok(Body::Ack)
    }

    fn mod_defined_set(&mut self, request: Option<Payload>) -> Result<Body, ApiError> {
        let change = match request {
            Some(Payload::DefinedSetChange(change)) => change,
            other => return Err(request_contract("DefinedSetChange", &other)),
        };
        let name = change.set.name.clone();
        apply_change(&mut self.defined_sets, "defined set", name, change.op, change.set)
    }

    fn mod_statement(&mut self, request: Option<Payload>) -> Result<Body, ApiError> {
        let change = match request {
            Some(Payload::StatementChange(change)) => change,
            other => return Err(request_contract("StatementChange", &other)),
        };
        if change.op != ChangeOp::Remove {
            for set in [&change.statement.prefix_set, &change.statement.neighbor_set]
                .into_iter()
                .flatten()
            {
                fetch(&self.defined_sets, "defined set", set)?;
            }
        }
        let name = change.statement.name.clone();
        apply_change(
            &mut self.statements,
            "statement",
            name,
            change.op,
            change.statement,
        )
    }

    fn mod_policy(&mut self, request: Option<Payload>) -> Result<Body, ApiError> {
        let change = match request {
            Some(Payload::PolicyChange(change)) => change,
            other => return Err(request_contract("PolicyChange", &other)),
        };
        if change.op != ChangeOp::Remove {
            for statement in &change.policy.statements {
                fetch(&self.statements, "statement", statement)?;
            }
        }
        let name = change.policy.name.clone();
        apply_change(&mut self.policies, "policy", name, change.op, change.policy)
    }

    fn mod_assignment(&mut self, request: Option<Payload>) -> Result<Body, ApiError> {
        let change = match request {
            Some(Payload::PolicyAssignmentChange(change)) => change,
            other => return Err(request_contract("PolicyAssignmentChange", &other)),
        };
        if change.op != ChangeOp::Remove {
            for policy in &change.assignment.policies {
                fetch(&self.policies, "policy", policy)?;
            }
        }
        let slot = (change.assignment.name.clone(), change.assignment.direction);
        match change.op {
            ChangeOp::Add => {
                if self.assignments.contains_key(&slot) {
                    return Err(ApiError::DuplicateObject {
                        kind: "policy assignment",
                        name: slot.0,
                    });
                }
                self.assignments.insert(slot, change.assignment);
            }
            ChangeOp::Remove => {
                if self.assignments.remove(&slot).is_none() {
                    return Err(ApiError::ObjectNotFound {
                        kind: "policy assignment",
                        name: slot.0,
                    });
                }
            }
            ChangeOp::Replace => {
                self.assignments.insert(slot, change.assignment);
            }
        }
        Ok(Body::Ack)
    }

    /// Applies a path mutation; returns the changed destination when the
    /// global table (the watchable one) was touched.
    fn mod_path(
        &mut self,
        vrf: &str,
        request: Option<Payload>,
    ) -> Result<Option<Destination>, ApiError> {
        let change = match request {
            Some(Payload::PathChange(change)) => change,
            other => return Err(request_contract("PathChange", &other)),
        };
        if vrf.is_empty() {
            let destination = self.rib.apply(change.path)?;
            return Ok(Some(destination));
        }
        let table = self
            .vrfs
            .get_mut(vrf)
            .ok_or_else(|| ApiError::VrfNotFound(vrf.to_string()))?;
        table.rib.apply(change.path)?;
        Ok(None)
    }

    fn vrf_rib(&self, name: &str, family: Option<Family>) -> Result<Vec<Body>, ApiError> {
        let table = self
            .vrfs
            .get(name)
            .ok_or_else(|| ApiError::VrfNotFound(name.to_string()))?;
        Ok(wrap_destinations(table.rib.destinations(family)))
    }

    fn dump(
        &mut self,
        table: &str,
        request: Option<Payload>,
        best_only: bool,
    ) -> Result<Vec<Body>, ApiError> {
        let options = match request {
            Some(Payload::Dump(options)) => options,
            None => DumpOptions::default(),
            other => return Err(request_contract("Dump", &other)),
        };
        let destinations = if best_only {
            self.rib.best_only(None)
        } else {
            self.rib.destinations(None)
        };
        self.dump_seq += 1;
        let seq = self.dump_seq;
        Ok(destinations
            .chunks(DUMP_CHUNK)
            .map(|chunk| {
                Body::TableDump(TableDump {
                    table: table.to_string(),
                    seq,
                    interval: options.interval,
                    entries: chunk.to_vec(),
                })
            })
            .collect())
    }

    // --- Neighbor lifecycle ---

    async fn reset_neighbor(&mut self, address: &str, responder: Responder<Bgp>) {
        let Some(neighbor) = self.neighbors.get_mut(address) else {
            answer(
                responder,
                Err(ApiError::NeighborNotFound(address.to_string())),
            )
            .await;
            return;
        };
        neighbor.session_state = SessionState::Idle;
        let down = neighbor.clone();
        let back_up = if neighbor.admin_state == AdminState::Up {
            neighbor.session_state = SessionState::Established;
            Some(neighbor.clone())
        } else {
            None
        };

        answer(responder, Ok(Body::Ack)).await;
        let origin = address.to_string();
        self.broadcast(WatchKind::PeerState, &origin, Body::Neighbor(down))
            .await;
        if let Some(neighbor) = back_up {
            self.broadcast(WatchKind::PeerState, &origin, Body::Neighbor(neighbor))
                .await;
        }
    }

    async fn set_neighbor_state(
        &mut self,
        address: &str,
        admin: AdminState,
        session: SessionState,
        responder: Responder<Bgp>,
    ) {
        let Some(neighbor) = self.neighbors.get_mut(address) else {
            answer(
                responder,
                Err(ApiError::NeighborNotFound(address.to_string())),
            )
            .await;
            return;
        };
        neighbor.admin_state = admin;
        neighbor.session_state = session;
        let event = neighbor.clone();
        info!(neighbor = %address, state = ?session, "session transition");

        answer(responder, Ok(Body::Ack)).await;
        self.broadcast(WatchKind::PeerState, address, Body::Neighbor(event))
            .await;
    }

    // --- Watcher fan-out ---

    /// Sends one event to every matching watcher. A watcher whose consumer
    /// hung up or went away is dropped on the spot; the send itself can
    /// never wedge the daemon because it races the end-signal.
    async fn broadcast(&mut self, kind: WatchKind, origin: &str, event: Body) {
        let mut kept = Vec::with_capacity(self.watchers.len());
        for mut watcher in self.watchers.drain(..) {
            if watcher.kind != kind || (!watcher.key.is_empty() && watcher.key != origin) {
                kept.push(watcher);
                continue;
            }
            if watcher.responder.data(event.clone()).await.is_ok() {
                kept.push(watcher);
            } else {
                debug!(?kind, "watcher gone, dropping subscription");
            }
        }
        self.watchers = kept;
    }
}

// --- Reply helpers ---

async fn answer(responder: Responder<Bgp>, reply: Result<Body, ApiError>) {
    match reply {
        Ok(body) => {
            let mut responder = responder;
            let _ = responder.data(body).await;
        }
        Err(err) => {
            warn!(error = %err, "request failed");
            responder.fail(err).await;
        }
    }
}

async fn send_all(mut responder: Responder<Bgp>, items: Vec<Body>) {
    for item in items {
        if responder.data(item).await.is_err() {
            return;
        }
    }
}

async fn reply_stream(responder: Responder<Bgp>, result: Result<Vec<Body>, ApiError>) {
    match result {
        Ok(items) => send_all(responder, items).await,
        Err(err) => {
            warn!(error = %err, "stream request failed");
            responder.fail(err).await;
        }
    }
}

fn wrap_destinations(destinations: Vec<Destination>) -> Vec<Body> {
    destinations.into_iter().map(Body::Destination).collect()
}

fn fetch<T: Clone>(
    store: &BTreeMap<String, T>,
    kind: &'static str,
    name: &str,
) -> Result<T, ApiError> {
    store.get(name).cloned().ok_or_else(|| ApiError::ObjectNotFound {
        kind,
        name: name.to_string(),
    })
}

fn apply_change<T>(
    store: &mut BTreeMap<String, T>,
    kind: &'static str,
    name: String,
    op: ChangeOp,
    value: T,
) -> Result<Body, ApiError> {
    match op {
        ChangeOp::Add => {
            if store.contains_key(&name) {
                return Err(ApiError::DuplicateObject { kind, name });
            }
            store.insert(name, value);
        }
        ChangeOp::Remove => {
            if store.remove(&name).is_none() {
                return Err(ApiError::ObjectNotFound { kind, name });
            }
        }
        ChangeOp::Replace => {
            store.insert(name, value);
        }
    }
    Ok(Body::Ack)
}

fn request_contract(expected: &'static str, got: &Option<Payload>) -> ApiError {
    ApiError::PayloadContract {
        expected,
        got: got.as_ref().map_or("None", Payload::tag),
    }
}
