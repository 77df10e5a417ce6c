//! # API Service Façade
//!
//! One method per supported operation, grouped by call shape. The façade
//! owns nothing but an injected [`Dispatcher`]; it validates scope selectors
//! before submission, builds envelopes, and decodes reply payloads into the
//! shapes its callers expect. A transport layer (gRPC, CLI, tests) sits on
//! top of these methods and never touches the bridge directly.

use async_trait::async_trait;
use tokio_stream::{Stream, StreamExt};
use tracing::{debug, instrument};

use actor_bridge::{Call, CallError, Dispatcher, ItemSink};

use crate::error::ApiError;
use crate::model::{
    DefinedSet, DefinedSetKind, Destination, DumpOptions, Family, GlobalConfig, Neighbor, Path,
    Policy, PolicyAssignment, PolicyDirection, RpkiServer, Roa, Statement, TableDump, Vrf,
};
use crate::op::{self, Op, Scope, SoftResetDirection};
use crate::payload::{
    Bgp, Body, DefinedSetChange, NeighborChange, PathChange, Payload, PolicyAssignmentChange,
    PolicyChange, StatementChange, VrfChange,
};

/// Typed destination for a server-streamed read. The façade decodes each
/// reply before delivery, so implementors only ever see the item type they
/// asked for.
#[async_trait]
pub trait Deliver<T>: Send {
    async fn deliver(&mut self, item: T) -> Result<(), ApiError>;
}

/// Channel senders work as sinks out of the box; a closed receiver reports
/// as a sink failure and cancels the stream.
#[async_trait]
impl<T: Send + 'static> Deliver<T> for tokio::sync::mpsc::Sender<T> {
    async fn deliver(&mut self, item: T) -> Result<(), ApiError> {
        self.send(item).await.map_err(|_| ApiError::SinkClosed)
    }
}

/// Bridge-facing adapter: decodes each reply body, then forwards the typed
/// item. A decode failure is a contract violation and aborts the stream.
struct DecodeSink<'a, T, S: ?Sized> {
    decode: fn(Body) -> Result<T, ApiError>,
    out: &'a mut S,
}

#[async_trait]
impl<'a, T, S> ItemSink<Bgp> for DecodeSink<'a, T, S>
where
    T: Send + 'static,
    S: Deliver<T> + ?Sized,
{
    async fn accept(&mut self, item: Body) -> Result<(), ApiError> {
        let item = (self.decode)(item)?;
        self.out.deliver(item).await
    }
}

/// One item of a client-streamed path mutation.
#[derive(Debug, Clone)]
pub struct PathUpdate {
    pub scope: Scope,
    /// Target VRF name; ignored unless `scope` is [`Scope::Vrf`].
    pub vrf: String,
    pub path: Path,
}

/// The call façade over the daemon. Cheap to clone; every clone shares the
/// same dispatcher queue.
#[derive(Clone)]
pub struct ApiService {
    dispatcher: Dispatcher<Bgp>,
}

impl ApiService {
    pub fn new(dispatcher: Dispatcher<Bgp>) -> Self {
        Self { dispatcher }
    }

    async fn fetch(&self, call: Call<Bgp>) -> Result<Body, ApiError> {
        self.dispatcher.unary(call).await.map_err(ApiError::from)
    }

    async fn ack(&self, call: Call<Bgp>) -> Result<(), ApiError> {
        self.fetch(call).await?.into_ack()
    }

    async fn drain<T, S>(
        &self,
        call: Call<Bgp>,
        decode: fn(Body) -> Result<T, ApiError>,
        out: &mut S,
    ) -> Result<(), ApiError>
    where
        T: Send + 'static,
        S: Deliver<T> + ?Sized,
    {
        let mut sink = DecodeSink { decode, out };
        self.dispatcher
            .stream(call, &mut sink)
            .await
            .map_err(ApiError::from)
    }

    // --- Global configuration ---

    #[instrument(skip(self))]
    pub async fn global_config(&self) -> Result<GlobalConfig, ApiError> {
        self.fetch(Call::new(Op::GlobalConfig)).await?.into_global()
    }

    #[instrument(skip(self, config))]
    pub async fn apply_global_config(&self, config: GlobalConfig) -> Result<(), ApiError> {
        self.ack(Call::new(Op::ModGlobalConfig).payload(Payload::Global(config)))
            .await
    }

    // --- Neighbors ---

    #[instrument(skip(self))]
    pub async fn neighbor(&self, address: &str) -> Result<Neighbor, ApiError> {
        self.fetch(Call::new(Op::Neighbor).key(address))
            .await?
            .into_neighbor()
    }

    #[instrument(skip(self, change))]
    pub async fn apply_neighbor(&self, change: NeighborChange) -> Result<(), ApiError> {
        self.ack(Call::new(Op::ModNeighbor).payload(Payload::NeighborChange(change)))
            .await
    }

    async fn neighbor_control(&self, op: Op, address: &str) -> Result<(), ApiError> {
        debug!(?op, address, "neighbor control");
        self.ack(Call::new(op).key(address)).await
    }

    #[instrument(skip(self))]
    pub async fn reset_neighbor(&self, address: &str) -> Result<(), ApiError> {
        self.neighbor_control(Op::NeighborReset, address).await
    }

    #[instrument(skip(self))]
    pub async fn soft_reset_neighbor(
        &self,
        address: &str,
        direction: SoftResetDirection,
    ) -> Result<(), ApiError> {
        self.neighbor_control(Op::for_soft_reset(direction), address)
            .await
    }

    #[instrument(skip(self))]
    pub async fn shutdown_neighbor(&self, address: &str) -> Result<(), ApiError> {
        self.neighbor_control(Op::NeighborShutdown, address).await
    }

    #[instrument(skip(self))]
    pub async fn enable_neighbor(&self, address: &str) -> Result<(), ApiError> {
        self.neighbor_control(Op::NeighborEnable, address).await
    }

    #[instrument(skip(self))]
    pub async fn disable_neighbor(&self, address: &str) -> Result<(), ApiError> {
        self.neighbor_control(Op::NeighborDisable, address).await
    }

    // --- VRFs ---

    #[instrument(skip(self, change))]
    pub async fn apply_vrf(&self, change: VrfChange) -> Result<(), ApiError> {
        self.ack(Call::new(Op::ModVrf).payload(Payload::VrfChange(change)))
            .await
    }

    // --- Policy objects ---

    #[instrument(skip(self))]
    pub async fn defined_set(
        &self,
        kind: DefinedSetKind,
        name: &str,
    ) -> Result<DefinedSet, ApiError> {
        self.fetch(
            Call::new(Op::DefinedSet)
                .key(name)
                .payload(Payload::DefinedSetQuery(kind)),
        )
        .await?
        .into_defined_set()
    }

    #[instrument(skip(self, change))]
    pub async fn apply_defined_set(&self, change: DefinedSetChange) -> Result<(), ApiError> {
        self.ack(Call::new(Op::ModDefinedSet).payload(Payload::DefinedSetChange(change)))
            .await
    }

    #[instrument(skip(self))]
    pub async fn statement(&self, name: &str) -> Result<Statement, ApiError> {
        self.fetch(Call::new(Op::Statement).key(name))
            .await?
            .into_statement()
    }

    #[instrument(skip(self, change))]
    pub async fn apply_statement(&self, change: StatementChange) -> Result<(), ApiError> {
        self.ack(Call::new(Op::ModStatement).payload(Payload::StatementChange(change)))
            .await
    }

    #[instrument(skip(self))]
    pub async fn policy(&self, name: &str) -> Result<Policy, ApiError> {
        self.fetch(Call::new(Op::Policy).key(name))
            .await?
            .into_policy()
    }

    #[instrument(skip(self, change))]
    pub async fn apply_policy(&self, change: PolicyChange) -> Result<(), ApiError> {
        self.ack(Call::new(Op::ModPolicy).payload(Payload::PolicyChange(change)))
            .await
    }

    #[instrument(skip(self))]
    pub async fn policy_assignment(
        &self,
        name: &str,
        direction: PolicyDirection,
    ) -> Result<PolicyAssignment, ApiError> {
        self.fetch(
            Call::new(Op::PolicyAssignment)
                .key(name)
                .payload(Payload::AssignmentQuery(direction)),
        )
        .await?
        .into_policy_assignment()
    }

    #[instrument(skip(self, change))]
    pub async fn apply_policy_assignment(
        &self,
        change: PolicyAssignmentChange,
    ) -> Result<(), ApiError> {
        self.ack(Call::new(Op::ModPolicyAssignment).payload(Payload::PolicyAssignmentChange(change)))
            .await
    }

    // --- Server-streamed reads ---

    #[instrument(skip(self, out))]
    pub async fn neighbors<S>(&self, out: &mut S) -> Result<(), ApiError>
    where
        S: Deliver<Neighbor> + ?Sized,
    {
        self.drain(Call::new(Op::NeighborList), Body::into_neighbor, out)
            .await
    }

    /// Streams one table. `name` selects the neighbor (adjacency scopes) or
    /// the VRF (virtual-table scope) and is ignored otherwise.
    #[instrument(skip(self, out))]
    pub async fn table<S>(
        &self,
        scope: Scope,
        name: &str,
        family: Family,
        out: &mut S,
    ) -> Result<(), ApiError>
    where
        S: Deliver<Destination> + ?Sized,
    {
        let op = Op::for_table_read(scope)?;
        self.drain(
            Call::new(op).key(name).filter(family),
            Body::into_destination,
            out,
        )
        .await
    }

    #[instrument(skip(self, out))]
    pub async fn dump_table<S>(
        &self,
        scope: Scope,
        options: DumpOptions,
        out: &mut S,
    ) -> Result<(), ApiError>
    where
        S: Deliver<TableDump> + ?Sized,
    {
        let op = Op::for_dump(scope)?;
        self.drain(
            Call::new(op).payload(Payload::Dump(options)),
            Body::into_table_dump,
            out,
        )
        .await
    }

    #[instrument(skip(self, out))]
    pub async fn rpki_servers<S>(&self, out: &mut S) -> Result<(), ApiError>
    where
        S: Deliver<RpkiServer> + ?Sized,
    {
        self.drain(Call::new(Op::Rpki), Body::into_rpki_server, out)
            .await
    }

    #[instrument(skip(self, out))]
    pub async fn roas<S>(&self, family: Family, out: &mut S) -> Result<(), ApiError>
    where
        S: Deliver<Roa> + ?Sized,
    {
        self.drain(Call::new(Op::Roa).filter(family), Body::into_roa, out)
            .await
    }

    #[instrument(skip(self, out))]
    pub async fn vrfs<S>(&self, out: &mut S) -> Result<(), ApiError>
    where
        S: Deliver<Vrf> + ?Sized,
    {
        self.drain(Call::new(Op::VrfList), Body::into_vrf, out).await
    }

    #[instrument(skip(self, out))]
    pub async fn defined_sets<S>(&self, out: &mut S) -> Result<(), ApiError>
    where
        S: Deliver<DefinedSet> + ?Sized,
    {
        self.drain(Call::new(Op::DefinedSetList), Body::into_defined_set, out)
            .await
    }

    #[instrument(skip(self, out))]
    pub async fn statements<S>(&self, out: &mut S) -> Result<(), ApiError>
    where
        S: Deliver<Statement> + ?Sized,
    {
        self.drain(Call::new(Op::StatementList), Body::into_statement, out)
            .await
    }

    #[instrument(skip(self, out))]
    pub async fn policies<S>(&self, out: &mut S) -> Result<(), ApiError>
    where
        S: Deliver<Policy> + ?Sized,
    {
        self.drain(Call::new(Op::PolicyList), Body::into_policy, out)
            .await
    }

    // --- Event subscriptions ---
    //
    // Subscriptions consume their service handle: they can outlive every
    // other caller, and holding a queue sender for that long would keep the
    // daemon's inbox open forever and wedge drop-based shutdown. Clone the
    // service before subscribing if it is still needed.

    /// Watches best-path changes until the sink fails or the daemon shuts
    /// down. Only the global table is watchable.
    #[instrument(skip(self, out))]
    pub async fn watch_best_paths<S>(self, scope: Scope, out: &mut S) -> Result<(), ApiError>
    where
        S: Deliver<Destination> + ?Sized,
    {
        let op = Op::for_monitor(scope)?;
        let mut sink = DecodeSink {
            decode: Body::into_destination,
            out,
        };
        self.dispatcher
            .subscribe(Call::new(op), &mut sink)
            .await
            .map_err(ApiError::from)
    }

    /// Watches peer session-state transitions. An empty `address` watches
    /// every neighbor.
    #[instrument(skip(self, out))]
    pub async fn watch_peer_states<S>(self, address: &str, out: &mut S) -> Result<(), ApiError>
    where
        S: Deliver<Neighbor> + ?Sized,
    {
        let mut sink = DecodeSink {
            decode: Body::into_neighbor,
            out,
        };
        self.dispatcher
            .subscribe(Call::new(Op::MonitorPeerState).key(address), &mut sink)
            .await
            .map_err(ApiError::from)
    }

    // --- Client-streamed mutation ---

    /// Applies an incremental sequence of path announcements/withdrawals.
    ///
    /// Each update's target scope is validated before anything is submitted;
    /// an unsupported scope aborts the call without contacting the daemon.
    /// Every accepted update is acknowledged by the daemon before the next
    /// one is taken from the source. `Ok(())` is the single terminal success
    /// acknowledgment; the first failing update aborts the whole call with
    /// that update's error, and previously applied updates stay applied.
    #[instrument(skip(self, updates))]
    pub async fn apply_paths<St>(&self, updates: St) -> Result<(), ApiError>
    where
        St: Stream<Item = PathUpdate> + Send + Unpin,
    {
        let calls = updates.map(|update| {
            if !op::path_target_supported(update.scope) {
                return Err(CallError::Op(ApiError::UnsupportedScope {
                    scope: update.scope,
                    call: "path mutation",
                }));
            }
            let key = match update.scope {
                Scope::Vrf => update.vrf,
                _ => String::new(),
            };
            Ok(Call::new(Op::ModPath)
                .key(key)
                .filter(update.path.family)
                .payload(Payload::PathChange(PathChange { path: update.path })))
        });
        self.dispatcher.mutate(calls).await.map_err(ApiError::from)
    }
}
