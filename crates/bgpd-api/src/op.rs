//! # Operation Catalog & Scope Routing
//!
//! The closed set of operations the daemon understands, plus the static
//! tables that route a caller-supplied scope selector to a concrete
//! operation tag. Routing is pure and synchronous: an unsupported selector
//! is rejected here, before any envelope is built, and the daemon never
//! observes the call.

use crate::error::ApiError;

/// Enumerated tag selecting one daemon operation. Immutable once chosen;
/// drives both validation and daemon routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    GlobalConfig,
    ModGlobalConfig,
    Neighbor,
    NeighborList,
    ModNeighbor,
    NeighborReset,
    NeighborSoftReset,
    NeighborSoftResetIn,
    NeighborSoftResetOut,
    NeighborShutdown,
    NeighborEnable,
    NeighborDisable,
    GlobalRib,
    LocalRib,
    AdjRibIn,
    AdjRibOut,
    VrfRib,
    MonitorBestChanged,
    MonitorPeerState,
    DumpGlobalRib,
    DumpLocalRib,
    Rpki,
    Roa,
    VrfList,
    ModVrf,
    ModPath,
    DefinedSet,
    DefinedSetList,
    ModDefinedSet,
    Statement,
    StatementList,
    ModStatement,
    Policy,
    PolicyList,
    ModPolicy,
    PolicyAssignment,
    ModPolicyAssignment,
}

/// Caller-supplied selector choosing which table a read or mutation applies
/// to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// The full global table.
    Global,
    /// The post-policy local table.
    Local,
    /// Routes received from a neighbor, pre-policy.
    AdjIn,
    /// Routes advertised to a neighbor.
    AdjOut,
    /// A named virtual table.
    Vrf,
}

/// Direction selector for a neighbor soft reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoftResetDirection {
    Both,
    Inbound,
    Outbound,
}

const TABLE_READS: &[(Scope, Op)] = &[
    (Scope::Global, Op::GlobalRib),
    (Scope::Local, Op::LocalRib),
    (Scope::AdjIn, Op::AdjRibIn),
    (Scope::AdjOut, Op::AdjRibOut),
    (Scope::Vrf, Op::VrfRib),
];

const MONITOR_READS: &[(Scope, Op)] = &[(Scope::Global, Op::MonitorBestChanged)];

const TABLE_DUMPS: &[(Scope, Op)] = &[
    (Scope::Global, Op::DumpGlobalRib),
    (Scope::Local, Op::DumpLocalRib),
];

const SOFT_RESETS: &[(SoftResetDirection, Op)] = &[
    (SoftResetDirection::Both, Op::NeighborSoftReset),
    (SoftResetDirection::Inbound, Op::NeighborSoftResetIn),
    (SoftResetDirection::Outbound, Op::NeighborSoftResetOut),
];

/// Scopes a path mutation may target.
const PATH_TARGETS: &[Scope] = &[Scope::Global, Scope::Vrf];

fn route(table: &[(Scope, Op)], scope: Scope, call: &'static str) -> Result<Op, ApiError> {
    table
        .iter()
        .find(|(supported, _)| *supported == scope)
        .map(|(_, op)| *op)
        .ok_or(ApiError::UnsupportedScope { scope, call })
}

impl Op {
    /// Routes a table read to its operation tag. All five scopes are
    /// readable.
    pub fn for_table_read(scope: Scope) -> Result<Op, ApiError> {
        route(TABLE_READS, scope, "table read")
    }

    /// Routes a best-path monitor; only the global table is watchable.
    pub fn for_monitor(scope: Scope) -> Result<Op, ApiError> {
        route(MONITOR_READS, scope, "monitor")
    }

    /// Routes an archival table dump; adjacency views and virtual tables
    /// have no archival format.
    pub fn for_dump(scope: Scope) -> Result<Op, ApiError> {
        route(TABLE_DUMPS, scope, "table dump")
    }

    /// Routes a soft reset to its direction-specific tag. Total: every
    /// direction is supported.
    pub fn for_soft_reset(direction: SoftResetDirection) -> Op {
        SOFT_RESETS
            .iter()
            .find(|(supported, _)| *supported == direction)
            .map(|(_, op)| *op)
            .unwrap_or(Op::NeighborSoftReset)
    }
}

/// Whether a path mutation may target this scope.
pub fn path_target_supported(scope: Scope) -> bool {
    PATH_TARGETS.contains(&scope)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_scope_has_a_table_read() {
        for scope in [Scope::Global, Scope::Local, Scope::AdjIn, Scope::AdjOut, Scope::Vrf] {
            assert!(Op::for_table_read(scope).is_ok(), "{scope:?} not readable");
        }
    }

    #[test]
    fn only_the_global_table_is_watchable() {
        assert_eq!(Op::for_monitor(Scope::Global).unwrap(), Op::MonitorBestChanged);
        for scope in [Scope::Local, Scope::AdjIn, Scope::AdjOut, Scope::Vrf] {
            assert!(matches!(
                Op::for_monitor(scope),
                Err(ApiError::UnsupportedScope { .. })
            ));
        }
    }

    #[test]
    fn dumps_cover_global_and_local_only() {
        assert_eq!(Op::for_dump(Scope::Global).unwrap(), Op::DumpGlobalRib);
        assert_eq!(Op::for_dump(Scope::Local).unwrap(), Op::DumpLocalRib);
        for scope in [Scope::AdjIn, Scope::AdjOut, Scope::Vrf] {
            assert!(Op::for_dump(scope).is_err());
        }
    }

    #[test]
    fn soft_reset_directions_map_to_distinct_tags() {
        assert_eq!(
            Op::for_soft_reset(SoftResetDirection::Both),
            Op::NeighborSoftReset
        );
        assert_eq!(
            Op::for_soft_reset(SoftResetDirection::Inbound),
            Op::NeighborSoftResetIn
        );
        assert_eq!(
            Op::for_soft_reset(SoftResetDirection::Outbound),
            Op::NeighborSoftResetOut
        );
    }

    #[test]
    fn path_mutations_target_global_and_vrf_only() {
        assert!(path_target_supported(Scope::Global));
        assert!(path_target_supported(Scope::Vrf));
        assert!(!path_target_supported(Scope::Local));
        assert!(!path_target_supported(Scope::AdjIn));
        assert!(!path_target_supported(Scope::AdjOut));
    }
}
