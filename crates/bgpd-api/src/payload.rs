//! # Payload Unions
//!
//! The discriminated payload types that travel inside envelopes and replies.
//! The daemon decodes [`Payload`] against the operation tag; callers decode
//! [`Body`] with the typed `into_*` accessors. A variant mismatch on either
//! side is a contract violation between the façade and the daemon and is
//! reported as [`ApiError::PayloadContract`] – explicit and testable, never
//! a panicking cast.

use serde::{Deserialize, Serialize};

use actor_bridge::Protocol;

use crate::error::ApiError;
use crate::model::{
    DefinedSet, DefinedSetKind, Destination, DumpOptions, Family, GlobalConfig, Neighbor, Path,
    Policy, PolicyAssignment, PolicyDirection, Roa, RpkiServer, Statement, TableDump, Vrf,
};
use crate::op::Op;

/// How a change request treats the named object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeOp {
    Add,
    Remove,
    Replace,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeighborChange {
    pub op: ChangeOp,
    pub neighbor: Neighbor,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VrfChange {
    pub op: ChangeOp,
    pub vrf: Vrf,
}

/// One path announcement or withdrawal; the withdraw flag lives on the path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathChange {
    pub path: Path,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefinedSetChange {
    pub op: ChangeOp,
    pub set: DefinedSet,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementChange {
    pub op: ChangeOp,
    pub statement: Statement,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyChange {
    pub op: ChangeOp,
    pub policy: Policy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyAssignmentChange {
    pub op: ChangeOp,
    pub assignment: PolicyAssignment,
}

/// Request payload union. Opaque to the bridge; the daemon decodes it
/// against the operation tag.
#[derive(Debug, Clone)]
pub enum Payload {
    Global(GlobalConfig),
    NeighborChange(NeighborChange),
    VrfChange(VrfChange),
    PathChange(PathChange),
    DefinedSetQuery(DefinedSetKind),
    DefinedSetChange(DefinedSetChange),
    StatementChange(StatementChange),
    PolicyChange(PolicyChange),
    AssignmentQuery(PolicyDirection),
    PolicyAssignmentChange(PolicyAssignmentChange),
    Dump(DumpOptions),
}

impl Payload {
    /// Variant name, used in contract-violation reports.
    pub fn tag(&self) -> &'static str {
        match self {
            Payload::Global(_) => "Global",
            Payload::NeighborChange(_) => "NeighborChange",
            Payload::VrfChange(_) => "VrfChange",
            Payload::PathChange(_) => "PathChange",
            Payload::DefinedSetQuery(_) => "DefinedSetQuery",
            Payload::DefinedSetChange(_) => "DefinedSetChange",
            Payload::StatementChange(_) => "StatementChange",
            Payload::PolicyChange(_) => "PolicyChange",
            Payload::AssignmentQuery(_) => "AssignmentQuery",
            Payload::PolicyAssignmentChange(_) => "PolicyAssignmentChange",
            Payload::Dump(_) => "Dump",
        }
    }
}

/// Reply payload union. Every successful reply carries one of these; the
/// operation tag promises which variant.
#[derive(Debug, Clone)]
pub enum Body {
    /// Bare acknowledgment for mutations.
    Ack,
    Global(GlobalConfig),
    Neighbor(Neighbor),
    Destination(Destination),
    Vrf(Vrf),
    RpkiServer(RpkiServer),
    Roa(Roa),
    TableDump(TableDump),
    DefinedSet(DefinedSet),
    Statement(Statement),
    Policy(Policy),
    PolicyAssignment(PolicyAssignment),
}

macro_rules! body_accessors {
    ($($variant:ident => $ty:ty),+ $(,)?) => {
        paste::paste! {
            impl Body {
                /// Variant name, used in contract-violation reports.
                pub fn tag(&self) -> &'static str {
                    match self {
                        Body::Ack => "Ack",
                        $(Body::$variant(_) => stringify!($variant),)+
                    }
                }

                /// Decodes an acknowledgment reply.
                pub fn into_ack(self) -> Result<(), ApiError> {
                    match self {
                        Body::Ack => Ok(()),
                        other => Err(ApiError::PayloadContract {
                            expected: "Ack",
                            got: other.tag(),
                        }),
                    }
                }

                $(
                    #[doc = concat!("Decodes this reply as [`", stringify!($ty), "`].")]
                    pub fn [<into_ $variant:snake>](self) -> Result<$ty, ApiError> {
                        match self {
                            Body::$variant(value) => Ok(value),
                            other => Err(ApiError::PayloadContract {
                                expected: stringify!($variant),
                                got: other.tag(),
                            }),
                        }
                    }
                )+
            }
        }
    };
}

body_accessors! {
    Global => GlobalConfig,
    Neighbor => Neighbor,
    Destination => Destination,
    Vrf => Vrf,
    RpkiServer => RpkiServer,
    Roa => Roa,
    TableDump => TableDump,
    DefinedSet => DefinedSet,
    Statement => Statement,
    Policy => Policy,
    PolicyAssignment => PolicyAssignment,
}

/// Protocol marker tying the catalog, payloads and error type together.
pub enum Bgp {}

impl Protocol for Bgp {
    type Op = Op;
    type Filter = Family;
    type Request = Payload;
    type Data = Body;
    type Error = ApiError;
}
