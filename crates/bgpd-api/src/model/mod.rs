//! Domain records exchanged between the API surface and the daemon.
//!
//! These are plain data types: no behavior beyond small constructors and
//! queries. Everything that mutates them lives in the daemon, which owns the
//! authoritative copies.

pub mod global;
pub mod neighbor;
pub mod policy;
pub mod route;
pub mod rpki;
pub mod vrf;

pub use global::GlobalConfig;
pub use neighbor::{AdminState, Neighbor, SessionState};
pub use policy::{
    DefinedSet, DefinedSetKind, Policy, PolicyAssignment, PolicyDirection, RouteAction, Statement,
};
pub use route::{Destination, DumpOptions, Family, Path, TableDump};
pub use rpki::{Roa, RpkiServer};
pub use vrf::Vrf;
