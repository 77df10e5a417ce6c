use serde::{Deserialize, Serialize};

/// Address family of a route, in AFI/SAFI terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Family {
    Ipv4Unicast,
    Ipv6Unicast,
    Ipv4Vpn,
    Ipv6Vpn,
    Evpn,
}

/// One path for a prefix, as learned from a peer or injected locally.
///
/// `source` is the address of the peer the path was learned from; `None`
/// marks a locally-injected path. `withdraw` marks the path as a withdrawal
/// when it travels inside a mutation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Path {
    pub family: Family,
    pub prefix: String,
    pub next_hop: String,
    pub as_path: Vec<u32>,
    pub source: Option<String>,
    pub withdraw: bool,
}

impl Path {
    /// Creates an announced (non-withdraw) path with an empty AS path.
    pub fn announce(family: Family, prefix: impl Into<String>, next_hop: impl Into<String>) -> Self {
        Self {
            family,
            prefix: prefix.into(),
            next_hop: next_hop.into(),
            as_path: Vec::new(),
            source: None,
            withdraw: false,
        }
    }

    /// Creates a withdrawal for a previously announced prefix.
    pub fn withdraw(family: Family, prefix: impl Into<String>) -> Self {
        Self {
            family,
            prefix: prefix.into(),
            next_hop: String::new(),
            as_path: Vec::new(),
            source: None,
            withdraw: true,
        }
    }
}

/// All known paths for one prefix. The first path is the current best.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    pub family: Family,
    pub prefix: String,
    pub paths: Vec<Path>,
}

impl Destination {
    pub fn best(&self) -> Option<&Path> {
        self.paths.first()
    }
}

/// Options for an archival table dump.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DumpOptions {
    /// Requested re-dump interval in seconds; 0 means a single snapshot.
    pub interval: u64,
}

/// One archival snapshot record. Large tables are emitted as a sequence of
/// chunked records sharing a dump sequence number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDump {
    pub table: String,
    pub seq: u64,
    pub interval: u64,
    pub entries: Vec<Destination>,
}
