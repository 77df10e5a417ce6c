use serde::{Deserialize, Serialize};

use crate::model::route::Family;

/// State of one connected RPKI cache server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpkiServer {
    pub address: String,
    pub port: u16,
    pub serial: u32,
    pub received_ipv4: u64,
    pub received_ipv6: u64,
}

/// One Route Origin Authorization entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roa {
    pub family: Family,
    pub prefix: String,
    pub max_prefix_len: u8,
    pub asn: u32,
}
