use serde::{Deserialize, Serialize};

use crate::model::route::Family;

/// BGP finite-state-machine position of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Idle,
    Connect,
    Active,
    OpenSent,
    OpenConfirm,
    Established,
}

/// Operator-controlled availability, independent of the session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdminState {
    Up,
    Down,
}

/// One configured peer and its live session state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Neighbor {
    pub address: String,
    pub peer_asn: u32,
    pub local_asn: u32,
    pub session_state: SessionState,
    pub admin_state: AdminState,
    pub families: Vec<Family>,
}

impl Neighbor {
    /// Creates a neighbor in the initial idle, administratively-up state.
    pub fn new(address: impl Into<String>, peer_asn: u32, local_asn: u32) -> Self {
        Self {
            address: address.into(),
            peer_asn,
            local_asn,
            session_state: SessionState::Idle,
            admin_state: AdminState::Up,
            families: vec![Family::Ipv4Unicast],
        }
    }
}
