use serde::{Deserialize, Serialize};

/// Daemon-wide configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalConfig {
    pub asn: u32,
    pub router_id: String,
    pub listen_port: u16,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            asn: 0,
            router_id: "0.0.0.0".to_string(),
            listen_port: 179,
        }
    }
}
