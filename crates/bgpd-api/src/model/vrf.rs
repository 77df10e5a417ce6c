use serde::{Deserialize, Serialize};

/// A named virtual routing table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vrf {
    pub name: String,
    /// Route distinguisher, e.g. `"64512:100"`.
    pub rd: String,
    pub import_rt: Vec<String>,
    pub export_rt: Vec<String>,
}

impl Vrf {
    pub fn new(name: impl Into<String>, rd: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rd: rd.into(),
            import_rt: Vec::new(),
            export_rt: Vec::new(),
        }
    }
}
