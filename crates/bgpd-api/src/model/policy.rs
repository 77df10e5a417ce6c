use serde::{Deserialize, Serialize};

/// What a defined set matches against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DefinedSetKind {
    Prefix,
    Neighbor,
    AsPath,
    Community,
    ExtCommunity,
}

/// A reusable named match list referenced by statements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefinedSet {
    pub kind: DefinedSetKind,
    pub name: String,
    pub members: Vec<String>,
}

/// Disposition a statement applies to matching routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RouteAction {
    Accept,
    Reject,
}

/// One match/action rule. Conditions reference defined sets by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    pub name: String,
    pub prefix_set: Option<String>,
    pub neighbor_set: Option<String>,
    pub action: RouteAction,
}

/// An ordered collection of statements, referenced by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    pub name: String,
    pub statements: Vec<String>,
}

/// Where a policy assignment applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PolicyDirection {
    Import,
    Export,
}

/// Policies attached to a direction of the routing pipeline, plus the
/// disposition for routes no policy matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyAssignment {
    pub name: String,
    pub direction: PolicyDirection,
    pub policies: Vec<String>,
    pub default_action: RouteAction,
}
