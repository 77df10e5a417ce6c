//! # API Errors
//!
//! One error type for the whole API surface, spanning the four failure
//! classes the bridge distinguishes: validation errors (rejected before
//! submission), domain errors (reported by the daemon), sink failures
//! (downstream delivery), and structural payload-contract violations.

use actor_bridge::{BridgeError, CallError};

use crate::op::Scope;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The caller-supplied scope selector is not supported for this call.
    /// Detected synchronously; the daemon never sees the request.
    #[error("unsupported scope {scope:?} for {call}")]
    UnsupportedScope { scope: Scope, call: &'static str },

    #[error("unknown neighbor {0:?}")]
    NeighborNotFound(String),

    #[error("unknown vrf {0:?}")]
    VrfNotFound(String),

    #[error("{kind} {name:?} not found")]
    ObjectNotFound { kind: &'static str, name: String },

    #[error("{kind} {name:?} already exists")]
    DuplicateObject { kind: &'static str, name: String },

    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// The downstream sink stopped accepting items. Triggers the same
    /// cancellation path as a domain error, though the daemon is not at
    /// fault.
    #[error("downstream sink closed")]
    SinkClosed,

    /// A reply payload did not match the shape the operation tag promises.
    /// This is a daemon/bridge contract violation, not a recoverable runtime
    /// condition; it is surfaced loudly instead of being swallowed.
    #[error("reply payload mismatch: expected {expected}, got {got}")]
    PayloadContract {
        expected: &'static str,
        got: &'static str,
    },

    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

impl From<CallError<ApiError>> for ApiError {
    fn from(err: CallError<ApiError>) -> Self {
        match err {
            CallError::Bridge(bridge) => ApiError::Bridge(bridge),
            CallError::Op(api) => api,
        }
    }
}
