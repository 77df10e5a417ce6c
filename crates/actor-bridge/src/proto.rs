//! # Protocol Contract
//!
//! The `Protocol` trait defines the contract a domain must implement to ride
//! the bridge. It only carries associated types; all bridge machinery
//! (envelopes, the dispatcher, the call adapters, the scripted mock) is
//! generic over it.
//!
//! # Architecture Note
//! By pinning the operation tag, payload and error types in one place, a
//! caller cannot submit a request whose payload belongs to a different
//! protocol, and the actor cannot answer with a reply type the consumer does
//! not expect. The compiler enforces the pairing end to end.

use std::fmt::Debug;
use std::hash::Hash;

/// Contract tying together the types that flow through one bridge instance.
///
/// A protocol is a marker type – typically an empty enum – and is never
/// instantiated.
pub trait Protocol: Send + Sync + 'static {
    /// Enumerated tag selecting which internal operation an envelope
    /// requests. Immutable once chosen; drives both validation and actor
    /// routing.
    type Op: Copy + Eq + Hash + Debug + Send + Sync + 'static;

    /// Auxiliary per-call filter, e.g. an address-family selector.
    type Filter: Debug + Send + 'static;

    /// Operation-specific request payload. Opaque to the bridge; the actor
    /// decodes it against the operation tag.
    type Request: Debug + Send + 'static;

    /// Data payload carried by a successful reply.
    type Data: Debug + Send + 'static;

    /// Domain error carried by a terminal reply.
    type Error: std::error::Error + Send + Sync + 'static;
}
