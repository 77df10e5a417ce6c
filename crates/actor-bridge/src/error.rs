//! # Bridge Errors
//!
//! Failures of the bridge itself, kept distinct from domain errors so that a
//! caller can always tell "the actor rejected this" apart from "the bridge is
//! broken". Domain errors travel inside replies and pass through unmodified.

/// Errors raised by the bridge machinery rather than by the actor.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// The shared queue to the actor is gone. Submission failure is fatal and
    /// surfaced to the caller immediately; no retries happen at this layer.
    #[error("dispatcher is closed")]
    DispatcherClosed,

    /// The actor dropped the reply channel for a unary request without
    /// answering.
    #[error("actor dropped the reply channel without answering")]
    ReplyDropped,
}

/// Returned to the actor when a reply send was aborted because the consumer
/// hung up or dropped its handle. Terminal for that request: the actor must
/// stop producing replies for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("consumer stopped accepting replies")]
pub struct Interrupted;

/// Outcome of one call through an adapter: either the bridge failed, or the
/// operation itself did (a domain error reported by the actor, or a sink
/// failure – both terminal for the request).
#[derive(Debug, thiserror::Error)]
pub enum CallError<E: std::error::Error> {
    #[error(transparent)]
    Bridge(#[from] BridgeError),
    #[error(transparent)]
    Op(E),
}
