//! # Actor Bridge
//!
//! This crate provides the request/response correlation and streaming-dispatch
//! bridge that lets many concurrent caller tasks invoke operations against a
//! single serialized state owner (the actor) without the actor needing any
//! locking.
//!
//! ## Why a bridge?
//!
//! One logical actor owns authoritative state and must process requests one at
//! a time, in submission order. Callers, however, arrive concurrently and come
//! in three shapes:
//!
//! - **Unary** – one request, exactly one reply.
//! - **Server-streamed** – one request, zero or more replies until the actor
//!   closes the channel (or forever, for event subscriptions).
//! - **Client-streamed** – many incremental inputs, one terminal
//!   acknowledgment.
//!
//! The bridge correlates replies structurally: every request carries its own
//! private reply channel and a one-shot end-signal channel, so no request
//! identifiers ever need to be matched. Requests flow one way into the actor
//! over a single bounded FIFO queue; replies flow one way back, never shared
//! across requests.
//!
//! ## Core Abstractions
//!
//! 1. [`Protocol`] – the contract a domain implements: operation tag, filter,
//!    request payload, reply payload and error types.
//! 2. [`Dispatcher`] – the clone-able caller-side handle over the shared
//!    queue, with the unary/streaming/mutation call adapters as methods.
//! 3. [`Envelope`] / [`Responder`] – the actor-side view of one request. The
//!    responder races every reply send against the consumer's end-signal, so
//!    the actor can never block unrecoverably on an abandoned stream.
//!
//! ## Concurrency Model
//!
//! - Many caller tasks submit concurrently; exactly one actor task consumes
//!   the queue, so the actor needs no locks.
//! - Submission order on the queue is FIFO; completion order across requests
//!   is unordered (a later unary call may finish before an earlier stream).
//! - Within one request, replies arrive in the order the actor produced them.
//! - Cancellation is cooperative and consumer-triggered only: a single
//!   best-effort signal on a capacity-1 channel, idempotent by construction.
//!
//! ## Example
//!
//! ```rust
//! use actor_bridge::{Call, Dispatcher, Protocol};
//!
//! #[derive(Debug, thiserror::Error)]
//! #[error("echo cannot fail")]
//! struct NoError;
//!
//! enum Echo {}
//!
//! impl Protocol for Echo {
//!     type Op = &'static str;
//!     type Filter = ();
//!     type Request = String;
//!     type Data = String;
//!     type Error = NoError;
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let (dispatcher, mut inbox) = Dispatcher::<Echo>::channel(8);
//!
//!     // The actor: single consumer, no locks.
//!     tokio::spawn(async move {
//!         while let Some(envelope) = inbox.recv().await {
//!             let mut responder = envelope.responder;
//!             let text = envelope.request.unwrap_or_default();
//!             let _ = responder.data(text).await;
//!         }
//!     });
//!
//!     let reply = dispatcher
//!         .unary(Call::new("echo").payload("hello".to_string()))
//!         .await
//!         .unwrap();
//!     assert_eq!(reply, "hello");
//! }
//! ```
//!
//! ## Testing
//!
//! The [`mock`] module provides a [`ScriptedActor`](mock::ScriptedActor) that
//! consumes a real queue and answers from per-operation scripts, so adapter
//! and façade logic can be tested without a real actor.

pub mod call;
pub mod dispatch;
pub mod envelope;
pub mod error;
pub mod mock;
pub mod proto;
pub mod tracing;

// Re-export core types for convenience
pub use call::ItemSink;
pub use dispatch::{Dispatcher, Inbox};
pub use envelope::{Call, Envelope, Reply, ReplyStream, Responder};
pub use envelope::{STREAM_WINDOW, UNARY_WINDOW};
pub use error::{BridgeError, CallError, Interrupted};
pub use proto::Protocol;
