//! # Dispatcher
//!
//! The dispatcher is the caller-side handle over the single shared queue to
//! the actor. It is constructed once together with the actor's [`Inbox`] and
//! passed to every caller by value (constructor injection) – never held in
//! process-wide state.
//!
//! # Architecture Note
//! Requests are delivered in FIFO submission order. The queue is bounded to
//! absorb bursts, not to provide real backpressure: a full queue briefly
//! suspends the submitting caller, and there is no reject-with-overload
//! policy at this layer. The actor, not the dispatcher, decides how much work
//! to do per request before yielding to the next.

use tokio::sync::mpsc;
use tracing::warn;

use crate::envelope::Envelope;
use crate::error::BridgeError;
use crate::proto::Protocol;

/// The receiving half of the shared queue, consumed exclusively by the actor.
pub type Inbox<P> = mpsc::Receiver<Envelope<P>>;

/// Clone-able submission handle over the shared request queue.
pub struct Dispatcher<P: Protocol> {
    queue: mpsc::Sender<Envelope<P>>,
}

impl<P: Protocol> Clone for Dispatcher<P> {
    fn clone(&self) -> Self {
        Self {
            queue: self.queue.clone(),
        }
    }
}

impl<P: Protocol> Dispatcher<P> {
    /// Creates the shared queue, returning the dispatcher and the inbox the
    /// actor must consume. `depth` bounds how many submitted envelopes may be
    /// waiting for the actor at once.
    pub fn channel(depth: usize) -> (Self, Inbox<P>) {
        let (queue, inbox) = mpsc::channel(depth);
        (Self { queue }, inbox)
    }

    /// Enqueues one envelope for the actor, suspending only while the queue
    /// is momentarily full. Submission failure means the actor is gone; that
    /// is fatal and surfaced immediately, with no retry.
    pub async fn submit(&self, envelope: Envelope<P>) -> Result<(), BridgeError> {
        let op = envelope.op;
        self.queue.send(envelope).await.map_err(|_| {
            warn!(op = ?op, "submission failed, actor inbox is closed");
            BridgeError::DispatcherClosed
        })
    }
}
