//! # Call Adapters
//!
//! The three call shapes, implemented as methods on [`Dispatcher`]:
//!
//! - [`Dispatcher::unary`] – one envelope, exactly one reply read.
//! - [`Dispatcher::stream`] – one envelope, replies forwarded to a sink until
//!   the channel closes, an error arrives, or the sink fails.
//!   [`Dispatcher::subscribe`] is the same shape for open-ended event
//!   subscriptions; it gives up its queue sender right after submission.
//! - [`Dispatcher::mutate`] – one unary-style envelope per source item, each
//!   acknowledged before the next is accepted; the first failure aborts the
//!   whole call.
//!
//! No adapter retries anything: every failure surfaces synchronously to the
//! caller at the point it occurs.

use async_trait::async_trait;
use tokio_stream::{Stream, StreamExt};
use tracing::debug;

use crate::dispatch::Dispatcher;
use crate::envelope::{Call, ReplyStream, STREAM_WINDOW, UNARY_WINDOW};
use crate::error::{BridgeError, CallError};
use crate::proto::Protocol;

/// Destination for streamed reply items. Accepts items one at a time and
/// reports failure as the protocol's error type; a sink failure cancels the
/// stream exactly like a domain error would.
#[async_trait]
pub trait ItemSink<P: Protocol>: Send {
    async fn accept(&mut self, item: P::Data) -> Result<(), P::Error>;
}

impl<P: Protocol> Dispatcher<P> {
    /// Submits a unary call and blocks for its single reply.
    ///
    /// A domain error reply is returned to the caller unchanged. A reply
    /// channel that closes without any reply indicates the actor dropped the
    /// request, which is a bridge fault, not a domain condition.
    pub async fn unary(&self, call: Call<P>) -> Result<P::Data, CallError<P::Error>> {
        let (envelope, mut replies) = call.open(UNARY_WINDOW);
        self.submit(envelope).await?;

        match replies.recv().await {
            Some(Ok(data)) => Ok(data),
            Some(Err(err)) => {
                debug!(error = %err, "unary call failed");
                Err(CallError::Op(err))
            }
            None => Err(CallError::Bridge(BridgeError::ReplyDropped)),
        }
    }

    /// Submits a streaming call and forwards every data reply to `sink` until
    /// the actor closes the reply channel.
    ///
    /// An error reply stops reading immediately, hangs up on the actor and is
    /// returned to the caller; a sink failure does the same with the sink's
    /// error. Channel closure without an error is success, even with zero
    /// items delivered. Items forwarded before a failure stay delivered.
    pub async fn stream<S>(&self, call: Call<P>, sink: &mut S) -> Result<(), CallError<P::Error>>
    where
        S: ItemSink<P> + ?Sized,
    {
        let (envelope, mut replies) = call.open(STREAM_WINDOW);
        self.submit(envelope).await?;
        drain_replies(&mut replies, sink).await
    }

    /// Like [`Dispatcher::stream`], but consumes this handle and releases it
    /// as soon as the envelope is submitted.
    ///
    /// An event subscription can outlive every other caller; if it kept its
    /// queue sender for its whole lifetime, the actor's inbox could never
    /// close and drop-based shutdown would deadlock against the subscriber.
    pub async fn subscribe<S>(self, call: Call<P>, sink: &mut S) -> Result<(), CallError<P::Error>>
    where
        S: ItemSink<P> + ?Sized,
    {
        let (envelope, mut replies) = call.open(STREAM_WINDOW);
        self.submit(envelope).await?;
        drop(self);
        drain_replies(&mut replies, sink).await
    }

    /// Drives a client-streamed mutation: one unary-style envelope per source
    /// item, blocking for the per-item acknowledgment before accepting the
    /// next.
    ///
    /// An `Err` item from the source (e.g. a validation failure) aborts
    /// immediately without contacting the actor. The first failing item
    /// aborts the whole call with that item's error; items already
    /// acknowledged are not rolled back. Exhaustion with every item
    /// acknowledged returns `Ok(())` – the caller's single terminal success
    /// acknowledgment.
    pub async fn mutate<St>(&self, mut calls: St) -> Result<(), CallError<P::Error>>
    where
        St: Stream<Item = Result<Call<P>, CallError<P::Error>>> + Send + Unpin,
    {
        while let Some(next) = calls.next().await {
            self.unary(next?).await?;
        }
        Ok(())
    }
}

async fn drain_replies<P, S>(
    replies: &mut ReplyStream<P>,
    sink: &mut S,
) -> Result<(), CallError<P::Error>>
where
    P: Protocol,
    S: ItemSink<P> + ?Sized,
{
    while let Some(reply) = replies.recv().await {
        let item = match reply {
            Ok(item) => item,
            Err(err) => {
                debug!(error = %err, "stream terminated by actor");
                replies.hang_up();
                return Err(CallError::Op(err));
            }
        };
        if let Err(err) = sink.accept(item).await {
            debug!(error = %err, "sink rejected item, hanging up");
            replies.hang_up();
            return Err(CallError::Op(err));
        }
    }
    Ok(())
}
