//! # Request Envelopes
//!
//! One envelope is one in-flight request. It carries the operation tag, a
//! correlation key, an optional filter, the operation-specific payload, and
//! the actor-side halves of the two private channels that correlate this
//! request's replies: the reply channel and the one-shot end-signal channel.
//! The consumer keeps the other halves as a [`ReplyStream`].
//!
//! # Lifecycle
//! An envelope is created from a [`Call`], submitted to the dispatcher, owned
//! by the actor while in flight, and terminates in exactly one of four ways:
//! a single reply consumed (unary), the reply channel observed closed without
//! error (stream complete), an error reply consumed, or a consumer-triggered
//! hang-up. Envelopes are single-use; nothing is pooled or reused.
//!
//! # The send/cancel race
//! The single subtlest requirement of the whole bridge lives in
//! [`Responder::data`]: the actor must never block indefinitely trying to
//! send a reply to a consumer that has already stopped reading. Every send is
//! therefore raced against the end-signal and against the consumer dropping
//! its handle; either outcome aborts the send with [`Interrupted`].

use tokio::sync::mpsc;

use crate::error::Interrupted;
use crate::proto::Protocol;

/// Reply channel capacity for unary calls: exactly one reply may ever arrive.
pub const UNARY_WINDOW: usize = 1;

/// Reply channel capacity for streaming calls. Bounded to cap memory while
/// smoothing producer/consumer speed mismatch; the actor suspends when the
/// window is full.
pub const STREAM_WINDOW: usize = 8;

/// One message on a request's reply channel. An `Err` is always terminal:
/// no further reply for that request may be read afterwards.
pub type Reply<P> = Result<<P as Protocol>::Data, <P as Protocol>::Error>;

/// Builder for one request: the caller-visible fields of an [`Envelope`]
/// before its channels are opened.
#[derive(Debug)]
pub struct Call<P: Protocol> {
    pub op: P::Op,
    pub key: String,
    pub filter: Option<P::Filter>,
    pub request: Option<P::Request>,
}

impl<P: Protocol> Call<P> {
    pub fn new(op: P::Op) -> Self {
        Self {
            op,
            key: String::new(),
            filter: None,
            request: None,
        }
    }

    /// Sets the correlation key (e.g. a neighbor address or table name).
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn filter(mut self, filter: P::Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn payload(mut self, request: P::Request) -> Self {
        self.request = Some(request);
        self
    }

    /// Opens the private channel pair and splits the call into the envelope
    /// handed to the actor and the reply stream kept by the consumer.
    ///
    /// `window` is the reply channel capacity ([`UNARY_WINDOW`] or
    /// [`STREAM_WINDOW`]); the end-signal channel always has capacity 1,
    /// which is what makes [`ReplyStream::hang_up`] idempotent.
    pub fn open(self, window: usize) -> (Envelope<P>, ReplyStream<P>) {
        let (replies_tx, replies_rx) = mpsc::channel(window);
        let (end_tx, end_rx) = mpsc::channel(1);
        let envelope = Envelope {
            op: self.op,
            key: self.key,
            filter: self.filter,
            request: self.request,
            responder: Responder {
                replies: replies_tx,
                end: end_rx,
            },
        };
        let stream = ReplyStream {
            replies: replies_rx,
            end: end_tx,
        };
        (envelope, stream)
    }
}

/// One in-flight request as the actor sees it. Immutable after construction;
/// the responder is the only state shared with the consumer.
#[derive(Debug)]
pub struct Envelope<P: Protocol> {
    pub op: P::Op,
    pub key: String,
    pub filter: Option<P::Filter>,
    pub request: Option<P::Request>,
    pub responder: Responder<P>,
}

/// Actor-side reply handle for one request.
#[derive(Debug)]
pub struct Responder<P: Protocol> {
    replies: mpsc::Sender<Reply<P>>,
    end: mpsc::Receiver<()>,
}

impl<P: Protocol> Responder<P> {
    /// Sends one data reply, racing the send against the consumer's
    /// end-signal and against the consumer dropping its handle.
    ///
    /// Returns [`Interrupted`] if the consumer is gone or has hung up; the
    /// actor must then stop producing replies for this request.
    pub async fn data(&mut self, item: P::Data) -> Result<(), Interrupted> {
        tokio::select! {
            biased;
            _ = self.end.recv() => Err(Interrupted),
            sent = self.replies.send(Ok(item)) => sent.map_err(|_| Interrupted),
        }
    }

    /// Terminates the request with a domain error. Consuming `self` is what
    /// makes an error reply terminal: nothing can be sent afterwards.
    pub async fn fail(mut self, err: P::Error) {
        tokio::select! {
            biased;
            _ = self.end.recv() => {}
            _ = self.replies.send(Err(err)) => {}
        }
    }
}

/// Consumer-side handle for one request: the reply receiver plus the
/// end-signal sender.
#[derive(Debug)]
pub struct ReplyStream<P: Protocol> {
    replies: mpsc::Receiver<Reply<P>>,
    end: mpsc::Sender<()>,
}

impl<P: Protocol> ReplyStream<P> {
    /// Receives the next reply; `None` once the actor has closed the channel.
    pub async fn recv(&mut self) -> Option<Reply<P>> {
        self.replies.recv().await
    }

    /// Best-effort cancellation signal to the actor. Non-blocking and
    /// idempotent: the end channel has capacity 1, so a second signal attempt
    /// is simply dropped.
    pub fn hang_up(&self) {
        let _ = self.end.try_send(());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("toy error")]
    struct ToyError;

    enum Toy {}

    impl Protocol for Toy {
        type Op = u8;
        type Filter = ();
        type Request = ();
        type Data = u32;
        type Error = ToyError;
    }

    #[tokio::test]
    async fn hang_up_signals_exactly_once() {
        let (envelope, stream) = Call::<Toy>::new(1).open(STREAM_WINDOW);
        let mut responder = envelope.responder;

        // Repeated hang-ups collapse into a single signal.
        stream.hang_up();
        stream.hang_up();
        stream.hang_up();

        assert_eq!(responder.end.recv().await, Some(()));
        assert!(responder.end.try_recv().is_err());
    }

    #[tokio::test]
    async fn send_is_interrupted_after_hang_up() {
        let (envelope, stream) = Call::<Toy>::new(1).open(UNARY_WINDOW);
        let mut responder = envelope.responder;

        // Fill the window, then cancel: the next send must not block.
        responder.data(7).await.unwrap();
        stream.hang_up();
        assert_eq!(responder.data(8).await, Err(Interrupted));
    }

    #[tokio::test]
    async fn send_is_interrupted_when_consumer_drops() {
        let (envelope, stream) = Call::<Toy>::new(1).open(UNARY_WINDOW);
        let mut responder = envelope.responder;

        drop(stream);
        assert_eq!(responder.data(7).await, Err(Interrupted));
    }

    #[tokio::test]
    async fn error_reply_is_terminal() {
        let (envelope, mut stream) = Call::<Toy>::new(1).open(UNARY_WINDOW);

        envelope.responder.fail(ToyError).await;
        assert!(matches!(stream.recv().await, Some(Err(ToyError))));
        // The responder was consumed, so the channel is now closed.
        assert!(stream.recv().await.is_none());
    }
}
