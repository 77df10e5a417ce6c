//! # Scripted Actor
//!
//! A test double for the real actor: it consumes a real dispatcher queue and
//! answers each envelope from a per-operation script, so adapter and façade
//! logic can be tested without spawning the production actor.
//!
//! The companion [`ActorLog`] records every operation tag the actor observed
//! and every send it had to abandon because the consumer cancelled, which is
//! exactly what tests need to assert "the actor saw zero activity for that
//! call" or "cancellation reached the actor once".
//!
//! Like most mocking layers, this one panics on an envelope it has no script
//! for – an unscripted operation in a test is a test bug, not a runtime
//! condition.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::dispatch::Dispatcher;
use crate::proto::Protocol;

/// How the scripted actor answers one envelope for a given operation.
pub enum Script<P: Protocol> {
    /// Send these data replies, then close the channel (zero items is a
    /// valid, successfully-empty stream – or a dropped unary reply).
    Reply(Vec<P::Data>),
    /// Terminate immediately with a domain error.
    Fail(P::Error),
    /// Send some data replies, then terminate with a domain error.
    ReplyThenFail(Vec<P::Data>, P::Error),
    /// Produce items indefinitely from the generator until the consumer
    /// cancels or goes away; models an event subscription.
    Feed(Box<dyn FnMut(u64) -> P::Data + Send>),
}

/// Observations recorded by a running [`ScriptedActor`].
pub struct ActorLog<P: Protocol> {
    seen: Arc<Mutex<Vec<P::Op>>>,
    cancellations: Arc<AtomicUsize>,
}

impl<P: Protocol> Clone for ActorLog<P> {
    fn clone(&self) -> Self {
        Self {
            seen: Arc::clone(&self.seen),
            cancellations: Arc::clone(&self.cancellations),
        }
    }
}

impl<P: Protocol> ActorLog<P> {
    /// Operation tags observed so far, in arrival order.
    pub fn ops(&self) -> Vec<P::Op> {
        self.seen.lock().expect("actor log poisoned").clone()
    }

    /// Number of reply sends the actor abandoned because the consumer hung
    /// up or dropped its handle.
    pub fn cancellations(&self) -> usize {
        self.cancellations.load(Ordering::SeqCst)
    }
}

/// Builder for the scripted actor. Scripts queue up per operation tag and
/// are consumed one per envelope, in arrival order.
pub struct ScriptedActor<P: Protocol> {
    scripts: HashMap<P::Op, VecDeque<Script<P>>>,
    depth: usize,
}

impl<P: Protocol> Default for ScriptedActor<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Protocol> ScriptedActor<P> {
    pub fn new() -> Self {
        Self {
            scripts: HashMap::new(),
            depth: 16,
        }
    }

    /// Queues one script for `op`. Repeated calls for the same tag answer
    /// successive envelopes in order.
    pub fn on(mut self, op: P::Op, script: Script<P>) -> Self {
        self.scripts.entry(op).or_default().push_back(script);
        self
    }

    /// Spawns the actor task and returns the dispatcher callers should use
    /// plus the observation log.
    pub fn spawn(mut self) -> (Dispatcher<P>, ActorLog<P>) {
        let (dispatcher, mut inbox) = Dispatcher::channel(self.depth);
        let log = ActorLog {
            seen: Arc::new(Mutex::new(Vec::new())),
            cancellations: Arc::new(AtomicUsize::new(0)),
        };
        let observed = log.clone();

        tokio::spawn(async move {
            while let Some(envelope) = inbox.recv().await {
                log.seen
                    .lock()
                    .expect("actor log poisoned")
                    .push(envelope.op);
                let script = self
                    .scripts
                    .get_mut(&envelope.op)
                    .and_then(|queue| queue.pop_front())
                    .unwrap_or_else(|| panic!("no script for operation {:?}", envelope.op));

                let mut responder = envelope.responder;
                match script {
                    Script::Reply(items) => {
                        for item in items {
                            if responder.data(item).await.is_err() {
                                log.cancellations.fetch_add(1, Ordering::SeqCst);
                                break;
                            }
                        }
                    }
                    Script::Fail(err) => responder.fail(err).await,
                    Script::ReplyThenFail(items, err) => {
                        let mut interrupted = false;
                        for item in items {
                            if responder.data(item).await.is_err() {
                                log.cancellations.fetch_add(1, Ordering::SeqCst);
                                interrupted = true;
                                break;
                            }
                        }
                        if !interrupted {
                            responder.fail(err).await;
                        }
                    }
                    Script::Feed(mut produce) => {
                        let mut seq = 0u64;
                        loop {
                            seq += 1;
                            if responder.data(produce(seq)).await.is_err() {
                                log.cancellations.fetch_add(1, Ordering::SeqCst);
                                break;
                            }
                        }
                    }
                }
            }
        });

        (dispatcher, observed)
    }
}
