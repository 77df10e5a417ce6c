//! # System Lifecycle & Orchestration
//!
//! Wires the bridge together: one dispatcher/inbox pair, one daemon task,
//! one service façade. The dispatcher is created here and injected into the
//! façade – no channel ever lives in process-wide state.
//!
//! ## Graceful Shutdown
//!
//! 1. Drop the service (and with it every dispatcher clone) – the inbox
//!    closes.
//! 2. The daemon drains remaining envelopes and exits its loop.
//! 3. Dropping the daemon's watcher list closes every live subscription,
//!    so monitoring consumers complete cleanly.
//! 4. `shutdown()` awaits the daemon task.

use tokio::task::JoinHandle;
use tracing::warn;

use actor_bridge::Dispatcher;

use crate::daemon::Daemon;
use crate::service::ApiService;

/// Depth of the shared request queue. Sized to absorb bursts from many
/// concurrent callers, not to provide backpressure semantics.
pub const QUEUE_DEPTH: usize = 64;

/// A running daemon plus the service façade bound to it.
pub struct ApiSystem {
    pub service: ApiService,
    daemon: JoinHandle<()>,
}

impl ApiSystem {
    /// Starts a system around a fresh, empty daemon.
    pub fn start() -> Self {
        Self::start_with(|daemon| daemon)
    }

    /// Starts a system, letting the caller season the daemon (e.g. seed the
    /// RPKI cache) before it is spawned.
    pub fn start_with(seed: impl FnOnce(Daemon) -> Daemon) -> Self {
        let (dispatcher, inbox) = Dispatcher::channel(QUEUE_DEPTH);
        let daemon = seed(Daemon::new(inbox));
        Self {
            service: ApiService::new(dispatcher),
            daemon: tokio::spawn(daemon.run()),
        }
    }

    /// Closes the request queue and waits for the daemon to drain and exit.
    pub async fn shutdown(self) {
        drop(self.service);
        if let Err(error) = self.daemon.await {
            warn!(%error, "daemon task did not exit cleanly");
        }
    }
}
