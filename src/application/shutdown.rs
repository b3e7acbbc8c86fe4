//! One-shot shutdown signal, active subsystem accounting and teardown.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::port::outbound::{ChainStore, PeerNetwork, RequestServer};

/// Process-wide single-fire broadcast. Never reset once fired.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownSignal {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Fire the signal. Returns `true` only for the call that fired it.
    pub fn fire(&self) -> bool {
        let mut first = false;
        self.tx.send_if_modified(|fired| {
            if *fired {
                return false;
            }
            *fired = true;
            first = true;
            true
        });
        first
    }

    #[must_use]
    pub fn is_fired(&self) -> bool {
        *self.tx.borrow()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    /// Resolve once the signal has fired.
    pub async fn wait(&self) {
        let mut rx = self.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|fired| *fired).await;
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Counts background subsystems that must finish before the process exits.
#[derive(Debug, Clone, Default)]
pub struct SubsystemCounter {
    active: Arc<AtomicUsize>,
}

impl SubsystemCounter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a running subsystem; it counts until the guard drops.
    #[must_use]
    pub fn enter(&self) -> SubsystemGuard {
        self.active.fetch_add(1, Ordering::SeqCst);
        SubsystemGuard {
            active: Arc::clone(&self.active),
        }
    }

    #[must_use]
    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Spawn a task that counts as active until it completes.
    pub fn spawn<F>(&self, name: &'static str, task: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let guard = self.enter();
        tokio::spawn(async move {
            let _guard = guard;
            task.await;
            debug!(subsystem = name, "Subsystem finished");
        })
    }
}

/// Decrements the owning [`SubsystemCounter`] on drop.
#[derive(Debug)]
pub struct SubsystemGuard {
    active: Arc<AtomicUsize>,
}

impl Drop for SubsystemGuard {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// How the final drain ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    Graceful,
    Forced { remaining: usize },
}

/// Wait for every subsystem to finish, giving up after `timeout`.
pub async fn drain(counter: &SubsystemCounter, timeout: Duration, poll: Duration) -> DrainOutcome {
    let deadline = Instant::now() + timeout;
    loop {
        let active = counter.active();
        if active == 0 {
            info!("All subsystems stopped, exiting gracefully");
            return DrainOutcome::Graceful;
        }

        let now = Instant::now();
        if now >= deadline {
            warn!(
                remaining = active,
                timeout_secs = timeout.as_secs(),
                "Drain timeout elapsed, forcing exit"
            );
            return DrainOutcome::Forced { remaining: active };
        }

        info!(active_subsystems = active, "Exit in progress, please wait");
        tokio::time::sleep(poll.min(deadline - now)).await;
    }
}

/// Stop request servers, then networking, then storage. Failures are
/// logged and skipped.
pub fn stop_collaborators(
    servers: &[Arc<dyn RequestServer>],
    network: &dyn PeerNetwork,
    chain: &dyn ChainStore,
) {
    for server in servers {
        match server.stop() {
            Ok(()) => info!(server = server.name(), "Request server stopped"),
            Err(e) => warn!(server = server.name(), error = %e, "Failed to stop request server"),
        }
    }
    match network.shutdown() {
        Ok(()) => info!("Networking stopped"),
        Err(e) => warn!(error = %e, "Failed to stop networking"),
    }
    match chain.shutdown() {
        Ok(()) => info!("Chain stopped"),
        Err(e) => warn!(error = %e, "Failed to stop chain"),
    }
}

/// Turns interrupts into the shutdown signal and sequences teardown.
#[derive(Debug, Clone)]
pub struct ShutdownCoordinator {
    signal: ShutdownSignal,
    subsystems: SubsystemCounter,
    drain_timeout: Duration,
    poll_interval: Duration,
}

impl ShutdownCoordinator {
    #[must_use]
    pub fn new(signal: ShutdownSignal, subsystems: SubsystemCounter, drain_timeout: Duration) -> Self {
        Self {
            signal,
            subsystems,
            drain_timeout,
            poll_interval: Duration::from_secs(1),
        }
    }

    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    #[must_use]
    pub const fn signal(&self) -> &ShutdownSignal {
        &self.signal
    }

    /// Listen for interrupts for the rest of the process lifetime. The first
    /// one fires the signal; later ones are ignored.
    pub fn listen_for_interrupt(&self) -> JoinHandle<()> {
        let signal = self.signal.clone();
        tokio::spawn(async move {
            loop {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    warn!(error = %e, "Failed to listen for interrupt");
                    return;
                }
                if signal.fire() {
                    info!("Interrupt received, shutting down");
                } else {
                    debug!("Interrupt ignored, shutdown already in progress");
                }
            }
        })
    }

    /// Stop collaborators in order and wait for background work.
    pub async fn finish(
        &self,
        servers: &[Arc<dyn RequestServer>],
        network: &dyn PeerNetwork,
        chain: &dyn ChainStore,
    ) -> DrainOutcome {
        info!("Exit in progress, please wait");
        stop_collaborators(servers, network, chain);
        drain(&self.subsystems, self.drain_timeout, self.poll_interval).await
    }
}
