//! Broker connection lifecycle
//!
//! [`ConnectionManager`] is the single owner of the session with the broker.
//! Every operation calls [`ConnectionManager::ensure_connected`] first; while a
//! connect attempt is in flight all callers await the same attempt, so the
//! transport never sees two concurrent connects.

use crate::error::{BridgeError, BridgeResult, TransportError};
use crate::transport::{BrokerTransport, TransportEvent};
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use kasir_cert::TrustProvider;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
        };
        f.write_str(s)
    }
}

type PendingConnect = Shared<BoxFuture<'static, BridgeResult<()>>>;

/// Cloneable handle to the process-wide broker connection
#[derive(Clone)]
pub struct ConnectionManager {
    core: Arc<Core>,
}

struct Core {
    transport: Arc<dyn BrokerTransport>,
    trust: Option<Arc<dyn TrustProvider>>,
    trust_installed: AtomicBool,
    connect_timeout: Option<Duration>,
    inner: Mutex<Inner>,
    state_tx: watch::Sender<ConnectionState>,
}

#[derive(Default)]
struct Inner {
    state: ConnectionState,
    pending: Option<PendingConnect>,
    /// Bumped on every attempt and disconnect; outcomes from older
    /// generations are discarded
    generation: u64,
    watcher: Option<CancellationToken>,
}

impl ConnectionManager {
    pub fn new(
        transport: Arc<dyn BrokerTransport>,
        trust: Option<Arc<dyn TrustProvider>>,
        connect_timeout: Option<Duration>,
    ) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            core: Arc::new(Core {
                transport,
                trust,
                trust_installed: AtomicBool::new(false),
                connect_timeout,
                inner: Mutex::new(Inner::default()),
                state_tx,
            }),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.core.lock().state
    }

    /// Watch state transitions (for status indicators)
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.core.state_tx.subscribe()
    }

    pub(crate) fn transport(&self) -> &Arc<dyn BrokerTransport> {
        &self.core.transport
    }

    /// Make sure a broker session is open
    ///
    /// Returns immediately when connected. Joins the in-flight attempt when
    /// one exists, otherwise starts a new one.
    pub async fn ensure_connected(&self) -> BridgeResult<()> {
        let attempt = {
            let mut inner = self.core.lock();
            let state = inner.state;
            match state {
                ConnectionState::Connected if self.core.transport.is_active() => return Ok(()),
                ConnectionState::Connecting => match inner.pending.clone() {
                    Some(pending) => {
                        debug!("joining in-flight connect attempt");
                        pending
                    }
                    None => self.core.clone().begin_attempt(&mut inner),
                },
                _ => self.core.clone().begin_attempt(&mut inner),
            }
        };
        attempt.await
    }

    /// Close the session; a no-op unless connected
    pub async fn disconnect(&self) -> BridgeResult<()> {
        let generation = {
            let mut inner = self.core.lock();
            if inner.state != ConnectionState::Connected {
                debug!(state = %inner.state, "disconnect ignored");
                return Ok(());
            }
            inner.generation += 1;
            if let Some(token) = inner.watcher.take() {
                token.cancel();
            }
            inner.generation
        };

        let result = self.core.transport.disconnect().await;

        {
            let mut inner = self.core.lock();
            // A connect that started while the transport was closing owns the state now
            if inner.generation == generation {
                inner.pending = None;
                self.core.set_state(&mut inner, ConnectionState::Disconnected);
                info!("disconnected from print broker");
            } else {
                debug!("disconnect superseded by a newer connect attempt");
            }
        }
        result.map_err(BridgeError::Transport)
    }
}

impl Core {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, inner: &mut Inner, state: ConnectionState) {
        if inner.state != state {
            debug!(from = %inner.state, to = %state, "connection state");
            inner.state = state;
            self.state_tx.send_replace(state);
        }
    }

    /// Register a new attempt; caller holds the lock
    fn begin_attempt(self: Arc<Self>, inner: &mut Inner) -> PendingConnect {
        inner.generation += 1;
        if let Some(token) = inner.watcher.take() {
            token.cancel();
        }
        self.set_state(inner, ConnectionState::Connecting);

        let generation = inner.generation;
        let attempt = self.run_attempt(generation).boxed().shared();
        inner.pending = Some(attempt.clone());
        attempt
    }

    fn install_trust(&self) {
        if let Some(trust) = &self.trust
            && !self.trust_installed.swap(true, Ordering::SeqCst)
        {
            self.transport.install_trust(trust.clone());
            info!(target: "security", "trust provider installed");
        }
    }

    async fn run_attempt(self: Arc<Self>, generation: u64) -> BridgeResult<()> {
        self.install_trust();
        // Subscribe before connecting so a close right after connect is seen
        let events = self.transport.subscribe();

        let outcome = match self.connect_bounded().await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(TransportError::SessionExists(reason))) => {
                warn!(target: "security", %reason, "broker session already exists, reusing it");
                Ok(())
            }
            Ok(Err(e)) => Err(BridgeError::from(e)),
            Err(limit_ms) => Err(BridgeError::Timeout(limit_ms)),
        };

        self.finish(generation, &outcome, events);
        outcome
    }

    /// Transport connect, bounded by the connect timeout when one is set
    async fn connect_bounded(&self) -> Result<Result<(), TransportError>, u64> {
        let Some(limit) = self.connect_timeout else {
            return Ok(self.transport.connect().await);
        };
        match tokio::time::timeout(limit, self.transport.connect()).await {
            Ok(outcome) => Ok(outcome),
            Err(_) => {
                // Drop whatever half-open session the attempt left behind
                let _ = self.transport.disconnect().await;
                Err(limit.as_millis() as u64)
            }
        }
    }

    fn finish(
        self: &Arc<Self>,
        generation: u64,
        outcome: &BridgeResult<()>,
        events: broadcast::Receiver<TransportEvent>,
    ) {
        let mut inner = self.lock();
        if inner.generation != generation {
            debug!(generation, "stale connect outcome discarded");
            return;
        }
        inner.pending = None;

        match outcome {
            Ok(()) => {
                let token = CancellationToken::new();
                inner.watcher = Some(token.clone());
                self.set_state(&mut inner, ConnectionState::Connected);
                tokio::spawn(self.clone().watch_transport(generation, token, events));
                info!("connected to print broker");
            }
            Err(e) => {
                self.set_state(&mut inner, ConnectionState::Disconnected);
                warn!(error = %e, "connect to print broker failed");
            }
        }
    }

    /// Resets state when the transport reports the session gone
    ///
    /// Events that arrive while the transport still has a live session belong
    /// to an earlier session and are skipped.
    async fn watch_transport(
        self: Arc<Self>,
        generation: u64,
        token: CancellationToken,
        mut events: broadcast::Receiver<TransportEvent>,
    ) {
        let event = loop {
            let event = tokio::select! {
                _ = token.cancelled() => return,
                event = next_lifecycle_event(&mut events) => event,
            };
            if !self.transport.is_active() {
                break event;
            }
            debug!(?event, "lifecycle event for a superseded session ignored");
        };

        let mut inner = self.lock();
        if inner.generation != generation || inner.state != ConnectionState::Connected {
            return;
        }
        match &event {
            TransportEvent::Closed => warn!("print broker connection closed"),
            TransportEvent::Error(message) => warn!(%message, "print broker connection error"),
        }
        inner.pending = None;
        inner.watcher = None;
        self.set_state(&mut inner, ConnectionState::Disconnected);
    }
}

async fn next_lifecycle_event(events: &mut broadcast::Receiver<TransportEvent>) -> TransportEvent {
    loop {
        match events.recv().await {
            Ok(event) => return event,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                debug!(skipped, "transport events lagged");
            }
            Err(broadcast::error::RecvError::Closed) => return TransportEvent::Closed,
        }
    }
}
