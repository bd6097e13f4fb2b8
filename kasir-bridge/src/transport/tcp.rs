use super::protocol::{self, BrokerEvent, Frame, PrintPayload, SignParams, call};
use super::{BrokerTransport, TransportEvent};
use crate::error::TransportError;
use async_trait::async_trait;
use kasir_cert::TrustProvider;
use serde_json::{Value, json};
use shared::{PrintJob, PrinterId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

type Reply = Result<Value, TransportError>;
type SharedTrust = Arc<RwLock<Option<Arc<dyn TrustProvider>>>>;

/// Broker transport over a local TCP socket
///
/// One session at a time. Each session owns a reader task that routes
/// responses to waiting requests and answers the broker's trust requests.
pub struct TcpBrokerTransport {
    addr: String,
    request_timeout: Duration,
    trust: SharedTrust,
    events: broadcast::Sender<TransportEvent>,
    session: Mutex<Option<Session>>,
}

struct Session {
    link: Arc<Link>,
    reader: JoinHandle<()>,
}

/// Per-session state shared with the reader task
struct Link {
    writer: tokio::sync::Mutex<OwnedWriteHalf>,
    active: AtomicBool,
    pending: Mutex<HashMap<Uuid, oneshot::Sender<Reply>>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Link {
    fn new(writer: OwnedWriteHalf) -> Self {
        Self {
            writer: tokio::sync::Mutex::new(writer),
            active: AtomicBool::new(false),
            pending: Mutex::new(HashMap::new()),
        }
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    async fn send(&self, frame: &Frame) -> Result<(), TransportError> {
        let mut writer = self.writer.lock().await;
        protocol::write_frame(&mut *writer, frame).await
    }

    async fn request(&self, method: &str, params: Value, limit: Duration) -> Reply {
        let uid = Uuid::new_v4();
        let (tx, rx) = oneshot::channel();
        lock(&self.pending).insert(uid, tx);

        let frame = Frame::Request {
            uid,
            call: method.to_string(),
            params,
        };
        if let Err(e) = self.send(&frame).await {
            lock(&self.pending).remove(&uid);
            return Err(e);
        }

        match tokio::time::timeout(limit, rx).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(_)) => Err(TransportError::Closed),
            Err(_) => {
                lock(&self.pending).remove(&uid);
                Err(TransportError::Timeout(format!(
                    "{} after {} ms",
                    method,
                    limit.as_millis()
                )))
            }
        }
    }

    fn resolve(&self, uid: Uuid, reply: Reply) {
        match lock(&self.pending).remove(&uid) {
            Some(tx) => {
                let _ = tx.send(reply);
            }
            None => debug!(%uid, "response for unknown request"),
        }
    }

    fn fail_pending(&self, err: TransportError) {
        let waiters: Vec<_> = lock(&self.pending).drain().collect();
        for (_, tx) in waiters {
            let _ = tx.send(Err(err.clone()));
        }
    }
}

impl TcpBrokerTransport {
    pub fn new(addr: impl Into<String>, request_timeout: Duration) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            addr: addr.into(),
            request_timeout,
            trust: Arc::new(RwLock::new(None)),
            events,
            session: Mutex::new(None),
        }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    fn active_link(&self) -> Result<Arc<Link>, TransportError> {
        match lock(&self.session).as_ref() {
            Some(session) if session.link.is_active() => Ok(session.link.clone()),
            _ => Err(TransportError::NotConnected),
        }
    }

    async fn call(&self, method: &str, params: Value) -> Reply {
        let link = self.active_link()?;
        link.request(method, params, self.request_timeout).await
    }

    /// Drop the current session without notifying subscribers
    fn teardown(&self) -> Option<Arc<Link>> {
        let session = lock(&self.session).take()?;
        session.reader.abort();
        session.link.active.store(false, Ordering::SeqCst);
        session.link.fail_pending(TransportError::Closed);
        Some(session.link)
    }
}

#[async_trait]
impl BrokerTransport for TcpBrokerTransport {
    fn is_active(&self) -> bool {
        self.active_link().is_ok()
    }

    fn install_trust(&self, trust: Arc<dyn TrustProvider>) {
        *self.trust.write().unwrap_or_else(PoisonError::into_inner) = Some(trust);
    }

    fn subscribe(&self) -> broadcast::Receiver<TransportEvent> {
        self.events.subscribe()
    }

    #[instrument(skip(self), fields(addr = %self.addr))]
    async fn connect(&self) -> Result<(), TransportError> {
        if self.is_active() {
            return Err(TransportError::SessionExists(format!(
                "an open connection with {} already exists",
                self.addr
            )));
        }
        // Stale handshake left behind by an abandoned attempt
        self.teardown();

        let stream = TcpStream::connect(&self.addr).await.map_err(|e| {
            TransportError::Unreachable(format!(
                "unable to establish connection to {}: {}",
                self.addr, e
            ))
        })?;
        stream.set_nodelay(true)?;

        let (reader, writer) = stream.into_split();
        let link = Arc::new(Link::new(writer));
        let reader = tokio::spawn(read_loop(
            reader,
            link.clone(),
            self.trust.clone(),
            self.events.clone(),
        ));
        *lock(&self.session) = Some(Session {
            link: link.clone(),
            reader,
        });

        let params = json!({
            "client": "kasir-bridge",
            "version": env!("CARGO_PKG_VERSION"),
        });
        match link
            .request(call::SESSION_START, params, self.request_timeout)
            .await
        {
            Ok(_) => {
                link.active.store(true, Ordering::SeqCst);
                info!("broker session started");
                Ok(())
            }
            Err(e @ TransportError::SessionExists(_)) => {
                link.active.store(true, Ordering::SeqCst);
                Err(e)
            }
            Err(e) => {
                self.teardown();
                Err(e)
            }
        }
    }

    #[instrument(skip(self), fields(addr = %self.addr))]
    async fn disconnect(&self) -> Result<(), TransportError> {
        let was_active = self.is_active();
        let Some(link) = self.teardown() else {
            return Ok(());
        };

        if was_active {
            // Best effort: the broker also cleans up on EOF
            if let Err(e) = link
                .send(&Frame::request(call::SESSION_STOP, Value::Null))
                .await
            {
                debug!(error = %e, "session.stop not delivered");
            }
        }
        let _ = link.writer.lock().await.shutdown().await;

        let _ = self.events.send(TransportEvent::Closed);
        info!("broker session closed");
        Ok(())
    }

    async fn find_printers(&self) -> Result<Vec<PrinterId>, TransportError> {
        let result = self.call(call::PRINTERS_FIND, Value::Null).await?;
        serde_json::from_value(result).map_err(|e| TransportError::Protocol(e.to_string()))
    }

    async fn default_printer(&self) -> Result<Option<PrinterId>, TransportError> {
        let result = self.call(call::PRINTERS_DEFAULT, Value::Null).await?;
        serde_json::from_value(result).map_err(|e| TransportError::Protocol(e.to_string()))
    }

    #[instrument(skip(self, job), fields(printer = %job.printer, bytes = job.len()))]
    async fn print(&self, job: &PrintJob) -> Result<(), TransportError> {
        let params = serde_json::to_value(PrintPayload::from_job(job))
            .map_err(|e| TransportError::Protocol(e.to_string()))?;
        self.call(call::PRINT, params).await?;
        debug!("job accepted by broker");
        Ok(())
    }
}

async fn read_loop(
    mut reader: OwnedReadHalf,
    link: Arc<Link>,
    trust: SharedTrust,
    events: broadcast::Sender<TransportEvent>,
) {
    let reason = loop {
        match protocol::read_frame(&mut reader).await {
            Ok(Frame::Response { uid, result, error }) => {
                let reply = match error {
                    Some(message) => Err(TransportError::classify(message)),
                    None => Ok(result.unwrap_or(Value::Null)),
                };
                link.resolve(uid, reply);
            }
            Ok(Frame::Request { uid, call, params }) => {
                let provider = trust
                    .read()
                    .unwrap_or_else(PoisonError::into_inner)
                    .clone();
                if let Err(e) = answer(&link, provider, uid, &call, params).await {
                    break e;
                }
            }
            Ok(Frame::Event {
                event: BrokerEvent::Closed,
                ..
            }) => break TransportError::Closed,
            Ok(Frame::Event {
                event: BrokerEvent::Error,
                message,
            }) => {
                let message = message.unwrap_or_else(|| "unspecified broker error".into());
                let _ = events.send(TransportEvent::Error(message.clone()));
                break TransportError::Broker(message);
            }
            Err(e) => break e,
        }
    };

    link.active.store(false, Ordering::SeqCst);
    debug!(reason = %reason, "broker session ended");
    link.fail_pending(reason);
    let _ = events.send(TransportEvent::Closed);
}

/// Answer a broker -> client trust request
async fn answer(
    link: &Link,
    trust: Option<Arc<dyn TrustProvider>>,
    uid: Uuid,
    method: &str,
    params: Value,
) -> Result<(), TransportError> {
    let Some(trust) = trust else {
        warn!(target: "security", method, "trust request without an installed provider");
        return link.send(&Frame::err(uid, "no trust provider installed")).await;
    };

    let reply = match method {
        call::CERTIFICATE => Frame::ok(uid, Value::String(trust.certificate().await)),
        call::SIGN => match serde_json::from_value::<SignParams>(params) {
            Ok(SignParams { challenge }) => match trust.sign(&challenge).await {
                Ok(signature) => {
                    info!(target: "security", "broker challenge signed");
                    Frame::ok(uid, Value::String(signature))
                }
                Err(e) => {
                    // Abort whatever is waiting on the handshake
                    link.fail_pending(TransportError::Signing(e.to_string()));
                    Frame::err(uid, format!("signing failed: {}", e))
                }
            },
            Err(e) => Frame::err(uid, format!("invalid sign params: {}", e)),
        },
        other => {
            warn!(method = other, "unsupported broker request");
            Frame::err(uid, format!("unsupported call: {}", other))
        }
    };
    link.send(&reply).await
}
