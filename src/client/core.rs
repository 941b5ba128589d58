//! The client session: correlation, the receive loop, and commands.
//!
//! One [`Client`] owns one connection. Any number of tasks may issue
//! commands concurrently; each command takes the next sequence id, parks a
//! one-shot result slot under that id, writes its frame, and waits. A single
//! receive loop — [`Client::run`] — owns the inbound side and resolves slots
//! (replies) or routes payloads to subscriptions (notifications).
//!
//! Replies are matched strictly by sequence id, not send order, so
//! concurrent commands may complete out of order.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use futures_util::StreamExt;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::Value;
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::path::Path;
use crate::protocol::command::{self, Command};
use crate::protocol::frame::{InboundFrame, RawFrame, Request, RpcError};
use crate::transport::connection::Connection;

use super::DispatchPolicy;
use super::subscriptions::CallbackFn;

// ============================================================================
// Types
// ============================================================================

/// Map of sequence ids to pending one-shot result slots.
type PendingMap = FxHashMap<u64, oneshot::Sender<Result<Value>>>;

/// Map of subscribed paths to their callbacks.
pub(crate) type CallbackMap = FxHashMap<Path, Arc<CallbackFn>>;

// ============================================================================
// Client
// ============================================================================

/// A session with one device.
///
/// Cheap to clone; clones share the session. Typical use connects, spawns
/// [`run`](Client::run) on its own task, then issues commands:
///
/// ```ignore
/// let client = Client::builder()
///     .url("wss://device.example.net/ws")
///     .credentials("admin", "secret")
///     .connect()
///     .await?;
///
/// let session = client.clone();
/// tokio::spawn(async move { session.run().await });
///
/// client.alert("Hi", "Stand-up in five minutes", Duration::from_secs(5)).await?;
/// ```
#[derive(Clone)]
pub struct Client {
    pub(crate) inner: Arc<ClientInner>,
}

/// Shared session state.
pub(crate) struct ClientInner {
    /// The one underlying connection.
    pub(crate) connection: Connection,
    /// Sequence counter; the only concurrently mutated number in the crate.
    seq: AtomicU64,
    /// Pending commands awaiting replies.
    pending: Mutex<PendingMap>,
    /// Active subscriptions.
    pub(crate) subscriptions: Mutex<CallbackMap>,
    /// How overlapping subscription matches are resolved.
    pub(crate) policy: DispatchPolicy,
    /// Default wait bound for [`Client::invoke`]; `None` waits forever.
    command_timeout: Option<Duration>,
    /// Cleared when the receive loop terminates or the session closes.
    connected: AtomicBool,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("pending", &self.pending_count())
            .field("subscriptions", &self.inner.subscriptions.lock().len())
            .field("policy", &self.inner.policy)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Starts building a session. See [`ClientBuilder`](super::ClientBuilder).
    #[inline]
    #[must_use]
    pub fn builder() -> super::ClientBuilder {
        super::ClientBuilder::new()
    }

    pub(crate) fn from_parts(
        connection: Connection,
        policy: DispatchPolicy,
        command_timeout: Option<Duration>,
    ) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                connection,
                seq: AtomicU64::new(0),
                pending: Mutex::new(PendingMap::default()),
                subscriptions: Mutex::new(CallbackMap::default()),
                policy,
                command_timeout,
                connected: AtomicBool::new(true),
            }),
        }
    }

    /// Returns the number of commands awaiting replies.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.inner.pending.lock().len()
    }

    /// Returns `true` while the session is usable.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::SeqCst)
    }
}

// ============================================================================
// Client - Invocation
// ============================================================================

impl Client {
    /// Sends a command and waits for its reply.
    ///
    /// Callable concurrently from any number of tasks. Waits forever unless
    /// the builder set a default command timeout; a command the device never
    /// answers otherwise blocks its caller indefinitely — use
    /// [`invoke_with_timeout`](Client::invoke_with_timeout) to bound a
    /// specific call.
    ///
    /// # Errors
    ///
    /// - [`Error::NotConnected`] if the session is closed
    /// - [`Error::Remote`] if the device reports a command failure
    /// - [`Error::UnknownResponse`] if the reply payload is neither a
    ///   structured value nor a number
    /// - [`Error::ConnectionClosed`] if the session dies while waiting
    pub async fn invoke(&self, command: Command, params: Option<Value>) -> Result<Value> {
        self.invoke_inner(command, params, self.inner.command_timeout)
            .await
    }

    /// Sends a command and waits at most `timeout` for its reply.
    ///
    /// On timeout the pending entry is reclaimed; a reply arriving later is
    /// treated as spurious by the receive loop.
    ///
    /// # Errors
    ///
    /// As [`invoke`](Client::invoke), plus [`Error::RequestTimeout`].
    pub async fn invoke_with_timeout(
        &self,
        command: Command,
        params: Option<Value>,
        timeout: Duration,
    ) -> Result<Value> {
        self.invoke_inner(command, params, Some(timeout)).await
    }

    async fn invoke_inner(
        &self,
        command: Command,
        params: Option<Value>,
        timeout: Option<Duration>,
    ) -> Result<Value> {
        if !self.is_connected() {
            return Err(Error::NotConnected);
        }

        // Strictly increasing, never reused for the life of the session.
        let id = self.inner.seq.fetch_add(1, Ordering::SeqCst) + 1;

        let frame = Request::new(id, command.as_str(), params);
        let text = serde_json::to_string(&frame)?;

        let (tx, rx) = oneshot::channel();
        self.inner.pending.lock().insert(id, tx);

        if let Err(err) = self.inner.connection.send_text(text).await {
            self.inner.pending.lock().remove(&id);
            return Err(err);
        }

        trace!(id, method = command.as_str(), "command sent");

        let outcome = match timeout {
            None => rx.await,
            Some(bound) => match tokio::time::timeout(bound, rx).await {
                Ok(received) => received,
                Err(_) => {
                    self.inner.pending.lock().remove(&id);
                    return Err(Error::request_timeout(id, bound.as_millis() as u64));
                }
            },
        };

        let value = outcome.map_err(|_| Error::ConnectionClosed)??;

        match value {
            Value::Object(_) | Value::Number(_) => Ok(value),
            other => {
                warn!(id, payload = %other, "reply payload has unexpected shape");
                Err(Error::UnknownResponse)
            }
        }
    }
}

// ============================================================================
// Client - Receive Loop
// ============================================================================

impl Client {
    /// Runs the receive loop. Blocks until the connection ends.
    ///
    /// Exactly one task may run this per session; a second call returns
    /// [`Error::NotConnected`]. Returns `Ok(())` on a clean close from the
    /// device and the underlying error otherwise. Either way the session is
    /// disconnected afterwards — reconnection policy belongs to the caller.
    ///
    /// # Errors
    ///
    /// - [`Error::WebSocket`] on a read failure
    /// - [`Error::UnsupportedMessage`] if the device sends a
    ///   server-to-client request
    pub async fn run(&self) -> Result<()> {
        let Some(mut reader) = self.inner.connection.take_reader() else {
            return Err(Error::NotConnected);
        };

        debug!("receive loop started");

        let result = loop {
            match reader.next().await {
                Some(Ok(Message::Text(text))) => {
                    if let Err(err) = self.handle_frame(text.as_str()) {
                        if err.is_fatal() {
                            break Err(err);
                        }
                        warn!(error = %err, "inbound frame dropped");
                    }
                }

                Some(Ok(Message::Close(frame))) => {
                    debug!(?frame, "connection closed by device");
                    break Ok(());
                }

                // Binary frames are not part of the protocol; Ping/Pong are
                // handled by the transport.
                Some(Ok(_)) => {}

                Some(Err(err)) => break Err(err.into()),

                None => {
                    debug!("stream ended");
                    break Ok(());
                }
            }
        };

        self.inner.connected.store(false, Ordering::SeqCst);
        self.fail_pending();

        debug!("receive loop terminated");

        result
    }

    /// Classifies one inbound frame and routes it.
    fn handle_frame(&self, text: &str) -> Result<()> {
        match RawFrame::parse(text)?.classify() {
            InboundFrame::Reply { id, result } => self.deliver(id, Ok(result)),

            InboundFrame::ErrorReply { id, error } => {
                let RpcError {
                    code,
                    message,
                    data,
                } = error;
                self.deliver(
                    id,
                    Err(Error::Remote {
                        code,
                        message,
                        data,
                    }),
                )
            }

            InboundFrame::Notification { method, params } => {
                trace!(method = %method, "notification received");
                self.route_notification(&params)
            }

            InboundFrame::ServerRequest { method } => Err(Error::UnsupportedMessage { method }),

            InboundFrame::Invalid { id } => self.deliver(id, Err(Error::InvalidMessage)),
        }
    }

    /// Resolves the pending slot a reply correlates with.
    fn deliver(&self, id: Option<u64>, outcome: Result<Value>) -> Result<()> {
        let id = id.ok_or(Error::MissingIdField)?;

        let tx = self
            .inner
            .pending
            .lock()
            .remove(&id)
            .ok_or(Error::missing_channel(id))?;

        // The caller may have timed out between lookup and send; a dropped
        // receiver is not an error.
        let _ = tx.send(outcome);

        Ok(())
    }

    /// Fails every pending command when the loop terminates.
    fn fail_pending(&self) {
        let pending: Vec<_> = {
            let mut table = self.inner.pending.lock();
            table.drain().collect()
        };

        let count = pending.len();
        for (_, tx) in pending {
            let _ = tx.send(Err(Error::ConnectionClosed));
        }

        if count > 0 {
            debug!(count, "failed pending commands on shutdown");
        }
    }

    /// Closes the session and releases the connection.
    ///
    /// # Errors
    ///
    /// Surfaces the transport's close error, including on a second close.
    pub async fn close(&self) -> Result<()> {
        self.inner.connected.store(false, Ordering::SeqCst);
        self.inner.connection.close().await
    }
}

// ============================================================================
// Client - Commands
// ============================================================================

impl Client {
    /// Displays an alert. On a Desk Pro it shows in the upper-right corner.
    ///
    /// # Errors
    ///
    /// Fails as [`invoke`](Client::invoke) does.
    pub async fn alert(&self, title: &str, text: &str, duration: Duration) -> Result<()> {
        self.invoke(
            command::ALERT_DISPLAY,
            Some(command::alert_args(title, text, duration)),
        )
        .await?;
        Ok(())
    }

    /// Displays text centered on the screen.
    ///
    /// There is no way to dismiss it from the UI; pass a non-zero duration
    /// or clear it with another command.
    ///
    /// # Errors
    ///
    /// Fails as [`invoke`](Client::invoke) does.
    pub async fn text_line(&self, text: &str, duration: Duration) -> Result<()> {
        self.invoke(
            command::TEXT_LINE_DISPLAY,
            Some(command::text_line_args(text, duration)),
        )
        .await?;
        Ok(())
    }

    /// Mutes the microphones.
    ///
    /// # Errors
    ///
    /// Fails as [`invoke`](Client::invoke) does.
    pub async fn mute(&self) -> Result<()> {
        self.invoke(command::MICROPHONES_MUTE, None).await?;
        Ok(())
    }

    /// Unmutes the microphones.
    ///
    /// # Errors
    ///
    /// Fails as [`invoke`](Client::invoke) does.
    pub async fn unmute(&self) -> Result<()> {
        self.invoke(command::MICROPHONES_UNMUTE, None).await?;
        Ok(())
    }

    /// Reads the value of a setting, status, or UI element.
    ///
    /// # Errors
    ///
    /// Fails as [`invoke`](Client::invoke) does.
    pub async fn get(&self, path: &Path) -> Result<Value> {
        self.invoke(command::GET, Some(path.to_get_params())).await
    }

    /// Updates a UI extension widget with a new value.
    ///
    /// # Errors
    ///
    /// Fails as [`invoke`](Client::invoke) does.
    pub async fn set_widget_value(&self, widget_id: &str, value: impl Into<Value>) -> Result<()> {
        self.invoke(
            command::WIDGET_SET_VALUE,
            Some(command::widget_set_value_args(widget_id, &value.into())),
        )
        .await?;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
