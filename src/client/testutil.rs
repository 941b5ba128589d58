//! In-process device stand-in for session tests.
//!
//! Binds a local WebSocket server, accepts one connection, and gives tests
//! three levers: observe the frames the client sent, push arbitrary inbound
//! frames, and (optionally) auto-acknowledge every command with a success
//! reply.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};

use super::{Client, DispatchPolicy};

enum DeviceOp {
    Push(String),
    Shutdown,
}

pub(crate) struct TestDevice {
    pub(crate) url: String,
    frames: mpsc::UnboundedReceiver<Value>,
    ops: mpsc::UnboundedSender<DeviceOp>,
    subprotocol: Arc<Mutex<Option<String>>>,
}

impl TestDevice {
    /// Binds the stand-in and spawns its accept/serve task.
    pub(crate) async fn spawn(auto_ack: bool) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("local addr").port();
        let url = format!("ws://127.0.0.1:{port}");

        let (frames_tx, frames) = mpsc::unbounded_channel();
        let (ops_tx, mut ops_rx) = mpsc::unbounded_channel::<DeviceOp>();
        let subprotocol = Arc::new(Mutex::new(None));
        let header_slot = Arc::clone(&subprotocol);

        tokio::spawn(async move {
            let (socket, _) = listener.accept().await.expect("accept");

            let callback =
                move |request: &Request, mut response: Response| -> Result<Response, ErrorResponse> {
                    let token = request
                        .headers()
                        .get("Sec-WebSocket-Protocol")
                        .and_then(|value| value.to_str().ok())
                        .map(ToString::to_string);
                    if let Some(token) = &token {
                        if let Ok(value) = HeaderValue::from_str(token) {
                            response
                                .headers_mut()
                                .insert("Sec-WebSocket-Protocol", value);
                        }
                    }
                    *header_slot.lock() = token;
                    Ok(response)
                };

            let mut socket = accept_hdr_async(socket, callback).await.expect("handshake");

            loop {
                tokio::select! {
                    message = socket.next() => match message {
                        Some(Ok(Message::Text(text))) => {
                            let frame: Value =
                                serde_json::from_str(text.as_str()).expect("client frames are JSON");
                            if auto_ack && frame.get("id").is_some() {
                                let ack = json!({
                                    "jsonrpc": "2.0",
                                    "id": frame["id"],
                                    "result": { "status": "OK" },
                                });
                                socket
                                    .send(Message::Text(ack.to_string().into()))
                                    .await
                                    .expect("ack");
                            }
                            let _ = frames_tx.send(frame);
                        }
                        Some(Ok(_)) => {}
                        _ => break,
                    },

                    op = ops_rx.recv() => match op {
                        Some(DeviceOp::Push(text)) => {
                            socket.send(Message::Text(text.into())).await.expect("push");
                        }
                        Some(DeviceOp::Shutdown) | None => {
                            let _ = socket.close(None).await;
                            break;
                        }
                    },
                }
            }
        });

        Self {
            url,
            frames,
            ops: ops_tx,
            subprotocol,
        }
    }

    /// Next frame the client sent, as parsed JSON.
    pub(crate) async fn next_frame(&mut self) -> Value {
        self.frames.recv().await.expect("device saw a frame")
    }

    /// Pushes one inbound frame to the client.
    pub(crate) fn push_json(&self, value: Value) {
        self.ops
            .send(DeviceOp::Push(value.to_string()))
            .expect("device task alive");
    }

    /// Replies success to the command with the given id.
    pub(crate) fn reply_ok(&self, id: &Value, result: Value) {
        self.push_json(json!({ "jsonrpc": "2.0", "id": id, "result": result }));
    }

    /// Replies a structured error to the command with the given id.
    pub(crate) fn reply_error(&self, id: &Value, code: i64, message: &str) {
        self.push_json(json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": { "code": code, "message": message },
        }));
    }

    /// Closes the device side of the connection.
    pub(crate) fn shutdown(&self) {
        let _ = self.ops.send(DeviceOp::Shutdown);
    }

    /// The `Sec-WebSocket-Protocol` value seen during the handshake.
    pub(crate) fn subprotocol(&self) -> Option<String> {
        self.subprotocol.lock().clone()
    }
}

/// Connects a client to the stand-in with test credentials.
pub(crate) async fn connect_client(device: &TestDevice) -> Client {
    connect_client_with_policy(device, DispatchPolicy::FirstMatch).await
}

/// Connects a client with an explicit dispatch policy.
pub(crate) async fn connect_client_with_policy(
    device: &TestDevice,
    policy: DispatchPolicy,
) -> Client {
    Client::builder()
        .url(&device.url)
        .credentials("bob", "secret")
        .dispatch_policy(policy)
        .connect()
        .await
        .expect("connect")
}
