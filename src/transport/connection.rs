//! The WebSocket connection to the device.
//!
//! One [`Connection`] owns exactly one socket for the lifetime of a session.
//! Credentials travel in the `Sec-WebSocket-Protocol` header as
//! `auth-<base64url(user:password)>` with no padding.
//!
//! The write half is shared behind an async lock so concurrent commands
//! serialize their frames instead of interleaving them; the read half is
//! handed out once, to the session's receive loop, and never shared.

// ============================================================================
// Imports
// ============================================================================

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::{Connector, MaybeTlsStream, WebSocketStream, connect_async_tls_with_config};
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Prefix for the credential token.
const CREDENTIAL_PREFIX: &str = "auth-";

/// Header carrying the credential token during the handshake.
const CREDENTIAL_HEADER: &str = "Sec-WebSocket-Protocol";

// ============================================================================
// Types
// ============================================================================

/// The underlying socket, TLS or plain depending on the URL scheme.
pub(crate) type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Write half of the socket.
pub(crate) type FrameSink = SplitSink<WsStream, Message>;

/// Read half of the socket.
pub(crate) type FrameStream = SplitStream<WsStream>;

// ============================================================================
// Credential Encoding
// ============================================================================

/// Builds the credential token for the connection handshake.
///
/// The token is `auth-` followed by `user:password` base64url-encoded with
/// the URL-safe alphabet and no padding, so it is always header-safe.
///
/// # Errors
///
/// Returns [`Error::InvalidCredentials`] if either part is empty.
pub(crate) fn encode_credentials(user: &str, password: &str) -> Result<String> {
    if user.is_empty() || password.is_empty() {
        return Err(Error::InvalidCredentials);
    }

    let token = URL_SAFE_NO_PAD.encode(format!("{user}:{password}"));

    Ok(format!("{CREDENTIAL_PREFIX}{token}"))
}

// ============================================================================
// Connection
// ============================================================================

/// A single established WebSocket connection to a device.
pub(crate) struct Connection {
    /// Write half, locked so concurrent senders cannot interleave frames.
    writer: tokio::sync::Mutex<FrameSink>,
    /// Read half, taken exactly once by the receive loop.
    reader: Mutex<Option<FrameStream>>,
}

impl Connection {
    /// Dials the device and completes the WebSocket handshake.
    ///
    /// `insecure` disables TLS certificate and hostname verification for
    /// devices with self-signed certificates.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidCredentials`] if user or password is empty
    /// - [`Error::Tls`] if the TLS connector cannot be built
    /// - [`Error::WebSocket`] on any dial or handshake failure
    pub(crate) async fn open(
        url: &Url,
        user: &str,
        password: &str,
        insecure: bool,
    ) -> Result<Self> {
        let token = encode_credentials(user, password)?;

        let mut request = url.as_str().into_client_request()?;
        request.headers_mut().insert(
            CREDENTIAL_HEADER,
            HeaderValue::from_str(&token)
                .map_err(|err| Error::connection(format!("credential header: {err}")))?,
        );

        let connector = native_tls::TlsConnector::builder()
            .danger_accept_invalid_certs(insecure)
            .danger_accept_invalid_hostnames(insecure)
            .build()?;

        let (stream, response) = connect_async_tls_with_config(
            request,
            None,
            false,
            Some(Connector::NativeTls(connector)),
        )
        .await?;

        debug!(url = %url, status = %response.status(), "websocket handshake complete");

        let (writer, reader) = stream.split();

        Ok(Self {
            writer: tokio::sync::Mutex::new(writer),
            reader: Mutex::new(Some(reader)),
        })
    }

    /// Writes one outbound text frame.
    ///
    /// Safe to call from any number of tasks; the write lock keeps frames
    /// whole.
    pub(crate) async fn send_text(&self, text: String) -> Result<()> {
        self.writer.lock().await.send(Message::Text(text.into())).await?;
        Ok(())
    }

    /// Hands out the read half. Returns `None` after the first call; the
    /// receive loop is the sole reader.
    pub(crate) fn take_reader(&self) -> Option<FrameStream> {
        self.reader.lock().take()
    }

    /// Closes the connection.
    ///
    /// Closing an already-closed connection surfaces the transport's error
    /// rather than suppressing it.
    pub(crate) async fn close(&self) -> Result<()> {
        self.writer.lock().await.close().await?;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_credentials() {
        let token = encode_credentials("bob", "secret").expect("encode");
        assert_eq!(token, "auth-Ym9iOnNlY3JldA");
    }

    #[test]
    fn test_encode_credentials_is_deterministic() {
        let a = encode_credentials("admin", "hunter2").expect("encode");
        let b = encode_credentials("admin", "hunter2").expect("encode");
        assert_eq!(a, b);
    }

    #[test]
    fn test_encode_credentials_is_header_safe() {
        // Inputs chosen so standard base64 would produce '+', '/' and '='.
        let token = encode_credentials("bob", "s?c>et~pass").expect("encode");
        assert!(!token.contains('+'));
        assert!(!token.contains('/'));
        assert!(!token.contains('='));
        assert!(token.starts_with(CREDENTIAL_PREFIX));
    }

    #[test]
    fn test_encode_credentials_rejects_empty_user() {
        assert!(matches!(
            encode_credentials("", "x"),
            Err(Error::InvalidCredentials)
        ));
    }

    #[test]
    fn test_encode_credentials_rejects_empty_password() {
        assert!(matches!(
            encode_credentials("x", ""),
            Err(Error::InvalidCredentials)
        ));
    }
}
