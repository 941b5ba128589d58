//! Session configuration and connection.
//!
//! [`ClientBuilder`] collects the endpoint, credentials, and session
//! policies, then [`connect`](ClientBuilder::connect) performs the
//! handshake and returns the live [`Client`].

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};
use crate::transport::connection::Connection;

use super::{Client, DispatchPolicy};

// ============================================================================
// ClientBuilder
// ============================================================================

/// Builder for a device session.
///
/// ```ignore
/// let client = Client::builder()
///     .url("wss://device.example.net/ws")
///     .credentials("admin", "secret")
///     .insecure(true) // self-signed device certificate
///     .connect()
///     .await?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct ClientBuilder {
    url: Option<String>,
    user: String,
    password: String,
    insecure: bool,
    policy: DispatchPolicy,
    command_timeout: Option<Duration>,
}

impl ClientBuilder {
    /// Creates a builder with nothing configured.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Device WebSocket endpoint, e.g. `wss://device.example.net/ws`.
    #[must_use]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Login and password for the credential token.
    #[must_use]
    pub fn credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.user = user.into();
        self.password = password.into();
        self
    }

    /// Disables TLS certificate and hostname verification.
    ///
    /// Devices commonly ship self-signed certificates; leave this off
    /// whenever a trusted certificate is installed.
    #[must_use]
    pub fn insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }

    /// How notifications matching several subscriptions are dispatched.
    ///
    /// Defaults to [`DispatchPolicy::FirstMatch`].
    #[must_use]
    pub fn dispatch_policy(mut self, policy: DispatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Default wait bound applied to every [`invoke`](Client::invoke).
    ///
    /// Without one, commands wait for their reply indefinitely.
    #[must_use]
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = Some(timeout);
        self
    }

    /// Dials the device and returns the connected session.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if the URL is missing or unparsable
    /// - [`Error::InvalidCredentials`] if user or password is empty
    /// - [`Error::Tls`] / [`Error::WebSocket`] on handshake failure
    pub async fn connect(self) -> Result<Client> {
        let raw = self
            .url
            .ok_or_else(|| Error::invalid_argument("url is required"))?;
        let url = Url::parse(&raw)
            .map_err(|err| Error::invalid_argument(format!("invalid url {raw:?}: {err}")))?;

        let connection = Connection::open(&url, &self.user, &self.password, self.insecure).await?;

        Ok(Client::from_parts(
            connection,
            self.policy,
            self.command_timeout,
        ))
    }
}

// ============================================================================
// Tests
// ============================================================================
