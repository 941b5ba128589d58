//! Error types for the xAPI client.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use webex_xapi::{Client, Result};
//!
//! async fn example(client: &Client) -> Result<()> {
//!     client.mute().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Connection | [`Error::Connection`], [`Error::InvalidCredentials`], [`Error::NotConnected`], [`Error::ConnectionClosed`] |
//! | Protocol | [`Error::MissingIdField`], [`Error::MissingChannel`], [`Error::UnsupportedMessage`], [`Error::InvalidMessage`], [`Error::UnknownResponse`], [`Error::Protocol`] |
//! | Device | [`Error::Remote`] |
//! | Routing | [`Error::MissingData`], [`Error::MissingCallback`] |
//! | Execution | [`Error::RequestTimeout`], [`Error::InvalidArgument`], [`Error::Aggregate`] |
//! | External | [`Error::Json`], [`Error::WebSocket`], [`Error::Tls`] |

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use serde_json::Value;
use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// Dial or handshake failure.
    #[error("connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// Login or password was empty when building the credential token.
    #[error("missing login or password")]
    InvalidCredentials,

    /// Operation attempted without a live session.
    ///
    /// Returned once the receive loop has terminated or [`close`] was
    /// called.
    ///
    /// [`close`]: crate::Client::close
    #[error("not connected")]
    NotConnected,

    /// The connection went away while an operation was in flight.
    #[error("connection closed")]
    ConnectionClosed,

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// A reply frame arrived without an `id` field, so it cannot be
    /// correlated with any pending command.
    #[error("missing id field in response")]
    MissingIdField,

    /// A reply frame arrived whose `id` has no pending entry.
    ///
    /// Indicates a spurious or duplicate reply, or one arriving after the
    /// caller abandoned the wait.
    #[error("missing response channel for request {id}")]
    MissingChannel {
        /// The uncorrelated sequence id.
        id: u64,
    },

    /// The device sent a server-to-client request, which this client does
    /// not support. Fatal to the receive loop.
    #[error("unsupported inbound request: {method}")]
    UnsupportedMessage {
        /// Method of the unsupported request.
        method: String,
    },

    /// An inbound frame that is neither a reply, an error, nor a
    /// notification.
    #[error("invalid message")]
    InvalidMessage,

    /// A success reply carried a payload that is neither a structured value
    /// nor a number.
    #[error("unknown response")]
    UnknownResponse,

    /// Protocol violation not covered by a more specific variant.
    #[error("protocol error: {message}")]
    Protocol {
        /// Description of the protocol violation.
        message: String,
    },

    // ========================================================================
    // Device Errors
    // ========================================================================
    /// Structured error returned by the device for a command.
    #[error("device error {code}: {message}")]
    Remote {
        /// JSON-RPC error code.
        code: i64,
        /// Error message from the device.
        message: String,
        /// Optional structured error data.
        data: Option<Value>,
    },

    // ========================================================================
    // Routing Errors
    // ========================================================================
    /// A notification matched no active subscription.
    #[error("missing response data")]
    MissingData,

    /// A notification matched a subscription whose callback is gone.
    ///
    /// Only reachable when a subscription is cancelled concurrently with
    /// dispatch.
    #[error("missing callback")]
    MissingCallback,

    // ========================================================================
    // Execution Errors
    // ========================================================================
    /// Command request timeout.
    #[error("request {id} timed out after {timeout_ms}ms")]
    RequestTimeout {
        /// The sequence id that timed out.
        id: u64,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// Invalid argument to a client operation.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Description of the invalid argument.
        message: String,
    },

    /// Multiple errors from a single operation, typically subscription
    /// teardown across several paths.
    #[error("multiple errors: [{}]", join_errors(.0))]
    Aggregate(Vec<Error>),

    // ========================================================================
    // External Errors
    // ========================================================================
    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),

    /// TLS connector error.
    #[error("TLS error: {0}")]
    Tls(#[from] native_tls::Error),
}

fn join_errors(errors: &[Error]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Creates an invalid argument error.
    #[inline]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates a missing channel error.
    #[inline]
    #[must_use]
    pub fn missing_channel(id: u64) -> Self {
        Self::MissingChannel { id }
    }

    /// Creates a request timeout error.
    #[inline]
    #[must_use]
    pub fn request_timeout(id: u64, timeout_ms: u64) -> Self {
        Self::RequestTimeout { id, timeout_ms }
    }

    /// Combines errors into one, unwrapping the single-error case.
    ///
    /// # Panics
    ///
    /// Panics if `errors` is empty; callers aggregate only after collecting
    /// at least one error.
    #[must_use]
    pub fn aggregate(mut errors: Vec<Error>) -> Self {
        assert!(!errors.is_empty(), "aggregate of zero errors");
        if errors.len() == 1 {
            errors.remove(0)
        } else {
            Self::Aggregate(errors)
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this error terminates the receive loop.
    ///
    /// Transport failures and the unsupported inbound-request kind are
    /// fatal; correlation anomalies and routing errors are not — the loop
    /// logs them and keeps reading.
    #[inline]
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::WebSocket(_) | Self::ConnectionClosed | Self::UnsupportedMessage { .. }
        )
    }

    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. }
                | Self::ConnectionClosed
                | Self::NotConnected
                | Self::WebSocket(_)
                | Self::Tls(_)
        )
    }

    /// Returns `true` if this is a notification routing error.
    #[inline]
    #[must_use]
    pub fn is_routing_error(&self) -> bool {
        matches!(self, Self::MissingData | Self::MissingCallback)
    }

    /// Returns `true` if the device itself reported the failure.
    #[inline]
    #[must_use]
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote { .. })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::connection("dial tcp refused");
        assert_eq!(err.to_string(), "connection failed: dial tcp refused");
    }

    #[test]
    fn test_remote_display() {
        let err = Error::Remote {
            code: -32601,
            message: "Method not found".into(),
            data: None,
        };
        assert_eq!(err.to_string(), "device error -32601: Method not found");
    }

    #[test]
    fn test_missing_channel_display() {
        let err = Error::missing_channel(7);
        assert_eq!(err.to_string(), "missing response channel for request 7");
    }

    #[test]
    fn test_aggregate_unwraps_single() {
        let err = Error::aggregate(vec![Error::MissingData]);
        assert!(matches!(err, Error::MissingData));
    }

    #[test]
    fn test_aggregate_joins_messages() {
        let err = Error::aggregate(vec![Error::MissingData, Error::NotConnected]);
        assert_eq!(
            err.to_string(),
            "multiple errors: [missing response data; not connected]"
        );
    }

    #[test]
    fn test_is_fatal() {
        assert!(
            Error::UnsupportedMessage {
                method: "xCommand/Foo".into()
            }
            .is_fatal()
        );
        assert!(Error::ConnectionClosed.is_fatal());
        assert!(!Error::missing_channel(1).is_fatal());
        assert!(!Error::MissingIdField.is_fatal());
        assert!(!Error::MissingData.is_fatal());
    }

    #[test]
    fn test_is_routing_error() {
        assert!(Error::MissingData.is_routing_error());
        assert!(Error::MissingCallback.is_routing_error());
        assert!(!Error::MissingIdField.is_routing_error());
    }
}
