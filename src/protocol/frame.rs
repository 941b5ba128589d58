//! JSON-RPC 2.0 frame encoding and inbound classification.
//!
//! The device speaks JSON-RPC 2.0 over a single WebSocket. Outbound frames
//! are always requests tagged with a sequence id; inbound frames are one of:
//!
//! | Kind | Shape | Handling |
//! |------|-------|----------|
//! | Reply | `{id, result}` | resolves the pending command with that id |
//! | Error reply | `{id, error: {code, message, data}}` | fails that command |
//! | Notification | `{method, params}`, no id | routed by path match |
//! | Server request | `{id, method, ...}` | unsupported, fatal |

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

// ============================================================================
// Outbound Request
// ============================================================================

/// Protocol version tag carried on every outbound frame.
const JSONRPC_VERSION: &str = "2.0";

/// An outbound command frame.
///
/// # Format
///
/// ```json
/// {
///   "jsonrpc": "2.0",
///   "id": 42,
///   "method": "xCommand/Audio/Microphones/Mute",
///   "params": { ... }
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct Request {
    /// Protocol version, always `"2.0"`.
    pub jsonrpc: &'static str,

    /// Sequence id for request/response correlation.
    pub id: u64,

    /// Command method, e.g. `xCommand/UserInterface/Message/Alert/Display`.
    pub method: String,

    /// Structured argument payload, omitted when the command takes none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl Request {
    /// Creates an outbound frame.
    #[inline]
    #[must_use]
    pub fn new(id: u64, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            method: method.into(),
            params,
        }
    }
}

// ============================================================================
// Inbound Frames
// ============================================================================

/// A structured error payload from an error reply.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcError {
    /// JSON-RPC error code.
    pub code: i64,

    /// Human-readable message.
    #[serde(default)]
    pub message: String,

    /// Optional structured error data.
    #[serde(default)]
    pub data: Option<Value>,
}

/// A raw inbound frame before classification.
///
/// Every field is optional; [`RawFrame::classify`] decides what the frame is
/// from which fields are present.
#[derive(Debug, Clone, Deserialize)]
pub struct RawFrame {
    /// Correlation id. Replies carry one, notifications do not.
    #[serde(default)]
    pub id: Option<Value>,

    /// Method name. Present on notifications and server requests.
    #[serde(default)]
    pub method: Option<String>,

    /// Notification payload.
    #[serde(default)]
    pub params: Option<Value>,

    /// Success payload.
    #[serde(default)]
    pub result: Option<Value>,

    /// Error payload.
    #[serde(default)]
    pub error: Option<RpcError>,
}

/// A classified inbound frame.
#[derive(Debug)]
pub enum InboundFrame {
    /// Success reply for a pending command.
    Reply {
        /// Correlation id, if the frame carried a usable one.
        id: Option<u64>,
        /// The result payload.
        result: Value,
    },

    /// Error reply for a pending command.
    ErrorReply {
        /// Correlation id, if the frame carried a usable one.
        id: Option<u64>,
        /// The structured error.
        error: RpcError,
    },

    /// Unsolicited notification, routed by path match.
    Notification {
        /// Feedback method name.
        method: String,
        /// Event payload.
        params: Value,
    },

    /// A server-to-client request. Not supported; fatal to the session.
    ServerRequest {
        /// Method the device tried to invoke.
        method: String,
    },

    /// None of the above.
    Invalid {
        /// Correlation id, if any, so the pending command can be failed.
        id: Option<u64>,
    },
}

impl RawFrame {
    /// Parses one inbound text frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`](crate::Error::Json) if the text is not valid
    /// JSON.
    pub fn parse(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Classifies the frame by which fields are present.
    #[must_use]
    pub fn classify(self) -> InboundFrame {
        let id = self.id.as_ref().and_then(numeric_id);

        if let Some(method) = self.method {
            if self.id.is_some() {
                return InboundFrame::ServerRequest { method };
            }
            return InboundFrame::Notification {
                method,
                params: self.params.unwrap_or(Value::Null),
            };
        }

        if let Some(error) = self.error {
            return InboundFrame::ErrorReply { id, error };
        }

        if let Some(result) = self.result {
            return InboundFrame::Reply { id, result };
        }

        InboundFrame::Invalid { id }
    }
}

/// Extracts a sequence id from a JSON id value.
///
/// Ids are sent as integers, but JSON-RPC permits any number; a fractionless
/// float echoes back as the same id.
fn numeric_id(value: &Value) -> Option<u64> {
    value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && *f >= 0.0)
            .map(|f| f as u64)
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_request_serialization() {
        let request = Request::new(
            3,
            "xCommand/UserInterface/Message/Alert/Display",
            Some(json!({ "Title": "Hi", "Text": "Body", "Duration": 5.0 })),
        );
        let value = serde_json::to_value(&request).expect("serialize");

        assert_eq!(value["jsonrpc"], "2.0");
        assert_eq!(value["id"], 3);
        assert_eq!(value["method"], "xCommand/UserInterface/Message/Alert/Display");
        assert_eq!(value["params"]["Duration"], 5.0);
    }

    #[test]
    fn test_request_without_params_omits_field() {
        let request = Request::new(1, "xCommand/Audio/Microphones/Mute", None);
        let text = serde_json::to_string(&request).expect("serialize");
        assert!(!text.contains("params"));
    }

    #[test]
    fn test_classify_reply() {
        let frame = RawFrame::parse(r#"{"jsonrpc":"2.0","id":7,"result":{"status":"OK"}}"#)
            .expect("parse");
        match frame.classify() {
            InboundFrame::Reply { id, result } => {
                assert_eq!(id, Some(7));
                assert_eq!(result["status"], "OK");
            }
            other => panic!("expected reply, got {other:?}"),
        }
    }

    #[test]
    fn test_classify_error_reply() {
        let frame = RawFrame::parse(
            r#"{"jsonrpc":"2.0","id":2,"error":{"code":-32601,"message":"Method not found"}}"#,
        )
        .expect("parse");
        match frame.classify() {
            InboundFrame::ErrorReply { id, error } => {
                assert_eq!(id, Some(2));
                assert_eq!(error.code, -32601);
                assert_eq!(error.message, "Method not found");
            }
            other => panic!("expected error reply, got {other:?}"),
        }
    }

    #[test]
    fn test_classify_notification() {
        let frame = RawFrame::parse(
            r#"{"jsonrpc":"2.0","method":"xFeedback/Event","params":{"Status":{"Audio":{"Volume":50}}}}"#,
        )
        .expect("parse");
        match frame.classify() {
            InboundFrame::Notification { method, params } => {
                assert_eq!(method, "xFeedback/Event");
                assert_eq!(params["Status"]["Audio"]["Volume"], 50);
            }
            other => panic!("expected notification, got {other:?}"),
        }
    }

    #[test]
    fn test_classify_server_request() {
        let frame = RawFrame::parse(r#"{"jsonrpc":"2.0","id":9,"method":"xCommand/Reboot"}"#)
            .expect("parse");
        assert!(matches!(
            frame.classify(),
            InboundFrame::ServerRequest { method } if method == "xCommand/Reboot"
        ));
    }

    #[test]
    fn test_classify_invalid() {
        let frame = RawFrame::parse(r#"{"jsonrpc":"2.0","id":4}"#).expect("parse");
        assert!(matches!(
            frame.classify(),
            InboundFrame::Invalid { id: Some(4) }
        ));
    }

    #[test]
    fn test_reply_with_float_id() {
        let frame = RawFrame::parse(r#"{"id":3.0,"result":{"v":1}}"#).expect("parse");
        assert!(matches!(
            frame.classify(),
            InboundFrame::Reply { id: Some(3), .. }
        ));
    }

    #[test]
    fn test_reply_with_unusable_id() {
        let frame = RawFrame::parse(r#"{"id":"abc","result":{}}"#).expect("parse");
        assert!(matches!(frame.classify(), InboundFrame::Reply { id: None, .. }));
    }
}
