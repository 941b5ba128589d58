//! WebSocket transport layer.
//!
//! Owns the single persistent connection to the device: credentialed
//! handshake, serialized frame writes, and the single-owner read half the
//! session's receive loop consumes.

// ============================================================================
// Submodules
// ============================================================================

/// Connection establishment and frame I/O.
pub(crate) mod connection;
