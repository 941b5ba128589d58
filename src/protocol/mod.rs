//! Wire protocol: the JSON-RPC envelope and the command catalog.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `command` | Command methods and argument shaping |
//! | `frame` | JSON-RPC 2.0 encoding and inbound classification |

// ============================================================================
// Submodules
// ============================================================================

/// Command methods and argument shaping.
pub mod command;

/// JSON-RPC 2.0 frame types.
pub mod frame;

// ============================================================================
// Re-exports
// ============================================================================

pub use command::{Command, InputType, MAX_PROMPT_OPTIONS, TextInputOptions};
pub use frame::{InboundFrame, RawFrame, Request, RpcError};
