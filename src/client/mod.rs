//! The client session layer.
//!
//! Everything above the raw transport lives here: the session aggregate and
//! its receive loop, request/response correlation, the subscription
//! registry, and the composite dialog flows.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `builder` | Session configuration and connection |
//! | `core` | [`Client`], correlation, the receive loop, commands |
//! | `subscriptions` | Feedback registry and notification routing |
//! | `dialogs` | Prompt, rating, and text-input flows |

// ============================================================================
// Submodules
// ============================================================================

/// Session configuration and connection.
pub mod builder;

/// The session aggregate: correlation, receive loop, commands.
pub mod core;

/// Dialog flows built on subscriptions and commands.
pub mod dialogs;

/// Feedback subscriptions and notification routing.
pub mod subscriptions;

#[cfg(test)]
mod testutil;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::ClientBuilder;
pub use core::Client;
pub use dialogs::{FirstEvent, RatingReply, TextInputReply};
pub use subscriptions::{CallbackFn, DispatchPolicy, Subscription};
