//! Async WebSocket client for the Cisco Webex device xAPI.
//!
//! Webex collaboration devices (Desk Pro, Room series) expose their xAPI —
//! status values, commands, and feedback events — over a single WebSocket
//! speaking JSON-RPC 2.0. This crate is the session layer that makes that
//! bidirectional, partially-asynchronous protocol usable from async Rust:
//!
//! - Outgoing commands are tagged with a monotonically increasing sequence
//!   id and correlated with their eventual replies, so any number of tasks
//!   can issue commands concurrently over the one connection.
//! - Unsolicited feedback notifications are routed to registered callbacks
//!   by hierarchical path match.
//! - Multi-step dialog flows (prompt, rating, text input) compose the two:
//!   subscribe, fire, resolve on the first terminal event, tear down.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//! use webex_xapi::{Client, Result, path};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = Client::builder()
//!         .url("wss://device.example.net/ws")
//!         .credentials("admin", "secret")
//!         .insecure(true) // self-signed device certificate
//!         .connect()
//!         .await?;
//!
//!     // The receive loop owns the inbound side; give it its own task.
//!     let session = client.clone();
//!     tokio::spawn(async move { session.run().await });
//!
//!     client.alert("Hi", "Stand-up in five minutes", Duration::from_secs(5)).await?;
//!
//!     let volume = client.get(&path::STATUS_AUDIO_VOLUME).await?;
//!     println!("volume: {volume}");
//!
//!     let subscription = client
//!         .subscribe(path::STATUS_AUDIO_MICROPHONES_MUTE, |data| {
//!             println!("mute changed: {data:?}");
//!         })
//!         .await?;
//!     subscription.cancel().await?;
//!
//!     client.close().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | Session layer: [`Client`], subscriptions, dialogs |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`path`] | Hierarchical paths and the well-known catalog |
//! | [`protocol`] | Command catalog and JSON-RPC frames (internal) |
//!
//! # Concurrency Model
//!
//! One task runs [`Client::run`] and performs all inbound reads and routing
//! decisions; arbitrarily many tasks invoke commands concurrently. Replies
//! are matched strictly by sequence id, not send order, so concurrent
//! commands may complete out of order. Subscription callbacks each run on
//! their own task, so a slow callback cannot stall the receive loop. A
//! terminated receive loop means the session is disconnected; reconnection
//! policy is the caller's.

// ============================================================================
// Modules
// ============================================================================

/// Session layer: the client, subscriptions, and dialog flows.
pub mod client;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Hierarchical paths into the device's namespace.
pub mod path;

/// Wire protocol: command catalog and JSON-RPC frames.
pub mod protocol;

/// WebSocket transport layer.
pub(crate) mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Session types
pub use client::{
    CallbackFn, Client, ClientBuilder, DispatchPolicy, FirstEvent, RatingReply, Subscription,
    TextInputReply,
};

// Error types
pub use error::{Error, Result};

// Path and command types
pub use path::Path;
pub use protocol::{Command, InputType, TextInputOptions};
