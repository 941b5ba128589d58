//! Feedback subscriptions and notification routing.
//!
//! A subscription pairs a [`Path`] with a callback. Each inbound
//! notification payload is probed with every active subscription's
//! dot-path query; [`DispatchPolicy`] decides what happens when more than
//! one query matches. Callbacks run on their own tasks so a slow callback
//! cannot stall the receive loop.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use serde_json::Value;
use serde_json_path::JsonPath;
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::path::Path;
use crate::protocol::command;

use super::Client;

// ============================================================================
// Types
// ============================================================================

/// Callback invoked with the values a notification matched for its path.
pub type CallbackFn = dyn Fn(Vec<Value>) + Send + Sync;

/// How a notification that matches several subscriptions is dispatched.
///
/// The registry does not deduplicate overlapping paths, so a payload can
/// satisfy both `Status` and `Status Audio Volume` at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchPolicy {
    /// Dispatch the single most specific match: most path segments first,
    /// ties broken by path order. Deterministic for any set of
    /// subscriptions.
    #[default]
    FirstMatch,

    /// Dispatch every matching subscription.
    FanOut,
}

/// Handle for one active subscription.
///
/// Dropping the handle does not cancel the subscription; call
/// [`cancel`](Subscription::cancel) to deregister from the device.
#[derive(Debug)]
pub struct Subscription {
    client: Client,
    path: Path,
}

impl Subscription {
    /// Returns the subscribed path.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Removes the registry entry and deregisters from the device.
    ///
    /// # Errors
    ///
    /// Fails if the unsubscribe command fails; the local registry entry is
    /// removed regardless.
    pub async fn cancel(self) -> Result<()> {
        self.client.unsubscribe(&self.path).await
    }
}

// ============================================================================
// Client - Subscriptions
// ============================================================================

impl Client {
    /// Subscribes to feedback on a path.
    ///
    /// The callback is registered only after the device accepts the
    /// subscribe command. Subscribing to the same path again replaces the
    /// callback; overlapping paths coexist.
    ///
    /// # Errors
    ///
    /// Fails as [`invoke`](Client::invoke) does; nothing is registered on
    /// failure.
    pub async fn subscribe<F>(&self, path: Path, callback: F) -> Result<Subscription>
    where
        F: Fn(Vec<Value>) + Send + Sync + 'static,
    {
        self.invoke(
            command::FEEDBACK_SUBSCRIBE,
            Some(path.to_subscribe_query()),
        )
        .await?;

        self.inner
            .subscriptions
            .lock()
            .insert(path.clone(), Arc::new(callback));

        debug!(path = %path, "subscription registered");

        Ok(Subscription {
            client: self.clone(),
            path,
        })
    }

    /// Removes a subscription and deregisters from the device.
    ///
    /// The registry entry is removed first so no further notifications
    /// dispatch to the callback, then the unsubscribe command is sent.
    ///
    /// # Errors
    ///
    /// Fails if the unsubscribe command fails.
    pub async fn unsubscribe(&self, path: &Path) -> Result<()> {
        self.inner.subscriptions.lock().remove(path);

        self.invoke(
            command::FEEDBACK_UNSUBSCRIBE,
            Some(path.to_subscribe_query()),
        )
        .await?;

        debug!(path = %path, "subscription removed");

        Ok(())
    }

    /// Routes one notification payload to the matching subscription(s).
    ///
    /// Paths are snapshotted under the lock, queries evaluated without it,
    /// and the winning callback re-fetched at dispatch — so a subscription
    /// cancelled mid-flight yields [`Error::MissingCallback`] instead of a
    /// stale dispatch.
    pub(crate) fn route_notification(&self, payload: &Value) -> Result<()> {
        let paths: Vec<Path> = self.inner.subscriptions.lock().keys().cloned().collect();

        let mut matches: Vec<(Path, Vec<Value>)> = Vec::new();
        for path in paths {
            let query = path.to_dot_path();
            let parsed = match JsonPath::parse(&query) {
                Ok(parsed) => parsed,
                Err(err) => {
                    warn!(path = %path, error = %err, "subscription query does not parse; skipped");
                    continue;
                }
            };

            let nodes = parsed.query(payload).all();
            if !nodes.is_empty() {
                matches.push((path, nodes.into_iter().cloned().collect()));
            }
        }

        if matches.is_empty() {
            return Err(Error::MissingData);
        }

        match self.inner.policy {
            DispatchPolicy::FirstMatch => {
                matches.sort_by(|a, b| {
                    b.0.segment_count()
                        .cmp(&a.0.segment_count())
                        .then_with(|| a.0.cmp(&b.0))
                });
                let (path, data) = matches.remove(0);
                self.dispatch(&path, data)
            }

            DispatchPolicy::FanOut => {
                let mut dispatched = 0;
                for (path, data) in matches {
                    match self.dispatch(&path, data) {
                        Ok(()) => dispatched += 1,
                        Err(err) => warn!(path = %path, error = %err, "fan-out dispatch skipped"),
                    }
                }
                if dispatched == 0 {
                    Err(Error::MissingCallback)
                } else {
                    Ok(())
                }
            }
        }
    }

    /// Spawns the callback for one matched path on its own task.
    fn dispatch(&self, path: &Path, data: Vec<Value>) -> Result<()> {
        let callback = self
            .inner
            .subscriptions
            .lock()
            .get(path)
            .cloned()
            .ok_or(Error::MissingCallback)?;

        trace!(path = %path, matched = data.len(), "dispatching notification");

        tokio::spawn(async move { callback(data) });

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
