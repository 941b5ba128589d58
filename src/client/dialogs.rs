//! Multi-step dialog flows: prompt, rating, and text input.
//!
//! Every dialog follows the same choreography: subscribe to the completion
//! event paths, fire the display command, resolve on the first matching
//! notification, then cancel every subscription — on success and on every
//! failure path alike, with teardown errors aggregated rather than dropped.
//! [`Client::invoke_and_await_event`] is that choreography as a reusable
//! primitive; the dialog methods are thin wrappers over it.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::oneshot;

use crate::error::{Error, Result};
use crate::path::{self, Path};
use crate::protocol::command::{self, Command, TextInputOptions};

use super::Client;

// ============================================================================
// Constants
// ============================================================================

/// Feedback tag on prompt display commands.
const PROMPT_FEEDBACK_ID: &str = "xapi-prompt";

/// Feedback tag on rating display commands.
const RATING_FEEDBACK_ID: &str = "xapi-rating";

/// Feedback tag on text-input display commands.
const TEXT_INPUT_FEEDBACK_ID: &str = "xapi-text-input";

// ============================================================================
// Reply Types
// ============================================================================

/// The first notification that resolved an
/// [`invoke_and_await_event`](Client::invoke_and_await_event) flow.
#[derive(Debug, Clone)]
pub struct FirstEvent {
    /// The subscription path the notification matched.
    pub path: Path,
    /// The values the path's query matched in the payload.
    pub data: Vec<Value>,
}

impl FirstEvent {
    /// Returns the first matched value as an object field lookup target.
    fn first_object(&self) -> Result<&Value> {
        self.data
            .first()
            .ok_or_else(|| Error::protocol("event match carried no data"))
    }
}

/// Outcome of a rating dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatingReply {
    /// `true` if the user dismissed the dialog without rating.
    pub canceled: bool,
    /// Stars given, 0 when canceled.
    pub rating: i64,
}

/// Outcome of a text-input dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextInputReply {
    /// `true` if the dialog was cleared without input.
    pub canceled: bool,
    /// The submitted text, empty when canceled.
    pub text: String,
}

// ============================================================================
// Client - Event Flows
// ============================================================================

impl Client {
    /// Fires a command and waits for the first notification matching any of
    /// `paths`, then tears down every subscription.
    ///
    /// If subscribing fails partway through, the partial subscriptions are
    /// cancelled and those errors are aggregated with the original. The
    /// wait itself is unbounded, like [`invoke`](Client::invoke) — wrap the
    /// call in a timeout to bound a user's think time.
    ///
    /// # Errors
    ///
    /// - Any subscribe or command failure, aggregated with teardown errors
    /// - [`Error::Aggregate`] if teardown fails after the event arrived
    /// - [`Error::InvalidArgument`] if `paths` is empty
    pub async fn invoke_and_await_event(
        &self,
        command: Command,
        params: Value,
        paths: &[Path],
    ) -> Result<FirstEvent> {
        if paths.is_empty() {
            return Err(Error::invalid_argument("at least one event path required"));
        }

        let (tx, rx) = oneshot::channel();
        // Take-once slot so exactly one terminal event resolves the flow.
        let slot = Arc::new(Mutex::new(Some(tx)));

        let mut registered: Vec<Path> = Vec::with_capacity(paths.len());

        for event_path in paths {
            let slot = Arc::clone(&slot);
            let matched = event_path.clone();

            let outcome = self
                .subscribe(event_path.clone(), move |data| {
                    if let Some(tx) = slot.lock().take() {
                        let _ = tx.send((matched.clone(), data));
                    }
                })
                .await;

            match outcome {
                Ok(subscription) => registered.push(subscription.path().clone()),
                Err(err) => {
                    let mut errors = vec![err];
                    errors.extend(self.cancel_paths(&registered).await);
                    return Err(Error::aggregate(errors));
                }
            }
        }

        if let Err(err) = self.invoke(command, Some(params)).await {
            let mut errors = vec![err];
            errors.extend(self.cancel_paths(&registered).await);
            return Err(Error::aggregate(errors));
        }

        let (matched_path, data) = match rx.await {
            Ok(event) => event,
            Err(_) => {
                let mut errors = vec![Error::ConnectionClosed];
                errors.extend(self.cancel_paths(&registered).await);
                return Err(Error::aggregate(errors));
            }
        };

        let teardown = self.cancel_paths(&registered).await;
        if teardown.is_empty() {
            Ok(FirstEvent {
                path: matched_path,
                data,
            })
        } else {
            Err(Error::aggregate(teardown))
        }
    }

    /// Cancels each path, collecting errors instead of short-circuiting.
    async fn cancel_paths(&self, paths: &[Path]) -> Vec<Error> {
        let mut errors = Vec::new();
        for path in paths {
            if let Err(err) = self.unsubscribe(path).await {
                errors.push(err);
            }
        }
        errors
    }
}

// ============================================================================
// Client - Dialogs
// ============================================================================

impl Client {
    /// Shows a multiple-choice prompt and waits for the user's pick.
    ///
    /// Up to [`MAX_PROMPT_OPTIONS`](command::MAX_PROMPT_OPTIONS) options are
    /// shown in order; the chosen option's text is returned.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] for zero or more than five options
    /// - [`Error::Protocol`] if the response event is malformed
    /// - Otherwise as [`invoke_and_await_event`](Client::invoke_and_await_event)
    pub async fn prompt(&self, title: &str, text: &str, options: &[&str]) -> Result<String> {
        if options.is_empty() || options.len() > command::MAX_PROMPT_OPTIONS {
            return Err(Error::invalid_argument(format!(
                "prompt takes 1 to {} options, got {}",
                command::MAX_PROMPT_OPTIONS,
                options.len()
            )));
        }

        let event = self
            .invoke_and_await_event(
                command::PROMPT_DISPLAY,
                command::prompt_args(PROMPT_FEEDBACK_ID, title, text, options),
                &[path::EVENT_UI_PROMPT_RESPONSE],
            )
            .await?;

        let option_id = event
            .first_object()?
            .get("OptionId")
            .and_then(Value::as_u64)
            .ok_or_else(|| Error::protocol("prompt response missing OptionId"))?;

        // OptionId is 1-based.
        option_id
            .checked_sub(1)
            .and_then(|index| options.get(index as usize))
            .map(|option| (*option).to_string())
            .ok_or_else(|| Error::protocol(format!("OptionId {option_id} out of range")))
    }

    /// Shows a five-star rating dialog and waits for a rating or dismissal.
    ///
    /// # Errors
    ///
    /// - [`Error::Protocol`] if the response event is malformed
    /// - Otherwise as [`invoke_and_await_event`](Client::invoke_and_await_event)
    pub async fn rating(&self, title: &str, text: &str) -> Result<RatingReply> {
        let event = self
            .invoke_and_await_event(
                command::RATING_DISPLAY,
                command::rating_args(RATING_FEEDBACK_ID, title, text),
                &[path::EVENT_UI_RATING_RESPONSE, path::EVENT_UI_RATING_CLEARED],
            )
            .await?;

        if event.path == path::EVENT_UI_RATING_CLEARED {
            return Ok(RatingReply {
                canceled: true,
                rating: 0,
            });
        }

        let rating = event
            .first_object()?
            .get("Rating")
            .and_then(Value::as_i64)
            .ok_or_else(|| Error::protocol("rating response missing Rating"))?;

        Ok(RatingReply {
            canceled: false,
            rating,
        })
    }

    /// Shows a free-text input dialog and waits for text or dismissal.
    ///
    /// # Errors
    ///
    /// - [`Error::Protocol`] if the response event is malformed
    /// - Otherwise as [`invoke_and_await_event`](Client::invoke_and_await_event)
    pub async fn text_input(
        &self,
        text: &str,
        options: TextInputOptions,
    ) -> Result<TextInputReply> {
        let event = self
            .invoke_and_await_event(
                command::TEXT_INPUT_DISPLAY,
                options.into_args(TEXT_INPUT_FEEDBACK_ID, text),
                &[
                    path::EVENT_UI_TEXT_INPUT_RESPONSE,
                    path::EVENT_UI_TEXT_INPUT_CLEAR,
                ],
            )
            .await?;

        if event.path == path::EVENT_UI_TEXT_INPUT_CLEAR {
            return Ok(TextInputReply {
                canceled: true,
                text: String::new(),
            });
        }

        let submitted = event
            .first_object()?
            .get("Text")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::protocol("text input response missing Text"))?;

        Ok(TextInputReply {
            canceled: false,
            text: submitted.to_string(),
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::super::testutil::{TestDevice, connect_client};
    use super::*;

    fn prompt_response(option_id: u64) -> Value {
        json!({
            "jsonrpc": "2.0",
            "method": "xFeedback/Event",
            "params": {
                "Event": {
                    "UserInterface": {
                        "Message": {
                            "Prompt": {
                                "Response": {
                                    "FeedbackId": "xapi-prompt",
                                    "OptionId": option_id,
                                }
                            }
                        }
                    }
                }
            }
        })
    }

    #[tokio::test]
    async fn test_prompt_full_choreography() {
        let mut device = TestDevice::spawn(false).await;
        let client = connect_client(&device).await;
        let session = client.clone();
        tokio::spawn(async move { session.run().await });

        let caller = client.clone();
        let call = tokio::spawn(async move {
            caller
                .prompt("Lunch", "Pick one", &["Pizza", "Tacos", "Salad"])
                .await
        });

        // 1. Subscribe to the response path.
        let frame = device.next_frame().await;
        assert_eq!(frame["method"], "xFeedback/Subscribe");
        assert_eq!(
            frame["params"]["Query"],
            json!(["Event", "UserInterface", "Message", "Prompt", "Response"])
        );
        device.reply_ok(&frame["id"], json!({ "status": "OK" }));

        // 2. The display command goes out.
        let frame = device.next_frame().await;
        assert_eq!(frame["method"], "xCommand/UserInterface/Message/Prompt/Display");
        assert_eq!(frame["params"]["Option.2"], "Tacos");
        device.reply_ok(&frame["id"], json!({ "status": "OK" }));

        // 3. The user picks option 2.
        device.push_json(prompt_response(2));

        // 4. Teardown unsubscribes the response path.
        let frame = device.next_frame().await;
        assert_eq!(frame["method"], "xFeedback/Unsubscribe");
        device.reply_ok(&frame["id"], json!({ "status": "OK" }));

        let choice = call.await.expect("join").expect("prompt resolves");
        assert_eq!(choice, "Tacos");
        assert_eq!(client.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_prompt_rejects_too_many_options() {
        let device = TestDevice::spawn(true).await;
        let client = connect_client(&device).await;

        let err = client
            .prompt("T", "x", &["1", "2", "3", "4", "5", "6"])
            .await
            .expect_err("six options");
        assert!(matches!(err, Error::InvalidArgument { .. }));
    }

    #[tokio::test]
    async fn test_rating_cleared_means_canceled() {
        let mut device = TestDevice::spawn(true).await;
        let client = connect_client(&device).await;
        let session = client.clone();
        tokio::spawn(async move { session.run().await });

        let caller = client.clone();
        let call = tokio::spawn(async move { caller.rating("Rate us", "How was the call?").await });

        // Two subscribes, the display command; all auto-acked.
        let _subscribe_response = device.next_frame().await;
        let _subscribe_cleared = device.next_frame().await;
        let display = device.next_frame().await;
        assert_eq!(
            display["method"],
            "xCommand/UserInterface/Message/Rating/Display"
        );

        device.push_json(json!({
            "jsonrpc": "2.0",
            "method": "xFeedback/Event",
            "params": {
                "Event": {
                    "UserInterface": {
                        "Message": { "Rating": { "Cleared": { "FeedbackId": "xapi-rating" } } }
                    }
                }
            }
        }));

        let reply = call.await.expect("join").expect("rating resolves");
        assert_eq!(
            reply,
            RatingReply {
                canceled: true,
                rating: 0
            }
        );

        // Both paths are torn down afterwards.
        let first = device.next_frame().await;
        let second = device.next_frame().await;
        assert_eq!(first["method"], "xFeedback/Unsubscribe");
        assert_eq!(second["method"], "xFeedback/Unsubscribe");
    }

    #[tokio::test]
    async fn test_rating_response_carries_stars() {
        let mut device = TestDevice::spawn(true).await;
        let client = connect_client(&device).await;
        let session = client.clone();
        tokio::spawn(async move { session.run().await });

        let caller = client.clone();
        let call = tokio::spawn(async move { caller.rating("Rate us", "How was the call?").await });

        let _subscribe_response = device.next_frame().await;
        let _subscribe_cleared = device.next_frame().await;
        let _display = device.next_frame().await;

        device.push_json(json!({
            "jsonrpc": "2.0",
            "method": "xFeedback/Event",
            "params": {
                "Event": {
                    "UserInterface": {
                        "Message": {
                            "Rating": {
                                "Response": { "FeedbackId": "xapi-rating", "Rating": 4 }
                            }
                        }
                    }
                }
            }
        }));

        let reply = call.await.expect("join").expect("rating resolves");
        assert_eq!(
            reply,
            RatingReply {
                canceled: false,
                rating: 4
            }
        );
    }

    #[tokio::test]
    async fn test_text_input_submission() {
        let mut device = TestDevice::spawn(true).await;
        let client = connect_client(&device).await;
        let session = client.clone();
        tokio::spawn(async move { session.run().await });

        let caller = client.clone();
        let call = tokio::spawn(async move {
            caller
                .text_input("Name?", TextInputOptions::new().title("Visitor"))
                .await
        });

        let _subscribe_response = device.next_frame().await;
        let _subscribe_clear = device.next_frame().await;
        let display = device.next_frame().await;
        assert_eq!(
            display["method"],
            "xCommand/UserInterface/Message/TextInput/Display"
        );
        assert_eq!(display["params"]["Title"], "Visitor");

        device.push_json(json!({
            "jsonrpc": "2.0",
            "method": "xFeedback/Event",
            "params": {
                "Event": {
                    "UserInterface": {
                        "Message": {
                            "TextInput": {
                                "Response": { "FeedbackId": "xapi-text-input", "Text": "Ada" }
                            }
                        }
                    }
                }
            }
        }));

        let reply = call.await.expect("join").expect("text input resolves");
        assert_eq!(
            reply,
            TextInputReply {
                canceled: false,
                text: "Ada".into()
            }
        );
    }

    #[tokio::test]
    async fn test_partial_subscribe_failure_cancels_and_aggregates() {
        let mut device = TestDevice::spawn(false).await;
        let client = connect_client(&device).await;
        let session = client.clone();
        tokio::spawn(async move { session.run().await });

        let caller = client.clone();
        let call = tokio::spawn(async move { caller.rating("Rate us", "?").await });

        // First subscribe succeeds.
        let frame = device.next_frame().await;
        assert_eq!(frame["method"], "xFeedback/Subscribe");
        device.reply_ok(&frame["id"], json!({ "status": "OK" }));

        // Second subscribe is refused by the device.
        let frame = device.next_frame().await;
        assert_eq!(frame["method"], "xFeedback/Subscribe");
        device.reply_error(&frame["id"], 87, "Unknown path");

        // The partial registration is torn down before the error returns.
        let frame = device.next_frame().await;
        assert_eq!(frame["method"], "xFeedback/Unsubscribe");
        device.reply_ok(&frame["id"], json!({ "status": "OK" }));

        let err = call.await.expect("join").expect_err("rating fails");
        assert!(matches!(err, Error::Remote { code: 87, .. }));
    }

    #[tokio::test]
    async fn test_teardown_failure_is_aggregated_not_dropped() {
        let mut device = TestDevice::spawn(false).await;
        let client = connect_client(&device).await;
        let session = client.clone();
        tokio::spawn(async move { session.run().await });

        let caller = client.clone();
        let call = tokio::spawn(async move {
            caller
                .prompt("Lunch", "Pick one", &["Pizza"])
                .await
        });

        let frame = device.next_frame().await;
        device.reply_ok(&frame["id"], json!({ "status": "OK" }));
        let frame = device.next_frame().await;
        device.reply_ok(&frame["id"], json!({ "status": "OK" }));

        device.push_json(prompt_response(1));

        // The unsubscribe during teardown fails.
        let frame = device.next_frame().await;
        assert_eq!(frame["method"], "xFeedback/Unsubscribe");
        device.reply_error(&frame["id"], 99, "backend hiccup");

        let err = call.await.expect("join").expect_err("teardown surfaced");
        assert!(matches!(err, Error::Remote { code: 99, .. }));
    }
}
