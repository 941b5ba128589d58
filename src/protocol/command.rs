//! Command catalog and argument shaping.
//!
//! Commands are the device's own method strings (`xCommand/...`,
//! `xFeedback/...`, `xGet`). The catalog covers what this crate drives
//! directly; a [`Command`] can also be built from any string, so methods not
//! listed here remain reachable through
//! [`Client::invoke`](crate::Client::invoke).
//!
//! Argument payloads use the device's PascalCase field names (`Title`,
//! `Text`, `Duration`), with durations carried as seconds.

// ============================================================================
// Imports
// ============================================================================

use std::borrow::Cow;
use std::fmt;
use std::time::Duration;

use serde::Serialize;
use serde_json::{Map, Value, json};

// ============================================================================
// Command
// ============================================================================

/// A remote method name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Command(Cow<'static, str>);

impl Command {
    /// Creates a command from a static method string.
    #[inline]
    #[must_use]
    pub const fn from_static(method: &'static str) -> Self {
        Self(Cow::Borrowed(method))
    }

    /// Creates a command from an arbitrary method string.
    #[inline]
    pub fn new(method: impl Into<String>) -> Self {
        Self(Cow::Owned(method.into()))
    }

    /// Returns the raw method string.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// Update a UI extension widget with a new value.
pub const WIDGET_SET_VALUE: Command =
    Command::from_static("xCommand/UserInterface/Extensions/Widget/SetValue");
/// Display an alert in the corner of the screen.
pub const ALERT_DISPLAY: Command =
    Command::from_static("xCommand/UserInterface/Message/Alert/Display");
/// Display a multiple-choice prompt dialog.
pub const PROMPT_DISPLAY: Command =
    Command::from_static("xCommand/UserInterface/Message/Prompt/Display");
/// Display a free-text input dialog.
pub const TEXT_INPUT_DISPLAY: Command =
    Command::from_static("xCommand/UserInterface/Message/TextInput/Display");
/// Display a five-star rating dialog.
pub const RATING_DISPLAY: Command =
    Command::from_static("xCommand/UserInterface/Message/Rating/Display");
/// Display a line of text centered on the screen.
pub const TEXT_LINE_DISPLAY: Command =
    Command::from_static("xCommand/UserInterface/Message/TextLine/Display");
/// Mute the microphones.
pub const MICROPHONES_MUTE: Command = Command::from_static("xCommand/Audio/Microphones/Mute");
/// Unmute the microphones.
pub const MICROPHONES_UNMUTE: Command = Command::from_static("xCommand/Audio/Microphones/Unmute");
/// Register for feedback on a path.
pub const FEEDBACK_SUBSCRIBE: Command = Command::from_static("xFeedback/Subscribe");
/// Deregister feedback on a path.
pub const FEEDBACK_UNSUBSCRIBE: Command = Command::from_static("xFeedback/Unsubscribe");
/// Read a status, configuration, or UI value.
pub const GET: Command = Command::from_static("xGet");

// ============================================================================
// Field Names
// ============================================================================

pub(crate) const TITLE_FIELD: &str = "Title";
pub(crate) const TEXT_FIELD: &str = "Text";
pub(crate) const DURATION_FIELD: &str = "Duration";
pub(crate) const FEEDBACK_ID_FIELD: &str = "FeedbackId";

/// The prompt dialog supports at most five options (`Option.1`..`Option.5`).
pub const MAX_PROMPT_OPTIONS: usize = 5;

// ============================================================================
// Argument Shaping
// ============================================================================

/// Arguments for an alert display.
pub(crate) fn alert_args(title: &str, text: &str, duration: Duration) -> Value {
    json!({
        TITLE_FIELD: title,
        TEXT_FIELD: text,
        DURATION_FIELD: duration.as_secs_f64(),
    })
}

/// Arguments for a text line display.
pub(crate) fn text_line_args(text: &str, duration: Duration) -> Value {
    json!({
        TEXT_FIELD: text,
        DURATION_FIELD: duration.as_secs_f64(),
    })
}

/// Arguments for a widget value update.
pub(crate) fn widget_set_value_args(widget_id: &str, value: &Value) -> Value {
    json!({
        "WidgetId": widget_id,
        "Value": value,
    })
}

/// Arguments for a prompt display.
///
/// Options become `Option.1` through `Option.N` in order.
pub(crate) fn prompt_args(feedback_id: &str, title: &str, text: &str, options: &[&str]) -> Value {
    let mut args = Map::new();
    args.insert(FEEDBACK_ID_FIELD.into(), feedback_id.into());
    args.insert(TITLE_FIELD.into(), title.into());
    args.insert(TEXT_FIELD.into(), text.into());
    for (index, option) in options.iter().enumerate() {
        args.insert(format!("Option.{}", index + 1), (*option).into());
    }
    Value::Object(args)
}

/// Arguments for a rating display.
pub(crate) fn rating_args(feedback_id: &str, title: &str, text: &str) -> Value {
    json!({
        FEEDBACK_ID_FIELD: feedback_id,
        TITLE_FIELD: title,
        TEXT_FIELD: text,
    })
}

// ============================================================================
// Text Input Options
// ============================================================================

/// Which keyboard the text-input dialog shows and whether input is masked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InputType {
    /// Plain single-line input with the full keyboard.
    SingleLine,
    /// Numeric-friendly keyboard.
    Numeric,
    /// Masked input with the full keyboard.
    Password,
    /// Masked input with the numeric keyboard.
    #[serde(rename = "PIN")]
    Pin,
}

/// Optional settings for a text-input dialog.
///
/// ```ignore
/// let opts = TextInputOptions::new()
///     .title("Door code")
///     .input_type(InputType::Pin)
///     .duration(Duration::from_secs(30));
/// client.text_input("Enter the door code", opts).await?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct TextInputOptions {
    title: Option<String>,
    input_text: Option<String>,
    input_type: Option<InputType>,
    keyboard_hidden: bool,
    placeholder: Option<String>,
    submit_text: Option<String>,
    duration: Option<Duration>,
}

impl TextInputOptions {
    /// Creates an empty option set; the device applies its defaults.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Title shown above the input box. Default is blank.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Description of what the input box is for.
    #[must_use]
    pub fn input_text(mut self, text: impl Into<String>) -> Self {
        self.input_text = Some(text.into());
        self
    }

    /// Keyboard and masking behavior.
    #[must_use]
    pub fn input_type(mut self, input_type: InputType) -> Self {
        self.input_type = Some(input_type);
        self
    }

    /// Keeps the on-screen keyboard closed while the dialog is up.
    #[must_use]
    pub fn keyboard_hidden(mut self) -> Self {
        self.keyboard_hidden = true;
        self
    }

    /// Text pre-filling the box; cleared once the user starts typing.
    #[must_use]
    pub fn placeholder(mut self, text: impl Into<String>) -> Self {
        self.placeholder = Some(text.into());
        self
    }

    /// Label of the submit button.
    #[must_use]
    pub fn submit_text(mut self, text: impl Into<String>) -> Self {
        self.submit_text = Some(text.into());
        self
    }

    /// How long the dialog stays on screen. Zero (the device default) means
    /// it must be dismissed or cleared explicitly.
    #[must_use]
    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Renders the full argument payload for a text-input display.
    pub(crate) fn into_args(self, feedback_id: &str, text: &str) -> Value {
        let mut args = Map::new();
        args.insert(FEEDBACK_ID_FIELD.into(), feedback_id.into());
        args.insert(TEXT_FIELD.into(), text.into());
        if let Some(title) = self.title {
            args.insert(TITLE_FIELD.into(), title.into());
        }
        if let Some(input_text) = self.input_text {
            args.insert("InputText".into(), input_text.into());
        }
        if let Some(input_type) = self.input_type {
            args.insert("InputType".into(), json!(input_type));
        }
        if self.keyboard_hidden {
            args.insert("KeyboardState".into(), "Closed".into());
        }
        if let Some(placeholder) = self.placeholder {
            args.insert("Placeholder".into(), placeholder.into());
        }
        if let Some(submit_text) = self.submit_text {
            args.insert("SubmitText".into(), submit_text.into());
        }
        if let Some(duration) = self.duration {
            args.insert(DURATION_FIELD.into(), json!(duration.as_secs_f64()));
        }
        Value::Object(args)
    }
}

// ============================================================================
// Tests
// ============================================================================
