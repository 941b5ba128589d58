//! Hierarchical paths into the device's status, command, and event tree.
//!
//! A [`Path`] is a space-delimited address like `"Status Audio Volume"`. It
//! renders three ways: as the query list a feedback subscription expects, as
//! the parameter list `xGet` expects, and as a dot-delimited JSONPath used to
//! probe incoming notification payloads.
//!
//! The catalog below covers the well-known paths; anything the device
//! understands can be addressed by constructing a [`Path`] from an arbitrary
//! string — no segment validation is performed.

// ============================================================================
// Imports
// ============================================================================

use std::borrow::Cow;
use std::fmt;
use std::str::SplitWhitespace;

use serde_json::{Value, json};

// ============================================================================
// Path
// ============================================================================

/// A hierarchical, space-delimited path into the device's namespace.
///
/// Segment order is significant and preserved by every rendering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Path(Cow<'static, str>);

impl Path {
    /// Creates a path from a static string. Used by the catalog consts.
    #[inline]
    #[must_use]
    pub const fn from_static(path: &'static str) -> Self {
        Self(Cow::Borrowed(path))
    }

    /// Creates a path from an arbitrary string.
    ///
    /// Segments are whitespace-delimited; no validation is performed, so
    /// paths not listed in the catalog work the same way.
    #[inline]
    pub fn new(path: impl Into<String>) -> Self {
        Self(Cow::Owned(path.into()))
    }

    /// Returns the raw space-delimited form.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterates the path's segments in order.
    #[inline]
    pub fn segments(&self) -> SplitWhitespace<'_> {
        self.0.split_whitespace()
    }

    /// Returns the number of segments.
    #[inline]
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.segments().count()
    }

    /// Renders the parameters for a feedback subscribe/unsubscribe command.
    ///
    /// Shape: `{"Query": ["Status", "Audio", "Volume"]}`.
    #[must_use]
    pub fn to_subscribe_query(&self) -> Value {
        json!({ "Query": self.segments().collect::<Vec<_>>() })
    }

    /// Renders the parameters for an `xGet` command.
    ///
    /// Shape: `{"Path": ["Status", "Audio", "Volume"]}`.
    #[must_use]
    pub fn to_get_params(&self) -> Value {
        json!({ "Path": self.segments().collect::<Vec<_>>() })
    }

    /// Renders the dot-delimited query used to match notification payloads.
    ///
    /// Shape: `$.Status.Audio.Volume`. A notification carries data for this
    /// path when the query yields a non-empty result against its payload.
    #[must_use]
    pub fn to_dot_path(&self) -> String {
        let mut query = String::from("$");
        for segment in self.segments() {
            query.push('.');
            query.push_str(segment);
        }
        query
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Path {
    #[inline]
    fn from(path: String) -> Self {
        Self::new(path)
    }
}

impl From<&str> for Path {
    #[inline]
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// Root of the status tree.
pub const STATUS: Path = Path::from_static("Status");
/// System unit status.
pub const STATUS_SYSTEM_UNIT: Path = Path::from_static("Status SystemUnit");
/// Number of active calls.
pub const STATUS_SYSTEM_UNIT_STATE_NUMBER_OF_ACTIVE_CALLS: Path =
    Path::from_static("Status SystemUnit State NumberOfActiveCalls");
/// Speaker volume level.
pub const STATUS_AUDIO_VOLUME: Path = Path::from_static("Status Audio Volume");
/// Microphone mute state.
pub const STATUS_AUDIO_MICROPHONES_MUTE: Path =
    Path::from_static("Status Audio Microphones Mute");
/// Main video mute state.
pub const STATUS_VIDEO_INPUT_MAIN_VIDEO_MUTE: Path =
    Path::from_static("Status Video Input MainVideoMute");

/// Root of the event tree.
pub const EVENT: Path = Path::from_static("Event");
/// All user interface events.
pub const EVENT_USER_INTERFACE: Path = Path::from_static("Event UserInterface");
/// All UI extension events.
pub const EVENT_UI_EXTENSIONS: Path = Path::from_static("Event UserInterface Extensions");
/// UI extension widget events.
pub const EVENT_UI_EXTENSIONS_EVENT: Path =
    Path::from_static("Event UserInterface Extensions Event");
/// Widget released.
pub const EVENT_UI_EXTENSIONS_EVENT_RELEASED: Path =
    Path::from_static("Event UserInterface Extensions Event Released");
/// Widget pressed.
pub const EVENT_UI_EXTENSIONS_EVENT_PRESSED: Path =
    Path::from_static("Event UserInterface Extensions Event Pressed");
/// Widget value changed.
pub const EVENT_UI_EXTENSIONS_EVENT_CHANGED: Path =
    Path::from_static("Event UserInterface Extensions Event Changed");
/// Widget action (press, release, change) events.
pub const EVENT_UI_WIDGET_ACTION: Path =
    Path::from_static("Event UserInterface Extensions Widget Action");
/// Custom panel clicked.
pub const EVENT_UI_PANEL_CLICKED: Path =
    Path::from_static("Event UserInterface Extensions Panel Clicked");
/// Custom panel closed.
pub const EVENT_UI_PANEL_CLOSE: Path =
    Path::from_static("Event UserInterface Extensions Panel Close");
/// Custom panel opened.
pub const EVENT_UI_PANEL_OPEN: Path =
    Path::from_static("Event UserInterface Extensions Panel Open");

/// User answered a prompt dialog.
pub const EVENT_UI_PROMPT_RESPONSE: Path =
    Path::from_static("Event UserInterface Message Prompt Response");
/// User submitted a rating dialog.
pub const EVENT_UI_RATING_RESPONSE: Path =
    Path::from_static("Event UserInterface Message Rating Response");
/// User submitted a text-input dialog.
pub const EVENT_UI_TEXT_INPUT_RESPONSE: Path =
    Path::from_static("Event UserInterface Message TextInput Response");
/// A text-input dialog was dismissed without input.
pub const EVENT_UI_TEXT_INPUT_CLEAR: Path =
    Path::from_static("Event UserInterface Message TextInput Clear");
/// An alert was cleared.
pub const EVENT_UI_ALERT_CLEARED: Path =
    Path::from_static("Event UserInterface Message Alert Cleared");
/// A rating dialog was cleared without a rating.
pub const EVENT_UI_RATING_CLEARED: Path =
    Path::from_static("Event UserInterface Message Rating Cleared");
/// A text line was cleared.
pub const EVENT_UI_TEXT_LINE_CLEARED: Path =
    Path::from_static("Event UserInterface Message TextLine Cleared");

/// Device is shutting down.
pub const EVENT_SHUTDOWN: Path = Path::from_static("Event Shutdown");
/// An incoming call is ringing.
pub const EVENT_INCOMING_CALL_INDICATION: Path =
    Path::from_static("Event IncomingCallIndication");

// ============================================================================
// Tests
// ============================================================================
