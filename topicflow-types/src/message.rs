//! Message - the immutable value published on topics.

use std::fmt;
use std::sync::Arc;

use crate::current_timestamp_ms;

/// An immutable value with a textual and a numeric representation.
///
/// The text is stored verbatim. The numeric value is parsed from the text
/// once at construction; text that is not a number yields `NaN` instead of
/// an error, so construction is total.
///
/// Cloning is cheap: the text is shared.
///
/// # Example
///
/// ```rust
/// use topicflow_types::Message;
///
/// let n = Message::from_number(4.0);
/// assert_eq!(n.text(), "4.0");
/// assert_eq!(n.value(), 4.0);
///
/// let t = Message::from_text("hello");
/// assert_eq!(t.text(), "hello");
/// assert!(t.value().is_nan());
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(from = "MessageRepr", into = "MessageRepr")
)]
pub struct Message {
    text: Arc<str>,
    value: f64,
    timestamp_ms: u64,
}

impl Message {
    /// Create a message from text. Never fails.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self::with_timestamp(text, current_timestamp_ms())
    }

    /// Create a message from a number.
    ///
    /// The number is formatted to text first so both representations agree.
    pub fn from_number(value: f64) -> Self {
        Self::from_text(format_number(value))
    }

    /// Create a message from raw bytes, decoding them as (lossy) UTF-8.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self::from_text(String::from_utf8_lossy(bytes).into_owned())
    }

    /// Create a message with a specific timestamp (milliseconds since Unix epoch).
    pub fn with_timestamp(text: impl Into<String>, timestamp_ms: u64) -> Self {
        let text: String = text.into();
        let value = parse_number(&text);
        Self {
            text: Arc::from(text),
            value,
            timestamp_ms,
        }
    }

    /// The text exactly as it was given.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The raw bytes of the text.
    pub fn as_bytes(&self) -> &[u8] {
        self.text.as_bytes()
    }

    /// The parsed numeric value, `NaN` when the text is not a number.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Returns true when the text did not parse as a number.
    pub fn is_nan(&self) -> bool {
        self.value.is_nan()
    }

    /// Creation time in milliseconds since Unix epoch.
    pub fn timestamp_ms(&self) -> u64 {
        self.timestamp_ms
    }
}

impl Default for Message {
    /// The zero-valued message every topic starts with.
    fn default() -> Self {
        Self::from_number(0.0)
    }
}

impl From<f64> for Message {
    fn from(value: f64) -> Self {
        Self::from_number(value)
    }
}

impl From<&str> for Message {
    fn from(text: &str) -> Self {
        Self::from_text(text)
    }
}

impl From<String> for Message {
    fn from(text: String) -> Self {
        Self::from_text(text)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Format a number so that parsing the text gives the number back.
///
/// Integral values keep a fractional part (`4.0`, not `4`). Infinities are
/// written `Infinity` / `-Infinity`.
fn format_number(value: f64) -> String {
    if value.is_infinite() {
        let sign = if value < 0.0 { "-" } else { "" };
        format!("{}Infinity", sign)
    } else {
        format!("{:?}", value)
    }
}

/// Parse decimal text. The only accepted spelling of infinity is an
/// optionally signed `Infinity`; `inf` and case variants are not numbers.
fn parse_number(text: &str) -> f64 {
    let text = text.trim();
    let unsigned = text.strip_prefix(['+', '-']).unwrap_or(text);
    if unsigned.starts_with(|c: char| c.is_ascii_alphabetic()) && unsigned != "Infinity" {
        return f64::NAN;
    }
    text.parse::<f64>().unwrap_or(f64::NAN)
}

/// Wire form: the numeric value is re-derived from the text on the way in.
#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct MessageRepr {
    text: String,
    #[serde(default)]
    timestamp_ms: u64,
}

#[cfg(feature = "serde")]
impl From<MessageRepr> for Message {
    fn from(repr: MessageRepr) -> Self {
        Message::with_timestamp(repr.text, repr.timestamp_ms)
    }
}

#[cfg(feature = "serde")]
impl From<Message> for MessageRepr {
    fn from(msg: Message) -> Self {
        MessageRepr {
            text: msg.text.to_string(),
            timestamp_ms: msg.timestamp_ms,
        }
    }
}
