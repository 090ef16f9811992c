use chrono::NaiveDateTime;
use serde::Serialize;

/// Longest body kept in a chat message. Older lines are dropped first.
pub const MAX_MESSAGE_CHARS: usize = 3900;

/// Plain-text chat message: a timestamp header plus the tail of a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessagePayload {
    pub text: String,
}

impl MessagePayload {
    pub fn new(body: &str, timestamp: NaiveDateTime) -> Self {
        let body = tail_chars(body, MAX_MESSAGE_CHARS);
        let text = format!(
            "Delivery report {}\n{}",
            timestamp.format("%Y-%m-%d %H:%M"),
            body
        );
        Self { text }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Body for webhook and `chat.postMessage` requests.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({ "text": self.text })
    }

    /// Same as [`to_json`](Self::to_json) with a target channel or user id.
    pub fn to_json_for(&self, channel: &str) -> serde_json::Value {
        serde_json::json!({ "channel": channel, "text": self.text })
    }
}

/// Last `max` characters of `s`, never splitting a code point.
pub fn tail_chars(s: &str, max: usize) -> &str {
    let count = s.chars().count();
    if count <= max {
        return s;
    }
    match s.char_indices().nth(count - max) {
        Some((idx, _)) => &s[idx..],
        None => "",
    }
}
