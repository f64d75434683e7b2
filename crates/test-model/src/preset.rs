use bookbot_model::ToolCallRequest;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The events in a preset response.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PresetEvent {
    #[serde(rename = "message_delta")]
    MessageDelta(String),
    #[serde(rename = "tool_call")]
    ToolCall(ToolCallRequest),
}

/// The preset response for an assistant step.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PresetResponse {
    /// Events in this response.
    pub events: Vec<PresetEvent>,
    /// If set, the request will fail in the first `failures` attempts.
    /// `Some(0)` means the request will fail infinitely.
    pub failures: Option<u64>,
}

impl PresetResponse {
    /// Creates a `PresetResponse` with the specified events.
    #[inline]
    pub fn with_events(events: impl Into<Vec<PresetEvent>>) -> Self {
        Self {
            events: events.into(),
            failures: None,
        }
    }

    /// Creates a response that streams `text` as one delta per word.
    pub fn text(text: &str) -> Self {
        let mut events = vec![];
        let mut rest = text;
        while let Some(idx) = rest.find(' ') {
            events.push(PresetEvent::MessageDelta(rest[..=idx].to_owned()));
            rest = &rest[idx + 1..];
        }
        if !rest.is_empty() {
            events.push(PresetEvent::MessageDelta(rest.to_owned()));
        }
        Self::with_events(events)
    }

    /// Creates a response that only calls the tool `name`.
    pub fn tool_call(name: &str, arguments: Value) -> Self {
        Self::with_events([PresetEvent::ToolCall(ToolCallRequest {
            id: format!("call:{name}"),
            name: name.to_owned(),
            arguments,
        })])
    }

    /// Sets failure times before a successful response. `0` means the
    /// response will always be a failure.
    #[inline]
    pub fn with_failures(mut self, failures: u64) -> Self {
        self.failures = Some(failures);
        self
    }

    pub(crate) fn fails_on_attempt(&self, attempt: u64) -> bool {
        match self.failures {
            None => false,
            Some(0) => true,
            Some(failures) => attempt < failures,
        }
    }
}
