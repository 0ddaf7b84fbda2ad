//! Streaming events for gateway communication
//!
//! [`GatewayEvent`] represents individual events in a streaming gateway
//! response. The raw transport emits `Token` and `ToolCallFragment` events;
//! the tool loop layers `ToolResult` on top and always closes the stream
//! with exactly one terminal event (`Done` or `Error`).

use serde::{Deserialize, Serialize};

use super::tool::ToolCallRecord;

/// An event in a streaming gateway response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GatewayEvent {
    /// A text chunk from the model
    Token { content: String },
    /// A streaming tool-call fragment
    ///
    /// `index` is the merge key; `id` and `name` appear only on the first
    /// fragment of a call.
    ToolCallFragment {
        index: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        arguments: String,
    },
    /// Result of an executed tool call, bound to its originating call
    ToolResult {
        tool_call_id: String,
        name: String,
        content: String,
    },
    /// Terminal: the assistant finished its turn
    Done {
        content: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls_made: Vec<ToolCallRecord>,
    },
    /// Terminal: the stream failed
    Error { message: String },
}

impl GatewayEvent {
    pub fn done(content: impl Into<String>) -> Self {
        Self::Done {
            content: content.into(),
            tool_calls_made: Vec::new(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Returns true if this event closes the stream
    pub fn is_terminal(&self) -> bool {
        matches!(self, GatewayEvent::Done { .. } | GatewayEvent::Error { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_classification() {
        assert!(GatewayEvent::done("").is_terminal());
        assert!(GatewayEvent::error("boom").is_terminal());
        assert!(
            !GatewayEvent::Token {
                content: "hi".into()
            }
            .is_terminal()
        );
    }

    #[test]
    fn test_tagged_serialization() {
        let event = GatewayEvent::Token {
            content: "hello".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "token");
        assert_eq!(json["content"], "hello");
    }
}
