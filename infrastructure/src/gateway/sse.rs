//! SSE decoding for chat-completions streams
//!
//! [`SseDecoder`] turns raw byte chunks into [`GatewayEvent`]s. Blocks are
//! separated by blank lines; each `data:` payload is one JSON chunk, and
//! `data: [DONE]` terminates the stream. Content deltas accumulate so the
//! terminal `Done` event carries the full text even when the upstream never
//! repeats it.

use council_domain::GatewayEvent;
use tracing::warn;

use super::protocol::StreamChunk;

#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: String,
    content: String,
    finished: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk of body text, draining any completed SSE blocks
    pub fn push(&mut self, chunk: &str) -> Vec<GatewayEvent> {
        let mut events = Vec::new();
        if self.finished {
            return events;
        }
        self.buffer.push_str(chunk);

        while let Some(pos) = self.buffer.find("\n\n") {
            let block = self.buffer[..pos].to_string();
            self.buffer.drain(..pos + 2);

            for line in block.lines() {
                let Some(data) = line.strip_prefix("data: ") else {
                    continue;
                };
                if data.trim() == "[DONE]" {
                    self.finished = true;
                    events.push(GatewayEvent::done(std::mem::take(&mut self.content)));
                    return events;
                }
                match serde_json::from_str::<StreamChunk>(data) {
                    Ok(chunk) => self.decode_chunk(chunk, &mut events),
                    Err(error) => {
                        warn!(%error, data, "unparsable stream chunk");
                    }
                }
            }
        }
        events
    }

    /// Close the stream; emits the terminal `Done` if `[DONE]` never came
    pub fn finish(&mut self) -> Option<GatewayEvent> {
        if self.finished {
            return None;
        }
        self.finished = true;
        Some(GatewayEvent::done(std::mem::take(&mut self.content)))
    }

    /// True once a terminal event has been produced
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn decode_chunk(&mut self, chunk: StreamChunk, events: &mut Vec<GatewayEvent>) {
        for choice in chunk.choices {
            let Some(delta) = choice.delta else { continue };
            if let Some(content) = delta.content
                && !content.is_empty()
            {
                self.content.push_str(&content);
                events.push(GatewayEvent::Token { content });
            }
            if let Some(tool_calls) = delta.tool_calls {
                for call in tool_calls {
                    let (name, arguments) = call
                        .function
                        .map(|f| (f.name, f.arguments.unwrap_or_default()))
                        .unwrap_or((None, String::new()));
                    events.push(GatewayEvent::ToolCallFragment {
                        index: call.index,
                        id: call.id,
                        name,
                        arguments,
                    });
                }
            }
        }
    }
}
