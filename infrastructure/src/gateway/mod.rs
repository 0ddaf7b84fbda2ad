//! OpenRouter-compatible gateway adapter
//!
//! Implements the [`LlmGateway`](council_application::LlmGateway) port over
//! the chat-completions HTTP contract: non-streaming JSON responses and SSE
//! `data:` streams with a terminal `data: [DONE]` line.

mod client;
mod protocol;
mod sse;

pub use client::OpenRouterGateway;
