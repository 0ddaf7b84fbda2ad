//! Reflection synthesizer
//!
//! Single streaming chairman call with the full transcript embedded in the
//! prompt and no tools offered. The chairman analyses the council output,
//! then writes its final answer after a `## Synthesis` header; the two
//! halves are emitted as separate `reflection` and `synthesis` events.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use council_domain::parse::split_reflection;
use council_domain::{CouncilEvent, GatewayEvent, Message, ModelResponse, ParticipantId, PromptTemplate};
use thiserror::Error;
use tracing::info;

use crate::events::ConsumerGone;
use crate::ports::llm_gateway::{ChatRequest, LlmGateway};
use crate::EventSender;

/// Failure of the synthesis stage
#[derive(Error, Debug)]
pub enum SynthesisError {
    #[error("Synthesis failed: {0}")]
    Failed(String),

    #[error(transparent)]
    Cancelled(#[from] ConsumerGone),
}

/// Streams the chairman's reflection and final synthesis
pub struct ReflectionSynthesizer {
    gateway: Arc<dyn LlmGateway>,
}

impl ReflectionSynthesizer {
    pub fn new(gateway: Arc<dyn LlmGateway>) -> Self {
        Self { gateway }
    }

    /// Run the synthesis pass over a formatted transcript context
    ///
    /// Emits `token` events while streaming, then `reflection` followed by
    /// `synthesis`. A missing `## Synthesis` boundary yields an empty
    /// reflection and the whole content as the synthesis.
    pub async fn synthesize(
        &self,
        chairman: &ParticipantId,
        context: &str,
        timeout: Duration,
        today: NaiveDate,
        events: &EventSender,
    ) -> Result<ModelResponse, SynthesisError> {
        info!(%chairman, "starting reflection synthesis");

        let prompt = PromptTemplate::reflection(context, today);
        let request = ChatRequest::new(chairman.clone(), vec![Message::user(prompt)])
            .with_timeout(timeout);
        let mut handle = self
            .gateway
            .open_stream(request)
            .await
            .map_err(|e| SynthesisError::Failed(e.to_string()))?;

        let mut accumulated = String::new();
        while let Some(event) = handle.next_event().await {
            match event {
                GatewayEvent::Token { content } => {
                    events.emit(CouncilEvent::Token {
                        model: Some(chairman.clone()),
                        content: content.clone(),
                    })?;
                    accumulated.push_str(&content);
                }
                GatewayEvent::Done { content, .. } => {
                    if !content.is_empty() {
                        accumulated = content;
                    }
                    break;
                }
                GatewayEvent::Error { message } => {
                    return Err(SynthesisError::Failed(message));
                }
                _ => {}
            }
        }

        let (reflection, synthesis) = split_reflection(&accumulated);
        events.emit(CouncilEvent::Reflection { text: reflection })?;
        events.emit(CouncilEvent::Synthesis {
            model: chairman.clone(),
            text: synthesis.clone(),
        })?;

        Ok(ModelResponse::new(chairman.clone(), synthesis))
    }
}
