//! Streaming assistant turns appended to a session's chat history.

use std::sync::Arc;

use futures::StreamExt;
use lingoflow_core::chat::{ChatChunk, ChatRequest};
use lingoflow_core::{ChatMessage, Session};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::provider::LLMProvider;

/// Text that replaces a reply whose stream failed
pub const CONNECTION_LOST_REPLY: &str = "Sorry, I lost connection. Please try again.";

const SYSTEM_INSTRUCTION: &str = "You are an expert consultant for professional interpreters. \
Your goal is to explain concepts clearly and comprehensively. \
CRITICAL RULE: Whenever you mention a key technical term, concept, or idiomatic expression in your explanation, \
YOU MUST provide the Chinese translation in parentheses immediately following it. \
Example: \"The solid-state battery (固态电池) offers higher energy density (能量密度) compared to traditional lithium-ion batteries (锂离子电池).\"";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssistantError {
    #[error("message must not be blank")]
    BlankMessage,
}

/// How a turn ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The stream ran to completion
    Completed,
    /// The stream failed and the reply was replaced by the apology
    Failed { error: String },
    /// The caller cancelled; partial text is kept
    Cancelled,
}

/// Conversational assistant bound to one provider
pub struct Assistant {
    provider: Arc<dyn LLMProvider>,
    model: Option<String>,
    system_instruction: String,
}

impl Assistant {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self {
            provider,
            model: None,
            system_instruction: SYSTEM_INSTRUCTION.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = instruction.into();
        self
    }

    pub fn system_instruction(&self) -> &str {
        &self.system_instruction
    }

    fn request(&self, history: Vec<ChatMessage>, message: &str) -> ChatRequest {
        let model = self
            .model
            .clone()
            .unwrap_or_else(|| self.provider.default_model().to_string());
        ChatRequest::new(model)
            .with_system_instruction(self.system_instruction.clone())
            .with_messages(history)
            .with_prompt(message)
            .stream()
    }

    /// Run one turn against `session`
    ///
    /// The user message and an empty model reply are appended before the
    /// request goes out. `on_update` receives each fragment and the reply so
    /// far, in arrival order.
    pub async fn send<F>(
        &self,
        session: &mut Session,
        message: &str,
        cancel: &CancellationToken,
        mut on_update: F,
    ) -> Result<TurnOutcome, AssistantError>
    where
        F: FnMut(&str, &str),
    {
        if message.trim().is_empty() {
            return Err(AssistantError::BlankMessage);
        }

        let history = session.chat_history.clone();
        session.push_message(ChatMessage::user(message));
        session.push_message(ChatMessage::placeholder());

        let request = self.request(history, message);
        info!(session = %session.id, turns = request.messages.len(), "assistant turn started");

        let opened = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!(session = %session.id, "assistant turn cancelled before the stream opened");
                return Ok(TurnOutcome::Cancelled);
            }
            opened = self.provider.chat_stream(request) => opened,
        };
        let mut stream = match opened {
            Ok(stream) => stream,
            Err(e) => return Ok(fail(session, e.to_string())),
        };

        let mut reply = String::new();
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!(session = %session.id, chars = reply.len(), "assistant turn cancelled");
                    return Ok(TurnOutcome::Cancelled);
                }
                next = stream.next() => next,
            };

            match next {
                None => break,
                Some(Ok(ChatChunk::Content { text })) => {
                    reply.push_str(&text);
                    set_reply(session, &reply);
                    debug!(fragment = text.len(), total = reply.len(), "assistant fragment");
                    on_update(&text, &reply);
                }
                Some(Ok(ChatChunk::Error { message })) => return Ok(fail(session, message)),
                Some(Ok(_)) => {}
                Some(Err(e)) => return Ok(fail(session, e.to_string())),
            }
        }

        info!(session = %session.id, chars = reply.len(), "assistant turn completed");
        Ok(TurnOutcome::Completed)
    }
}

fn set_reply(session: &mut Session, text: &str) {
    if let Some(last) = session.last_message_mut() {
        last.text = text.to_string();
    }
    session.touch();
}

fn fail(session: &mut Session, error: String) -> TurnOutcome {
    warn!(session = %session.id, "assistant stream failed: {}", error);
    set_reply(session, CONNECTION_LOST_REPLY);
    TurnOutcome::Failed { error }
}
