//! Treatment chat bound to a single history entry.

use super::message::ChatMessage;
use crate::advisory::AdvisoryRequest;
use crate::classification::Confidence;
use crate::history::HistoryEntry;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Local reply when the gateway answered without any text.
pub const EMPTY_REPLY_FALLBACK: &str =
    "I'm sorry, I couldn't generate a response right now. Please try again.";

/// Local reply when the gateway could not be reached at all.
pub const CONNECTION_FALLBACK: &str = "I'm having trouble connecting to the treatment recommendation service. Please try again later.";

/// Errors raised by chat state transitions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    #[error("Message is empty")]
    EmptyInput,

    #[error("A reply is already pending")]
    ReplyPending,

    #[error("No reply is pending")]
    NoPendingTurn,

    #[error("No chat session is open")]
    NoSession,
}

/// Whether the session is waiting for the assistant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatPhase {
    Idle,
    AwaitingReply,
}

/// An open treatment conversation about one history entry.
///
/// Messages are append-only for the lifetime of the session; closing the
/// session is done by dropping it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    /// Distinguishes reopened sessions on the same entry.
    id: String,
    entry_id: String,
    diagnosis: String,
    confidence: Confidence,
    messages: Vec<ChatMessage>,
    input: String,
    phase: ChatPhase,
}

impl ChatSession {
    /// Opens a session bound to the entry's label and displayed confidence.
    pub fn open(entry: &HistoryEntry) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            entry_id: entry.id.clone(),
            diagnosis: entry.label.clone(),
            confidence: entry.display_confidence(),
            messages: Vec::new(),
            input: String::new(),
            phase: ChatPhase::Idle,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn entry_id(&self) -> &str {
        &self.entry_id
    }

    pub fn diagnosis(&self) -> &str {
        &self.diagnosis
    }

    pub fn confidence(&self) -> Confidence {
        self.confidence
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn phase(&self) -> ChatPhase {
        self.phase
    }

    /// True while a reply is pending.
    pub fn is_loading(&self) -> bool {
        self.phase == ChatPhase::AwaitingReply
    }

    /// Replaces the input buffer.
    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    /// Starts a turn from the input buffer.
    ///
    /// Appends the user message, clears the input and enters
    /// `AwaitingReply`. The returned request is what the advisory call needs.
    pub fn begin_turn(&mut self) -> Result<AdvisoryRequest, ChatError> {
        if self.is_loading() {
            return Err(ChatError::ReplyPending);
        }
        if self.input.trim().is_empty() {
            return Err(ChatError::EmptyInput);
        }

        let question = std::mem::take(&mut self.input);
        self.messages.push(ChatMessage::user(question.clone()));
        self.phase = ChatPhase::AwaitingReply;

        Ok(AdvisoryRequest::new(
            question,
            self.diagnosis.clone(),
            self.confidence,
        ))
    }

    /// Finishes the pending turn with the assistant's reply.
    ///
    /// A blank reply is replaced with [`EMPTY_REPLY_FALLBACK`].
    pub fn complete_turn(&mut self, reply: impl Into<String>) -> Result<&ChatMessage, ChatError> {
        let reply = reply.into();
        let content = if reply.trim().is_empty() {
            EMPTY_REPLY_FALLBACK.to_string()
        } else {
            reply
        };
        self.finish(content)
    }

    /// Finishes the pending turn after the call itself failed.
    pub fn fail_turn(&mut self) -> Result<&ChatMessage, ChatError> {
        self.finish(CONNECTION_FALLBACK.to_string())
    }

    fn finish(&mut self, content: String) -> Result<&ChatMessage, ChatError> {
        if !self.is_loading() {
            return Err(ChatError::NoPendingTurn);
        }
        self.messages.push(ChatMessage::assistant(content));
        self.phase = ChatPhase::Idle;
        Ok(&self.messages[self.messages.len() - 1])
    }
}
