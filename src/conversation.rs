//! Conversation transcript storage
//!
//! Append-only, ordered log of messages. Insertion order is display order.

use crate::models::{CompanyAnalysis, Message, Sender};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Transcript for one console session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationStore {
    created_at: DateTime<Utc>,
    /// Time of the last append
    updated_at: DateTime<Utc>,
    messages: Vec<Message>,
    /// Next message sequence number; ids are never reused
    next_seq: u64,
}

impl ConversationStore {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            created_at: now,
            updated_at: now,
            messages: Vec::new(),
            next_seq: 1,
        }
    }

    /// Append a message and return its id
    pub fn append(
        &mut self,
        sender: Sender,
        text: impl Into<String>,
        analysis_data: Option<CompanyAnalysis>,
    ) -> String {
        let id = format!("msg-{:06}", self.next_seq);
        self.next_seq += 1;
        let now = Utc::now();

        self.messages.push(Message {
            id: id.clone(),
            text: text.into(),
            sender,
            timestamp: now,
            analysis_data,
        });
        self.updated_at = now;

        id
    }

    pub fn append_user(&mut self, text: impl Into<String>) -> String {
        self.append(Sender::User, text, None)
    }

    pub fn append_system(&mut self, text: impl Into<String>) -> String {
        self.append(Sender::System, text, None)
    }

    /// All messages in insertion order
    pub fn all(&self) -> &[Message] {
        &self.messages
    }

    /// Messages appended after the first `offset` ones
    pub fn since(&self, offset: usize) -> &[Message] {
        self.messages.get(offset..).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new()
    }
}
