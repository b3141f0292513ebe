use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::message::ChatMessage;
use super::term::Term;
use super::timestamp_now;

/// Unique session identifier
pub type SessionId = String;

/// One topic's notebook: briefing, glossary, notes and assistant history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: SessionId,
    pub topic: String,
    #[serde(default)]
    pub summary: Vec<String>,
    #[serde(default)]
    pub terms: Vec<Term>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub chat_history: Vec<ChatMessage>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_modified: DateTime<Utc>,
}

impl Session {
    /// Create a session with a fresh id, empty notes and empty chat history
    pub fn new(topic: impl Into<String>, summary: Vec<String>, terms: Vec<Term>) -> Self {
        let now = timestamp_now();
        Self {
            id: Uuid::new_v4().to_string(),
            topic: topic.into(),
            summary,
            terms,
            notes: String::new(),
            chat_history: Vec::new(),
            created_at: now,
            last_modified: now,
        }
    }

    /// Bump `last_modified`
    pub fn touch(&mut self) {
        let now = timestamp_now();
        // keep it monotonic even if the wall clock steps back
        self.last_modified = now.max(self.last_modified);
    }

    pub fn term(&self, id: &str) -> Option<&Term> {
        self.terms.iter().find(|t| t.id == id)
    }

    pub fn term_mut(&mut self, id: &str) -> Option<&mut Term> {
        self.terms.iter_mut().find(|t| t.id == id)
    }

    /// Insert a term at the top of the glossary
    pub fn prepend_term(&mut self, term: Term) {
        self.terms.insert(0, term);
        self.touch();
    }

    /// Overwrite the two language fields of a term
    ///
    /// Empty strings are accepted. Returns `false` if no term has that id.
    pub fn set_term_text(&mut self, id: &str, english: &str, chinese: &str) -> bool {
        let Some(term) = self.term_mut(id) else {
            return false;
        };
        term.english = english.to_string();
        term.chinese = chinese.to_string();
        self.touch();
        true
    }

    pub fn remove_term(&mut self, id: &str) -> Option<Term> {
        let index = self.terms.iter().position(|t| t.id == id)?;
        let removed = self.terms.remove(index);
        self.touch();
        Some(removed)
    }

    pub fn rename(&mut self, topic: impl Into<String>) {
        self.topic = topic.into();
        self.touch();
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) {
        self.notes = notes.into();
        self.touch();
    }

    /// Append a timestamped fragment to the notes, separated by a blank line
    pub fn capture_note(&mut self, snippet: &str, at: DateTime<chrono::Local>) {
        let fragment = format!("[{}] {}", at.format("%H:%M:%S"), snippet);
        if self.notes.is_empty() {
            self.notes = fragment;
        } else {
            self.notes.push_str("\n\n");
            self.notes.push_str(&fragment);
        }
        self.touch();
    }

    pub fn push_message(&mut self, message: ChatMessage) {
        self.chat_history.push(message);
        self.touch();
    }

    /// Most recent chat turn, used while a reply is streaming into it
    pub fn last_message_mut(&mut self) -> Option<&mut ChatMessage> {
        self.chat_history.last_mut()
    }
}
