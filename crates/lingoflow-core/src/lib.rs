//! Core data model and in-memory editing logic for LingoFlow.

pub mod chat;
pub mod collab;
pub mod glossary;
pub mod package;
pub mod types;

pub use types::{
    timestamp_now, ChatMessage, ChatRole, MessageId, PrepMaterial, RawTerm, Session, SessionId,
    Term, TermId, MANUAL_ENTRY_DEFINITION, MAX_MASTERY,
};

pub use chat::{
    ChatChunk, ChatOptions, ChatRequest, ChatResponse, ChatUsage, FinishReason, ResponseFormat,
};

pub use collab::{AutoConfirm, Confirmer, NullSpeaker, Speaker};
pub use glossary::{GlossaryEditor, GlossaryError, GlossaryResult, TermDraft};
pub use package::{export_package, import_package, package_file_name};

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
