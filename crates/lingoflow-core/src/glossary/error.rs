use thiserror::Error;

/// Glossary editing and tabular import/export errors
#[derive(Error, Debug)]
pub enum GlossaryError {
    #[error("Term not found: {0}")]
    TermNotFound(String),

    #[error("No term is being edited")]
    NotEditing,

    #[error("Missing header row")]
    MissingHeader,

    #[error("Unknown column layout: {0}")]
    BadHeader(String),

    #[error("Unterminated quoted field starting on line {line}")]
    UnterminatedQuote { line: usize },

    #[error("Row {row} has {found} fields, expected at least {expected}")]
    ShortRow {
        row: usize,
        found: usize,
        expected: usize,
    },
}

pub type GlossaryResult<T> = Result<T, GlossaryError>;
