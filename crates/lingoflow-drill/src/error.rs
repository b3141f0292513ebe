use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DrillError {
    #[error("Glossary is empty, add terms before starting a drill")]
    EmptyGlossary,

    #[error("Drill has already finished")]
    Closed,
}

pub type DrillResult<T> = Result<T, DrillError>;
