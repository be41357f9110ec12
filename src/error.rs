//! Error type shared by the diagram model, the editor and the file formats

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiagramError {
    #[error("There's already one initial transition, delete it first to add another one")]
    DuplicateInitialTransition,
    #[error("Unknown state: {0}")]
    UnknownState(String),
    #[error("Unknown transition")]
    UnknownTransition,
    #[error("A state named '{0}' already exists")]
    DuplicateId(String),
    #[error("'{0}' is reserved for the initial pseudo-state")]
    ReservedId(String),
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
    #[error("Malformed diagram: {0}")]
    MalformedDiagram(String),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type DiagramResult<T> = Result<T, DiagramError>;
