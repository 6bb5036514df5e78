use thiserror::Error;

#[derive(Error, Debug)]
pub enum FuzzplanError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Unrecognized substitution point with head: {0}")]
    UnknownSubstitutionType(String),

    #[error("Execution error: {0}")]
    Execution(String),

    #[error("Objective error: {0}")]
    ObjectiveParse(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FuzzplanError>;
