use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImportError {
    #[error("invalid row layout: {0}")]
    InvalidLayout(String),
}

pub type Result<T> = std::result::Result<T, ImportError>;
