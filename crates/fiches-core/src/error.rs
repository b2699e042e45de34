use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("invalid phone number: {0}")]
    InvalidPhone(String),
    #[error("malformed unit: {0}")]
    MalformedUnit(String),
}
