use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error{
    #[error("invalid configuration: {0}")]
    Configuration(String),
    #[error("input validation failed: {0}")]
    InputValidation(&'static str),
    #[error("integrity check failed")]
    Integrity,
    #[error("malformed ticket")]
    Parse,
    #[error("cipher operation failed")]
    Crypto,
    #[error("unable to encode ticket: {0}")]
    Encode(String),
    /// The only decode failure that leaves the codec, whatever stage rejected the input.
    #[error("invalid ticket")]
    InvalidTicket,
}

pub type Result<T> = std::result::Result<T, Error>;
