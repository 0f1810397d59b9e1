use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GainsError {
    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

pub type GainsResult<T> = Result<T, GainsError>;
