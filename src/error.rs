use crate::domain::payee::Address;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LedgerError>;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("caller is not the administrator")]
    Unauthorized,
    #[error("payee not found: {0}")]
    NotFound(Address),
    #[error("record already exists: {0}")]
    AlreadyExists(Address),
    #[error("payee is already inactive: {0}")]
    AlreadyInactive(Address),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: u64, available: u64 },
    #[error("storage error: {0}")]
    Storage(String),
    #[error("codec error: {0}")]
    Codec(String),
    #[error("transfer failed: {0}")]
    Transfer(String),
    #[error("command parse error: {0}")]
    Parse(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
