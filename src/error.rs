use thiserror::Error;

use crate::account::Address;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Only oracle can call this function")]
    Unauthorized { caller: Address },
    #[error("Too early to rebase: {elapsed}s elapsed, cooldown is {cooldown}s")]
    TooEarly { elapsed: u64, cooldown: u64 },
    #[error("Insufficient balance: available {available}, requested {requested}")]
    InsufficientBalance { available: u128, requested: u128 },
    #[error("Arithmetic overflow")]
    Overflow,
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
    #[error("Invalid state: {0}")]
    InvalidState(String),
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("I/O error: {0}")]
    Io(String),
    #[error("Ledger lock poisoned")]
    LockPoisoned,
}

pub type Result<T> = std::result::Result<T, LedgerError>;

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        LedgerError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        LedgerError::Serialization(err.to_string())
    }
}
