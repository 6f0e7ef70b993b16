use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ServiceError {
    #[error("{0}")]
    AccountNotFound(String),
    #[error("{0}")]
    InsufficientFunds(String),
    #[error("{0}")]
    InvalidOperation(String),
    #[error("Invalid input data")]
    Validation(HashMap<String, String>),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Serialization error: {0}")]
    Codec(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn not_found_by_id(id: u64) -> Self {
        Self::AccountNotFound(format!("Account not found with ID: {}", id))
    }

    pub fn not_found_by_number(number: &str) -> Self {
        Self::AccountNotFound(format!("Account not found with number: {}", number))
    }
}

impl From<sled::Error> for ServiceError {
    fn from(err: sled::Error) -> Self {
        ServiceError::Storage(err.to_string())
    }
}

impl From<bincode::Error> for ServiceError {
    fn from(err: bincode::Error) -> Self {
        ServiceError::Codec(err.to_string())
    }
}
