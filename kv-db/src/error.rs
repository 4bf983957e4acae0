//! Errors surfaced by the typed value layer and command handlers.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DbError {
    #[error("key does not exist in database")]
    KeyNotExist,
    #[error("Illegal key type")]
    IllegalType,
    #[error("illegal request parameter")]
    IllegalParameter,
    #[error("key already exists")]
    KeyAlreadyExists,
    #[error("Score value overflows")]
    Overflow,
    #[error("not a number")]
    NotANumber,
}

impl From<kv_core::DictError> for DbError {
    fn from(e: kv_core::DictError) -> Self {
        match e {
            kv_core::DictError::KeyNotExist => DbError::KeyNotExist,
            kv_core::DictError::IllegalKey => DbError::IllegalParameter,
        }
    }
}
