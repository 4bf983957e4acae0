//! Error types shared by the dict, list, and skip list.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DictError {
    #[error("key does not exist in database")]
    KeyNotExist,
    #[error("illegal request parameter")]
    IllegalKey,
}
