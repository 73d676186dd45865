//! Parsing errors for the shared value types.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypesError {
    #[error("invalid identity: {0:?}")]
    InvalidIdentity(String),

    #[error("invalid amount: {0:?}")]
    InvalidAmount(String),

    #[error("invalid vote direction: {0:?} (expected \"yes\" or \"no\")")]
    InvalidVote(String),
}
