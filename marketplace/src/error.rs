use dao_types::Amount;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MarketError {
    #[error("wrong payment amount: price is {expected}, got {got}")]
    WrongAmount { expected: Amount, got: Amount },
}
