use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MembershipError {
    #[error("membership supply exhausted: all {max_supply} units minted")]
    SupplyExhausted { max_supply: u64 },
}
