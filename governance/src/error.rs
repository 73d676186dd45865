use dao_marketplace::MarketError;
use dao_types::{Amount, Identity, ItemId, ProposalIndex};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GovernanceError {
    #[error("{0} holds no membership units")]
    NotAMember(Identity),

    #[error("{0} is not available for purchase")]
    ItemUnavailable(ItemId),

    #[error("proposal {0} does not exist")]
    NoSuchProposal(ProposalIndex),

    #[error("voting on proposal {0} has closed")]
    VotingClosed(ProposalIndex),

    #[error("voting on proposal {0} is still active")]
    VotingStillActive(ProposalIndex),

    #[error("every unit held by {voter} has already voted on proposal {index}")]
    AlreadyVoted {
        index: ProposalIndex,
        voter: Identity,
    },

    #[error("proposal {0} has already been executed")]
    AlreadyExecuted(ProposalIndex),

    #[error("insufficient treasury: need {needed}, have {available}")]
    InsufficientTreasury { needed: Amount, available: Amount },

    #[error("{0} is not the administrator")]
    NotAuthorized(Identity),

    #[error(transparent)]
    Market(#[from] MarketError),

    #[error("invalid governance parameters: {0}")]
    InvalidParams(String),

    #[error("arithmetic overflow in governance accounting")]
    Overflow,

    #[error("snapshot error: {0}")]
    Snapshot(String),
}
