//! Governance for the DAO acquisition engine.
//!
//! Members holding membership units propose acquiring a marketplace item,
//! vote with one unit of weight per unit held, and after the voting window
//! closes any member may execute the proposal. A strict yes-majority spends
//! treasury funds on the item; anything else closes the proposal untouched.
//!
//! Proposal lifecycle: Active → AwaitingExecution → Executed (terminal).

pub mod engine;
pub mod error;
pub mod params;
pub mod proposal;
pub mod shared;
pub mod snapshot;
pub mod treasury;

pub use engine::GovernanceEngine;
pub use error::GovernanceError;
pub use params::GovernanceParams;
pub use proposal::{ExecutionOutcome, Proposal, ProposalStatus};
pub use shared::SharedGovernance;
pub use snapshot::GovernanceSnapshot;
pub use treasury::Treasury;
