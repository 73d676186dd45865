//! Acquisition proposals and their lifecycle.

use dao_types::{Amount, Identity, ItemId, Timestamp, UnitId, VoteDirection};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Where a proposal stands at a given moment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalStatus {
    /// Before the deadline: votes are accepted.
    Active,
    /// Deadline reached, not yet executed.
    AwaitingExecution,
    /// Terminal.
    Executed,
}

/// What execution did.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionOutcome {
    /// Yes outweighed no; the item was bought for `price`.
    Purchased { item: ItemId, price: Amount },
    /// Tie or no-majority; nothing was bought.
    Rejected,
}

/// A request to spend treasury funds acquiring one marketplace item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub item_id: ItemId,
    pub proposer: Identity,
    pub created_at: Timestamp,
    /// Voting closes at this instant; execution opens.
    pub deadline: Timestamp,
    pub yes_votes: u64,
    pub no_votes: u64,
    pub executed: bool,
    /// Set together with `executed`.
    pub outcome: Option<ExecutionOutcome>,
    /// Membership units that have already contributed weight.
    pub voters_used: BTreeSet<UnitId>,
}

impl Proposal {
    pub fn new(item_id: ItemId, proposer: Identity, created_at: Timestamp, window_secs: u64) -> Self {
        Self {
            item_id,
            proposer,
            created_at,
            deadline: created_at.plus_secs(window_secs),
            yes_votes: 0,
            no_votes: 0,
            executed: false,
            outcome: None,
            voters_used: BTreeSet::new(),
        }
    }

    pub fn status(&self, now: Timestamp) -> ProposalStatus {
        if self.executed {
            ProposalStatus::Executed
        } else if now < self.deadline {
            ProposalStatus::Active
        } else {
            ProposalStatus::AwaitingExecution
        }
    }

    pub fn is_voting_open(&self, now: Timestamp) -> bool {
        now < self.deadline
    }

    /// Strict majority; a tie is a rejection.
    pub fn passed(&self) -> bool {
        self.yes_votes > self.no_votes
    }

    pub fn has_unit_voted(&self, unit: UnitId) -> bool {
        self.voters_used.contains(&unit)
    }

    pub fn tally(&self, direction: VoteDirection) -> u64 {
        match direction {
            VoteDirection::Yes => self.yes_votes,
            VoteDirection::No => self.no_votes,
        }
    }

    pub fn total_votes(&self) -> u64 {
        self.yes_votes.saturating_add(self.no_votes)
    }
}
