//! Core governance engine — proposals, weighted voting, execution and treasury.
//!
//! Every operation validates all of its preconditions before mutating
//! anything, so a failed call leaves the engine exactly as it was.

use crate::error::GovernanceError;
use crate::params::GovernanceParams;
use crate::proposal::{ExecutionOutcome, Proposal, ProposalStatus};
use crate::treasury::Treasury;
use dao_marketplace::Marketplace;
use dao_membership::MembershipOracle;
use dao_types::{Amount, Identity, ItemId, ProposalIndex, Timestamp, VoteDirection};
use std::collections::BTreeSet;
use std::sync::Arc;

/// The governance engine.
///
/// Owns the proposal list (append-only, indexed from 0) and the treasury.
/// Reads membership live from the oracle on every call and buys through the
/// marketplace under its own `identity`.
pub struct GovernanceEngine<M, O> {
    pub(crate) identity: Identity,
    pub(crate) params: GovernanceParams,
    pub(crate) proposals: Vec<Proposal>,
    pub(crate) treasury: Treasury,
    pub(crate) market: Arc<M>,
    pub(crate) oracle: Arc<O>,
}

impl<M: Marketplace, O: MembershipOracle> GovernanceEngine<M, O> {
    pub fn new(
        identity: Identity,
        administrator: Identity,
        market: Arc<M>,
        oracle: Arc<O>,
        params: GovernanceParams,
        initial_funding: Amount,
    ) -> Self {
        Self {
            identity,
            params,
            proposals: Vec::new(),
            treasury: Treasury::new(administrator, initial_funding),
            market,
            oracle,
        }
    }

    // ── Queries ─────────────────────────────────────────────────────────

    /// The identity the engine buys items under.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn params(&self) -> &GovernanceParams {
        &self.params
    }

    pub fn num_proposals(&self) -> u64 {
        self.proposals.len() as u64
    }

    pub fn proposal(&self, index: ProposalIndex) -> Option<&Proposal> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.proposals.get(i))
    }

    pub fn proposals(&self) -> &[Proposal] {
        &self.proposals
    }

    pub fn proposal_status(
        &self,
        index: ProposalIndex,
        now: Timestamp,
    ) -> Result<ProposalStatus, GovernanceError> {
        self.proposal(index)
            .map(|p| p.status(now))
            .ok_or(GovernanceError::NoSuchProposal(index))
    }

    pub fn treasury_balance(&self) -> Amount {
        self.treasury.balance()
    }

    pub fn administrator(&self) -> &Identity {
        self.treasury.administrator()
    }

    // ── Proposal lifecycle ──────────────────────────────────────────────

    fn require_member(&self, who: &Identity) -> Result<(), GovernanceError> {
        if !self.oracle.is_member(who) {
            return Err(GovernanceError::NotAMember(who.clone()));
        }
        Ok(())
    }

    fn proposal_mut(&mut self, index: ProposalIndex) -> Result<&mut Proposal, GovernanceError> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.proposals.get_mut(i))
            .ok_or(GovernanceError::NoSuchProposal(index))
    }

    /// Open a proposal to acquire `item`. Voting closes one window after `now`.
    pub fn create_proposal(
        &mut self,
        item: ItemId,
        requester: &Identity,
        now: Timestamp,
    ) -> Result<ProposalIndex, GovernanceError> {
        self.require_member(requester)?;
        if !self.market.available(item) {
            return Err(GovernanceError::ItemUnavailable(item));
        }
        let index = self.num_proposals();
        let proposal = Proposal::new(item, requester.clone(), now, self.params.voting_window_secs);
        tracing::info!(
            index,
            %item,
            proposer = %requester,
            deadline = %proposal.deadline,
            "proposal created"
        );
        self.proposals.push(proposal);
        Ok(index)
    }

    /// Cast `voter`'s weight on a proposal.
    ///
    /// Weight is the number of the voter's units that have not yet voted on
    /// this proposal; each of those units is marked as used. Units acquired
    /// after an earlier vote therefore still count. Returns the weight applied.
    pub fn vote_on_proposal(
        &mut self,
        index: ProposalIndex,
        direction: VoteDirection,
        voter: &Identity,
        now: Timestamp,
    ) -> Result<u64, GovernanceError> {
        self.require_member(voter)?;
        let units = self.oracle.units_of(voter);
        let proposal = self.proposal_mut(index)?;
        // An executed proposal stays closed even for a caller whose `now` lags.
        if proposal.executed || !proposal.is_voting_open(now) {
            return Err(GovernanceError::VotingClosed(index));
        }

        let fresh: BTreeSet<_> = units
            .into_iter()
            .filter(|unit| !proposal.has_unit_voted(*unit))
            .collect();
        let weight = fresh.len() as u64;
        if weight == 0 {
            return Err(GovernanceError::AlreadyVoted {
                index,
                voter: voter.clone(),
            });
        }

        let tally = match direction {
            VoteDirection::Yes => &mut proposal.yes_votes,
            VoteDirection::No => &mut proposal.no_votes,
        };
        *tally = tally.checked_add(weight).ok_or(GovernanceError::Overflow)?;
        proposal.voters_used.extend(fresh);

        tracing::info!(
            index,
            %voter,
            %direction,
            weight,
            yes = proposal.yes_votes,
            no = proposal.no_votes,
            "vote recorded"
        );
        Ok(weight)
    }

    /// Close a proposal after its deadline.
    ///
    /// With a strict yes-majority the item is bought at the marketplace price
    /// out of the treasury. A failed purchase aborts the whole execution: the
    /// proposal stays unexecuted and the treasury is not debited.
    pub fn execute_proposal(
        &mut self,
        index: ProposalIndex,
        requester: &Identity,
        now: Timestamp,
    ) -> Result<ExecutionOutcome, GovernanceError> {
        self.require_member(requester)?;
        let proposal = usize::try_from(index)
            .ok()
            .and_then(|i| self.proposals.get_mut(i))
            .ok_or(GovernanceError::NoSuchProposal(index))?;
        if proposal.is_voting_open(now) {
            return Err(GovernanceError::VotingStillActive(index));
        }
        if proposal.executed {
            return Err(GovernanceError::AlreadyExecuted(index));
        }

        let outcome = if proposal.passed() {
            let price = self.market.price();
            self.treasury.ensure_covers(price)?;
            self.market.purchase(&self.identity, proposal.item_id, price)?;
            self.treasury.debit(price)?;
            ExecutionOutcome::Purchased {
                item: proposal.item_id,
                price,
            }
        } else {
            ExecutionOutcome::Rejected
        };

        proposal.executed = true;
        proposal.outcome = Some(outcome);
        tracing::info!(
            index,
            item = %proposal.item_id,
            yes = proposal.yes_votes,
            no = proposal.no_votes,
            ?outcome,
            by = %requester,
            "proposal executed"
        );
        Ok(outcome)
    }

    // ── Treasury ────────────────────────────────────────────────────────

    /// Accept funds from anyone. Returns the new treasury balance.
    pub fn deposit(&mut self, from: &Identity, amount: Amount) -> Result<Amount, GovernanceError> {
        let balance = self.treasury.deposit(amount)?;
        tracing::info!(%from, %amount, %balance, "treasury deposit");
        Ok(balance)
    }

    /// Pay the whole treasury out to the administrator.
    pub fn withdraw(&mut self, requester: &Identity) -> Result<Amount, GovernanceError> {
        let amount = self.treasury.withdraw_all(requester)?;
        tracing::info!(administrator = %requester, %amount, "treasury withdrawn");
        Ok(amount)
    }

    pub fn transfer_administrator(
        &mut self,
        requester: &Identity,
        new_administrator: Identity,
    ) -> Result<(), GovernanceError> {
        self.treasury
            .transfer_administrator(requester, new_administrator.clone())?;
        tracing::info!(from = %requester, to = %new_administrator, "administrator transferred");
        Ok(())
    }
}
