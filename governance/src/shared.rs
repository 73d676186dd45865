//! Serialized access to the engine.
//!
//! All state-changing operations go through one mutex and read the time from
//! one clock while holding it, so the times operations see are ordered the
//! same way as the operations themselves.

use crate::engine::GovernanceEngine;
use crate::error::GovernanceError;
use crate::proposal::{ExecutionOutcome, Proposal, ProposalStatus};
use dao_marketplace::Marketplace;
use dao_membership::MembershipOracle;
use dao_types::{
    Amount, Clock, Identity, ItemId, ProposalIndex, SystemClock, Timestamp, VoteDirection,
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Thread-safe handle around a [`GovernanceEngine`] and its clock.
pub struct SharedGovernance<M, O> {
    engine: Mutex<GovernanceEngine<M, O>>,
    clock: Arc<dyn Clock>,
}

impl<M: Marketplace, O: MembershipOracle> SharedGovernance<M, O> {
    pub fn new(engine: GovernanceEngine<M, O>, clock: Arc<dyn Clock>) -> Self {
        Self {
            engine: Mutex::new(engine),
            clock,
        }
    }

    /// Deadlines measured against the operating system clock.
    pub fn with_system_clock(engine: GovernanceEngine<M, O>) -> Self {
        Self::new(engine, Arc::new(SystemClock))
    }

    // Engine operations never panic while holding the lock, but a panicking
    // reader in `with_engine` could; the state is still consistent then.
    fn lock(&self) -> MutexGuard<'_, GovernanceEngine<M, O>> {
        self.engine.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Run a read-only closure against the engine under the lock.
    pub fn with_engine<R>(&self, f: impl FnOnce(&GovernanceEngine<M, O>) -> R) -> R {
        f(&self.lock())
    }

    pub fn create_proposal(
        &self,
        item: ItemId,
        requester: &Identity,
    ) -> Result<ProposalIndex, GovernanceError> {
        let mut engine = self.lock();
        let now = self.clock.now();
        engine
            .create_proposal(item, requester, now)
            .inspect_err(|e| tracing::debug!(%requester, %item, error = %e, "create_proposal rejected"))
    }

    pub fn vote_on_proposal(
        &self,
        index: ProposalIndex,
        direction: VoteDirection,
        voter: &Identity,
    ) -> Result<u64, GovernanceError> {
        let mut engine = self.lock();
        let now = self.clock.now();
        engine
            .vote_on_proposal(index, direction, voter, now)
            .inspect_err(|e| tracing::debug!(%voter, index, error = %e, "vote rejected"))
    }

    pub fn execute_proposal(
        &self,
        index: ProposalIndex,
        requester: &Identity,
    ) -> Result<ExecutionOutcome, GovernanceError> {
        let mut engine = self.lock();
        let now = self.clock.now();
        engine
            .execute_proposal(index, requester, now)
            .inspect_err(|e| tracing::debug!(%requester, index, error = %e, "execution rejected"))
    }

    pub fn deposit(&self, from: &Identity, amount: Amount) -> Result<Amount, GovernanceError> {
        self.lock().deposit(from, amount)
    }

    pub fn withdraw(&self, requester: &Identity) -> Result<Amount, GovernanceError> {
        self.lock()
            .withdraw(requester)
            .inspect_err(|e| tracing::debug!(%requester, error = %e, "withdrawal rejected"))
    }

    pub fn transfer_administrator(
        &self,
        requester: &Identity,
        new_administrator: Identity,
    ) -> Result<(), GovernanceError> {
        self.lock()
            .transfer_administrator(requester, new_administrator)
    }

    pub fn proposal(&self, index: ProposalIndex) -> Option<Proposal> {
        self.lock().proposal(index).cloned()
    }

    pub fn proposal_status(&self, index: ProposalIndex) -> Result<ProposalStatus, GovernanceError> {
        let engine = self.lock();
        let now = self.clock.now();
        engine.proposal_status(index, now)
    }

    pub fn num_proposals(&self) -> u64 {
        self.lock().num_proposals()
    }

    pub fn treasury_balance(&self) -> Amount {
        self.lock().treasury_balance()
    }

    pub fn into_inner(self) -> GovernanceEngine<M, O> {
        self.engine.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::GovernanceParams;
    use dao_marketplace::FixedPriceMarketplace;
    use dao_membership::MembershipRegistry;
    use dao_nullables::NullClock;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    /// Test clock whose next read, once armed, reports in and then stalls.
    struct StallingClock {
        inner: NullClock,
        gate: Mutex<Option<mpsc::Sender<()>>>,
    }

    impl StallingClock {
        fn arm(&self, reading: mpsc::Sender<()>) {
            *self.gate.lock().unwrap() = Some(reading);
        }
    }

    impl Clock for StallingClock {
        fn now(&self) -> Timestamp {
            let now = self.inner.now();
            let gate = self.gate.lock().unwrap().take();
            if let Some(reading) = gate {
                reading.send(()).unwrap();
                thread::sleep(Duration::from_millis(100));
            }
            now
        }
    }

    #[test]
    fn concurrent_votes_each_count_once() {
        let registry = Arc::new(MembershipRegistry::new());
        let voters: Vec<Identity> = (0..8).map(|i| Identity::new(format!("member{i}"))).collect();
        for v in &voters {
            registry.mint_many(v, 2).unwrap();
        }
        let clock = Arc::new(NullClock::new(1_000));
        let engine = GovernanceEngine::new(
            Identity::new("dao"),
            Identity::new("admin"),
            Arc::new(FixedPriceMarketplace::new(Amount::new(1))),
            registry,
            GovernanceParams::default(),
            Amount::new(1),
        );
        let shared = Arc::new(SharedGovernance::new(engine, clock.clone()));
        let index = shared.create_proposal(ItemId::new(1), &voters[0]).unwrap();

        let handles: Vec<_> = voters
            .iter()
            .cloned()
            .flat_map(|v| [v.clone(), v])
            .map(|voter| {
                let shared = shared.clone();
                thread::spawn(move || shared.vote_on_proposal(index, VoteDirection::Yes, &voter))
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        // Each voter submitted twice: exactly one of the two landed.
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), voters.len());
        assert_eq!(shared.proposal(index).unwrap().yes_votes, 16);

        assert_eq!(shared.proposal_status(index), Ok(ProposalStatus::Active));
        clock.advance(300);
        assert_eq!(shared.proposal_status(index), Ok(ProposalStatus::AwaitingExecution));
    }

    #[test]
    fn clock_read_is_ordered_with_the_lock() {
        let registry = Arc::new(MembershipRegistry::new());
        let alice = Identity::new("alice");
        registry.mint(&alice).unwrap();
        let clock = Arc::new(StallingClock {
            inner: NullClock::new(0),
            gate: Mutex::new(None),
        });
        let engine = GovernanceEngine::new(
            Identity::new("dao"),
            Identity::new("admin"),
            Arc::new(FixedPriceMarketplace::new(Amount::new(1))),
            registry,
            GovernanceParams::default(),
            Amount::new(1),
        );
        let shared = Arc::new(SharedGovernance::new(engine, clock.clone()));
        let index = shared.create_proposal(ItemId::new(1), &alice).unwrap();
        clock.inner.set(299);

        let (tx, rx) = mpsc::channel();
        clock.arm(tx);
        let voter = {
            let shared = shared.clone();
            let alice = alice.clone();
            thread::spawn(move || shared.vote_on_proposal(index, VoteDirection::Yes, &alice))
        };

        // The voter has read t=299 and is stalled inside the clock.
        rx.recv().unwrap();
        clock.inner.set(300);
        let outcome = shared.execute_proposal(index, &alice).unwrap();

        // The vote finished before execution started, so execution saw it.
        assert_eq!(voter.join().unwrap(), Ok(1));
        assert!(matches!(outcome, ExecutionOutcome::Purchased { .. }));
        let p = shared.proposal(index).unwrap();
        assert_eq!((p.yes_votes, p.no_votes), (1, 0));
        assert_eq!(p.outcome, Some(outcome));
    }

    #[test]
    fn system_clock_opens_a_live_window() {
        let registry = Arc::new(MembershipRegistry::new());
        let alice = Identity::new("alice");
        registry.mint(&alice).unwrap();
        let engine = GovernanceEngine::new(
            Identity::new("dao"),
            Identity::new("admin"),
            Arc::new(FixedPriceMarketplace::new(Amount::new(1))),
            registry,
            GovernanceParams::default(),
            Amount::ZERO,
        );
        let shared = SharedGovernance::with_system_clock(engine);
        let index = shared.create_proposal(ItemId::new(1), &alice).unwrap();
        assert_eq!(shared.proposal_status(index), Ok(ProposalStatus::Active));
        assert_eq!(
            shared.execute_proposal(index, &alice),
            Err(GovernanceError::VotingStillActive(index))
        );
        let engine = shared.into_inner();
        assert_eq!(engine.num_proposals(), 1);
    }
}
