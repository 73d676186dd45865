//! End-to-end governance scenarios driven by a deterministic clock.

use dao_governance::{
    ExecutionOutcome, GovernanceEngine, GovernanceError, GovernanceParams, SharedGovernance,
};
use dao_marketplace::{FixedPriceMarketplace, Marketplace};
use dao_membership::MembershipRegistry;
use dao_nullables::NullClock;
use dao_types::{Amount, Identity, ItemId, VoteDirection};
use std::sync::Arc;

const START: u64 = 1_700_000_000;

struct World {
    dao: SharedGovernance<FixedPriceMarketplace, MembershipRegistry>,
    market: Arc<FixedPriceMarketplace>,
    registry: Arc<MembershipRegistry>,
    clock: Arc<NullClock>,
}

fn id(name: &str) -> Identity {
    Identity::new(name)
}

/// Price 0.1 coin, five-minute window, the given treasury funding.
fn world(funding: Amount) -> World {
    let market = Arc::new(FixedPriceMarketplace::new(Amount::from_millis(100)));
    let registry = Arc::new(MembershipRegistry::new());
    let clock = Arc::new(NullClock::new(START));
    let engine = GovernanceEngine::new(
        id("dao"),
        id("admin"),
        market.clone(),
        registry.clone(),
        GovernanceParams::default(),
        funding,
    );
    World {
        dao: SharedGovernance::new(engine, clock.clone()),
        market,
        registry,
        clock,
    }
}

#[test]
fn scenario_a_single_member_buys_item() {
    let w = world(Amount::from_millis(1_000));
    let m = id("member");
    w.registry.mint(&m).unwrap();

    let index = w.dao.create_proposal(ItemId::new(7), &m).unwrap();
    assert_eq!(index, 0);
    let proposal = w.dao.proposal(index).unwrap();
    assert_eq!(proposal.deadline.as_secs(), START + 300);

    assert_eq!(w.dao.vote_on_proposal(index, VoteDirection::Yes, &m), Ok(1));

    w.clock.advance(301);
    assert_eq!(
        w.dao.execute_proposal(index, &id("stranger")),
        Err(GovernanceError::NotAMember(id("stranger")))
    );
    let outcome = w.dao.execute_proposal(index, &m).unwrap();
    assert_eq!(
        outcome,
        ExecutionOutcome::Purchased {
            item: ItemId::new(7),
            price: Amount::from_millis(100)
        }
    );
    assert_eq!(w.market.owner_of(ItemId::new(7)), Some(id("dao")));
    assert!(w.dao.proposal(index).unwrap().executed);
    assert_eq!(w.dao.treasury_balance(), Amount::from_millis(900));
    assert_eq!(w.market.proceeds(), Amount::from_millis(100));
}

#[test]
fn scenario_b_two_unit_voter_cannot_vote_twice() {
    let w = world(Amount::from_millis(1_000));
    let v = id("whale");
    w.registry.mint_many(&v, 2).unwrap();

    let index = w.dao.create_proposal(ItemId::new(1), &v).unwrap();
    assert_eq!(w.dao.vote_on_proposal(index, VoteDirection::Yes, &v), Ok(2));
    w.clock.advance(10);
    assert_eq!(
        w.dao.vote_on_proposal(index, VoteDirection::Yes, &v),
        Err(GovernanceError::AlreadyVoted { index, voter: v.clone() })
    );
    let proposal = w.dao.proposal(index).unwrap();
    assert_eq!(proposal.yes_votes, 2);
    assert_eq!(proposal.voters_used.len(), 2);
}

#[test]
fn scenario_c_underfunded_treasury_blocks_execution() {
    let w = world(Amount::from_millis(50));
    let m = id("member");
    w.registry.mint(&m).unwrap();

    let index = w.dao.create_proposal(ItemId::new(2), &m).unwrap();
    w.dao.vote_on_proposal(index, VoteDirection::Yes, &m).unwrap();
    w.clock.advance(300);

    assert_eq!(
        w.dao.execute_proposal(index, &m),
        Err(GovernanceError::InsufficientTreasury {
            needed: Amount::from_millis(100),
            available: Amount::from_millis(50),
        })
    );
    assert!(!w.dao.proposal(index).unwrap().executed);
    assert!(w.market.available(ItemId::new(2)));
    assert_eq!(w.dao.treasury_balance(), Amount::from_millis(50));
}

#[test]
fn scenario_d_only_administrator_withdraws() {
    let w = world(Amount::from_millis(300));
    assert_eq!(
        w.dao.withdraw(&id("member")),
        Err(GovernanceError::NotAuthorized(id("member")))
    );
    assert_eq!(w.dao.treasury_balance(), Amount::from_millis(300));
    assert_eq!(w.dao.withdraw(&id("admin")), Ok(Amount::from_millis(300)));
    assert_eq!(w.dao.treasury_balance(), Amount::ZERO);
}

#[test]
fn item_bought_elsewhere_cannot_be_proposed() {
    let w = world(Amount::from_millis(300));
    let m = id("member");
    w.registry.mint(&m).unwrap();
    w.market
        .purchase(&id("collector"), ItemId::new(5), w.market.price())
        .unwrap();
    assert_eq!(
        w.dao.create_proposal(ItemId::new(5), &m),
        Err(GovernanceError::ItemUnavailable(ItemId::new(5)))
    );
    assert_eq!(w.dao.num_proposals(), 0);
}

#[test]
fn competing_proposals_for_one_item_last_purchase_wins() {
    // Availability is only checked at creation and the marketplace does not
    // re-check it, so two passing proposals for one item both buy it.
    let w = world(Amount::from_millis(1_000));
    let m = id("member");
    w.registry.mint(&m).unwrap();

    let first = w.dao.create_proposal(ItemId::new(4), &m).unwrap();
    let second = w.dao.create_proposal(ItemId::new(4), &m).unwrap();
    w.dao.vote_on_proposal(first, VoteDirection::Yes, &m).unwrap();
    w.dao.vote_on_proposal(second, VoteDirection::Yes, &m).unwrap();
    w.clock.advance(300);

    assert!(w.dao.execute_proposal(first, &m).is_ok());
    assert!(w.dao.execute_proposal(second, &m).is_ok());
    assert_eq!(w.market.items_sold(), 2);
    assert_eq!(w.dao.treasury_balance(), Amount::from_millis(800));
}

#[test]
fn deposits_fund_a_later_purchase() {
    let w = world(Amount::ZERO);
    let m = id("member");
    w.registry.mint(&m).unwrap();

    let index = w.dao.create_proposal(ItemId::new(8), &m).unwrap();
    w.dao.vote_on_proposal(index, VoteDirection::Yes, &m).unwrap();
    w.dao.deposit(&id("donor"), Amount::from_millis(60)).unwrap();
    w.dao.deposit(&id("donor"), Amount::from_millis(40)).unwrap();
    w.clock.advance(300);

    assert!(matches!(
        w.dao.execute_proposal(index, &m),
        Ok(ExecutionOutcome::Purchased { .. })
    ));
    assert_eq!(w.dao.treasury_balance(), Amount::ZERO);
}

#[test]
fn rejected_proposal_is_closed_for_good() {
    let w = world(Amount::from_millis(1_000));
    let yes = id("yes-voter");
    let no = id("no-voter");
    w.registry.mint(&yes).unwrap();
    w.registry.mint_many(&no, 2).unwrap();

    let index = w.dao.create_proposal(ItemId::new(3), &yes).unwrap();
    w.dao.vote_on_proposal(index, VoteDirection::Yes, &yes).unwrap();
    w.dao.vote_on_proposal(index, VoteDirection::No, &no).unwrap();
    w.clock.advance(400);

    assert_eq!(w.dao.execute_proposal(index, &yes), Ok(ExecutionOutcome::Rejected));
    assert_eq!(
        w.dao.execute_proposal(index, &yes),
        Err(GovernanceError::AlreadyExecuted(index))
    );
    assert_eq!(
        w.dao.vote_on_proposal(index, VoteDirection::Yes, &yes),
        Err(GovernanceError::VotingClosed(index))
    );
    assert!(w.market.available(ItemId::new(3)));

    // The item is still up for grabs, so a fresh proposal is allowed.
    assert_eq!(w.dao.create_proposal(ItemId::new(3), &yes), Ok(1));
}
