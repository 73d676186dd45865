//! Builds the components from a [`DaoConfig`] and runs its steps.

use crate::config::{DaoConfig, Step};
use crate::DaemonError;
use dao_governance::{GovernanceEngine, ProposalStatus, SharedGovernance};
use dao_marketplace::{FixedPriceMarketplace, Marketplace};
use dao_membership::MembershipRegistry;
use dao_nullables::NullClock;
use dao_types::{Amount, Identity, ItemId, ProposalIndex, Timestamp};
use dao_utils::format_remaining;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// A governance engine wired to an in-memory marketplace, membership
/// registry and a logical clock that only moves on `advance` steps.
pub struct ScenarioRunner {
    dao: SharedGovernance<FixedPriceMarketplace, MembershipRegistry>,
    market: Arc<FixedPriceMarketplace>,
    registry: Arc<MembershipRegistry>,
    clock: Arc<NullClock>,
}

/// Result of one step.
#[derive(Clone, Debug, Serialize)]
pub struct StepReport {
    pub step: usize,
    pub at: Timestamp,
    pub action: String,
    pub ok: bool,
    pub detail: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct ProposalReport {
    pub index: ProposalIndex,
    pub item: ItemId,
    pub proposer: Identity,
    pub yes_votes: u64,
    pub no_votes: u64,
    pub status: ProposalStatus,
    pub remaining: String,
    pub outcome: Option<String>,
}

/// Final state after all steps.
#[derive(Clone, Debug, Serialize)]
pub struct Report {
    pub steps: Vec<StepReport>,
    pub now: Timestamp,
    pub treasury: Amount,
    pub administrator: Identity,
    pub proposals: Vec<ProposalReport>,
    pub owned_items: Vec<(ItemId, Identity)>,
    pub members: Vec<(Identity, u64)>,
}

impl Report {
    pub fn failed_steps(&self) -> impl Iterator<Item = &StepReport> {
        self.steps.iter().filter(|s| !s.ok)
    }
}

impl ScenarioRunner {
    pub fn from_config(config: &DaoConfig) -> Result<Self, DaemonError> {
        config.validate()?;
        let market = Arc::new(FixedPriceMarketplace::new(config.item_price));
        let registry = Arc::new(match config.max_supply {
            Some(max) => MembershipRegistry::with_max_supply(max),
            None => MembershipRegistry::new(),
        });
        for member in &config.members {
            registry.mint_many(&member.identity, member.units)?;
        }
        let start = config
            .start_time
            .unwrap_or_else(|| Timestamp::now().as_secs());
        let clock = Arc::new(NullClock::new(start));
        let engine = GovernanceEngine::new(
            config.engine_identity.clone(),
            config.administrator.clone(),
            market.clone(),
            registry.clone(),
            config.governance_params(),
            config.initial_treasury,
        );
        tracing::info!(
            engine = %config.engine_identity,
            administrator = %config.administrator,
            price = %config.item_price,
            treasury = %config.initial_treasury,
            members = config.members.len(),
            start,
            "dao initialised"
        );
        Ok(Self {
            dao: SharedGovernance::new(engine, clock.clone()),
            market,
            registry,
            clock,
        })
    }

    pub fn governance(&self) -> &SharedGovernance<FixedPriceMarketplace, MembershipRegistry> {
        &self.dao
    }

    pub fn market(&self) -> &FixedPriceMarketplace {
        &self.market
    }

    /// Run one step; the returned string describes what happened.
    pub fn apply(&self, step: &Step) -> Result<String, String> {
        fn err(e: impl fmt::Display) -> String {
            e.to_string()
        }

        match step {
            Step::Deposit { from, amount } => self
                .dao
                .deposit(from, *amount)
                .map(|balance| format!("treasury now {balance}"))
                .map_err(err),
            Step::Propose { by, item } => self
                .dao
                .create_proposal(*item, by)
                .map(|index| format!("proposal {index} for {item}"))
                .map_err(err),
            Step::Vote { by, proposal, vote } => self
                .dao
                .vote_on_proposal(*proposal, *vote, by)
                .map(|weight| format!("{vote} with weight {weight}"))
                .map_err(err),
            Step::Execute { by, proposal } => self
                .dao
                .execute_proposal(*proposal, by)
                .map(|outcome| format!("{outcome:?}"))
                .map_err(err),
            Step::Withdraw { by } => self
                .dao
                .withdraw(by)
                .map(|amount| format!("{amount} paid to {by}"))
                .map_err(err),
            Step::TransferAdmin { by, to } => self
                .dao
                .transfer_administrator(by, to.clone())
                .map(|()| format!("administrator is now {to}"))
                .map_err(err),
            Step::Advance { secs } => {
                self.clock.advance(*secs);
                Ok(format!("clock at {}", self.clock.now()))
            }
            Step::Mint { to, units } => self
                .registry
                .mint_many(to, *units)
                .map(|minted| format!("{} units minted to {to}", minted.len()))
                .map_err(err),
            Step::Buy { by, item, amount } => {
                let payment = amount.unwrap_or_else(|| self.market.price());
                self.market
                    .purchase(by, *item, payment)
                    .map(|()| format!("{item} bought by {by}"))
                    .map_err(err)
            }
        }
    }

    /// Run every step in order. Failed steps are recorded, not fatal.
    pub fn run(&self, steps: &[Step]) -> Report {
        let (reports, _) = self.run_steps(steps, false);
        self.report(reports)
    }

    /// Like [`ScenarioRunner::run`] but stops at the first failed step; the
    /// steps after it are never applied.
    pub fn run_strict(&self, steps: &[Step]) -> Result<Report, DaemonError> {
        match self.run_steps(steps, true) {
            (_, Some(failed)) => Err(DaemonError::StepFailed {
                step: failed.step,
                message: failed.detail,
            }),
            (reports, None) => Ok(self.report(reports)),
        }
    }

    /// Applies `steps`, returning the reports and, when `stop_on_failure` is
    /// set, the step that halted the run.
    fn run_steps(
        &self,
        steps: &[Step],
        stop_on_failure: bool,
    ) -> (Vec<StepReport>, Option<StepReport>) {
        let mut reports = Vec::with_capacity(steps.len());
        for (i, step) in steps.iter().enumerate() {
            let at = self.clock.now();
            let (ok, detail) = match self.apply(step) {
                Ok(detail) => (true, detail),
                Err(detail) => {
                    tracing::warn!(index = i, ?step, error = %detail, "step failed");
                    (false, detail)
                }
            };
            let report = StepReport {
                step: i,
                at,
                action: action_name(step).to_string(),
                ok,
                detail,
            };
            if !ok && stop_on_failure {
                return (reports, Some(report));
            }
            reports.push(report);
        }
        (reports, None)
    }

    fn report(&self, steps: Vec<StepReport>) -> Report {
        let now = self.clock.now();
        let (treasury, administrator, proposals) = self.dao.with_engine(|engine| {
            let proposals = engine
                .proposals()
                .iter()
                .enumerate()
                .map(|(index, p)| ProposalReport {
                    index: index as ProposalIndex,
                    item: p.item_id,
                    proposer: p.proposer.clone(),
                    yes_votes: p.yes_votes,
                    no_votes: p.no_votes,
                    status: p.status(now),
                    remaining: format_remaining(p.deadline, now),
                    outcome: p.outcome.map(|o| format!("{o:?}")),
                })
                .collect();
            (
                engine.treasury_balance(),
                engine.administrator().clone(),
                proposals,
            )
        });
        Report {
            steps,
            now,
            treasury,
            administrator,
            proposals,
            owned_items: self.market.owned_items(),
            members: self.registry.holders(),
        }
    }
}

fn action_name(step: &Step) -> &'static str {
    match step {
        Step::Deposit { .. } => "deposit",
        Step::Propose { .. } => "propose",
        Step::Vote { .. } => "vote",
        Step::Execute { .. } => "execute",
        Step::Withdraw { .. } => "withdraw",
        Step::TransferAdmin { .. } => "transfer_admin",
        Step::Advance { .. } => "advance",
        Step::Mint { .. } => "mint",
        Step::Buy { .. } => "buy",
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for s in &self.steps {
            let mark = if s.ok { "ok " } else { "ERR" };
            writeln!(f, "[{mark}] #{:<3} {:<14} @{}  {}", s.step, s.action, s.at, s.detail)?;
        }
        writeln!(f)?;
        writeln!(f, "time:          {}", self.now)?;
        writeln!(f, "treasury:      {}", self.treasury)?;
        writeln!(f, "administrator: {}", self.administrator)?;
        writeln!(f, "proposals:")?;
        for p in &self.proposals {
            writeln!(
                f,
                "  {:>3}: {} by {}  yes={} no={}  {:?} ({}){}",
                p.index,
                p.item,
                p.proposer,
                p.yes_votes,
                p.no_votes,
                p.status,
                p.remaining,
                p.outcome
                    .as_ref()
                    .map(|o| format!("  -> {o}"))
                    .unwrap_or_default(),
            )?;
        }
        writeln!(f, "items:")?;
        for (item, owner) in &self.owned_items {
            writeln!(f, "  {item} owned by {owner}")?;
        }
        writeln!(f, "members:")?;
        for (member, units) in &self.members {
            writeln!(f, "  {member}: {units} units")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO_A: &str = include_str!("../scenarios/scenario_a.toml");
    const DOUBLE_SALE: &str = include_str!("../scenarios/double_sale.toml");

    #[test]
    fn scenario_a_file_buys_item_seven() {
        let config = DaoConfig::from_toml_str(SCENARIO_A).unwrap();
        let runner = ScenarioRunner::from_config(&config).unwrap();
        let report = runner.run(&config.steps);

        let failures: Vec<_> = report.failed_steps().map(|s| s.detail.clone()).collect();
        // The only expected failure is the outsider trying to execute.
        assert_eq!(failures.len(), 1, "{failures:?}");
        assert!(failures[0].contains("holds no membership units"));

        assert_eq!(report.owned_items, vec![(ItemId::new(7), Identity::new("dao"))]);
        assert_eq!(report.proposals[0].status, ProposalStatus::Executed);
        assert_eq!(report.treasury, Amount::from_millis(900));
        assert!(report.to_string().contains("item#7 owned by dao"));
    }

    #[test]
    fn double_sale_file_shows_overwrite() {
        let config = DaoConfig::from_toml_str(DOUBLE_SALE).unwrap();
        let runner = ScenarioRunner::from_config(&config).unwrap();
        let report = runner.run(&config.steps);
        assert_eq!(report.failed_steps().count(), 0);
        assert_eq!(report.owned_items, vec![(ItemId::new(3), Identity::new("collector"))]);
        assert_eq!(runner.market().items_sold(), 2);
        let sales = runner.market().sales();
        assert_eq!(sales[0].buyer, Identity::new("dao"));
        assert_eq!(sales[1].buyer, Identity::new("collector"));
    }

    #[test]
    fn strict_run_stops_on_failure() {
        let config = DaoConfig {
            start_time: Some(0),
            initial_treasury: Amount::new(50),
            steps: vec![
                Step::Withdraw { by: Identity::new("mallory") },
                Step::Withdraw { by: Identity::new("admin") },
            ],
            ..DaoConfig::default()
        };
        let runner = ScenarioRunner::from_config(&config).unwrap();
        let err = runner.run_strict(&config.steps).unwrap_err();
        assert!(matches!(err, DaemonError::StepFailed { step: 0, .. }));
        // The admin's withdrawal after the failure never ran.
        assert_eq!(runner.governance().treasury_balance(), Amount::new(50));
    }

    #[test]
    fn lenient_run_continues_past_failure() {
        let config = DaoConfig {
            start_time: Some(0),
            initial_treasury: Amount::new(50),
            ..DaoConfig::default()
        };
        let runner = ScenarioRunner::from_config(&config).unwrap();
        let report = runner.run(&[
            Step::Withdraw { by: Identity::new("mallory") },
            Step::Withdraw { by: Identity::new("admin") },
        ]);
        assert_eq!(report.failed_steps().map(|s| s.step).collect::<Vec<_>>(), vec![0]);
        assert_eq!(runner.governance().treasury_balance(), Amount::ZERO);
    }

    #[test]
    fn report_serializes_to_json() {
        let config = DaoConfig {
            start_time: Some(100),
            initial_treasury: Amount::new(5),
            ..DaoConfig::default()
        };
        let runner = ScenarioRunner::from_config(&config).unwrap();
        let report = runner.run(&[Step::Advance { secs: 5 }]);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["now"], 105);
        assert_eq!(json["steps"][0]["ok"], true);
    }
}
