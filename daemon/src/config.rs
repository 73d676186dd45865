//! DAO configuration with TOML file support.

use dao_governance::params::DEFAULT_VOTING_WINDOW_SECS;
use dao_governance::GovernanceParams;
use dao_types::{Amount, Identity, ItemId, ProposalIndex, VoteDirection};
use dao_utils::LogFormat;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::DaemonError;

/// Everything needed to stand up a marketplace, a membership registry and a
/// governance engine, plus an optional script of steps to run against them.
///
/// Can be loaded from a TOML file via [`DaoConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DaoConfig {
    /// Identity the engine buys items under.
    #[serde(default = "default_engine_identity")]
    pub engine_identity: Identity,

    /// Identity allowed to withdraw the treasury.
    #[serde(default = "default_administrator")]
    pub administrator: Identity,

    /// Seconds between proposal creation and its deadline.
    #[serde(default = "default_voting_window_secs")]
    pub voting_window_secs: u64,

    /// Fixed marketplace price per item, in raw units.
    #[serde(default = "default_item_price", with = "amount_serde")]
    pub item_price: Amount,

    /// Treasury funding at construction, in raw units.
    #[serde(default, with = "amount_serde")]
    pub initial_treasury: Amount,

    /// Logical clock start (Unix seconds). Defaults to the current time.
    #[serde(default)]
    pub start_time: Option<u64>,

    /// Cap on membership units ever minted.
    #[serde(default)]
    pub max_supply: Option<u64>,

    /// Initial membership holdings.
    #[serde(default)]
    pub members: Vec<MemberConfig>,

    /// Log format: "human" or "json".
    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Operations to run, in order.
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberConfig {
    pub identity: Identity,
    #[serde(default = "default_units")]
    pub units: u64,
}

/// One scripted operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Fund the treasury.
    Deposit {
        from: Identity,
        #[serde(with = "amount_serde")]
        amount: Amount,
    },
    /// Create a proposal to acquire `item`.
    Propose { by: Identity, item: ItemId },
    Vote {
        by: Identity,
        proposal: ProposalIndex,
        vote: VoteDirection,
    },
    Execute { by: Identity, proposal: ProposalIndex },
    Withdraw { by: Identity },
    TransferAdmin { by: Identity, to: Identity },
    /// Move the logical clock forward.
    Advance { secs: u64 },
    /// Mint membership units after start-up.
    Mint {
        to: Identity,
        #[serde(default = "default_units")]
        units: u64,
    },
    /// Buy directly from the marketplace, bypassing governance.
    Buy {
        by: Identity,
        item: ItemId,
        /// Defaults to the marketplace price.
        #[serde(default, with = "option_amount_serde")]
        amount: Option<Amount>,
    },
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_engine_identity() -> Identity {
    Identity::new("dao")
}

fn default_administrator() -> Identity {
    Identity::new("admin")
}

fn default_voting_window_secs() -> u64 {
    DEFAULT_VOTING_WINDOW_SECS
}

fn default_item_price() -> Amount {
    Amount::from_millis(100)
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_units() -> u64 {
    1
}

// TOML integers are i64, so amounts are written as strings and read from
// either form.
mod amount_serde {
    use dao_types::Amount;
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    pub(super) enum Raw {
        Int(u64),
        Str(String),
    }

    impl Raw {
        pub(super) fn into_amount<E: serde::de::Error>(self) -> Result<Amount, E> {
            match self {
                Raw::Int(n) => Ok(Amount::new(n.into())),
                Raw::Str(s) => s.parse().map_err(E::custom),
            }
        }
    }

    pub fn serialize<S: Serializer>(amount: &Amount, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&amount.raw().to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Amount, D::Error> {
        Raw::deserialize(d)?.into_amount()
    }
}

mod option_amount_serde {
    use super::amount_serde::Raw;
    use dao_types::Amount;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(amount: &Option<Amount>, s: S) -> Result<S::Ok, S::Error> {
        match amount {
            Some(a) => s.serialize_some(&a.raw().to_string()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Amount>, D::Error> {
        Option::<Raw>::deserialize(d)?
            .map(Raw::into_amount)
            .transpose()
    }
}

// ── Impl ───────────────────────────────────────────────────────────────

impl DaoConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, DaemonError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| DaemonError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, DaemonError> {
        let config: Self = toml::from_str(s).map_err(|e| DaemonError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, DaemonError> {
        toml::to_string_pretty(self).map_err(|e| DaemonError::Config(e.to_string()))
    }

    pub fn governance_params(&self) -> GovernanceParams {
        GovernanceParams::with_voting_window(self.voting_window_secs)
    }

    /// Reject configurations the components would refuse at start-up.
    pub fn validate(&self) -> Result<(), DaemonError> {
        self.governance_params()
            .validate()
            .map_err(|e| DaemonError::Config(e.to_string()))?;
        for id in [&self.engine_identity, &self.administrator] {
            if !id.is_valid() {
                return Err(DaemonError::Config(format!("invalid identity {id:?}")));
            }
        }
        let mut seen = HashSet::new();
        for member in &self.members {
            if !seen.insert(&member.identity) {
                return Err(DaemonError::Config(format!(
                    "member {} listed twice",
                    member.identity
                )));
            }
        }
        if let Some(max) = self.max_supply {
            let initial = self
                .members
                .iter()
                .try_fold(0u64, |acc, m| acc.checked_add(m.units))
                .ok_or_else(|| DaemonError::Config("member units overflow u64".into()))?;
            if initial > max {
                return Err(DaemonError::Config(format!(
                    "members hold {initial} units but max_supply is {max}"
                )));
            }
        }
        Ok(())
    }
}

impl Default for DaoConfig {
    fn default() -> Self {
        Self {
            engine_identity: default_engine_identity(),
            administrator: default_administrator(),
            voting_window_secs: default_voting_window_secs(),
            item_price: default_item_price(),
            initial_treasury: Amount::ZERO,
            start_time: None,
            max_supply: None,
            members: Vec::new(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
            steps: Vec::new(),
        }
    }
}
