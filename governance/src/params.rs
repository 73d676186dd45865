//! Tunable governance parameters.

use crate::error::GovernanceError;
use serde::{Deserialize, Serialize};

/// Default voting window: five minutes.
pub const DEFAULT_VOTING_WINDOW_SECS: u64 = 300;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceParams {
    /// Seconds between proposal creation and its deadline.
    #[serde(default = "default_voting_window_secs")]
    pub voting_window_secs: u64,
}

fn default_voting_window_secs() -> u64 {
    DEFAULT_VOTING_WINDOW_SECS
}

impl GovernanceParams {
    pub fn with_voting_window(voting_window_secs: u64) -> Self {
        Self { voting_window_secs }
    }

    /// A zero-length window would close every proposal at creation.
    pub fn validate(&self) -> Result<(), GovernanceError> {
        if self.voting_window_secs == 0 {
            return Err(GovernanceError::InvalidParams(
                "voting_window_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

impl Default for GovernanceParams {
    fn default() -> Self {
        Self {
            voting_window_secs: DEFAULT_VOTING_WINDOW_SECS,
        }
    }
}
