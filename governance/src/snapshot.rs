//! Serializable engine state.
//!
//! The marketplace and membership oracle are external components and are not
//! part of the snapshot; they are supplied again on restore.

use crate::engine::GovernanceEngine;
use crate::error::GovernanceError;
use crate::params::GovernanceParams;
use crate::proposal::Proposal;
use crate::treasury::Treasury;
use dao_marketplace::Marketplace;
use dao_membership::MembershipOracle;
use dao_types::Identity;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Everything the engine owns: identity, parameters, treasury and proposals.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceSnapshot {
    pub identity: Identity,
    pub params: GovernanceParams,
    pub treasury: Treasury,
    pub proposals: Vec<Proposal>,
}

impl<M: Marketplace, O: MembershipOracle> GovernanceEngine<M, O> {
    pub fn snapshot(&self) -> GovernanceSnapshot {
        GovernanceSnapshot {
            identity: self.identity.clone(),
            params: self.params.clone(),
            treasury: self.treasury.clone(),
            proposals: self.proposals.clone(),
        }
    }

    pub fn restore(snapshot: GovernanceSnapshot, market: Arc<M>, oracle: Arc<O>) -> Self {
        Self {
            identity: snapshot.identity,
            params: snapshot.params,
            proposals: snapshot.proposals,
            treasury: snapshot.treasury,
            market,
            oracle,
        }
    }

    /// Encode the engine state with bincode.
    pub fn save_state(&self) -> Result<Vec<u8>, GovernanceError> {
        bincode::serialize(&self.snapshot()).map_err(|e| GovernanceError::Snapshot(e.to_string()))
    }

    /// Rebuild an engine from bytes produced by [`GovernanceEngine::save_state`].
    pub fn load_state(data: &[u8], market: Arc<M>, oracle: Arc<O>) -> Result<Self, GovernanceError> {
        let snapshot: GovernanceSnapshot =
            bincode::deserialize(data).map_err(|e| GovernanceError::Snapshot(e.to_string()))?;
        Ok(Self::restore(snapshot, market, oracle))
    }
}
