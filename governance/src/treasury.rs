//! Treasury custody and the administrator role.

use crate::error::GovernanceError;
use dao_types::{Amount, Identity};
use serde::{Deserialize, Serialize};

/// Pooled funds held by the engine, and the one identity allowed to drain them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Treasury {
    balance: Amount,
    administrator: Identity,
}

impl Treasury {
    pub fn new(administrator: Identity, initial_funding: Amount) -> Self {
        Self {
            balance: initial_funding,
            administrator,
        }
    }

    pub fn balance(&self) -> Amount {
        self.balance
    }

    pub fn administrator(&self) -> &Identity {
        &self.administrator
    }

    pub fn ensure_administrator(&self, requester: &Identity) -> Result<(), GovernanceError> {
        if *requester != self.administrator {
            return Err(GovernanceError::NotAuthorized(requester.clone()));
        }
        Ok(())
    }

    /// Accept funds from anyone. Returns the new balance.
    pub fn deposit(&mut self, amount: Amount) -> Result<Amount, GovernanceError> {
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or(GovernanceError::Overflow)?;
        Ok(self.balance)
    }

    /// Fail unless at least `amount` is held.
    pub fn ensure_covers(&self, amount: Amount) -> Result<(), GovernanceError> {
        if self.balance < amount {
            return Err(GovernanceError::InsufficientTreasury {
                needed: amount,
                available: self.balance,
            });
        }
        Ok(())
    }

    pub fn debit(&mut self, amount: Amount) -> Result<(), GovernanceError> {
        self.ensure_covers(amount)?;
        self.balance = self.balance - amount;
        Ok(())
    }

    /// Hand the whole balance to the administrator.
    pub fn withdraw_all(&mut self, requester: &Identity) -> Result<Amount, GovernanceError> {
        self.ensure_administrator(requester)?;
        Ok(std::mem::replace(&mut self.balance, Amount::ZERO))
    }

    /// Only the current administrator may name a successor.
    pub fn transfer_administrator(
        &mut self,
        requester: &Identity,
        new_administrator: Identity,
    ) -> Result<(), GovernanceError> {
        self.ensure_administrator(requester)?;
        self.administrator = new_administrator;
        Ok(())
    }
}
