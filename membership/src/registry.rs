//! In-memory membership unit ledger.

use crate::error::MembershipError;
use crate::oracle::MembershipOracle;
use dao_types::{Identity, UnitId};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Default)]
struct RegistryState {
    next_unit: u64,
    /// Units per holder, in mint order.
    holdings: HashMap<Identity, Vec<UnitId>>,
    owners: HashMap<UnitId, Identity>,
}

/// Registry of minted membership units.
///
/// Units are numbered sequentially from 0 and never change hands once minted.
pub struct MembershipRegistry {
    max_supply: Option<u64>,
    state: Mutex<RegistryState>,
}

impl MembershipRegistry {
    pub fn new() -> Self {
        Self {
            max_supply: None,
            state: Mutex::new(RegistryState::default()),
        }
    }

    /// A registry that refuses to mint more than `max_supply` units.
    pub fn with_max_supply(max_supply: u64) -> Self {
        Self {
            max_supply: Some(max_supply),
            state: Mutex::new(RegistryState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mint one new unit to `to`.
    pub fn mint(&self, to: &Identity) -> Result<UnitId, MembershipError> {
        let mut state = self.state();
        if let Some(max_supply) = self.max_supply {
            if state.next_unit >= max_supply {
                return Err(MembershipError::SupplyExhausted { max_supply });
            }
        }
        let unit = UnitId::new(state.next_unit);
        state.next_unit += 1;
        state.holdings.entry(to.clone()).or_default().push(unit);
        state.owners.insert(unit, to.clone());
        tracing::debug!(%unit, holder = %to, "membership unit minted");
        Ok(unit)
    }

    /// Mint `count` units to `to`. Stops at the first failure; units minted
    /// before it are kept.
    pub fn mint_many(&self, to: &Identity, count: u64) -> Result<Vec<UnitId>, MembershipError> {
        (0..count).map(|_| self.mint(to)).collect()
    }

    pub fn total_supply(&self) -> u64 {
        self.state().next_unit
    }

    pub fn owner_of(&self, unit: UnitId) -> Option<Identity> {
        self.state().owners.get(&unit).cloned()
    }

    /// Every holder with their weight, sorted by identity.
    pub fn holders(&self) -> Vec<(Identity, u64)> {
        let mut holders: Vec<_> = self
            .state()
            .holdings
            .iter()
            .map(|(holder, units)| (holder.clone(), units.len() as u64))
            .collect();
        holders.sort();
        holders
    }
}

impl Default for MembershipRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MembershipOracle for MembershipRegistry {
    fn weight(&self, holder: &Identity) -> u64 {
        self.state()
            .holdings
            .get(holder)
            .map(|units| units.len() as u64)
            .unwrap_or(0)
    }

    fn unit_at(&self, holder: &Identity, index: u64) -> Option<UnitId> {
        let index = usize::try_from(index).ok()?;
        self.state().holdings.get(holder)?.get(index).copied()
    }

    fn units_of(&self, holder: &Identity) -> Vec<UnitId> {
        self.state().holdings.get(holder).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(name: &str) -> Identity {
        Identity::new(name)
    }

    #[test]
    fn units_are_sequential_across_holders() {
        let reg = MembershipRegistry::new();
        assert_eq!(reg.mint(&id("alice")).unwrap(), UnitId::new(0));
        assert_eq!(reg.mint(&id("bob")).unwrap(), UnitId::new(1));
        assert_eq!(reg.mint(&id("alice")).unwrap(), UnitId::new(2));
        assert_eq!(reg.total_supply(), 3);
        assert_eq!(reg.owner_of(UnitId::new(1)), Some(id("bob")));
    }

    #[test]
    fn weight_and_enumeration_agree() {
        let reg = MembershipRegistry::new();
        reg.mint_many(&id("alice"), 3).unwrap();
        assert_eq!(reg.weight(&id("alice")), 3);
        assert_eq!(reg.unit_at(&id("alice"), 2), Some(UnitId::new(2)));
        assert_eq!(reg.unit_at(&id("alice"), 3), None);
        assert_eq!(
            reg.units_of(&id("alice")),
            vec![UnitId::new(0), UnitId::new(1), UnitId::new(2)]
        );
    }

    #[test]
    fn non_holders_have_no_weight() {
        let reg = MembershipRegistry::new();
        assert_eq!(reg.weight(&id("nobody")), 0);
        assert!(!reg.is_member(&id("nobody")));
        assert!(reg.units_of(&id("nobody")).is_empty());
    }

    #[test]
    fn max_supply_is_enforced() {
        let reg = MembershipRegistry::with_max_supply(2);
        reg.mint(&id("alice")).unwrap();
        reg.mint(&id("bob")).unwrap();
        assert_eq!(
            reg.mint(&id("carol")),
            Err(MembershipError::SupplyExhausted { max_supply: 2 })
        );
        assert_eq!(reg.total_supply(), 2);
        assert_eq!(reg.holders(), vec![(id("alice"), 1), (id("bob"), 1)]);
    }
}
