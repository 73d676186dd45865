//! The read-only interface the governance engine queries.

use dao_types::{Identity, UnitId};

/// Live view of who holds which membership units.
///
/// The engine never caches answers: weight may change between calls.
pub trait MembershipOracle: Send + Sync {
    /// Number of units held by `holder`.
    fn weight(&self, holder: &Identity) -> u64;

    /// The unit at position `index` of `holder`'s holdings, for `index` in `[0, weight)`.
    fn unit_at(&self, holder: &Identity, index: u64) -> Option<UnitId>;

    /// Enumerate every unit held by `holder`.
    fn units_of(&self, holder: &Identity) -> Vec<UnitId> {
        (0..self.weight(holder))
            .filter_map(|i| self.unit_at(holder, i))
            .collect()
    }

    fn is_member(&self, holder: &Identity) -> bool {
        self.weight(holder) > 0
    }
}
