//! The marketplace trait and its in-memory fixed-price implementation.

use crate::error::MarketError;
use dao_types::{Amount, Identity, ItemId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Read/purchase interface the governance engine depends on.
///
/// Methods take `&self`; implementations guard their own state so a single
/// marketplace can be shared between the engine and other buyers.
pub trait Marketplace: Send + Sync {
    /// The constant price of every item.
    fn price(&self) -> Amount;

    /// Whether `item` has no recorded owner.
    fn available(&self, item: ItemId) -> bool;

    /// Buy `item` for `buyer`, paying exactly `payment`.
    ///
    /// Fails with [`MarketError::WrongAmount`] when `payment != price()`.
    /// On success `buyer` becomes the owner and the payment is accepted.
    fn purchase(&self, buyer: &Identity, item: ItemId, payment: Amount)
        -> Result<(), MarketError>;
}

/// A completed sale.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleRecord {
    pub item: ItemId,
    pub buyer: Identity,
    pub paid: Amount,
}

#[derive(Default)]
struct MarketState {
    owners: HashMap<ItemId, Identity>,
    proceeds: Amount,
    sales: Vec<SaleRecord>,
}

/// Marketplace selling any item id at one fixed price.
///
/// `purchase` does not re-check availability: buying an already-owned item
/// overwrites its owner. Callers that need exclusivity must check
/// [`Marketplace::available`] first, as the governance engine does when a
/// proposal is created.
pub struct FixedPriceMarketplace {
    price: Amount,
    state: Mutex<MarketState>,
}

impl FixedPriceMarketplace {
    pub fn new(price: Amount) -> Self {
        Self {
            price,
            state: Mutex::new(MarketState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, MarketState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current owner of `item`, if any.
    pub fn owner_of(&self, item: ItemId) -> Option<Identity> {
        self.state().owners.get(&item).cloned()
    }

    /// Total value accepted from buyers.
    pub fn proceeds(&self) -> Amount {
        self.state().proceeds
    }

    /// Number of successful purchases, including overwrites.
    pub fn items_sold(&self) -> usize {
        self.state().sales.len()
    }

    /// All sales in the order they happened.
    pub fn sales(&self) -> Vec<SaleRecord> {
        self.state().sales.clone()
    }

    /// All owned items with their owners, sorted by item id.
    pub fn owned_items(&self) -> Vec<(ItemId, Identity)> {
        let mut items: Vec<_> = self
            .state()
            .owners
            .iter()
            .map(|(item, owner)| (*item, owner.clone()))
            .collect();
        items.sort_by_key(|(item, _)| *item);
        items
    }
}

impl Marketplace for FixedPriceMarketplace {
    fn price(&self) -> Amount {
        self.price
    }

    fn available(&self, item: ItemId) -> bool {
        !self.state().owners.contains_key(&item)
    }

    fn purchase(
        &self,
        buyer: &Identity,
        item: ItemId,
        payment: Amount,
    ) -> Result<(), MarketError> {
        if payment != self.price {
            return Err(MarketError::WrongAmount {
                expected: self.price,
                got: payment,
            });
        }
        let mut state = self.state();
        if let Some(previous) = state.owners.insert(item, buyer.clone()) {
            tracing::warn!(%item, %previous, new_owner = %buyer, "item re-sold over existing owner");
        }
        state.proceeds = state.proceeds.saturating_add(payment);
        state.sales.push(SaleRecord {
            item,
            buyer: buyer.clone(),
            paid: payment,
        });
        tracing::info!(%item, %buyer, price = %payment, "item sold");
        Ok(())
    }
}
