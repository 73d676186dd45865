//! Fixed-price item marketplace.
//!
//! Tracks which identity owns each item and sells any item at a single
//! constant price. The governance engine consumes it through the
//! [`Marketplace`] trait for price discovery and purchase; the marketplace
//! never calls back into governance.

pub mod error;
pub mod market;

pub use error::MarketError;
pub use market::{FixedPriceMarketplace, Marketplace, SaleRecord};
