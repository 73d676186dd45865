//! Fundamental types for the DAO acquisition engine.
//!
//! This crate defines the value types shared across every other crate in the workspace:
//! identities, amounts, timestamps and the clock abstraction, item/unit/proposal
//! identifiers and vote directions.

pub mod amount;
pub mod error;
pub mod identity;
pub mod ids;
pub mod time;
pub mod vote;

pub use amount::Amount;
pub use error::TypesError;
pub use identity::Identity;
pub use ids::{ItemId, ProposalIndex, UnitId};
pub use time::{Clock, SystemClock, Timestamp};
pub use vote::VoteDirection;
