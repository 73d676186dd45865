//! Membership oracle for governance.
//!
//! A member is any identity holding at least one membership unit. Voting
//! weight is the number of units held, and double-vote prevention is keyed
//! on the individual unit ids the oracle enumerates.

pub mod error;
pub mod oracle;
pub mod registry;

pub use error::MembershipError;
pub use oracle::MembershipOracle;
pub use registry::MembershipRegistry;
