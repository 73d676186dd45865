//! Library half of the `dao` binary: configuration loading and the scenario
//! runner, kept separate from `main.rs` so both can be tested.

pub mod config;
pub mod error;
pub mod scenario;

pub use config::{DaoConfig, MemberConfig, Step};
pub use error::DaemonError;
pub use scenario::{Report, ScenarioRunner, StepReport};
