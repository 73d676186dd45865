//! Nullable infrastructure for deterministic testing.
//!
//! Inspired by the "A-frame architecture" pattern from RsNano.
//! External dependencies are abstracted behind traits; this crate provides
//! test-friendly implementations that return deterministic values and can be
//! controlled programmatically.
//!
//! Usage: swap [`dao_types::SystemClock`] for [`NullClock`] in tests and simulations.

pub mod clock;

pub use clock::NullClock;
