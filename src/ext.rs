//! Public extension contracts.
//!
//! The crate ships the contracts without opinionated implementations so services can plug in their own
//! retry or circuit-breaking policy.

pub mod resilience;

pub use resilience::*;
