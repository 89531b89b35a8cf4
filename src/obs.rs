//! Optional observability helpers for contract calls and token refreshes.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to wrap every dispatched call in a `contract_rest_client.call` span (fields
//!   `contract` and `method`) and to emit the request/response log events described in [`log`].
//! - Enable `metrics` to increment `contract_rest_client_call_total` (labels `contract` + `outcome`) and
//!   `contract_rest_client_token_refresh_total` (label `outcome`).

pub mod log;

mod metrics;
mod tracing;

pub use self::tracing::*;
pub use self::metrics::*;

// self
use crate::_prelude::*;

/// Outcome labels recorded for each dispatched call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallOutcome {
	/// Entry to the dispatcher.
	Attempt,
	/// A typed result was produced.
	Success,
	/// An error was propagated back to the caller.
	Failure,
}
impl CallOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CallOutcome::Attempt => "attempt",
			CallOutcome::Success => "success",
			CallOutcome::Failure => "failure",
		}
	}
}
impl Display for CallOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each token refresh.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RefreshOutcome {
	/// The issuer returned a new token.
	Success,
	/// The refresh failed and the error reached the caller.
	Failure,
	/// The refresh failed inside the grace window and the cached token was reused.
	Degraded,
}
impl RefreshOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			RefreshOutcome::Success => "success",
			RefreshOutcome::Failure => "failure",
			RefreshOutcome::Degraded => "degraded",
		}
	}
}
impl Display for RefreshOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
