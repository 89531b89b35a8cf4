// self
use crate::obs::{CallOutcome, RefreshOutcome};

/// Records a call outcome via the global metrics recorder (when enabled).
pub fn record_call_outcome(contract: &str, outcome: CallOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"contract_rest_client_call_total",
			"contract" => contract.to_owned(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (contract, outcome);
	}
}

/// Records a token refresh outcome via the global metrics recorder (when enabled).
pub fn record_token_refresh(outcome: RefreshOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("contract_rest_client_token_refresh_total", "outcome" => outcome.as_str())
			.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = outcome;
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn recorders_noop_without_installed_recorder() {
		record_call_outcome("billing", CallOutcome::Failure);
		record_token_refresh(RefreshOutcome::Degraded);
	}
}
