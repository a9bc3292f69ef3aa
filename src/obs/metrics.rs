// self
use crate::obs::{OperationKind, OperationOutcome};

/// Bumps `csrf_broker_operation_total{operation, outcome}`.
pub fn record_outcome(kind: OperationKind, outcome: OperationOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"csrf_broker_operation_total",
			"operation" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}
	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Bumps `csrf_broker_issue_rejected_total{reason}` for a refused issuance.
pub fn record_issue_rejection(reason: &'static str) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("csrf_broker_issue_rejected_total", "reason" => reason).increment(1);
	}
	#[cfg(not(feature = "metrics"))]
	{
		let _ = reason;
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn recorders_accept_every_label() {
		for kind in [OperationKind::Issue, OperationKind::GetToken, OperationKind::ApiRequest] {
			for outcome in [
				OperationOutcome::Attempt,
				OperationOutcome::CacheHit,
				OperationOutcome::Success,
				OperationOutcome::Failure,
			] {
				record_outcome(kind, outcome);
			}
		}

		record_issue_rejection("invalid_session");
	}
}
