//! Observability hooks shared by the issuer, the token cache, and the API wrapper.
//!
//! With `tracing`, each operation runs in a `csrf_broker.operation` span whose `session`
//! field holds the credential fingerprint once it is parsed. Failures that callers only see
//! as "Unauthorized" or "Internal server error" are logged here with their full detail.
//!
//! With `metrics`, `csrf_broker_operation_total{operation, outcome}` counts attempts, cache
//! hits, successes, and failures, and `csrf_broker_issue_rejected_total{reason}` breaks
//! refused issuances down by [`IssueError::reason`](crate::issuer::IssueError::reason).
//!
//! Without either feature every hook compiles to a no-op.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Operations observed by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationKind {
	/// Issuer minting a token for an authenticated caller.
	Issue,
	/// Client obtaining a token (cache lookup plus optional issuer call).
	GetToken,
	/// Client request routed through the API wrapper.
	ApiRequest,
}
impl OperationKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OperationKind::Issue => "issue",
			OperationKind::GetToken => "get_token",
			OperationKind::ApiRequest => "api_request",
		}
	}
}
impl Display for OperationKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationOutcome {
	/// Entry to an operation.
	Attempt,
	/// Served from the client cache without an issuer call.
	CacheHit,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl OperationOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OperationOutcome::Attempt => "attempt",
			OperationOutcome::CacheHit => "cache_hit",
			OperationOutcome::Success => "success",
			OperationOutcome::Failure => "failure",
		}
	}
}
impl Display for OperationOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
