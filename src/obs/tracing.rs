// self
use crate::{_prelude::*, auth::BearerCredential, obs::OperationKind};

/// Future returned by [`OperationSpan::instrument`]; a plain passthrough without `tracing`.
#[cfg(feature = "tracing")]
pub type Traced<F> = tracing::instrument::Instrumented<F>;
/// Future returned by [`OperationSpan::instrument`]; a plain passthrough without `tracing`.
#[cfg(not(feature = "tracing"))]
pub type Traced<F> = F;

/// `csrf_broker.operation` span carrying the operation, its stage, and the session
/// fingerprint once the caller's credential is known.
#[derive(Clone, Debug)]
pub struct OperationSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl OperationSpan {
	/// Opens a span for `kind` at `stage`; the `session` field starts empty.
	pub fn new(kind: OperationKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			Self {
				span: tracing::info_span!(
					"csrf_broker.operation",
					operation = kind.as_str(),
					stage,
					session = tracing::field::Empty,
				),
			}
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Tags the span with the credential's fingerprint, never the credential itself.
	pub fn record_session(&self, credential: &BearerCredential) {
		#[cfg(feature = "tracing")]
		{
			self.span.record("session", credential.fingerprint().as_str());
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = credential;
		}
	}

	/// Runs `fut` inside the span.
	pub fn instrument<Fut>(&self, fut: Fut) -> Traced<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Logs the technical detail of a failure that callers only see as a generic message.
pub fn record_failure_detail(kind: OperationKind, stage: &'static str, detail: &dyn Display) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(operation = kind.as_str(), stage, error = %detail, "Operation failed.");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (kind, stage, detail);
	}
}
