//! Audit trail of issued tokens.

// self
use crate::{
	_prelude::*,
	auth::{BearerCredential, Role, UserId},
	issuer::IssuedToken,
};

/// Boxed future returned by [`AuditSink::record`].
pub type AuditFuture<'a> = Pin<Box<dyn Future<Output = Result<(), AuditError>> + 'a + Send>>;

/// Destination for [`AuditEntry`] values.
///
/// The issuer awaits each call but only logs failures, so a broken sink never blocks issuance.
pub trait AuditSink
where
	Self: Send + Sync,
{
	/// Records one entry.
	fn record<'a>(&'a self, entry: &'a AuditEntry) -> AuditFuture<'a>;
}

/// Error returned by [`AuditSink`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum AuditError {
	/// Backend-level failure for the audit destination.
	#[error("Audit backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// One issuance, as written to the audit trail.
///
/// The session is identified by its fingerprint; neither the credential nor the token value
/// is recorded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
	/// Name of the function that issued the token.
	pub function: String,
	/// Caller identifier.
	pub user_id: UserId,
	/// Caller role at issuance.
	pub role: Role,
	/// Fingerprint of the bearer session.
	pub session_fingerprint: String,
	/// Issuance instant.
	#[serde(with = "time::serde::rfc3339")]
	pub issued_at: OffsetDateTime,
}
impl AuditEntry {
	/// Builds the entry describing `issued`.
	pub fn new(
		function: impl Into<String>,
		issued: &IssuedToken,
		session: &BearerCredential,
	) -> Self {
		Self {
			function: function.into(),
			user_id: issued.identity.user_id.clone(),
			role: issued.identity.role,
			session_fingerprint: session.fingerprint(),
			issued_at: issued.issued_at,
		}
	}
}

/// Sink that drops every entry.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopAuditSink;
impl AuditSink for NoopAuditSink {
	fn record<'a>(&'a self, _: &'a AuditEntry) -> AuditFuture<'a> {
		Box::pin(async { Ok(()) })
	}
}

/// Sink that keeps entries in-process; clones share the same buffer.
#[derive(Clone, Debug, Default)]
pub struct MemoryAuditSink(Arc<Mutex<Vec<AuditEntry>>>);
impl MemoryAuditSink {
	/// Snapshot of the recorded entries, oldest first.
	pub fn entries(&self) -> Vec<AuditEntry> {
		self.0.lock().clone()
	}
}
impl AuditSink for MemoryAuditSink {
	fn record<'a>(&'a self, entry: &'a AuditEntry) -> AuditFuture<'a> {
		self.0.lock().push(entry.clone());

		Box::pin(async { Ok(()) })
	}
}

/// Sink that emits each entry as an `info` event on the `audit` target.
#[cfg(feature = "tracing")]
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingAuditSink;
#[cfg(feature = "tracing")]
impl AuditSink for TracingAuditSink {
	fn record<'a>(&'a self, entry: &'a AuditEntry) -> AuditFuture<'a> {
		tracing::info!(
			target: "audit",
			function = %entry.function,
			user_id = %entry.user_id,
			role = entry.role.as_str(),
			session = %entry.session_fingerprint,
			issued_at = %entry.issued_at,
			"Token issued."
		);

		Box::pin(async { Ok(()) })
	}
}
