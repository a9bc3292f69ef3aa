//! Token issuer: authenticates a bearer session and mints a fresh anti-forgery token.
//!
//! [`TokenIssuer::issue`] is transport-agnostic; the `server` feature wraps it in an axum
//! router. Every successful call mints a new token and hands an [`AuditEntry`] to the
//! configured [`AuditSink`]. Minted tokens are neither stored nor verified later.

pub mod audit;
#[cfg(feature = "server")] pub mod config;
#[cfg(feature = "server")] pub mod router;

pub use audit::*;
#[cfg(feature = "server")] pub use config::*;
#[cfg(feature = "server")] pub use router::*;

// crates.io
use http::StatusCode;
// self
use crate::{
	_prelude::*,
	auth::{BearerCredential, CredentialError, CsrfToken, Identity, ResolveError, SessionResolver},
	obs::{self, OperationKind, OperationOutcome, OperationSpan},
};

/// Failures returned by [`TokenIssuer::issue`].
///
/// [`Display`] carries technical detail for logs; callers must answer with
/// [`status`](Self::status) and [`public_message`](Self::public_message) instead.
#[derive(Debug, ThisError)]
pub enum IssueError {
	/// The request carried no `Authorization` header.
	#[error("Missing authorization header.")]
	MissingCredential,
	/// The `Authorization` header is not a usable bearer credential.
	#[error("Malformed authorization header.")]
	MalformedCredential(#[from] CredentialError),
	/// The session is unknown, invalid, or expired.
	#[error("Session is invalid or expired.")]
	InvalidSession,
	/// The identity provider failed.
	#[error("Session resolution failed.")]
	Resolver(#[from] ResolveError),
}
impl IssueError {
	/// HTTP status the failure maps to.
	pub fn status(&self) -> StatusCode {
		match self {
			Self::MissingCredential | Self::MalformedCredential(_) | Self::InvalidSession =>
				StatusCode::UNAUTHORIZED,
			Self::Resolver(_) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	/// Generic message that is safe to return to callers.
	pub fn public_message(&self) -> &'static str {
		match self.status() {
			StatusCode::UNAUTHORIZED => "Unauthorized",
			_ => "Internal server error",
		}
	}

	/// Stable label for metrics and logs.
	pub const fn reason(&self) -> &'static str {
		match self {
			Self::MissingCredential => "missing_credential",
			Self::MalformedCredential(_) => "malformed_credential",
			Self::InvalidSession => "invalid_session",
			Self::Resolver(_) => "resolver",
		}
	}

	/// Returns `true` for failures caused by the caller's credentials.
	pub fn is_unauthorized(&self) -> bool {
		self.status() == StatusCode::UNAUTHORIZED
	}
}

/// Successful issuance.
#[derive(Clone, Debug)]
pub struct IssuedToken {
	/// Freshly minted token.
	pub token: CsrfToken,
	/// Identity the session resolved to.
	pub identity: Identity,
	/// Mint instant.
	pub issued_at: OffsetDateTime,
}
impl IssuedToken {
	/// JSON body returned to the caller.
	pub fn response(&self) -> TokenResponse {
		TokenResponse { token: self.token.expose().to_owned() }
	}
}

/// Wire body of a successful issuance: `{"token": "<uuid-v4>"}`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
	/// Token value.
	pub token: String,
}
impl Debug for TokenResponse {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenResponse").field("token", &"<redacted>").finish()
	}
}

/// Mints tokens for callers whose bearer session resolves to an identity.
#[derive(Clone)]
pub struct TokenIssuer {
	resolver: Arc<dyn SessionResolver>,
	audit: Arc<dyn AuditSink>,
}
impl TokenIssuer {
	/// Function name recorded in audit entries.
	pub const FUNCTION_NAME: &'static str = "generate-csrf-token";

	/// Creates an issuer that resolves sessions with `resolver` and discards audit entries.
	pub fn new(resolver: Arc<dyn SessionResolver>) -> Self {
		Self { resolver, audit: Arc::new(NoopAuditSink) }
	}

	/// Replaces the audit sink.
	pub fn with_audit_sink(mut self, audit: Arc<dyn AuditSink>) -> Self {
		self.audit = audit;

		self
	}

	/// Authenticates `authorization` (the raw header value) and mints a token.
	pub async fn issue(&self, authorization: Option<&str>) -> Result<IssuedToken, IssueError> {
		const KIND: OperationKind = OperationKind::Issue;

		let span = OperationSpan::new(KIND, "issue");

		obs::record_outcome(KIND, OperationOutcome::Attempt);

		let result = span.instrument(self.issue_inner(&span, authorization)).await;

		match &result {
			Ok(_) => obs::record_outcome(KIND, OperationOutcome::Success),
			Err(err) => {
				obs::record_failure_detail(KIND, "issue", err);
				obs::record_issue_rejection(err.reason());
				obs::record_outcome(KIND, OperationOutcome::Failure);
			},
		}

		result
	}

	async fn issue_inner(
		&self,
		span: &OperationSpan,
		authorization: Option<&str>,
	) -> Result<IssuedToken, IssueError> {
		let header = authorization.ok_or(IssueError::MissingCredential)?;
		let credential = BearerCredential::from_authorization_header(header)?;

		span.record_session(&credential);

		let identity =
			self.resolver.resolve(&credential).await?.ok_or(IssueError::InvalidSession)?;
		let issued = IssuedToken {
			token: CsrfToken::mint(),
			identity,
			issued_at: OffsetDateTime::now_utc(),
		};
		let entry = AuditEntry::new(Self::FUNCTION_NAME, &issued, &credential);

		// Audit failures never block issuance.
		if let Err(err) = self.audit.record(&entry).await {
			obs::record_failure_detail(OperationKind::Issue, "audit", &err);
		}

		Ok(issued)
	}
}
impl Debug for TokenIssuer {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenIssuer").finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{_preludet::*, auth::Role};

	fn issuer() -> TokenIssuer {
		TokenIssuer::new(test_resolver("live-session", test_identity("user-1", Role::Donor)))
	}

	#[tokio::test]
	async fn issue_mints_uuid_for_live_sessions() {
		let issued = issuer()
			.issue(Some("Bearer live-session"))
			.await
			.expect("A live session should receive a token.");

		assert!(issued.token.is_uuid_v4());
		assert_eq!(issued.identity.role, Role::Donor);
		assert_eq!(issued.response().token, issued.token.expose());
	}

	#[tokio::test]
	async fn every_call_mints_a_new_token() {
		let issuer = issuer();
		let first = issuer.issue(Some("Bearer live-session")).await.expect("First issue.");
		let second = issuer.issue(Some("Bearer live-session")).await.expect("Second issue.");

		assert_ne!(first.token, second.token);
	}

	#[tokio::test]
	async fn credential_failures_are_unauthorized() {
		let issuer = issuer();

		for header in [None, Some(""), Some("Basic abc"), Some("Bearer"), Some("Bearer invalid")] {
			let err = issuer.issue(header).await.expect_err("Issuance should be rejected.");

			assert_eq!(err.status(), StatusCode::UNAUTHORIZED, "{header:?}");
			assert_eq!(err.public_message(), "Unauthorized");
		}
	}

	#[test]
	fn resolver_failures_are_internal_and_generic() {
		let err = IssueError::from(ResolveError::UnexpectedStatus { status: 503 });

		assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
		assert_eq!(err.public_message(), "Internal server error");
		assert_eq!(err.reason(), "resolver");
		assert!(!err.is_unauthorized());
	}

	#[tokio::test]
	async fn rejections_carry_distinct_reasons() {
		let issuer = issuer();
		let mut reasons = Vec::new();

		for header in [None, Some("Basic abc"), Some("Bearer unknown-session")] {
			reasons.push(issuer.issue(header).await.expect_err("Issuance should fail.").reason());
		}

		assert_eq!(reasons, ["missing_credential", "malformed_credential", "invalid_session"]);
	}

	#[test]
	fn token_response_debug_is_redacted() {
		let response = TokenResponse { token: "secret".into() };

		assert!(!format!("{response:?}").contains("secret"));
		assert_eq!(
			serde_json::to_string(&response).expect("Response should serialize."),
			r#"{"token":"secret"}"#
		);
	}
}
