//! Bearer session credentials and the resolver contract that turns them into identities.

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD_NO_PAD};
use sha2::{Digest, Sha256};
// self
use crate::{_prelude::*, auth::Identity};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Boxed future returned by [`SessionResolver::resolve`].
pub type ResolveFuture<'a> =
	Pin<Box<dyn Future<Output = Result<Option<Identity>, ResolveError>> + 'a + Send>>;

/// Identity-provider capability used by the issuer to authenticate callers.
///
/// `Ok(None)` means the credential is unknown, invalid, or expired and the caller must be
/// rejected as unauthorized. `Err` is reserved for failures of the provider itself.
pub trait SessionResolver
where
	Self: Send + Sync,
{
	/// Resolves the bearer credential to a live identity.
	fn resolve<'a>(&'a self, credential: &'a BearerCredential) -> ResolveFuture<'a>;
}

/// Failures raised by a [`SessionResolver`] backend.
#[derive(Debug, ThisError)]
pub enum ResolveError {
	/// Identity provider could not be reached.
	#[error("Identity provider could not be reached.")]
	Transport {
		/// Transport-specific failure.
		#[source]
		source: BoxError,
	},
	/// Identity provider answered with an unexpected status.
	#[error("Identity provider returned status {status}.")]
	UnexpectedStatus {
		/// HTTP status code.
		status: u16,
	},
	/// Identity provider payload could not be interpreted.
	#[error("Identity provider returned an unreadable user payload.")]
	Payload {
		/// Parsing or validation failure.
		#[source]
		source: BoxError,
	},
}
impl ResolveError {
	/// Wraps a transport-specific failure.
	pub fn transport(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Transport { source: Box::new(src) }
	}

	/// Wraps a payload parsing failure.
	pub fn payload(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Payload { source: Box::new(src) }
	}
}

/// Errors produced while reading an `Authorization` header.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum CredentialError {
	/// The header does not use the `Bearer` scheme.
	#[error("Authorization header must use the Bearer scheme.")]
	UnsupportedScheme,
	/// The credential part is empty.
	#[error("Bearer credential is empty.")]
	Empty,
	/// The credential contains whitespace.
	#[error("Bearer credential contains whitespace.")]
	ContainsWhitespace,
}

/// Session token presented as `Authorization: Bearer <token>`.
///
/// Formatting helpers redact the value; use [`fingerprint`](Self::fingerprint) to correlate
/// sessions in logs.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct BearerCredential(String);
impl BearerCredential {
	const SCHEME: &'static str = "Bearer";

	/// Wraps a raw session token after validation.
	pub fn new(value: impl Into<String>) -> Result<Self, CredentialError> {
		let value = value.into();

		if value.is_empty() {
			return Err(CredentialError::Empty);
		}
		if value.chars().any(char::is_whitespace) {
			return Err(CredentialError::ContainsWhitespace);
		}

		Ok(Self(value))
	}

	/// Parses an `Authorization` header value; the scheme is matched case-insensitively.
	pub fn from_authorization_header(header: &str) -> Result<Self, CredentialError> {
		let header = header.trim();
		let (scheme, rest) = header.split_once(' ').unwrap_or((header, ""));

		if !scheme.eq_ignore_ascii_case(Self::SCHEME) {
			return Err(CredentialError::UnsupportedScheme);
		}

		Self::new(rest.trim())
	}

	/// Renders the credential as an `Authorization` header value.
	pub fn authorization_header(&self) -> String {
		format!("{} {}", Self::SCHEME, self.0)
	}

	/// Returns the raw session token. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Stable base64 (no padding) SHA-256 digest of the credential.
	pub fn fingerprint(&self) -> String {
		STANDARD_NO_PAD.encode(Sha256::digest(self.0.as_bytes()))
	}
}
impl Debug for BearerCredential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("BearerCredential").field(&"<redacted>").finish()
	}
}
impl Display for BearerCredential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

#[derive(Clone, Debug)]
struct SessionEntry {
	identity: Identity,
	expires_at: OffsetDateTime,
}

type SessionMap = Arc<RwLock<HashMap<BearerCredential, SessionEntry>>>;

/// Thread-safe resolver that keeps sessions in-process for tests, demos, and local runs.
#[derive(Clone, Debug, Default)]
pub struct MemorySessionResolver(SessionMap);
impl MemorySessionResolver {
	/// Registers (or replaces) a session that stays valid until `expires_at`.
	pub fn insert(
		&self,
		credential: BearerCredential,
		identity: Identity,
		expires_at: OffsetDateTime,
	) {
		self.0.write().insert(credential, SessionEntry { identity, expires_at });
	}

	/// Removes a session, returning its identity if it was present.
	pub fn revoke(&self, credential: &BearerCredential) -> Option<Identity> {
		self.0.write().remove(credential).map(|entry| entry.identity)
	}

	/// Resolves against an explicit instant.
	pub fn resolve_at(
		&self,
		credential: &BearerCredential,
		now: OffsetDateTime,
	) -> Option<Identity> {
		self.0
			.read()
			.get(credential)
			.filter(|entry| now < entry.expires_at)
			.map(|entry| entry.identity.clone())
	}
}
impl SessionResolver for MemorySessionResolver {
	fn resolve<'a>(&'a self, credential: &'a BearerCredential) -> ResolveFuture<'a> {
		let identity = self.resolve_at(credential, OffsetDateTime::now_utc());

		Box::pin(async move { Ok(identity) })
	}
}
