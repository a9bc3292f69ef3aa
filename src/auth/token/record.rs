//! Cached token record kept by clients and its lifecycle helpers.

// self
use crate::{_prelude::*, auth::token::secret::CsrfToken};

/// Lifecycle status for a cached token record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenStatus {
	/// The record may be handed out without contacting the issuer.
	Valid,
	/// The expiry instant has passed; the record behaves as if absent.
	Expired,
}

/// Client-side record pairing a token with the instant it stops being reusable.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedToken {
	/// Token value; callers must avoid logging it.
	pub value: CsrfToken,
	/// Instant after which the record is treated as absent.
	pub expires_at: OffsetDateTime,
}
impl CachedToken {
	/// Creates a record that expires `ttl` after `now`, clamped to the latest representable
	/// instant.
	pub fn new(value: CsrfToken, now: OffsetDateTime, ttl: Duration) -> Self {
		Self { value, expires_at: now.saturating_add(ttl) }
	}

	/// Rebuilds a record from its stored parts; the expiry is decimal epoch milliseconds.
	///
	/// Returns `None` when the expiry cannot be interpreted so callers treat the record as
	/// absent.
	pub fn from_stored(value: impl Into<String>, expiry_millis: &str) -> Option<Self> {
		let value = value.into();

		if value.is_empty() {
			return None;
		}

		let millis = expiry_millis.trim().parse::<i64>().ok()?;
		let expires_at =
			OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000).ok()?;

		Some(Self { value: CsrfToken::new(value), expires_at })
	}

	/// Expiry encoded as decimal epoch milliseconds.
	pub fn expiry_millis(&self) -> String {
		(self.expires_at.unix_timestamp_nanos() / 1_000_000).to_string()
	}

	/// Computes the lifecycle status at a given instant.
	pub fn status_at(&self, instant: OffsetDateTime) -> TokenStatus {
		if instant < self.expires_at { TokenStatus::Valid } else { TokenStatus::Expired }
	}

	/// Returns `true` if the record can be reused at the provided instant.
	pub fn is_valid_at(&self, instant: OffsetDateTime) -> bool {
		matches!(self.status_at(instant), TokenStatus::Valid)
	}
}
impl Debug for CachedToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CachedToken")
			.field("value", &"<redacted>")
			.field("expires_at", &self.expires_at)
			.finish()
	}
}
