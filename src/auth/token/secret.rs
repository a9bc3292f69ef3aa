//! Anti-forgery token values, redacted in logs.

// crates.io
use rand::Rng;
use uuid::{Builder, Uuid, Variant, Version};
// self
use crate::_prelude::*;

/// Opaque anti-forgery token; minted values are canonical UUID-v4 strings.
///
/// Formatting helpers redact the value so tokens never end up in logs.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CsrfToken(String);
impl CsrfToken {
	/// Wraps an existing token value, e.g. one received from the issuer.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Mints a fresh token from 128 bits of cryptographically strong randomness.
	pub fn mint() -> Self {
		let bytes: [u8; 16] = rand::rng().random();

		Self(Builder::from_random_bytes(bytes).into_uuid().hyphenated().to_string())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Returns `true` if the value is a lowercase, hyphenated UUID-v4.
	pub fn is_uuid_v4(&self) -> bool {
		match Uuid::try_parse(&self.0) {
			Ok(uuid) =>
				uuid.get_version() == Some(Version::Random)
					&& uuid.get_variant() == Variant::RFC4122
					&& uuid.hyphenated().to_string() == self.0,
			Err(_) => false,
		}
	}
}
impl AsRef<str> for CsrfToken {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for CsrfToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("CsrfToken").field(&"<redacted>").finish()
	}
}
impl Display for CsrfToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}
