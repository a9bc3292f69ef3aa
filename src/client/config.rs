//! Token client configuration and its validating builder.

// crates.io
use http::header::HeaderName;
// self
use crate::_prelude::*;

/// Errors raised while constructing or validating a [`ClientConfig`].
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum ClientConfigError {
	/// Issuer endpoint must use HTTPS unless it targets a loopback host.
	#[error("The issuer endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Issuer endpoint has no host component.
	#[error("The issuer endpoint must include a host: {url}.")]
	MissingHost {
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Cache lifetime must be strictly positive.
	#[error("Token time-to-live must be positive.")]
	NonPositiveTtl,
	/// Cache lifetime exceeds [`ClientConfig::MAX_TTL`].
	#[error("Token time-to-live must not exceed {max_seconds} seconds.")]
	TtlTooLong {
		/// Largest accepted lifetime in seconds.
		max_seconds: i64,
	},
	/// Header name cannot be carried on an HTTP request.
	#[error("Invalid header name: {name}.")]
	InvalidHeaderName {
		/// Rejected header name.
		name: String,
	},
	/// A storage key is empty.
	#[error("Storage keys must not be empty.")]
	EmptyStorageKey,
	/// Token and expiry storage keys collide.
	#[error("Token and expiry storage keys must differ: {key}.")]
	DuplicateStorageKey {
		/// Colliding key.
		key: String,
	},
}

/// Validated settings shared by every [`TokenClient`](crate::client::TokenClient) call.
#[derive(Clone, Debug)]
pub struct ClientConfig {
	endpoint: Url,
	ttl: Duration,
	header_name: HeaderName,
	token_key: String,
	expiry_key: String,
}
impl ClientConfig {
	/// Default lifetime of a cached token.
	pub const DEFAULT_TTL: Duration = Duration::seconds(3_600);
	/// Longest lifetime the builder accepts.
	pub const MAX_TTL: Duration = Duration::days(30);
	/// Default request header carrying the token.
	pub const DEFAULT_HEADER: &'static str = "x-csrf-token";
	/// Default storage key for the token value.
	pub const DEFAULT_TOKEN_KEY: &'static str = "csrf-token";
	/// Default storage key for the expiry (epoch milliseconds).
	pub const DEFAULT_EXPIRY_KEY: &'static str = "csrf-token-expiry";

	/// Creates a configuration for `endpoint` with every other setting at its default.
	pub fn new(endpoint: Url) -> Result<Self, ClientConfigError> {
		Self::builder(endpoint).build()
	}

	/// Starts a builder seeded with `endpoint`.
	pub fn builder(endpoint: Url) -> ClientConfigBuilder {
		ClientConfigBuilder::new(endpoint)
	}

	/// Issuer endpoint.
	pub fn endpoint(&self) -> &Url {
		&self.endpoint
	}

	/// Cached token lifetime.
	pub fn ttl(&self) -> Duration {
		self.ttl
	}

	/// Header attached to mutating requests.
	pub fn header_name(&self) -> &HeaderName {
		&self.header_name
	}

	/// Storage key holding the token value.
	pub fn token_key(&self) -> &str {
		&self.token_key
	}

	/// Storage key holding the expiry.
	pub fn expiry_key(&self) -> &str {
		&self.expiry_key
	}
}

/// Builder for [`ClientConfig`] values.
#[derive(Debug)]
pub struct ClientConfigBuilder {
	/// Issuer endpoint.
	pub endpoint: Url,
	/// Cached token lifetime.
	pub ttl: Duration,
	/// Header name attached to mutating requests.
	pub header_name: String,
	/// Storage key for the token value.
	pub token_key: String,
	/// Storage key for the expiry.
	pub expiry_key: String,
}
impl ClientConfigBuilder {
	/// Creates a new builder seeded with the provided endpoint.
	pub fn new(endpoint: Url) -> Self {
		Self {
			endpoint,
			ttl: ClientConfig::DEFAULT_TTL,
			header_name: ClientConfig::DEFAULT_HEADER.into(),
			token_key: ClientConfig::DEFAULT_TOKEN_KEY.into(),
			expiry_key: ClientConfig::DEFAULT_EXPIRY_KEY.into(),
		}
	}

	/// Overrides the cached token lifetime.
	pub fn ttl(mut self, ttl: Duration) -> Self {
		self.ttl = ttl;

		self
	}

	/// Overrides the header attached to mutating requests.
	pub fn header_name(mut self, name: impl Into<String>) -> Self {
		self.header_name = name.into();

		self
	}

	/// Overrides both storage keys.
	pub fn storage_keys(
		mut self,
		token_key: impl Into<String>,
		expiry_key: impl Into<String>,
	) -> Self {
		self.token_key = token_key.into();
		self.expiry_key = expiry_key.into();

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<ClientConfig, ClientConfigError> {
		validate_endpoint(&self.endpoint)?;

		if !self.ttl.is_positive() {
			return Err(ClientConfigError::NonPositiveTtl);
		}
		if self.ttl > ClientConfig::MAX_TTL {
			return Err(ClientConfigError::TtlTooLong {
				max_seconds: ClientConfig::MAX_TTL.whole_seconds(),
			});
		}

		let header_name = HeaderName::from_bytes(self.header_name.as_bytes())
			.map_err(|_| ClientConfigError::InvalidHeaderName { name: self.header_name.clone() })?;

		if self.token_key.is_empty() || self.expiry_key.is_empty() {
			return Err(ClientConfigError::EmptyStorageKey);
		}
		if self.token_key == self.expiry_key {
			return Err(ClientConfigError::DuplicateStorageKey { key: self.token_key });
		}

		Ok(ClientConfig {
			endpoint: self.endpoint,
			ttl: self.ttl,
			header_name,
			token_key: self.token_key,
			expiry_key: self.expiry_key,
		})
	}
}

fn validate_endpoint(url: &Url) -> Result<(), ClientConfigError> {
	let Some(host) = url.host() else {
		return Err(ClientConfigError::MissingHost { url: url.to_string() });
	};

	match url.scheme() {
		"https" => Ok(()),
		"http" if is_loopback(&host) => Ok(()),
		_ => Err(ClientConfigError::InsecureEndpoint { url: url.to_string() }),
	}
}

fn is_loopback(host: &url::Host<&str>) -> bool {
	match host {
		url::Host::Domain(domain) => domain.eq_ignore_ascii_case("localhost"),
		url::Host::Ipv4(addr) => addr.is_loopback(),
		url::Host::Ipv6(addr) => addr.is_loopback(),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn url(raw: &str) -> Url {
		Url::parse(raw).expect("URL fixture should parse.")
	}

	#[test]
	fn defaults_match_the_browser_contract() {
		let config =
			ClientConfig::new(url("https://abc.supabase.co/functions/v1/generate-csrf-token"))
				.expect("Default configuration should be valid.");

		assert_eq!(config.ttl(), Duration::hours(1));
		assert_eq!(config.header_name().as_str(), "x-csrf-token");
		assert_eq!(config.token_key(), "csrf-token");
		assert_eq!(config.expiry_key(), "csrf-token-expiry");
	}

	#[test]
	fn endpoint_must_be_https_outside_loopback() {
		assert_eq!(
			ClientConfig::new(url("http://issuer.example.com/token")).map(|_| ()),
			Err(ClientConfigError::InsecureEndpoint {
				url: "http://issuer.example.com/token".into()
			})
		);
		assert!(ClientConfig::new(url("http://127.0.0.1:8080/token")).is_ok());
		assert!(ClientConfig::new(url("http://localhost:8080/token")).is_ok());
		assert!(ClientConfig::new(url("http://[::1]:8080/token")).is_ok());
		assert!(matches!(
			ClientConfig::new(url("data:text/plain,token")),
			Err(ClientConfigError::MissingHost { .. })
		));
	}

	#[test]
	fn builder_rejects_invalid_settings() {
		let endpoint = url("https://issuer.example.com/token");

		assert_eq!(
			ClientConfig::builder(endpoint.clone()).ttl(Duration::ZERO).build().map(|_| ()),
			Err(ClientConfigError::NonPositiveTtl)
		);
		assert_eq!(
			ClientConfig::builder(endpoint.clone())
				.ttl(Duration::days(365 * 20_000))
				.build()
				.map(|_| ()),
			Err(ClientConfigError::TtlTooLong { max_seconds: 30 * 86_400 })
		);
		assert!(
			ClientConfig::builder(endpoint.clone()).ttl(ClientConfig::MAX_TTL).build().is_ok(),
			"The maximum lifetime itself is accepted."
		);
		assert_eq!(
			ClientConfig::builder(endpoint.clone()).header_name("X CSRF").build().map(|_| ()),
			Err(ClientConfigError::InvalidHeaderName { name: "X CSRF".into() })
		);
		assert_eq!(
			ClientConfig::builder(endpoint.clone()).storage_keys("", "exp").build().map(|_| ()),
			Err(ClientConfigError::EmptyStorageKey)
		);
		assert_eq!(
			ClientConfig::builder(endpoint.clone()).storage_keys("k", "k").build().map(|_| ()),
			Err(ClientConfigError::DuplicateStorageKey { key: "k".into() })
		);

		let custom = ClientConfig::builder(endpoint)
			.ttl(Duration::minutes(5))
			.header_name("X-Anti-Forgery")
			.storage_keys("af", "af-exp")
			.build()
			.expect("Custom configuration should be valid.");

		assert_eq!(custom.header_name().as_str(), "x-anti-forgery");
		assert_eq!(custom.ttl(), Duration::minutes(5));
	}
}
