//! Environment-driven configuration for the issuer server.

// std
use std::net::SocketAddr;
// self
use crate::{
	_prelude::*,
	issuer::{AllowedOrigins, RouterOptions, RouterOptionsError},
};

/// Errors raised while loading [`IssuerConfig`].
#[derive(Debug, PartialEq, Eq, ThisError)]
pub enum IssuerConfigError {
	/// A required variable is unset or empty.
	#[error("Missing required environment variable {name}.")]
	Missing {
		/// Variable name.
		name: &'static str,
	},
	/// A variable is set but cannot be interpreted.
	#[error("Invalid value for environment variable {name}: {reason}.")]
	Invalid {
		/// Variable name.
		name: &'static str,
		/// Why the value was rejected.
		reason: String,
	},
}

/// Server settings.
#[derive(Clone)]
pub struct IssuerConfig {
	/// Listen address.
	pub addr: SocketAddr,
	/// Route and CORS settings.
	pub router: RouterOptions,
	/// Identity provider project URL.
	pub supabase_url: Url,
	/// Service key sent to the identity provider.
	pub service_role_key: String,
}
impl IssuerConfig {
	/// Listen address variable (default `0.0.0.0:8080`).
	pub const ADDR: &'static str = "CSRF_ISSUER_ADDR";
	/// Route variable (default `/generate-csrf-token`).
	pub const ROUTE: &'static str = "CSRF_ISSUER_ROUTE";
	/// Allowed origins variable: `*` or a comma list (default `*`).
	pub const ALLOWED_ORIGINS: &'static str = "CSRF_ALLOWED_ORIGINS";
	/// Identity provider project URL variable (required).
	pub const SUPABASE_URL: &'static str = "SUPABASE_URL";
	/// Identity provider service key variable (required).
	pub const SERVICE_ROLE_KEY: &'static str = "SUPABASE_SERVICE_ROLE_KEY";

	const DEFAULT_ADDR: &'static str = "0.0.0.0:8080";

	/// Loads `.env` (if present) and reads the process environment.
	pub fn from_env() -> Result<Self, IssuerConfigError> {
		dotenvy::dotenv().ok();

		Self::from_lookup(|name| std::env::var(name).ok())
	}

	/// Reads settings through `lookup`; unset and blank values count as absent.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, IssuerConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let var = |name: &str| lookup(name).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());
		let required = |name: &'static str| var(name).ok_or(IssuerConfigError::Missing { name });
		let addr = var(Self::ADDR)
			.unwrap_or_else(|| Self::DEFAULT_ADDR.into())
			.parse::<SocketAddr>()
			.map_err(|e| invalid(Self::ADDR, e))?;
		let router = RouterOptions::new(
			var(Self::ROUTE).unwrap_or_else(|| RouterOptions::DEFAULT_ROUTE.into()),
		)
		.map_err(|e| invalid(Self::ROUTE, e))?;
		let origins = match var(Self::ALLOWED_ORIGINS) {
			Some(raw) => raw
				.parse::<AllowedOrigins>()
				.map_err(|e: RouterOptionsError| invalid(Self::ALLOWED_ORIGINS, e))?,
			None => AllowedOrigins::Any,
		};
		let supabase_url = required(Self::SUPABASE_URL)?
			.parse::<Url>()
			.map_err(|e| invalid(Self::SUPABASE_URL, e))?;

		if !matches!(supabase_url.scheme(), "http" | "https") {
			return Err(invalid(Self::SUPABASE_URL, "scheme must be http or https"));
		}

		Ok(Self {
			addr,
			router: router.with_allowed_origins(origins),
			supabase_url,
			service_role_key: required(Self::SERVICE_ROLE_KEY)?,
		})
	}
}
impl Debug for IssuerConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("IssuerConfig")
			.field("addr", &self.addr)
			.field("router", &self.router)
			.field("supabase_url", &self.supabase_url.as_str())
			.field("service_role_key", &"<redacted>")
			.finish()
	}
}

fn invalid(name: &'static str, reason: impl Display) -> IssuerConfigError {
	IssuerConfigError::Invalid { name, reason: reason.to_string() }
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn load(vars: &[(&str, &str)]) -> Result<IssuerConfig, IssuerConfigError> {
		let vars: HashMap<String, String> =
			vars.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect();

		IssuerConfig::from_lookup(|name| vars.get(name).cloned())
	}

	const REQUIRED: [(&str, &str); 2] = [
		("SUPABASE_URL", "https://abc.supabase.co"),
		("SUPABASE_SERVICE_ROLE_KEY", "service-key"),
	];

	#[test]
	fn defaults_apply_when_only_required_vars_are_set() {
		let config = load(&REQUIRED).expect("Required variables should be enough.");

		assert_eq!(config.addr, "0.0.0.0:8080".parse().expect("Address fixture should parse."));
		assert_eq!(config.router.route(), "/generate-csrf-token");
		assert_eq!(config.router.allowed_origins(), &AllowedOrigins::Any);
		assert_eq!(config.supabase_url.as_str(), "https://abc.supabase.co/");
		assert_eq!(config.service_role_key, "service-key");
		assert!(!format!("{config:?}").contains("service-key"));
	}

	#[test]
	fn overrides_are_applied() {
		let mut vars = REQUIRED.to_vec();

		vars.extend([
			("CSRF_ISSUER_ADDR", "127.0.0.1:9000"),
			("CSRF_ISSUER_ROUTE", "/functions/v1/generate-csrf-token"),
			("CSRF_ALLOWED_ORIGINS", "https://shop.example"),
		]);

		let config = load(&vars).expect("Overrides should be valid.");

		assert_eq!(config.addr.port(), 9000);
		assert_eq!(config.router.route(), "/functions/v1/generate-csrf-token");
		assert!(matches!(
			config.router.allowed_origins(),
			AllowedOrigins::List(list) if list.len() == 1
		));
	}

	#[test]
	fn missing_and_invalid_values_are_rejected() {
		assert_eq!(
			load(&REQUIRED[..1]).map(|_| ()),
			Err(IssuerConfigError::Missing { name: "SUPABASE_SERVICE_ROLE_KEY" })
		);
		assert_eq!(
			load(&[("SUPABASE_URL", "  "), REQUIRED[1]]).map(|_| ()),
			Err(IssuerConfigError::Missing { name: "SUPABASE_URL" })
		);

		for (name, value) in [
			("CSRF_ISSUER_ADDR", "not-an-addr"),
			("CSRF_ISSUER_ROUTE", "no-leading-slash"),
			("CSRF_ALLOWED_ORIGINS", ","),
			("SUPABASE_URL", "ftp://abc.supabase.co"),
		] {
			let mut vars = REQUIRED.to_vec();

			vars.retain(|(key, _)| *key != name);
			vars.push((name, value));

			assert!(
				matches!(load(&vars), Err(IssuerConfigError::Invalid { name: n, .. }) if n == name),
				"{name} should be rejected"
			);
		}
	}
}
