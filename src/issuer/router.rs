//! axum surface for the issuer: one route, JSON envelopes, and CORS.

// std
use std::io;
// crates.io
use axum::{
	Json, Router,
	extract::State,
	http::{
		HeaderMap, HeaderName, HeaderValue, Method, StatusCode,
		header::{AUTHORIZATION, CONTENT_TYPE},
	},
	response::{IntoResponse, Response},
	routing,
};
use tokio::net::TcpListener;
use tower_http::cors::{self, CorsLayer};
// self
use crate::{_prelude::*, issuer::TokenIssuer};

/// Headers browsers may send on cross-origin issuer calls.
pub const ALLOWED_HEADERS: [&str; 5] =
	["authorization", "x-client-info", "apikey", "content-type", "x-csrf-token"];

/// Errors raised while validating router options.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum RouterOptionsError {
	/// Route is not an absolute, literal path.
	#[error("Route must be an absolute path without captures or whitespace: {route}.")]
	InvalidRoute {
		/// Rejected route.
		route: String,
	},
	/// An origin cannot be carried in a CORS header.
	#[error("Invalid allowed origin: {origin}.")]
	InvalidOrigin {
		/// Rejected origin.
		origin: String,
	},
	/// The origin list is empty.
	#[error("At least one allowed origin is required.")]
	NoOrigins,
}

/// Origins allowed to call the issuer from a browser.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum AllowedOrigins {
	/// Any origin (`*`).
	#[default]
	Any,
	/// Exact origins.
	List(Vec<HeaderValue>),
}
impl FromStr for AllowedOrigins {
	type Err = RouterOptionsError;

	/// Parses `*` or a comma-separated origin list.
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let s = s.trim();

		if s == "*" {
			return Ok(Self::Any);
		}

		let origins = s
			.split(',')
			.map(str::trim)
			.filter(|origin| !origin.is_empty())
			.map(|origin| {
				HeaderValue::from_str(origin)
					.map_err(|_| RouterOptionsError::InvalidOrigin { origin: origin.to_owned() })
			})
			.collect::<Result<Vec<_>, _>>()?;

		if origins.is_empty() {
			return Err(RouterOptionsError::NoOrigins);
		}

		Ok(Self::List(origins))
	}
}

/// Route and CORS settings for [`router`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouterOptions {
	route: String,
	allowed_origins: AllowedOrigins,
}
impl RouterOptions {
	/// Default issuer route.
	pub const DEFAULT_ROUTE: &'static str = "/generate-csrf-token";

	/// Creates options serving `route`.
	pub fn new(route: impl Into<String>) -> Result<Self, RouterOptionsError> {
		let route = route.into();
		let literal = route.starts_with('/')
			&& !route.chars().any(|c| c.is_whitespace() || matches!(c, '{' | '}' | '*' | ':'));

		if !literal {
			return Err(RouterOptionsError::InvalidRoute { route });
		}

		Ok(Self { route, allowed_origins: AllowedOrigins::default() })
	}

	/// Replaces the allowed origins.
	pub fn with_allowed_origins(mut self, origins: AllowedOrigins) -> Self {
		self.allowed_origins = origins;

		self
	}

	/// Served route.
	pub fn route(&self) -> &str {
		&self.route
	}

	/// Allowed origins.
	pub fn allowed_origins(&self) -> &AllowedOrigins {
		&self.allowed_origins
	}
}
impl Default for RouterOptions {
	fn default() -> Self {
		Self { route: Self::DEFAULT_ROUTE.into(), allowed_origins: AllowedOrigins::default() }
	}
}

/// JSON body of every failed issuer call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
	/// Always `false`.
	pub success: bool,
	/// Generic, caller-safe message.
	pub error: String,
}
impl ErrorEnvelope {
	/// Creates a failure envelope.
	pub fn new(error: impl Into<String>) -> Self {
		Self { success: false, error: error.into() }
	}
}

/// Builds the issuer router: `GET` and `POST` on the configured route behind a CORS layer.
pub fn router(issuer: TokenIssuer, options: &RouterOptions) -> Router {
	Router::new()
		.route(&options.route, routing::get(generate_token).post(generate_token))
		.layer(cors_layer(&options.allowed_origins))
		.with_state(issuer)
}

/// Serves `app` on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, app: Router, shutdown: F) -> io::Result<()>
where
	F: 'static + Send + Future<Output = ()>,
{
	axum::serve(listener, app).with_graceful_shutdown(shutdown).await
}

async fn generate_token(State(issuer): State<TokenIssuer>, headers: HeaderMap) -> Response {
	// A header that is not visible ASCII is treated like a malformed one.
	let authorization =
		headers.get(AUTHORIZATION).map(|value| value.to_str().unwrap_or_default());

	match issuer.issue(authorization).await {
		Ok(issued) => (StatusCode::OK, Json(issued.response())).into_response(),
		Err(err) => (err.status(), Json(ErrorEnvelope::new(err.public_message()))).into_response(),
	}
}

fn cors_layer(origins: &AllowedOrigins) -> CorsLayer {
	let layer = CorsLayer::new()
		.allow_methods([Method::GET, Method::POST, Method::OPTIONS])
		.allow_headers([
			AUTHORIZATION,
			HeaderName::from_static(ALLOWED_HEADERS[1]),
			HeaderName::from_static(ALLOWED_HEADERS[2]),
			CONTENT_TYPE,
			HeaderName::from_static(ALLOWED_HEADERS[4]),
		]);

	match origins {
		AllowedOrigins::Any => layer.allow_origin(cors::Any),
		AllowedOrigins::List(list) => layer.allow_origin(list.clone()),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn origins_parse_wildcard_and_lists() {
		assert_eq!(" * ".parse::<AllowedOrigins>(), Ok(AllowedOrigins::Any));
		assert_eq!(
			"https://shop.example, https://admin.example,".parse::<AllowedOrigins>(),
			Ok(AllowedOrigins::List(vec![
				HeaderValue::from_static("https://shop.example"),
				HeaderValue::from_static("https://admin.example"),
			]))
		);
		assert_eq!(" , ".parse::<AllowedOrigins>(), Err(RouterOptionsError::NoOrigins));
		assert!(matches!(
			"https://ok.example,bad\u{7f}origin".parse::<AllowedOrigins>(),
			Err(RouterOptionsError::InvalidOrigin { .. })
		));
	}

	#[test]
	fn routes_must_be_literal_absolute_paths() {
		assert_eq!(RouterOptions::default().route(), "/generate-csrf-token");
		assert!(RouterOptions::new("/functions/v1/generate-csrf-token").is_ok());

		for route in ["generate-csrf-token", "/{id}", "/a b", "/*rest", ""] {
			assert_eq!(
				RouterOptions::new(route),
				Err(RouterOptionsError::InvalidRoute { route: route.into() })
			);
		}
	}

	#[test]
	fn error_envelope_shape() {
		assert_eq!(
			serde_json::to_string(&ErrorEnvelope::new("Unauthorized"))
				.expect("Envelope should serialize."),
			r#"{"success":false,"error":"Unauthorized"}"#
		);
	}
}
