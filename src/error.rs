//! Client-level error types shared across the token cache, transports, and the API wrapper.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical client error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Session storage failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Temporary upstream failure; retry with backoff.
	#[error(transparent)]
	Transient(#[from] TransientError),
	/// Transport failure (DNS, TCP, TLS, timeouts).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Issuer answered 2xx but the body did not carry a usable token.
	#[error(transparent)]
	Response(#[from] ResponseError),

	/// No bearer session is available to authenticate the issuer call.
	#[error("No authenticated session is available.")]
	Unauthenticated,
	/// Issuer rejected the bearer session.
	#[error("Token issuer rejected the session: {reason}.")]
	Unauthorized {
		/// Issuer-supplied reason string.
		reason: String,
	},
	/// Downstream API call returned a non-success status.
	#[error("Request failed with status {status}: {message}.")]
	Api {
		/// HTTP status code returned by the API.
		status: u16,
		/// Message extracted from the response body.
		message: String,
	},
}
impl Error {
	/// Classifies the error for UI handling.
	pub fn category(&self) -> ErrorCategory {
		match self {
			Self::Storage(_) => ErrorCategory::Storage,
			Self::Config(_) => ErrorCategory::Config,
			Self::Transient(_) => ErrorCategory::Server,
			Self::Transport(_) => ErrorCategory::Network,
			Self::Response(_) => ErrorCategory::MalformedResponse,
			Self::Unauthenticated | Self::Unauthorized { .. } => ErrorCategory::Auth,
			Self::Api { status: 401 | 403, .. } => ErrorCategory::Auth,
			Self::Api { .. } => ErrorCategory::Server,
		}
	}

	/// Generic message that is safe to show to end users.
	///
	/// Technical details stay in [`Display`] and the error source chain.
	pub fn user_message(&self) -> &'static str {
		self.category().user_message()
	}
}

/// Coarse error categories surfaced to calling UI code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
	/// Missing or rejected session.
	Auth,
	/// The issuer or API could not be reached.
	Network,
	/// The issuer answered without a usable token.
	MalformedResponse,
	/// Upstream failure reported through an HTTP status.
	Server,
	/// Local misconfiguration.
	Config,
	/// Session storage failure.
	Storage,
}
impl ErrorCategory {
	/// Returns a stable label suitable for logs or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Auth => "auth",
			Self::Network => "network",
			Self::MalformedResponse => "malformed_response",
			Self::Server => "server",
			Self::Config => "config",
			Self::Storage => "storage",
		}
	}

	/// Generic, retry-friendly message for the category.
	pub const fn user_message(self) -> &'static str {
		match self {
			Self::Auth => "Your session has expired. Please sign in again.",
			Self::Network => "Network connection issue. Please check your connection.",
			Self::MalformedResponse | Self::Server | Self::Config | Self::Storage =>
				"An unexpected error occurred. Please try again.",
		}
	}
}
impl Display for ErrorCategory {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Configuration and validation failures raised by the client.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Token value cannot be carried in an HTTP header.
	#[error("Token value is not a valid HTTP header value.")]
	InvalidHeaderValue(#[from] http::header::InvalidHeaderValue),
	/// Request URL could not be built.
	#[error("Request URL is invalid.")]
	InvalidUrl(#[from] url::ParseError),
}

/// Temporary failure variants (safe to retry).
#[derive(Debug, ThisError)]
pub enum TransientError {
	/// Issuer returned an unexpected non-success status.
	#[error("Token issuer returned an unexpected response: {message}.")]
	IssuerEndpoint {
		/// Issuer- or client-supplied message summarizing the failure.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
}

/// Success responses whose body cannot be used.
#[derive(Debug, ThisError)]
pub enum ResponseError {
	/// Response body was not the expected JSON document.
	#[error("Response body is not the expected JSON document.")]
	MalformedJson {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code.
		status: u16,
	},
	/// Issuer response did not include a non-empty `token` field.
	#[error("Token issuer response is missing the token field.")]
	MissingToken {
		/// HTTP status code.
		status: u16,
	},
	/// Issued token cannot be sent back as an HTTP header value.
	#[error("Token issuer returned a token that is not a valid header value.")]
	InvalidToken {
		/// HTTP status code.
		status: u16,
	},
}

/// Transport-level failures (DNS, TCP, TLS, timeouts).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the token issuer.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
