//! Transport primitives for reaching the token issuer.
//!
//! The module exposes [`IssuerTransport`] alongside [`IssuerResponse`] so downstream crates can
//! plug in a custom HTTP stack (or an in-process fake) without losing the cache's error
//! classification. Implementations hand back the raw status, body, and any `Retry-After` hint;
//! the client decides what each outcome means.

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// crates.io
#[cfg(feature = "reqwest")] use reqwest::header::{AUTHORIZATION, HeaderMap, RETRY_AFTER};
#[cfg(feature = "reqwest")] use time::format_description::well_known::Rfc2822;
// self
use crate::{_prelude::*, auth::BearerCredential, error::TransportError};

/// Boxed future returned by [`IssuerTransport::request_token`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<IssuerResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP stacks capable of calling the token issuer.
///
/// Implementations must be `Send + Sync + 'static` so one transport can be shared across
/// clients behind an `Arc`. The returned future must be `Send` so callers can box and move
/// it between executor threads.
pub trait IssuerTransport
where
	Self: 'static + Send + Sync,
{
	/// Calls `endpoint` authenticated by `session` and returns the raw response.
	///
	/// `Err` is reserved for failures that produced no HTTP response at all; every status code,
	/// including 4xx and 5xx, must come back as `Ok`.
	fn request_token<'a>(
		&'a self,
		endpoint: &'a Url,
		session: &'a BearerCredential,
	) -> TransportFuture<'a>;
}

/// Raw issuer response handed from the transport to the cache.
///
/// Additional fields may be added in future releases, so downstream code should construct
/// values using field names instead of struct update syntax.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IssuerResponse {
	/// HTTP status code.
	pub status: u16,
	/// Retry-After hint expressed as a relative duration.
	pub retry_after: Option<Duration>,
	/// Response body bytes.
	pub body: Vec<u8>,
}
impl IssuerResponse {
	/// Creates a response without a retry hint.
	pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
		Self { status, retry_after: None, body: body.into() }
	}

	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// The issuer is called with `POST` and an empty body; redirects are followed according to the
/// wrapped client's policy.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestIssuerTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestIssuerTransport {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	async fn execute(
		&self,
		endpoint: &Url,
		session: &BearerCredential,
	) -> Result<IssuerResponse, TransportError> {
		let response = self
			.0
			.post(endpoint.clone())
			.header(AUTHORIZATION, session.authorization_header())
			.send()
			.await?;
		let status = response.status().as_u16();
		let retry_after = parse_retry_after(response.headers());
		let body = response.bytes().await?.to_vec();

		Ok(IssuerResponse { status, retry_after, body })
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestIssuerTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestIssuerTransport {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl IssuerTransport for ReqwestIssuerTransport {
	fn request_token<'a>(
		&'a self,
		endpoint: &'a Url,
		session: &'a BearerCredential,
	) -> TransportFuture<'a> {
		Box::pin(self.execute(endpoint, session))
	}
}

#[cfg(feature = "reqwest")]
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u32>() {
		return Some(Duration::seconds(i64::from(secs)));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}

#[cfg(all(test, feature = "reqwest"))]
mod tests {
	// crates.io
	use reqwest::header::HeaderValue;
	// self
	use super::*;

	fn headers(retry_after: &str) -> HeaderMap {
		let mut headers = HeaderMap::new();

		headers.insert(
			RETRY_AFTER,
			HeaderValue::from_str(retry_after).expect("Header fixture should be valid."),
		);

		headers
	}

	#[test]
	fn retry_after_accepts_delta_seconds() {
		assert_eq!(parse_retry_after(&headers("30")), Some(Duration::seconds(30)));
		assert_eq!(parse_retry_after(&headers(" 5 ")), Some(Duration::seconds(5)));
	}

	#[test]
	fn retry_after_ignores_past_dates_and_garbage() {
		assert_eq!(parse_retry_after(&headers("Wed, 21 Oct 2015 07:28:00 GMT")), None);
		assert_eq!(parse_retry_after(&headers("later")), None);
		assert_eq!(parse_retry_after(&HeaderMap::new()), None);
	}

	#[test]
	fn response_success_covers_2xx_only() {
		assert!(IssuerResponse::new(200, "{}").is_success());
		assert!(IssuerResponse::new(204, Vec::new()).is_success());
		assert!(!IssuerResponse::new(302, Vec::new()).is_success());
		assert!(!IssuerResponse::new(401, Vec::new()).is_success());
	}
}
