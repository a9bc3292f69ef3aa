//! Session-scoped token cache that fetches from the issuer on demand.
//!
//! [`TokenClient`] keeps at most one [`CachedToken`] in its [`SessionStorage`]. Lookups that
//! find a valid record return it without touching the network; misses call the issuer through
//! an [`IssuerTransport`] under a singleflight guard so concurrent callers share one fetch.
//! Failed fetches are propagated and never cached.

pub mod attach;
#[cfg(feature = "reqwest")] pub mod api;
pub mod clock;
pub mod config;
pub mod session;

mod metrics;

#[cfg(feature = "reqwest")] pub use api::*;
pub use attach::*;
pub use clock::*;
pub use config::*;
pub use metrics::*;
pub use session::*;

// crates.io
use http::HeaderValue;
// self
use crate::{
	_prelude::*,
	auth::{BearerCredential, CachedToken, CsrfToken},
	error::{ConfigError, ResponseError, TransientError},
	obs::{self, OperationKind, OperationOutcome, OperationSpan},
	store::{MemorySessionStorage, SessionStorage},
	transport::{IssuerResponse, IssuerTransport},
};
#[cfg(feature = "reqwest")] use crate::transport::ReqwestIssuerTransport;

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport.
pub type ReqwestTokenClient = TokenClient<ReqwestIssuerTransport>;

/// Caching front for the token issuer.
///
/// Clones share storage, metrics, and the singleflight guard, so every clone observes the
/// same cached record.
pub struct TokenClient<T>
where
	T: ?Sized + IssuerTransport,
{
	config: ClientConfig,
	transport: Arc<T>,
	session: Arc<dyn SessionSource>,
	storage: Arc<dyn SessionStorage>,
	clock: Arc<dyn Clock>,
	metrics: Arc<CacheMetrics>,
	fetch_guard: Arc<AsyncMutex<()>>,
	// Bumped by every clear; a fetch only stores its token if no clear happened meanwhile.
	clear_epoch: Arc<Mutex<u64>>,
}
impl<T> TokenClient<T>
where
	T: ?Sized + IssuerTransport,
{
	/// Creates a client that reuses the caller-provided transport.
	///
	/// The client starts with private in-memory storage and the system clock; use
	/// [`with_storage`](Self::with_storage) and [`with_clock`](Self::with_clock) to share or
	/// replace them.
	pub fn with_transport(
		config: ClientConfig,
		transport: impl Into<Arc<T>>,
		session: impl 'static + SessionSource,
	) -> Self {
		Self {
			config,
			transport: transport.into(),
			session: Arc::new(session),
			storage: Arc::new(MemorySessionStorage::default()),
			clock: Arc::new(SystemClock),
			metrics: Default::default(),
			fetch_guard: Default::default(),
			clear_epoch: Default::default(),
		}
	}

	/// Replaces the storage backend.
	pub fn with_storage(mut self, storage: Arc<dyn SessionStorage>) -> Self {
		self.storage = storage;

		self
	}

	/// Replaces the clock.
	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;

		self
	}

	/// Active configuration.
	pub fn config(&self) -> &ClientConfig {
		&self.config
	}

	/// Shared cache counters.
	pub fn metrics(&self) -> &CacheMetrics {
		&self.metrics
	}

	/// Reads the stored record as-is, including an expired one.
	///
	/// A record with a missing or unreadable expiry is reported as absent.
	pub fn cached_record(&self) -> Result<Option<CachedToken>> {
		let Some(value) = self.storage.get(self.config.token_key())? else {
			return Ok(None);
		};
		let Some(expiry) = self.storage.get(self.config.expiry_key())? else {
			return Ok(None);
		};

		Ok(CachedToken::from_stored(value, &expiry))
	}

	/// Returns the cached token if it is still valid, without any network call.
	pub fn cached_token(&self) -> Result<Option<CsrfToken>> {
		let now = self.clock.now();

		Ok(self
			.cached_record()?
			.filter(|record| record.is_valid_at(now))
			.map(|record| record.value))
	}

	/// Returns a valid token, calling the issuer only when the cache has none.
	pub async fn get_token(&self) -> Result<CsrfToken> {
		const KIND: OperationKind = OperationKind::GetToken;

		if let Some(token) = self.cached_token()? {
			self.metrics.record_hit();
			obs::record_outcome(KIND, OperationOutcome::CacheHit);

			return Ok(token);
		}

		let span = OperationSpan::new(KIND, "get_token");

		obs::record_outcome(KIND, OperationOutcome::Attempt);

		let result: Result<CsrfToken> = span
			.instrument(async {
				let _singleflight = self.fetch_guard.lock().await;

				// Another caller may have filled the cache while this one waited.
				if let Some(token) = self.cached_token()? {
					self.metrics.record_hit();

					return Ok(token);
				}

				self.metrics.record_miss();

				self.fetch_and_store(&span)
					.await
					.inspect_err(|_| self.metrics.record_fetch_failure())
			})
			.await;

		match &result {
			Ok(_) => obs::record_outcome(KIND, OperationOutcome::Success),
			Err(err) => {
				obs::record_failure_detail(KIND, "get_token", err);
				obs::record_outcome(KIND, OperationOutcome::Failure);
			},
		}

		result
	}

	/// Discards the cached record; the next [`get_token`](Self::get_token) calls the issuer.
	///
	/// A fetch already in flight still answers its caller, but its token is not cached.
	pub fn clear_token(&self) -> Result<()> {
		let mut epoch = self.clear_epoch.lock();

		*epoch = epoch.wrapping_add(1);

		self.storage.remove_all(&[self.config.token_key(), self.config.expiry_key()])?;

		Ok(())
	}

	/// Stamps `request` with the token header unless it is a `GET`.
	///
	/// `GET` requests come back untouched without consulting the cache or the issuer.
	pub async fn attach_to_mutating_request<R>(&self, mut request: R) -> Result<R>
	where
		R: CsrfRequest,
	{
		if request.is_read_only() {
			return Ok(request);
		}

		let value = self.header_value().await?;

		request.insert_header(self.config.header_name().clone(), value);

		Ok(request)
	}

	pub(crate) fn current_session(&self) -> Option<BearerCredential> {
		self.session.current_session()
	}

	pub(crate) async fn header_value(&self) -> Result<HeaderValue> {
		let token = self.get_token().await?;
		let mut value = HeaderValue::from_str(token.expose()).map_err(ConfigError::from)?;

		value.set_sensitive(true);

		Ok(value)
	}

	async fn fetch_and_store(&self, span: &OperationSpan) -> Result<CsrfToken> {
		let session = self.session.current_session().ok_or(Error::Unauthenticated)?;

		span.record_session(&session);

		let started_epoch = *self.clear_epoch.lock();
		let response = self.transport.request_token(self.config.endpoint(), &session).await?;
		let token = interpret_response(response)?;
		let record = CachedToken::new(token.clone(), self.clock.now(), self.config.ttl());
		let epoch = self.clear_epoch.lock();

		if *epoch == started_epoch {
			self.storage.set_all(&[
				(self.config.token_key(), record.value.expose().to_owned()),
				(self.config.expiry_key(), record.expiry_millis()),
			])?;
		}

		Ok(token)
	}
}
#[cfg(feature = "reqwest")]
impl TokenClient<ReqwestIssuerTransport> {
	/// Creates a client backed by a default reqwest transport.
	pub fn new(config: ClientConfig, session: impl 'static + SessionSource) -> Self {
		Self::with_transport(config, ReqwestIssuerTransport::default(), session)
	}
}
impl<T> Clone for TokenClient<T>
where
	T: ?Sized + IssuerTransport,
{
	fn clone(&self) -> Self {
		Self {
			config: self.config.clone(),
			transport: self.transport.clone(),
			session: self.session.clone(),
			storage: self.storage.clone(),
			clock: self.clock.clone(),
			metrics: self.metrics.clone(),
			fetch_guard: self.fetch_guard.clone(),
			clear_epoch: self.clear_epoch.clone(),
		}
	}
}
impl<T> Debug for TokenClient<T>
where
	T: ?Sized + IssuerTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenClient")
			.field("config", &self.config)
			.field("session_set", &self.session.current_session().is_some())
			.field("metrics", &self.metrics)
			.finish()
	}
}

#[derive(Deserialize)]
struct TokenBody {
	#[serde(default)]
	token: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
	#[serde(default)]
	error: Option<String>,
}

fn interpret_response(response: IssuerResponse) -> Result<CsrfToken> {
	let status = response.status;

	if status == 401 {
		return Err(Error::Unauthorized {
			reason: error_reason(&response.body).unwrap_or_else(|| "Unauthorized".into()),
		});
	}
	if !response.is_success() {
		return Err(TransientError::IssuerEndpoint {
			message: error_reason(&response.body)
				.unwrap_or_else(|| format!("Request failed with status {status}")),
			status: Some(status),
			retry_after: response.retry_after,
		}
		.into());
	}

	let mut de = serde_json::Deserializer::from_slice(&response.body);
	let body: TokenBody = serde_path_to_error::deserialize(&mut de)
		.map_err(|source| ResponseError::MalformedJson { source, status })?;

	match body.token {
		Some(token) if token.is_empty() => Err(ResponseError::MissingToken { status }.into()),
		Some(token) if HeaderValue::from_str(&token).is_err() =>
			Err(ResponseError::InvalidToken { status }.into()),
		Some(token) => Ok(CsrfToken::new(token)),
		None => Err(ResponseError::MissingToken { status }.into()),
	}
}

fn error_reason(body: &[u8]) -> Option<String> {
	serde_json::from_slice::<ErrorBody>(body).ok()?.error.filter(|reason| !reason.is_empty())
}
