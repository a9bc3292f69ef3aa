//! JSON API wrapper that stamps mutating calls with the anti-forgery header.

// crates.io
use http::Method;
use reqwest::{
	RequestBuilder, Response,
	header::{AUTHORIZATION, CONTENT_TYPE},
};
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	client::TokenClient,
	error::{ConfigError, ResponseError, TransportError},
	obs::{self, OperationKind, OperationOutcome, OperationSpan},
	transport::IssuerTransport,
};

/// Sends authenticated JSON requests and invokes serverless functions through a shared
/// [`TokenClient`].
pub struct ApiClient<T>
where
	T: ?Sized + IssuerTransport,
{
	http: ReqwestClient,
	tokens: TokenClient<T>,
	functions_base: Url,
}
impl<T> ApiClient<T>
where
	T: ?Sized + IssuerTransport,
{
	/// Creates a wrapper with a default reqwest client.
	///
	/// `functions_base` is the URL function names are appended to, e.g.
	/// `https://<project>.supabase.co/functions/v1`.
	pub fn new(tokens: TokenClient<T>, functions_base: Url) -> Self {
		Self::with_client(ReqwestClient::default(), tokens, functions_base)
	}

	/// Creates a wrapper that reuses the caller-provided reqwest client.
	pub fn with_client(http: ReqwestClient, tokens: TokenClient<T>, functions_base: Url) -> Self {
		Self { http, tokens, functions_base }
	}

	/// Token cache backing this wrapper.
	pub fn tokens(&self) -> &TokenClient<T> {
		&self.tokens
	}

	/// Sends a JSON request and decodes the JSON response.
	///
	/// Every method except `GET` carries the anti-forgery header, and only those methods send
	/// `body`. Non-2xx answers become [`Error::Api`] with the body's `message` field, or
	/// `Request failed with status N` when there is none.
	pub async fn request_json<B, R>(&self, method: Method, url: Url, body: Option<&B>) -> Result<R>
	where
		B: ?Sized + Serialize,
		R: DeserializeOwned,
	{
		let mutating = method != Method::GET;

		self.observe("request_json", async {
			let mut request = self.authorized(self.http.request(method, url))?;

			if mutating {
				request = request.header(
					self.tokens.config().header_name().clone(),
					self.tokens.header_value().await?,
				);
			}

			// `json` sets the content type itself.
			request = match body {
				Some(body) if mutating => request.json(body),
				_ => request.header(CONTENT_TYPE, "application/json"),
			};

			decode(request.send().await.map_err(TransportError::from)?, &["message"]).await
		})
		.await
	}

	/// Invokes the function `name` with an optional JSON payload.
	///
	/// The anti-forgery header is attached only when `payload` is present.
	pub async fn invoke_function<P, R>(&self, name: &str, payload: Option<&P>) -> Result<R>
	where
		P: ?Sized + Serialize,
		R: DeserializeOwned,
	{
		self.observe("invoke_function", async {
			let url = self.function_url(name)?;
			let mut request = self.authorized(self.http.post(url))?;

			if let Some(payload) = payload {
				request = request
					.header(
						self.tokens.config().header_name().clone(),
						self.tokens.header_value().await?,
					)
					.json(payload);
			}

			decode(request.send().await.map_err(TransportError::from)?, &["error", "message"]).await
		})
		.await
	}

	/// Resolves the URL of function `name` below the functions base.
	pub fn function_url(&self, name: &str) -> Result<Url> {
		let mut url = self.functions_base.clone();

		url.path_segments_mut()
			.map_err(|_| ConfigError::from(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
			.pop_if_empty()
			.push(name);

		Ok(url)
	}

	fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder> {
		let session = self.tokens.current_session().ok_or(Error::Unauthenticated)?;

		Ok(request.header(AUTHORIZATION, session.authorization_header()))
	}

	async fn observe<F, R>(&self, stage: &'static str, fut: F) -> Result<R>
	where
		F: Future<Output = Result<R>>,
	{
		const KIND: OperationKind = OperationKind::ApiRequest;

		obs::record_outcome(KIND, OperationOutcome::Attempt);

		let result = OperationSpan::new(KIND, stage).instrument(fut).await;

		match &result {
			Ok(_) => obs::record_outcome(KIND, OperationOutcome::Success),
			Err(err) => {
				obs::record_failure_detail(KIND, stage, err);
				obs::record_outcome(KIND, OperationOutcome::Failure);
			},
		}

		result
	}
}
impl<T> Clone for ApiClient<T>
where
	T: ?Sized + IssuerTransport,
{
	fn clone(&self) -> Self {
		Self {
			http: self.http.clone(),
			tokens: self.tokens.clone(),
			functions_base: self.functions_base.clone(),
		}
	}
}
impl<T> Debug for ApiClient<T>
where
	T: ?Sized + IssuerTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ApiClient")
			.field("functions_base", &self.functions_base.as_str())
			.field("tokens", &self.tokens)
			.finish()
	}
}

async fn decode<R>(response: Response, message_fields: &[&str]) -> Result<R>
where
	R: DeserializeOwned,
{
	let status = response.status().as_u16();
	let body = response.bytes().await.map_err(TransportError::from)?;

	if !(200..300).contains(&status) {
		let message = serde_json::from_slice::<serde_json::Value>(&body)
			.ok()
			.and_then(|value| {
				message_fields
					.iter()
					.find_map(|field| value.get(field)?.as_str().map(ToOwned::to_owned))
			})
			.filter(|message| !message.is_empty())
			.unwrap_or_else(|| format!("Request failed with status {status}"));

		return Err(Error::Api { status, message });
	}

	let mut de = serde_json::Deserializer::from_slice(&body);

	Ok(serde_path_to_error::deserialize(&mut de)
		.map_err(|source| ResponseError::MalformedJson { source, status })?)
}
