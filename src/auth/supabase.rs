//! [`SessionResolver`] backed by the Supabase Auth user endpoint.

// crates.io
use reqwest::{StatusCode, header::AUTHORIZATION};
// self
use crate::{
	_prelude::*,
	auth::{
		BearerCredential, Identity, ResolveError, ResolveFuture, Role, SessionResolver, UserId,
	},
};

/// Resolves bearer sessions by calling `GET {project}/auth/v1/user`.
///
/// The service key is sent as the `apikey` header while the caller's session travels in
/// `Authorization`. Client-side rejections (4xx other than 429) resolve to `None`; every
/// other failure surfaces as [`ResolveError`] so the issuer can answer 500.
#[derive(Clone)]
pub struct SupabaseSessionResolver {
	client: ReqwestClient,
	endpoint: Url,
	api_key: String,
}
impl SupabaseSessionResolver {
	/// Creates a resolver for the project at `project_url` using a default reqwest client.
	pub fn new(project_url: &Url, api_key: impl Into<String>) -> Self {
		Self::with_client(ReqwestClient::default(), project_url, api_key)
	}

	/// Creates a resolver that reuses the caller-provided reqwest client.
	pub fn with_client(
		client: ReqwestClient,
		project_url: &Url,
		api_key: impl Into<String>,
	) -> Self {
		let mut endpoint = project_url.clone();

		endpoint.set_path(&format!("{}/auth/v1/user", project_url.path().trim_end_matches('/')));
		endpoint.set_query(None);

		Self { client, endpoint, api_key: api_key.into() }
	}

	/// User endpoint the resolver calls.
	pub fn endpoint(&self) -> &Url {
		&self.endpoint
	}

	async fn fetch_user(
		&self,
		credential: &BearerCredential,
	) -> Result<Option<Identity>, ResolveError> {
		let response = self
			.client
			.get(self.endpoint.clone())
			.header("apikey", &self.api_key)
			.header(AUTHORIZATION, credential.authorization_header())
			.send()
			.await
			.map_err(ResolveError::transport)?;

		match response.status() {
			status if status.is_success() => (),
			StatusCode::TOO_MANY_REQUESTS =>
				return Err(ResolveError::UnexpectedStatus { status: 429 }),
			status if status.is_client_error() => return Ok(None),
			status => return Err(ResolveError::UnexpectedStatus { status: status.as_u16() }),
		}

		let body = response.bytes().await.map_err(ResolveError::transport)?;

		parse_user(&body).map(Some)
	}
}
impl SessionResolver for SupabaseSessionResolver {
	fn resolve<'a>(&'a self, credential: &'a BearerCredential) -> ResolveFuture<'a> {
		Box::pin(self.fetch_user(credential))
	}
}
impl Debug for SupabaseSessionResolver {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SupabaseSessionResolver")
			.field("endpoint", &self.endpoint.as_str())
			.field("api_key", &"<redacted>")
			.finish()
	}
}

#[derive(Deserialize)]
struct SupabaseUser {
	id: String,
	#[serde(default)]
	email: Option<String>,
	#[serde(default)]
	user_metadata: Option<UserMetadata>,
}

#[derive(Deserialize)]
struct UserMetadata {
	#[serde(default)]
	role: Option<String>,
}

fn parse_user(body: &[u8]) -> Result<Identity, ResolveError> {
	let mut de = serde_json::Deserializer::from_slice(body);
	let user: SupabaseUser =
		serde_path_to_error::deserialize(&mut de).map_err(ResolveError::payload)?;
	let user_id = UserId::new(&user.id).map_err(ResolveError::payload)?;
	// Unknown or missing roles fall back to the provider's default user role.
	let role = user
		.user_metadata
		.and_then(|meta| meta.role)
		.and_then(|role| role.parse::<Role>().ok())
		.unwrap_or_default();

	Ok(Identity::new(user_id, user.email.unwrap_or_default()).with_role(role))
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn endpoint_is_derived_from_project_url() {
		let with_slash =
			Url::parse("https://abc.supabase.co/").expect("URL fixture should parse.");
		let nested = Url::parse("https://gateway.example.com/supabase?x=1")
			.expect("URL fixture should parse.");

		assert_eq!(
			SupabaseSessionResolver::new(&with_slash, "k").endpoint().as_str(),
			"https://abc.supabase.co/auth/v1/user"
		);
		assert_eq!(
			SupabaseSessionResolver::new(&nested, "k").endpoint().as_str(),
			"https://gateway.example.com/supabase/auth/v1/user"
		);
	}

	#[test]
	fn user_payload_maps_role_and_email() {
		let identity = parse_user(
			br#"{"id":"9b1f","email":"owner@shop.test","user_metadata":{"role":"campaign_owner"}}"#,
		)
		.expect("User payload should parse.");

		assert_eq!(&*identity.user_id, "9b1f");
		assert_eq!(identity.email, "owner@shop.test");
		assert_eq!(identity.role, Role::CampaignOwner);

		let fallback = parse_user(br#"{"id":"9b1f","user_metadata":{"role":"wizard"}}"#)
			.expect("Unknown roles should not fail parsing.");

		assert_eq!(fallback.role, Role::User);
		assert_eq!(fallback.email, "");
	}

	#[test]
	fn malformed_payloads_are_resolver_errors() {
		assert!(matches!(parse_user(br#"{"email":"x"}"#), Err(ResolveError::Payload { .. })));
		assert!(matches!(parse_user(br#"{"id":""}"#), Err(ResolveError::Payload { .. })));
		assert!(matches!(parse_user(b"<html>"), Err(ResolveError::Payload { .. })));
	}
}
