#![cfg(all(feature = "reqwest", feature = "test"))]

// crates.io
use httpmock::prelude::*;
// self
use csrf_broker::{
	_preludet::*,
	auth::{ResolveError, Role, SessionResolver, SupabaseSessionResolver},
};

const SERVICE_KEY: &str = "service-role-key";

fn resolver(server: &MockServer) -> SupabaseSessionResolver {
	let project = Url::parse(&server.base_url()).expect("Mock project URL should parse.");

	SupabaseSessionResolver::with_client(test_reqwest_client(), &project, SERVICE_KEY)
}

#[tokio::test]
async fn live_session_resolves_to_identity() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/auth/v1/user")
				.header("apikey", SERVICE_KEY)
				.header("authorization", "Bearer user-jwt");
			then.status(200).header("content-type", "application/json").body(
				"{\"id\":\"8f14e45f\",\"email\":\"owner@shop.test\",\"user_metadata\":{\"role\":\"store_owner\"}}",
			);
		})
		.await;
	let identity = resolver(&server)
		.resolve(&test_credential("user-jwt"))
		.await
		.expect("Resolution should succeed.")
		.expect("A live session should resolve to an identity.");

	mock.assert_async().await;

	assert_eq!(&*identity.user_id, "8f14e45f");
	assert_eq!(identity.email, "owner@shop.test");
	assert_eq!(identity.role, Role::StoreOwner);
}

#[tokio::test]
async fn rejected_sessions_resolve_to_none() {
	let server = MockServer::start_async().await;
	let resolver = resolver(&server);

	for status in [401, 403, 404] {
		let mut mock = server
			.mock_async(|when, then| {
				when.method(GET).path("/auth/v1/user");
				then.status(status).body("{\"msg\":\"invalid JWT\"}");
			})
			.await;
		let resolved = resolver
			.resolve(&test_credential("invalid"))
			.await
			.expect("Client rejections are not resolver failures.");

		mock.assert_async().await;
		mock.delete_async().await;

		assert_eq!(resolved, None, "status {status}");
	}
}

#[tokio::test]
async fn provider_failures_are_resolver_errors() {
	let server = MockServer::start_async().await;
	let resolver = resolver(&server);

	for status in [429, 500, 502] {
		let mut mock = server
			.mock_async(|when, then| {
				when.method(GET).path("/auth/v1/user");
				then.status(status);
			})
			.await;
		let err = resolver
			.resolve(&test_credential("user-jwt"))
			.await
			.expect_err("Provider failures should surface as errors.");

		mock.delete_async().await;

		assert!(matches!(err, ResolveError::UnexpectedStatus { status: s } if s == status));
	}

	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/auth/v1/user");
			then.status(200).body("{\"email\":\"no-id@shop.test\"}");
		})
		.await;
	let err = resolver
		.resolve(&test_credential("user-jwt"))
		.await
		.expect_err("Payloads without an id should be rejected.");

	mock.assert_async().await;

	assert!(matches!(err, ResolveError::Payload { .. }));
}
