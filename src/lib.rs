//! Anti-forgery token issuance and caching: an authenticated issuer endpoint that mints
//! random tokens, plus a session-scoped client cache that stamps every mutating request.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod client;
pub mod error;
pub mod issuer;
pub mod obs;
pub mod store;
pub mod transport;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		auth::{BearerCredential, Identity, MemorySessionResolver, Role, UserId},
		client::{ClientConfig, ManualClock, TokenClient},
		store::MemorySessionStorage,
		transport::IssuerTransport,
	};

	/// Fixed instant used by tests that drive a [`ManualClock`].
	pub const TEST_EPOCH: OffsetDateTime = time::macros::datetime!(2025-06-01 12:00 UTC);

	/// Parses a bearer credential fixture.
	pub fn test_credential(raw: &str) -> BearerCredential {
		BearerCredential::new(raw).expect("Bearer credential fixture should be valid.")
	}

	/// Builds an identity fixture with the provided user identifier and role.
	pub fn test_identity(user_id: &str, role: Role) -> Identity {
		let email = format!("{user_id}@example.com");
		let user_id = UserId::new(user_id).expect("User identifier fixture should be valid.");

		Identity::new(user_id, email).with_role(role)
	}

	/// Builds a resolver that accepts `credential` for `identity` for one day after
	/// [`TEST_EPOCH`] and beyond the real clock.
	pub fn test_resolver(credential: &str, identity: Identity) -> Arc<MemorySessionResolver> {
		let resolver = MemorySessionResolver::default();

		resolver.insert(
			test_credential(credential),
			identity,
			OffsetDateTime::now_utc().max(TEST_EPOCH) + Duration::days(1),
		);

		Arc::new(resolver)
	}

	/// Constructs a [`TokenClient`] wired to a manual clock and in-memory session storage.
	pub fn build_test_client<T>(
		config: ClientConfig,
		transport: impl Into<Arc<T>>,
		session: &str,
	) -> (TokenClient<T>, Arc<MemorySessionStorage>, Arc<ManualClock>)
	where
		T: ?Sized + IssuerTransport,
	{
		let storage = Arc::new(MemorySessionStorage::default());
		let clock = Arc::new(ManualClock::new(TEST_EPOCH));
		let client = TokenClient::with_transport(config, transport, test_credential(session))
			.with_storage(storage.clone())
			.with_clock(clock.clone());

		(client, storage, clock)
	}

	#[cfg(feature = "reqwest")]
	/// Same as [`build_test_client`] with the insecure reqwest transport from
	/// [`test_reqwest_transport`].
	pub fn build_reqwest_test_client(
		config: ClientConfig,
		session: &str,
	) -> (
		TokenClient<crate::transport::ReqwestIssuerTransport>,
		Arc<MemorySessionStorage>,
		Arc<ManualClock>,
	) {
		build_test_client::<crate::transport::ReqwestIssuerTransport>(
			config,
			test_reqwest_transport(),
			session,
		)
	}

	#[cfg(feature = "reqwest")]
	/// Builds a reqwest client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_client() -> ReqwestClient {
		ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.")
	}

	#[cfg(feature = "reqwest")]
	/// Wraps [`test_reqwest_client`] in an issuer transport.
	pub fn test_reqwest_transport() -> crate::transport::ReqwestIssuerTransport {
		crate::transport::ReqwestIssuerTransport::with_client(test_reqwest_client())
	}
}

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(feature = "cli")] use {color_eyre as _, tracing_subscriber as _};
#[cfg(test)]
use {
	color_eyre as _, http_body_util as _, httpmock as _, regex as _, tokio as _, tower as _,
};
