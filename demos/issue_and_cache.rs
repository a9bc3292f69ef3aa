//! Runs the issuer in-process, then shows the client caching one token across calls and
//! stamping only the mutating request.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use time::{Duration, OffsetDateTime};
use tokio::{net::TcpListener, sync::oneshot};
// self
use csrf_broker::{
	auth::{BearerCredential, Identity, MemorySessionResolver, Role, UserId},
	client::{ClientConfig, TokenClient},
	issuer::{self, MemoryAuditSink, RouterOptions, TokenIssuer},
	url::Url,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let session = BearerCredential::new("demo-session")?;
	let resolver = MemorySessionResolver::default();

	resolver.insert(
		session.clone(),
		Identity::new(UserId::new("donor-42")?, "donor@example.com").with_role(Role::Donor),
		OffsetDateTime::now_utc() + Duration::hours(1),
	);

	let audit = MemoryAuditSink::default();
	let issuer = TokenIssuer::new(Arc::new(resolver)).with_audit_sink(Arc::new(audit.clone()));
	let options = RouterOptions::default();
	let listener = TcpListener::bind("127.0.0.1:0").await?;
	let addr = listener.local_addr()?;
	let (stop, stopped) = oneshot::channel::<()>();
	let server = tokio::spawn(issuer::serve(listener, issuer::router(issuer, &options), async {
		stopped.await.ok();
	}));
	let endpoint = Url::parse(&format!("http://{addr}{}", options.route()))?;
	let client = TokenClient::new(ClientConfig::new(endpoint)?, session);
	let first = client.get_token().await?;
	let second = client.get_token().await?;

	println!("Cached token reused: {}.", first == second);

	let read = http::Request::get("https://api.example.com/campaigns").body(())?;
	let read = client.attach_to_mutating_request(read).await?;
	let write = http::Request::post("https://api.example.com/donations").body(())?;
	let write = client.attach_to_mutating_request(write).await?;

	println!("GET carries a token: {}.", read.headers().contains_key("x-csrf-token"));
	println!("POST carries a token: {}.", write.headers().contains_key("x-csrf-token"));
	println!(
		"Issuer calls: {}; cache hits: {}; audit entries: {}.",
		client.metrics().misses(),
		client.metrics().hits(),
		audit.entries().len()
	);

	client.clear_token()?;
	stop.send(()).ok();
	server.await??;

	Ok(())
}
