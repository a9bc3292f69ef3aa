//! `csrf-issuer`: serves the token issuer over HTTP, resolving sessions against Supabase Auth.

// std
use std::sync::Arc;
// crates.io
use color_eyre::eyre::{Result, WrapErr};
use tokio::net::TcpListener;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
// self
use csrf_broker::{
	auth::SupabaseSessionResolver,
	issuer::{self, IssuerConfig, TokenIssuer, TracingAuditSink},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;
	tracing_subscriber::registry()
		.with(EnvFilter::new(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into())))
		.with(tracing_subscriber::fmt::layer())
		.init();

	let config = IssuerConfig::from_env().wrap_err("Failed to load issuer configuration.")?;
	let resolver = SupabaseSessionResolver::new(&config.supabase_url, &config.service_role_key);
	let issuer = TokenIssuer::new(Arc::new(resolver)).with_audit_sink(Arc::new(TracingAuditSink));
	let app = issuer::router(issuer, &config.router);
	let listener = TcpListener::bind(config.addr)
		.await
		.wrap_err_with(|| format!("Failed to bind {}.", config.addr))?;

	tracing::info!(addr = %config.addr, route = config.router.route(), "Token issuer listening.");

	issuer::serve(listener, app, async {
		if let Err(e) = tokio::signal::ctrl_c().await {
			tracing::error!(error = %e, "Failed to listen for shutdown signal.");
		}
	})
	.await
	.wrap_err("Token issuer server failed.")?;

	tracing::info!("Token issuer stopped.");

	Ok(())
}
