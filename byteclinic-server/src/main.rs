// byteclinic-server/src/main.rs

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use byteclinic_common::Error;
use byteclinic_core::auth::HostedAuthVerifier;
use byteclinic_core::codegen::RandomCodeGenerator;
use byteclinic_core::provider::StripeProvider;
use byteclinic_core::repositories::postgres::{
    PostgresAdminGrantRepository, PostgresPaymentCodeRepository,
};
use byteclinic_core::services::{
    AdminGate, CheckoutService, CodeIssuanceService, CodeRedemptionService, MasterKeyConfig,
    WebhookService,
};
use byteclinic_core::Database;

mod routes;
mod state;

use state::AppState;

#[derive(Parser, Debug, Clone)]
#[command(name = "byteclinic-server")]
#[command(author, version, about = "ByteClinic storefront core - payment-code issuance and redemption")]
struct Args {
    /// Address to which the server will bind
    #[arg(long, default_value = "0.0.0.0:8787")]
    server_addr: String,

    /// Postgres connection URL.
    #[arg(long, default_value = "postgres://byteclinic@localhost:5432/byteclinic")]
    db_path: String,

    /// Base URL of the payment provider API.
    #[arg(long, default_value = "https://api.stripe.com")]
    stripe_api_base: String,

    /// Base URL of the hosted auth provider.
    #[arg(long, default_value = "http://localhost:9999")]
    auth_base_url: String,
}

fn required_env(name: &str) -> Result<String, Error> {
    std::env::var(name).map_err(|_| Error::Config(format!("{name} must be set")))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let stripe_secret_key = required_env("STRIPE_SECRET_KEY")?;
    let stripe_webhook_secret = required_env("STRIPE_WEBHOOK_SECRET")?;
    let admin_master_key = required_env("ADMIN_MASTER_KEY")?;
    let auth_api_key = required_env("AUTH_API_KEY")?;

    let db = Database::new(&args.db_path).await?;
    db.migrate().await?;

    let code_repo = Arc::new(PostgresPaymentCodeRepository::new(db.pool().clone()));
    let grant_repo = Arc::new(PostgresAdminGrantRepository::new(db.pool().clone()));

    let provider = Arc::new(StripeProvider::new(&args.stripe_api_base, &stripe_secret_key)?);
    let sessions = Arc::new(HostedAuthVerifier::new(&args.auth_base_url, &auth_api_key)?);

    let state = AppState {
        issuance: Arc::new(CodeIssuanceService::new(
            code_repo.clone(),
            provider.clone(),
            Arc::new(RandomCodeGenerator),
        )),
        redemption: Arc::new(CodeRedemptionService::new(code_repo.clone())),
        checkout: Arc::new(CheckoutService::new(provider.clone())),
        admin_gate: Arc::new(AdminGate::new(
            grant_repo,
            MasterKeyConfig::new(admin_master_key),
        )),
        webhook: Arc::new(WebhookService::new(code_repo, &stripe_webhook_secret)),
        sessions,
    };

    let app = routes::router(state);

    let addr: SocketAddr = args
        .server_addr
        .parse()
        .map_err(|e| Error::Config(format!("invalid server address: {e}")))?;
    info!("ByteClinic server listening on http://{}", addr);

    axum_server::bind(addr)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}
