//! HarvestLink - agricultural marketplace backend
//!
//! Farmers list crops; firms find farmers; both sides connect through
//! mutual friend requests.

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use harvestlink::{
    auth::JwtValidator,
    config::Args,
    db::MongoClient,
    friends::{MongoRelationshipStore, RelationshipManager},
    server::{self, AppState},
    sms::SmsClient,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    // Parse command line arguments
    let args = Args::parse();

    // Initialize tracing/logging
    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("harvestlink={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Validate configuration
    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    // Print startup banner
    info!("======================================");
    info!("  HarvestLink - farm to firm");
    info!("======================================");
    info!("Node ID: {}", args.node_id);
    info!("Listen: {}", args.listen);
    info!("MongoDB: {}", args.mongodb_uri);
    info!("JWT expiry: {}s", args.jwt_expiry_seconds);
    info!(
        "SMS gateway: {}",
        if args.sms_config().is_some() { "configured" } else { "not configured" }
    );
    info!("======================================");

    // Connect to MongoDB
    let mongo = match MongoClient::new(&args.mongodb_uri, &args.mongodb_db).await {
        Ok(client) => {
            info!("MongoDB connected successfully");
            client
        }
        Err(e) => {
            error!("MongoDB connection failed: {}", e);
            std::process::exit(1);
        }
    };

    // Relationship ledger over MongoDB
    let store = match MongoRelationshipStore::new(&mongo).await {
        Ok(s) => Arc::new(s),
        Err(e) => {
            error!("Failed to initialize relationship store: {}", e);
            std::process::exit(1);
        }
    };
    let friends = RelationshipManager::new(store);

    // JWT validator
    let jwt = match JwtValidator::new(args.jwt_secret.clone(), args.jwt_expiry_seconds) {
        Ok(v) => v,
        Err(e) => {
            error!("JWT configuration error: {}", e);
            std::process::exit(1);
        }
    };

    // Optional SMS gateway
    let sms = args.sms_config().map(SmsClient::new);

    let state = Arc::new(AppState::new(args, mongo, jwt, friends, sms));

    server::run(state).await?;

    Ok(())
}
