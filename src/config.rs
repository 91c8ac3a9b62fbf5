//! Configuration for HarvestLink
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use std::net::SocketAddr;
use uuid::Uuid;

use crate::sms::SmsConfig;

/// HarvestLink - agricultural marketplace backend
#[derive(Parser, Debug, Clone)]
#[command(name = "harvestlink")]
#[command(about = "HTTP backend for the HarvestLink agricultural marketplace")]
pub struct Args {
    /// Unique node identifier for this instance
    #[arg(long, env = "NODE_ID", default_value_t = Uuid::new_v4())]
    pub node_id: Uuid,

    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "harvestlink")]
    pub mongodb_db: String,

    /// JWT secret for token signing (required, no insecure default)
    #[arg(long, env = "JWT_SECRET")]
    pub jwt_secret: String,

    /// JWT token expiry in seconds (login sessions last two hours)
    #[arg(long, env = "JWT_EXPIRY_SECONDS", default_value = "7200")]
    pub jwt_expiry_seconds: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// SMS gateway account SID (notifications disabled when unset)
    #[arg(long, env = "TWILIO_ACCOUNT_SID")]
    pub twilio_account_sid: Option<String>,

    /// SMS gateway auth token
    #[arg(long, env = "TWILIO_AUTH_TOKEN")]
    pub twilio_auth_token: Option<String>,

    /// SMS gateway sending number
    #[arg(long, env = "TWILIO_FROM_NUMBER")]
    pub twilio_from_number: Option<String>,
}

impl Args {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.jwt_secret.len() < 32 {
            return Err("JWT_SECRET must be at least 32 characters".to_string());
        }

        let sms_fields = [
            &self.twilio_account_sid,
            &self.twilio_auth_token,
            &self.twilio_from_number,
        ];
        let set = sms_fields.iter().filter(|f| f.is_some()).count();
        if set != 0 && set != sms_fields.len() {
            return Err(
                "TWILIO_ACCOUNT_SID, TWILIO_AUTH_TOKEN and TWILIO_FROM_NUMBER must be set together"
                    .to_string(),
            );
        }

        Ok(())
    }

    /// SMS gateway configuration, if fully specified
    pub fn sms_config(&self) -> Option<SmsConfig> {
        Some(SmsConfig {
            account_sid: self.twilio_account_sid.clone()?,
            auth_token: self.twilio_auth_token.clone()?,
            from_number: self.twilio_from_number.clone()?,
        })
    }
}
