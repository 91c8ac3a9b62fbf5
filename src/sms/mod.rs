//! SMS notification client
//!
//! Thin REST client for the Twilio Messages API. Notifications are a
//! courtesy: callers fire-and-forget and a delivery failure never changes
//! an API result.

use serde::Deserialize;
use tracing::{debug, info};

use crate::types::HarvestError;

/// Credentials and sending number for the SMS gateway
#[derive(Debug, Clone)]
pub struct SmsConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    sid: String,
}

/// SMS gateway client
#[derive(Clone)]
pub struct SmsClient {
    http: reqwest::Client,
    config: SmsConfig,
}

impl SmsClient {
    pub fn new(config: SmsConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Send one SMS, returning the provider message id
    pub async fn send(&self, to: &str, body: &str) -> Result<String, HarvestError> {
        let url = format!(
            "https://api.twilio.com/2010-04-01/Accounts/{}/Messages.json",
            self.config.account_sid
        );

        let params = [
            ("To", to),
            ("From", self.config.from_number.as_str()),
            ("Body", body),
        ];

        let response = self
            .http
            .post(&url)
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(HarvestError::Sms(format!(
                "gateway returned {}: {}",
                status, detail
            )));
        }

        let message: MessageResponse = response.json().await?;
        info!("SMS sent to {} (sid {})", to, message.sid);
        Ok(message.sid)
    }

    /// Courtesy note to the receiver of a new friend request
    pub async fn notify_friend_request(
        &self,
        to: &str,
        sender_name: &str,
    ) -> Result<String, HarvestError> {
        debug!("Notifying {} of friend request from {}", to, sender_name);
        let body = format!(
            "{} sent you a friend request on HarvestLink. Log in to respond.",
            sender_name
        );
        self.send(to, &body).await
    }
}
