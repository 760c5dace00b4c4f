//! Outbound reply forwarding.
//!
//! When a `send_msg` API call carries a `reply_url`, the eventual reply to
//! that message is forwarded to the URL as JSON. This client is the only
//! outbound HTTP surface the framework owns.

use reqwest::ClientBuilder;
use serde_json::{Value, json};
use std::time::Duration;

use confab_core::Message;

/// Request timeout for webhook deliveries.
const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(30);

/// JSON-posting client for reply forwarding.
#[derive(Clone)]
pub struct Webhook {
    http: reqwest::Client,
    access_token: Option<String>,
}

impl Webhook {
    /// Creates a webhook client, optionally authenticating with a bearer
    /// token.
    pub fn new(access_token: Option<String>) -> reqwest::Result<Self> {
        let http = ClientBuilder::new().timeout(WEBHOOK_TIMEOUT).build()?;
        Ok(Self { http, access_token })
    }

    /// Forwards a correlated reply to `url`.
    ///
    /// The payload names the outbound message the reply quoted and carries
    /// the normalized reply itself.
    pub async fn forward_reply(
        &self,
        url: &str,
        msg_id: &str,
        reply: &Message,
    ) -> anyhow::Result<Value> {
        let body = json!({
            "action": "on_reply",
            "msg_id": msg_id,
            "reply": reply,
        });
        let mut request = self.http.post(url).json(&body);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("webhook returned HTTP {}", status.as_u16());
        }
        Ok(response.json().await.unwrap_or(Value::Null))
    }
}

impl std::fmt::Debug for Webhook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Webhook")
            .field("authenticated", &self.access_token.is_some())
            .finish()
    }
}
