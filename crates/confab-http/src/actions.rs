//! Built-in control actions.
//!
//! These mirror the operations a remote caller needs to drive the bot:
//! sending messages (with optional reply forwarding), fetching a message by
//! id, and reading the bot's network identity.

use serde_json::Value;
use tracing::debug;

use confab_core::{Client, Message, Outbound};

use crate::server::ApiServer;

pub(crate) fn install_builtins(server: &mut ApiServer) {
    let webhook = server.webhook().clone();
    let default_target = server.config().default_target.clone();

    server
        .add("send_msg", move |client: Client, params: Value| {
            let webhook = webhook.clone();
            let default_target = default_target.clone();
            async move {
                let to = params
                    .get("to")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .or(default_target)
                    .ok_or_else(|| anyhow::anyhow!("key \"to\" missing in request"))?;
                let text = params
                    .get("text")
                    .and_then(Value::as_str)
                    .unwrap_or("empty message")
                    .to_string();
                let log = params
                    .get("log")
                    .and_then(Value::as_str)
                    .unwrap_or("api::send_msg")
                    .to_string();
                let quote_id = params
                    .get("quote_id")
                    .and_then(Value::as_str)
                    .map(str::to_string);
                let reply_url = params
                    .get("reply_url")
                    .and_then(Value::as_str)
                    .map(str::to_string);

                let mut outbound = Outbound::text(text).to(to).log(log);
                if let Some(quote_id) = quote_id {
                    outbound = outbound.quote(quote_id);
                }
                let sent = client.send(outbound).await?;

                if let Some(url) = reply_url {
                    let msg_id = sent.id.clone();
                    debug!(msg_id = %msg_id, url = %url, "binding reply webhook");
                    sent.on_reply(move |reply: Message| async move {
                        webhook.forward_reply(&url, &msg_id, &reply).await?;
                        Ok(())
                    })?;
                }

                Ok(serde_json::to_value(&sent)?)
            }
        })
        .expect("builtin action names are non-empty");

    server
        .add("get_message", |client: Client, params: Value| async move {
            let id = params
                .get("id")
                .and_then(Value::as_str)
                .ok_or_else(|| anyhow::anyhow!("key \"id\" missing in request"))?;
            if id.is_empty() {
                anyhow::bail!("key \"id\" not valid");
            }
            match client.message_by_id(id).await? {
                Some(message) => Ok(serde_json::to_value(&message)?),
                None => Ok(Value::Null),
            }
        })
        .expect("builtin action names are non-empty");

    server
        .add("host_device", |client: Client, _params: Value| async move {
            match client.identity() {
                Some(identity) => Ok(serde_json::to_value(&identity)?),
                None => Ok(Value::Null),
            }
        })
        .expect("builtin action names are non-empty");
}

#[cfg(test)]
mod tests {
    use crate::server::{ApiConfig, ApiRequest, ApiServer};

    use std::sync::Arc;

    use serde_json::json;

    use confab_adapter_inproc::{InprocDriver, InprocHandle};
    use confab_core::{Client, DriverIdentity};

    async fn api_fixture(default_target: Option<&str>) -> (ApiServer, InprocHandle) {
        let driver = InprocDriver::new(DriverIdentity::new("confab", "bot@inproc"));
        let handle = driver.handle();
        let client = Client::new(Arc::new(driver));
        client.start().await.unwrap();

        let config = ApiConfig {
            default_target: default_target.map(str::to_string),
            ..ApiConfig::default()
        };
        (ApiServer::new(client, config).unwrap(), handle)
    }

    fn request(action: &str, params: serde_json::Value) -> ApiRequest {
        ApiRequest {
            action: action.to_string(),
            params,
        }
    }

    #[tokio::test]
    async fn send_msg_delivers_through_the_driver() {
        let (server, handle) = api_fixture(None).await;

        let response = server
            .execute("127.0.0.1", request("send_msg", json!({"to": "operator", "text": "hi"})))
            .await;

        assert!(response.done, "unexpected failure: {:?}", response.error);
        let delivery = handle.last_delivery().unwrap();
        assert_eq!(delivery.to, "operator");
        assert_eq!(delivery.message.body.as_deref(), Some("hi"));
        assert_eq!(response.data.unwrap()["id"], delivery.message.id);
    }

    #[tokio::test]
    async fn send_msg_without_target_fails_unless_defaulted() {
        let (server, _handle) = api_fixture(None).await;
        let response = server
            .execute("127.0.0.1", request("send_msg", json!({"text": "hi"})))
            .await;
        assert!(!response.done);
        assert!(response.error.unwrap().contains("\"to\""));

        let (server, handle) = api_fixture(Some("operator")).await;
        let response = server
            .execute("127.0.0.1", request("send_msg", json!({"text": "hi"})))
            .await;
        assert!(response.done);
        assert_eq!(handle.last_delivery().unwrap().to, "operator");
    }

    #[tokio::test]
    async fn send_msg_with_reply_url_binds_a_continuation() {
        let (server, handle) = api_fixture(None).await;

        let response = server
            .execute(
                "127.0.0.1",
                request(
                    "send_msg",
                    json!({
                        "to": "operator",
                        "text": "pick one",
                        "reply_url": "http://127.0.0.1:9/never-called",
                    }),
                ),
            )
            .await;

        assert!(response.done);
        let sent_id = handle.last_delivery().unwrap().message.id;
        assert_eq!(response.data.unwrap()["id"], sent_id);
        assert!(server.client().correlator().contains(&sent_id));
    }

    #[tokio::test]
    async fn get_message_round_trips_and_misses_cleanly() {
        let (server, handle) = api_fixture(None).await;

        server
            .execute("127.0.0.1", request("send_msg", json!({"to": "operator", "text": "kept"})))
            .await;
        let sent_id = handle.last_delivery().unwrap().message.id;

        let response = server
            .execute("127.0.0.1", request("get_message", json!({"id": sent_id})))
            .await;
        assert!(response.done);
        assert_eq!(response.data.unwrap()["body"], "kept");

        let response = server
            .execute("127.0.0.1", request("get_message", json!({"id": "unknown"})))
            .await;
        assert!(response.done);
        assert_eq!(response.data.unwrap(), serde_json::Value::Null);

        let response = server
            .execute("127.0.0.1", request("get_message", json!({})))
            .await;
        assert!(!response.done);
    }

    #[tokio::test]
    async fn host_device_reports_identity() {
        let (server, _handle) = api_fixture(None).await;
        let response = server.execute("127.0.0.1", request("host_device", json!({}))).await;
        assert!(response.done);
        assert_eq!(response.data.unwrap()["user"], "confab");
    }

    #[tokio::test]
    async fn unknown_action_is_a_soft_failure() {
        let (server, _handle) = api_fixture(None).await;
        let response = server.execute("127.0.0.1", request("reboot", json!({}))).await;
        assert!(!response.done);
        assert_eq!(response.error.as_deref(), Some("action not found"));
    }
}
