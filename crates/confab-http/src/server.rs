//! The HTTP control endpoint.
//!
//! One `POST` route accepts `{ "action": "...", ...params }` envelopes,
//! authenticates them with a bearer token, and executes the named action
//! from a registry that mirrors the trigger registry's validation rules.
//! Action failures are contained: the caller always gets a
//! `{ done, data | error }` envelope, never a 500 from a throwing handler.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{ConnectInfo, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{error, info, warn};

use confab_core::{Client, RegistryError, safe_call};

use crate::actions;
use crate::webhook::Webhook;

/// Control-endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Whether the runtime serves the endpoint at all.
    #[serde(default)]
    pub enabled: bool,
    /// Bind host.
    #[serde(default = "default_host")]
    pub host: String,
    /// Bind port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Route path of the control endpoint.
    #[serde(default = "default_path")]
    pub path: String,
    /// Bearer token callers must present; `None` disables authentication.
    #[serde(default)]
    pub access_token: Option<String>,
    /// Fallback target for `send_msg` calls that name none.
    #[serde(default)]
    pub default_target: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: default_host(),
            port: default_port(),
            path: default_path(),
            access_token: None,
            default_target: None,
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    1615
}

fn default_path() -> String {
    "/bot".to_string()
}

/// One action request envelope.
#[derive(Debug, Deserialize)]
pub struct ApiRequest {
    /// Name of the action to execute.
    pub action: String,
    /// Remaining fields, handed to the action verbatim.
    #[serde(flatten)]
    pub params: Value,
}

/// The uniform action response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse {
    /// Whether the action completed.
    pub done: bool,
    /// Action result, present on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Failure description, present on error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiResponse {
    fn done(data: Value) -> Self {
        Self {
            done: true,
            data: Some(data),
            error: None,
        }
    }

    fn failed(error: impl std::fmt::Display) -> Self {
        Self {
            done: false,
            data: None,
            error: Some(error.to_string()),
        }
    }
}

/// Errors from standing the endpoint up.
#[derive(Debug, Error)]
pub enum ApiServerError {
    /// The bind address could not be claimed.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The outbound HTTP client could not be built.
    #[error("http client init failed: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// A named API action.
pub type ApiAction =
    Arc<dyn Fn(Client, Value) -> BoxFuture<'static, anyhow::Result<Value>> + Send + Sync>;

/// The control endpoint over one client.
pub struct ApiServer {
    client: Client,
    webhook: Webhook,
    actions: HashMap<String, ApiAction>,
    config: ApiConfig,
}

impl ApiServer {
    /// Creates the server with the built-in actions installed.
    pub fn new(client: Client, config: ApiConfig) -> Result<Self, ApiServerError> {
        let webhook = Webhook::new(config.access_token.clone())?;
        let mut server = Self {
            client,
            webhook,
            actions: HashMap::new(),
            config,
        };
        actions::install_builtins(&mut server);
        Ok(server)
    }

    /// The client this endpoint drives.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// The server configuration.
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// The reply-forwarding client.
    pub fn webhook(&self) -> &Webhook {
        &self.webhook
    }

    /// Registers an action (replacing any same-named one).
    pub fn add<F, Fut>(&mut self, name: &str, action: F) -> Result<(), RegistryError>
    where
        F: Fn(Client, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        self.actions.insert(
            name.to_string(),
            Arc::new(move |client, params| Box::pin(action(client, params))),
        );
        Ok(())
    }

    /// Names of registered actions.
    pub fn action_names(&self) -> Vec<&str> {
        self.actions.keys().map(String::as_str).collect()
    }

    /// Executes one request envelope.
    ///
    /// Never fails outward: unknown actions and contained action failures
    /// both come back as `done: false`.
    pub async fn execute(&self, remote: &str, request: ApiRequest) -> ApiResponse {
        if request.action.is_empty() {
            return ApiResponse::failed("key \"action\" not valid");
        }
        let Some(action) = self.actions.get(&request.action) else {
            return ApiResponse::failed("action not found");
        };

        info!(action = %request.action, remote = %remote, "executing api action");
        match safe_call(action(self.client.clone(), request.params)).await {
            Ok(data) => ApiResponse::done(data),
            Err(action_error) => {
                warn!(
                    action = %request.action,
                    remote = %remote,
                    error = %action_error,
                    "api action failed"
                );
                ApiResponse::failed(action_error)
            }
        }
    }

    /// Binds the endpoint and serves it in a background task.
    pub async fn serve(self) -> Result<ApiHandle, ApiServerError> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let path = if self.config.path.starts_with('/') {
            self.config.path.clone()
        } else {
            format!("/{}", self.config.path)
        };

        let state = Arc::new(self);
        let router = Router::new()
            .route(&path, post(api_handler))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|source| ApiServerError::Bind {
                addr: addr.clone(),
                source,
            })?;
        let local_addr = listener.local_addr().map_err(|source| ApiServerError::Bind {
            addr: addr.clone(),
            source,
        })?;

        info!(addr = %local_addr, path = %path, "api server listening");

        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();
        tokio::spawn(async move {
            let server = axum::serve(
                listener,
                router.into_make_service_with_connect_info::<SocketAddr>(),
            );
            tokio::select! {
                result = server => {
                    if let Err(serve_error) = result {
                        error!(error = %serve_error, "api server error");
                    }
                }
                _ = &mut shutdown_rx => {
                    info!("api server shutting down");
                }
            }
        });

        Ok(ApiHandle {
            addr: local_addr,
            shutdown: shutdown_tx,
        })
    }
}

impl std::fmt::Debug for ApiServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiServer")
            .field("actions", &self.actions.len())
            .field("path", &self.config.path)
            .finish()
    }
}

/// Handle over a serving endpoint.
pub struct ApiHandle {
    addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
}

impl ApiHandle {
    /// The address the endpoint actually bound.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Stops the endpoint.
    pub fn shutdown(self) {
        let _ = self.shutdown.send(());
    }
}

/// Checks the bearer token on an incoming request.
///
/// A server without a configured token accepts everything.
fn authorized(headers: &HeaderMap, access_token: Option<&str>) -> bool {
    let Some(expected) = access_token else {
        return true;
    };
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .is_some_and(|token| token == expected)
}

async fn api_handler(
    State(state): State<Arc<ApiServer>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(request): Json<ApiRequest>,
) -> Response {
    if !authorized(&headers, state.config.access_token.as_deref()) {
        warn!(remote = %addr, "rejected api call with bad credentials");
        return (StatusCode::UNAUTHORIZED, "bad credentials").into_response();
    }
    let response = state.execute(&addr.ip().to_string(), request).await;
    Json(response).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn missing_token_requirement_accepts_all() {
        assert!(authorized(&HeaderMap::new(), None));
    }

    #[test]
    fn bearer_token_must_match() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer sekrit"),
        );
        assert!(authorized(&headers, Some("sekrit")));
        assert!(!authorized(&headers, Some("other")));
        assert!(!authorized(&HeaderMap::new(), Some("sekrit")));
    }

    #[test]
    fn request_envelope_flattens_params() {
        let request: ApiRequest = serde_json::from_value(serde_json::json!({
            "action": "send_msg",
            "to": "anthony",
            "text": "hi",
        }))
        .unwrap();
        assert_eq!(request.action, "send_msg");
        assert_eq!(request.params["to"], "anthony");
    }

    mod live {
        use super::*;

        use std::sync::Arc;

        use confab_adapter_inproc::InprocDriver;
        use confab_core::{Client, DriverIdentity};

        async fn serve_fixture(access_token: Option<&str>) -> ApiHandle {
            let driver = InprocDriver::new(DriverIdentity::new("confab", "bot@inproc"));
            let client = Client::new(Arc::new(driver));
            client.start().await.unwrap();

            let config = ApiConfig {
                enabled: true,
                host: "127.0.0.1".to_string(),
                port: 0,
                access_token: access_token.map(str::to_string),
                ..ApiConfig::default()
            };
            ApiServer::new(client, config).unwrap().serve().await.unwrap()
        }

        #[tokio::test]
        async fn endpoint_answers_the_envelope() {
            let handle = serve_fixture(Some("sekrit")).await;
            let url = format!("http://{}/bot", handle.addr());
            let http = reqwest::Client::new();

            // Wrong token is rejected before execution.
            let status = http
                .post(&url)
                .json(&serde_json::json!({"action": "host_device"}))
                .send()
                .await
                .unwrap()
                .status();
            assert_eq!(status, StatusCode::UNAUTHORIZED);

            // Authenticated calls get the uniform envelope.
            let body: serde_json::Value = http
                .post(&url)
                .bearer_auth("sekrit")
                .json(&serde_json::json!({"action": "host_device"}))
                .send()
                .await
                .unwrap()
                .json()
                .await
                .unwrap();
            assert_eq!(body["done"], true);
            assert_eq!(body["data"]["user"], "confab");

            handle.shutdown();
        }
    }
}
