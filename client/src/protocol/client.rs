use std::time::Duration;

use async_trait::async_trait;
use derive_builder::Builder;
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::protocol::models::{
    BridgeStatus, ConnectRequest, CreateGroupRequest, GroupMap, GroupUpdate, LightMap,
    LightUpdate,
};

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

const FALLBACK_DETAIL: &str = "Request failed";

#[derive(Error, Debug)]
pub enum IrisClientError {
    #[error("Not connected to a bridge")]
    InvalidState,
    #[error("Connection failed: {0}")]
    Connection(String),
    #[error("{detail} (HTTP {status})")]
    Api { status: u16, detail: String },
    #[error("Invalid response: {0}")]
    Decode(String),
    #[error("{0}")]
    Validation(String),
    #[error("Client request failed: {0}")]
    Generic(String),
}

impl IrisClientError {
    /// Message suitable for an inline error line in a view.
    pub fn detail(&self) -> String {
        match self {
            IrisClientError::Api { detail, .. } => detail.clone(),
            IrisClientError::Validation(message) => message.clone(),
            other => other.to_string(),
        }
    }
}

#[derive(Builder, Debug, Clone)]
pub struct BridgeOptions {
    #[builder(setter(into), default = "DEFAULT_API_URL.to_string()")]
    pub base_url: String,
    #[builder(default = "Duration::from_secs(10)")]
    pub timeout: Duration,
}

impl BridgeOptions {
    pub fn builder() -> BridgeOptionsBuilder {
        BridgeOptionsBuilder::default()
    }
}

/// Operations of the bridge-control service. The store only talks to the
/// service through this trait.
#[async_trait]
pub trait BridgeClientTrait: Clone + Send + Sync + 'static {
    async fn status(&self) -> Result<BridgeStatus, IrisClientError>;
    async fn connect(&self, ip: &str) -> Result<(), IrisClientError>;
    async fn lights(&self) -> Result<LightMap, IrisClientError>;
    async fn groups(&self) -> Result<GroupMap, IrisClientError>;
    async fn room_classes(&self) -> Result<Vec<String>, IrisClientError>;
    async fn update_light(&self, id: &str, update: &LightUpdate) -> Result<(), IrisClientError>;
    async fn update_group(&self, id: &str, update: &GroupUpdate) -> Result<(), IrisClientError>;
    async fn create_group(&self, request: &CreateGroupRequest) -> Result<(), IrisClientError>;
    async fn delete_group(&self, id: &str) -> Result<(), IrisClientError>;
}

#[derive(Clone, Debug)]
pub struct HttpBridgeClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpBridgeClient {
    pub fn new(options: BridgeOptions) -> Result<Self, IrisClientError> {
        let http = reqwest::Client::builder()
            .timeout(options.timeout)
            .build()
            .map_err(|e| IrisClientError::Generic(e.to_string()))?;
        let base_url = options.base_url.trim_end_matches('/').to_string();
        info!("Using bridge service at {base_url}");
        Ok(Self { http, base_url })
    }

    async fn request<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, IrisClientError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let url = format!("{}{path}", self.base_url);
        debug!("{method} {url}");
        let mut builder = self.http.request(method, &url);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        let response = builder
            .send()
            .await
            .map_err(|e| IrisClientError::Connection(e.to_string()))?;
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| IrisClientError::Connection(e.to_string()))?;

        if !status.is_success() {
            return Err(api_error(status, &bytes));
        }

        // Status-only answers may come back with an empty body.
        let bytes: &[u8] = if bytes.is_empty() { b"null" } else { &bytes };
        serde_json::from_slice(bytes).map_err(|e| IrisClientError::Decode(e.to_string()))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, IrisClientError> {
        self.request::<Value, T>(Method::GET, path, None).await
    }
}

fn api_error(status: StatusCode, body: &[u8]) -> IrisClientError {
    let detail = serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|value| match value.get("detail") {
            Some(Value::String(text)) => Some(text.clone()),
            Some(Value::Null) | None => None,
            Some(other) => Some(other.to_string()),
        })
        .unwrap_or_else(|| FALLBACK_DETAIL.to_string());
    IrisClientError::Api {
        status: status.as_u16(),
        detail,
    }
}

#[async_trait]
impl BridgeClientTrait for HttpBridgeClient {
    async fn status(&self) -> Result<BridgeStatus, IrisClientError> {
        self.get("/api/status").await
    }

    async fn connect(&self, ip: &str) -> Result<(), IrisClientError> {
        let body = ConnectRequest { ip: ip.to_string() };
        self.request::<_, Value>(Method::POST, "/api/connect", Some(&body))
            .await?;
        info!("Bridge at {ip} connected");
        Ok(())
    }

    async fn lights(&self) -> Result<LightMap, IrisClientError> {
        self.get("/api/lights").await
    }

    async fn groups(&self) -> Result<GroupMap, IrisClientError> {
        self.get("/api/groups").await
    }

    async fn room_classes(&self) -> Result<Vec<String>, IrisClientError> {
        self.get("/api/room-classes").await
    }

    async fn update_light(&self, id: &str, update: &LightUpdate) -> Result<(), IrisClientError> {
        self.request::<_, Value>(Method::PUT, &format!("/api/lights/{id}"), Some(update))
            .await?;
        Ok(())
    }

    async fn update_group(&self, id: &str, update: &GroupUpdate) -> Result<(), IrisClientError> {
        self.request::<_, Value>(Method::PUT, &format!("/api/groups/{id}"), Some(update))
            .await?;
        Ok(())
    }

    async fn create_group(&self, request: &CreateGroupRequest) -> Result<(), IrisClientError> {
        let created: Value = self
            .request(Method::POST, "/api/groups", Some(request))
            .await?;
        info!("Created room '{}': {created}", request.name);
        Ok(())
    }

    async fn delete_group(&self, id: &str) -> Result<(), IrisClientError> {
        self.request::<Value, Value>(Method::DELETE, &format!("/api/groups/{id}"), None)
            .await?;
        Ok(())
    }
}
