use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::{
    Ack, ActiveTeam, ApiResponse, AuthApi, AuthResponse, FlotillaApiError, InitSwarmRequest,
    JoinSwarmRequest, LoginRequest, NodesApi, SwarmNode, SwarmStatus, SwarmTokens, TeamsApi,
    TokenProvider, UserProfile,
};

pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:8080";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpApiConfig {
    pub api_base: String,
    pub request_timeout_ms: u64,
}

impl Default for HttpApiConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ServerErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Clone)]
/// reqwest-backed implementation of the backend contracts.
pub struct HttpApiClient {
    client: reqwest::Client,
    config: HttpApiConfig,
    token_provider: Option<Arc<dyn TokenProvider>>,
}

impl std::fmt::Debug for HttpApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpApiClient")
            .field("config", &self.config)
            .field("token_provider", &self.token_provider.is_some())
            .finish()
    }
}

impl HttpApiClient {
    pub fn new(config: HttpApiConfig) -> Result<Self, FlotillaApiError> {
        let api_base = config.api_base.trim();
        if api_base.is_empty() {
            return Err(FlotillaApiError::InvalidConfig(
                "api base url cannot be empty".to_string(),
            ));
        }
        if !(api_base.starts_with("http://") || api_base.starts_with("https://")) {
            return Err(FlotillaApiError::InvalidConfig(format!(
                "api base url '{api_base}' must start with http:// or https://"
            )));
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_millis(
                config.request_timeout_ms.max(1),
            ))
            .build()?;

        Ok(Self {
            client,
            config: HttpApiConfig {
                api_base: api_base.trim_end_matches('/').to_string(),
                request_timeout_ms: config.request_timeout_ms,
            },
            token_provider: None,
        })
    }

    pub fn with_token_provider(mut self, provider: Arc<dyn TokenProvider>) -> Self {
        self.token_provider = Some(provider);
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base, path)
    }

    fn authorize(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::RequestBuilder, FlotillaApiError> {
        let Some(token) = self
            .token_provider
            .as_ref()
            .and_then(|provider| provider.bearer_token())
        else {
            return Ok(request);
        };
        let bearer = HeaderValue::from_str(&format!("Bearer {}", token.trim())).map_err(|e| {
            FlotillaApiError::InvalidConfig(format!("invalid bearer token header: {e}"))
        })?;
        Ok(request.header(AUTHORIZATION, bearer))
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<Option<T>, FlotillaApiError> {
        let response = self.authorize(request)?.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let parsed = serde_json::from_str::<ServerErrorBody>(&body).unwrap_or_default();
            return Err(FlotillaApiError::HttpStatus {
                status: status.as_u16(),
                error: parsed.error,
                message: parsed.message,
            });
        }

        if body.trim().is_empty() {
            return Ok(None);
        }
        let value = serde_json::from_str::<serde_json::Value>(&body)?;
        if value.is_null() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_value(value)?))
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: &'static str,
        path: &str,
        request: reqwest::RequestBuilder,
    ) -> ApiResponse<T> {
        match self.send::<T>(request).await {
            Ok(data) => ApiResponse {
                data,
                error: None,
                message: None,
            },
            Err(error) => {
                tracing::debug!(method, path, error = %error, "backend request failed");
                error.into_response()
            }
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResponse<T> {
        self.request("GET", path, self.client.get(self.url(path)))
            .await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResponse<T> {
        self.request("POST", path, self.client.post(self.url(path)).json(body))
            .await
    }
}

#[async_trait]
impl NodesApi for HttpApiClient {
    async fn swarm(&self) -> ApiResponse<SwarmStatus> {
        self.get("/api/nodes/swarm").await
    }

    async fn list(&self) -> ApiResponse<Vec<SwarmNode>> {
        self.get("/api/nodes").await
    }

    async fn init_swarm(&self, listen_addr: &str) -> ApiResponse<Ack> {
        let body = InitSwarmRequest {
            listen_addr: listen_addr.to_string(),
        };
        self.post("/api/nodes/swarm/init", &body).await
    }

    async fn join_swarm(&self, request: &JoinSwarmRequest) -> ApiResponse<Ack> {
        self.post("/api/nodes/swarm/join", request).await
    }

    async fn swarm_tokens(&self) -> ApiResponse<SwarmTokens> {
        self.get("/api/nodes/swarm/tokens").await
    }
}

#[async_trait]
impl AuthApi for HttpApiClient {
    async fn me(&self) -> ApiResponse<UserProfile> {
        self.get("/api/auth/me").await
    }

    async fn login(&self, request: &LoginRequest) -> ApiResponse<AuthResponse> {
        self.post("/api/auth/login", request).await
    }
}

#[async_trait]
impl TeamsApi for HttpApiClient {
    async fn list_teams(&self) -> ApiResponse<Vec<ActiveTeam>> {
        self.get("/api/teams").await
    }
}
