use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Uniform response envelope returned by every remote call.
///
/// A call succeeded when `data` is present. `error` and `message` are only
/// meaningful for display and are never used as the success discriminant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiResponse<T> {
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
            message: None,
        }
    }

    pub fn failure(error: Option<String>, message: Option<String>) -> Self {
        Self {
            data: None,
            error,
            message,
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self::failure(Some(error.into()), None)
    }

    pub fn is_success(&self) -> bool {
        self.data.is_some()
    }

    /// Most specific human-readable failure text: server message, then error
    /// code, then `fallback`. Blank fields are skipped.
    pub fn failure_text(&self, fallback: &str) -> String {
        non_blank(self.message.as_deref())
            .or_else(|| non_blank(self.error.as_deref()))
            .unwrap_or(fallback)
            .to_string()
    }

    /// Error code first, then `fallback`; the server message is ignored.
    pub fn error_text(&self, fallback: &str) -> String {
        non_blank(self.error.as_deref())
            .unwrap_or(fallback)
            .to_string()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|candidate| !candidate.trim().is_empty())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
/// Cluster member as reported by the backend.
pub struct SwarmNode {
    pub id: String,
    #[serde(default, alias = "hostname")]
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub addr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_version: Option<String>,
    #[serde(default)]
    pub leader: bool,
}

impl SwarmNode {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SwarmStatus {
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
/// Manager/worker join secrets. Display only; never persisted.
pub struct SwarmTokens {
    pub manager: String,
    pub worker: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InitSwarmRequest {
    pub listen_addr: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JoinSwarmRequest {
    pub listen_addr: String,
    pub remote_addr: String,
    pub token: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Team {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
/// Team membership selected as the session's organizational context.
pub struct ActiveTeam {
    #[serde(default)]
    pub team: Team,
    #[serde(default)]
    pub role: String,
}

impl ActiveTeam {
    pub fn new(id: impl Into<String>, name: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            team: Team {
                id: id.into(),
                name: name.into(),
                extra: Map::new(),
            },
            role: role.into(),
        }
    }

    /// A membership is usable only when both the team id and role are set.
    pub fn is_well_formed(&self) -> bool {
        !self.team.id.trim().is_empty() && !self.role.trim().is_empty()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserProfile {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserProfile,
}

/// Acknowledgement payload of mutating swarm calls. Its shape is owned by the
/// backend; only its presence matters here.
pub type Ack = Value;

#[derive(Debug, Error)]
pub enum FlotillaApiError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned non-success status {status}")]
    HttpStatus {
        status: u16,
        error: Option<String>,
        message: Option<String>,
    },
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("invalid client configuration: {0}")]
    InvalidConfig(String),
}

impl FlotillaApiError {
    /// Folds the error into the uniform envelope handed to callers.
    pub fn into_response<T>(self) -> ApiResponse<T> {
        match self {
            Self::Http(error) => {
                ApiResponse::failure(Some("network_error".to_string()), Some(error.to_string()))
            }
            Self::HttpStatus {
                status,
                error,
                message,
            } => ApiResponse::failure(error.or_else(|| Some(format!("http_{status}"))), message),
            Self::Serde(error) => {
                ApiResponse::failure(Some("invalid_response".to_string()), Some(error.to_string()))
            }
            Self::InvalidConfig(reason) => {
                ApiResponse::failure(Some("invalid_config".to_string()), Some(reason))
            }
        }
    }
}

#[async_trait]
/// Swarm and node endpoints of the backend.
pub trait NodesApi: Send + Sync {
    async fn swarm(&self) -> ApiResponse<SwarmStatus>;

    async fn list(&self) -> ApiResponse<Vec<SwarmNode>>;

    async fn init_swarm(&self, listen_addr: &str) -> ApiResponse<Ack>;

    async fn join_swarm(&self, request: &JoinSwarmRequest) -> ApiResponse<Ack>;

    async fn swarm_tokens(&self) -> ApiResponse<SwarmTokens>;
}

#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Resolves the identity behind the current bearer token.
    async fn me(&self) -> ApiResponse<UserProfile>;

    async fn login(&self, request: &LoginRequest) -> ApiResponse<AuthResponse>;
}

#[async_trait]
pub trait TeamsApi: Send + Sync {
    /// Teams the current user belongs to, with their role in each.
    async fn list_teams(&self) -> ApiResponse<Vec<ActiveTeam>>;
}

/// Source of the bearer token attached to outgoing requests.
pub trait TokenProvider: Send + Sync {
    fn bearer_token(&self) -> Option<String>;
}

#[cfg(test)]
mod tests {
    use super::{ActiveTeam, ApiResponse, FlotillaApiError, SwarmNode};

    #[test]
    fn unit_failure_text_prefers_message_then_error_then_fallback() {
        let both: ApiResponse<()> =
            ApiResponse::failure(Some("timeout".into()), Some("backend slow".into()));
        assert_eq!(both.failure_text("fallback"), "backend slow");

        let error_only: ApiResponse<()> = ApiResponse::error("timeout");
        assert_eq!(error_only.failure_text("fallback"), "timeout");

        let blank: ApiResponse<()> = ApiResponse::failure(Some(" ".into()), Some(String::new()));
        assert_eq!(blank.failure_text("fallback"), "fallback");
    }

    #[test]
    fn unit_success_is_decided_by_payload_presence() {
        let with_error_and_data = ApiResponse {
            data: Some(1_u8),
            error: Some("warning".to_string()),
            message: None,
        };
        assert!(with_error_and_data.is_success());

        let empty: ApiResponse<u8> = ApiResponse::failure(None, None);
        assert!(!empty.is_success());
    }

    #[test]
    fn unit_active_team_requires_team_id_and_role() {
        let missing_id: ActiveTeam =
            serde_json::from_str(r#"{"team":{},"role":"admin"}"#).expect("decode");
        assert!(!missing_id.is_well_formed());

        let missing_role: ActiveTeam =
            serde_json::from_str(r#"{"team":{"id":"t1"}}"#).expect("decode");
        assert!(!missing_role.is_well_formed());

        let valid: ActiveTeam =
            serde_json::from_str(r#"{"team":{"id":"t1","name":"core","created_at":"x"},"role":"Admin"}"#)
                .expect("decode");
        assert!(valid.is_well_formed());
        assert_eq!(valid.team.extra["created_at"], "x");
    }

    #[test]
    fn unit_swarm_node_accepts_sparse_payloads() {
        let node: SwarmNode = serde_json::from_str(r#"{"id":"n1"}"#).expect("decode");
        assert_eq!(node.id, "n1");
        assert!(node.name.is_empty());

        let hostname: SwarmNode =
            serde_json::from_str(r#"{"id":"n2","hostname":"node-b","role":"manager"}"#)
                .expect("decode");
        assert_eq!(hostname.name, "node-b");
        assert_eq!(hostname.role, "manager");
    }

    #[test]
    fn regression_status_error_without_body_maps_to_status_code() {
        let response: ApiResponse<()> = FlotillaApiError::HttpStatus {
            status: 503,
            error: None,
            message: None,
        }
        .into_response();
        assert_eq!(response.error.as_deref(), Some("http_503"));
        assert!(!response.is_success());
    }
}
