//! Remote collaborator contracts for the Flotilla dashboard.
//!
//! Defines the uniform response envelope, the wire types shared with the
//! backend, the `NodesApi`/`AuthApi`/`TeamsApi` traits consumed by the session
//! and dashboard crates, and a reqwest implementation of all three.

mod http_client;
mod types;


pub use http_client::{
    HttpApiClient, HttpApiConfig, DEFAULT_API_BASE, DEFAULT_REQUEST_TIMEOUT_MS,
};
pub use types::{
    Ack, ActiveTeam, ApiResponse, AuthApi, AuthResponse, FlotillaApiError, InitSwarmRequest,
    JoinSwarmRequest, LoginRequest, NodesApi, SwarmNode, SwarmStatus, SwarmTokens, Team,
    TeamsApi, TokenProvider, UserProfile,
};
