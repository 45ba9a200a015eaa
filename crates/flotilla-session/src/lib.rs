//! Client-held session state for the Flotilla dashboard.
//!
//! Provides the self-healing persistent cache, the observable active-team
//! store seeded from it, and the cached-credential session that feeds the
//! bearer token to the API client.

pub mod active_team;
pub mod auth;
pub mod cache;
pub mod storage;


pub use active_team::ActiveTeamStore;
pub use auth::AuthSession;
pub use cache::{
    CachedValue, Persistence, PersistentCache, ACTIVE_TEAM_KEY, TOKEN_KEY, USER_KEY,
};
pub use storage::{FileStorage, MemoryStorage, SessionStorage};
