use flotilla_api::{ApiResponse, AuthApi, AuthResponse, LoginRequest, TokenProvider, UserProfile};

use crate::active_team::ActiveTeamStore;
use crate::cache::{Persistence, TOKEN_KEY, USER_KEY};

#[derive(Clone, Debug)]
/// Cached credentials: the bearer token and the profile it resolved to.
pub struct AuthSession {
    persistence: Persistence,
}

impl AuthSession {
    pub fn new(persistence: Persistence) -> Self {
        Self { persistence }
    }

    pub fn persistence(&self) -> &Persistence {
        &self.persistence
    }

    /// Cached bearer token. A JSON-encoded string is unwrapped; any other
    /// text is used as stored.
    pub fn token(&self) -> Option<String> {
        let cache = self.persistence.cache()?;
        let raw = cache.read_raw_string(TOKEN_KEY)?;
        match serde_json::from_str::<String>(&raw) {
            Ok(token) if token.trim().is_empty() => {
                cache.remove(TOKEN_KEY);
                None
            }
            Ok(token) => Some(token),
            Err(_) => Some(raw),
        }
    }

    pub fn cached_user(&self) -> Option<UserProfile> {
        self.persistence
            .cache()
            .and_then(|cache| cache.read::<UserProfile>(USER_KEY))
    }

    pub fn store(&self, auth: &AuthResponse) {
        if let Some(cache) = self.persistence.cache() {
            cache.write(TOKEN_KEY, &auth.token);
            cache.write(USER_KEY, &auth.user);
        }
    }

    /// Drops the token and the cached profile.
    pub fn purge_credentials(&self) {
        if let Some(cache) = self.persistence.cache() {
            cache.remove(TOKEN_KEY);
            cache.remove(USER_KEY);
        }
    }

    pub async fn login<A>(&self, api: &A, email: &str, password: &str) -> ApiResponse<UserProfile>
    where
        A: AuthApi + ?Sized,
    {
        let request = LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        let response = api.login(&request).await;
        match response.data {
            Some(auth) if !auth.token.trim().is_empty() => {
                self.store(&auth);
                tracing::info!(user_id = %auth.user.id, "login succeeded");
                ApiResponse::ok(auth.user)
            }
            Some(_) => ApiResponse::error("invalid_response"),
            None => {
                tracing::debug!(error = ?response.error, "login rejected");
                ApiResponse::failure(response.error, response.message)
            }
        }
    }

    /// Clears credentials and the active team selection.
    pub fn logout(&self, teams: &ActiveTeamStore) {
        self.purge_credentials();
        teams.reset();
    }
}

impl TokenProvider for AuthSession {
    fn bearer_token(&self) -> Option<String> {
        self.token()
    }
}
