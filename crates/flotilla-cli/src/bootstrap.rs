use std::sync::Arc;

use anyhow::{Context, Result};
use flotilla_api::{HttpApiClient, HttpApiConfig};
use flotilla_dashboard::{NodeListController, RouteGuard};
use flotilla_session::{ActiveTeamStore, AuthSession, Persistence};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::cli_args::Cli;

pub(crate) fn init_tracing() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

/// Explicitly constructed session graph shared by every command.
pub(crate) struct DashboardContext {
    pub session: AuthSession,
    pub teams: ActiveTeamStore,
    pub api: Arc<HttpApiClient>,
}

impl DashboardContext {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let persistence = if cli.no_persistence {
            Persistence::Unavailable
        } else {
            Persistence::file(&cli.state_dir)
        };
        Self::build(
            persistence,
            HttpApiConfig {
                api_base: cli.api_base.clone(),
                request_timeout_ms: cli.request_timeout_ms,
            },
        )
    }

    pub fn build(persistence: Persistence, config: HttpApiConfig) -> Result<Self> {
        let session = AuthSession::new(persistence.clone());
        let teams = ActiveTeamStore::initialize(persistence);
        let api = HttpApiClient::new(config)
            .context("failed to build dashboard api client")?
            .with_token_provider(Arc::new(session.clone()));
        Ok(Self {
            session,
            teams,
            api: Arc::new(api),
        })
    }

    pub fn route_guard(&self) -> RouteGuard {
        RouteGuard::new(self.session.clone(), self.api.clone())
    }

    pub fn node_list(&self) -> NodeListController {
        NodeListController::new(self.api.clone())
    }
}
