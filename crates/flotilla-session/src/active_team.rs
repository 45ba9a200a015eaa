use flotilla_api::ActiveTeam;
use tokio::sync::watch;

use crate::cache::{Persistence, ACTIVE_TEAM_KEY};

#[derive(Debug)]
/// Observable active-team selection mirrored into the session cache.
///
/// The in-memory value is authoritative once the store is initialized; the
/// cache only carries it across restarts. Subscribers receive the current
/// value on subscription and every subsequent change.
pub struct ActiveTeamStore {
    persistence: Persistence,
    sender: watch::Sender<Option<ActiveTeam>>,
}

impl ActiveTeamStore {
    pub fn initialize(persistence: Persistence) -> Self {
        let initial = persistence
            .cache()
            .and_then(|cache| cache.read::<ActiveTeam>(ACTIVE_TEAM_KEY));
        tracing::debug!(
            team_id = initial.as_ref().map(|team| team.team.id.as_str()),
            "active team store initialized"
        );
        let (sender, _) = watch::channel(initial);
        Self {
            persistence,
            sender,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<ActiveTeam>> {
        self.sender.subscribe()
    }

    pub fn current(&self) -> Option<ActiveTeam> {
        self.sender.borrow().clone()
    }

    pub fn set(&self, team: Option<ActiveTeam>) {
        let team = match team {
            Some(team) if !team.is_well_formed() => {
                tracing::warn!("ignoring active team without id or role; clearing selection");
                None
            }
            other => other,
        };

        if let Some(cache) = self.persistence.cache() {
            match &team {
                Some(team) => cache.write(ACTIVE_TEAM_KEY, team),
                None => cache.remove(ACTIVE_TEAM_KEY),
            }
        }
        self.sender.send_replace(team);
    }

    pub fn reset(&self) {
        self.set(None);
    }
}
