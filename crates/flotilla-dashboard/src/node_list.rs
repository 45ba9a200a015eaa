use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use flotilla_api::{JoinSwarmRequest, NodesApi, SwarmNode, SwarmTokens};

use crate::notifications::{Notification, NotificationQueue};

pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:2377";

const LOAD_NODES_FALLBACK: &str = "Failed to load nodes";
const INIT_SWARM_FALLBACK: &str = "Failed to initialize Swarm";
const JOIN_SWARM_FALLBACK: &str = "Failed to join Swarm";
const LOAD_TOKENS_FAILURE: &str = "Failed to fetch Swarm tokens";

#[derive(Debug, Clone, PartialEq)]
/// View state of the node list page.
pub struct NodeListState {
    pub nodes: Vec<SwarmNode>,
    pub loading: bool,
    pub is_swarm_enabled: bool,
    pub swarm_tokens: Option<SwarmTokens>,
    pub show_init_dialog: bool,
    pub show_join_dialog: bool,
    pub show_tokens_dialog: bool,
    pub show_terminal: bool,
    pub selected_node_id: Option<String>,
    pub selected_node_name: Option<String>,
    pub listen_addr: String,
    pub remote_addr: String,
    pub join_token: String,
    pub loading_action: bool,
}

impl Default for NodeListState {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            loading: true,
            is_swarm_enabled: false,
            swarm_tokens: None,
            show_init_dialog: false,
            show_join_dialog: false,
            show_tokens_dialog: false,
            show_terminal: false,
            selected_node_id: None,
            selected_node_name: None,
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            remote_addr: String::new(),
            join_token: String::new(),
            loading_action: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Completed,
    Failed,
    /// Another swarm action was still running; nothing was sent.
    AlreadyInFlight,
}

/// Sequences swarm and node fetches for the node list page.
///
/// All server-derived fields are refreshed from the backend after every
/// successful mutation; nothing is updated optimistically. View state sits
/// behind a mutex that is never held across an await point.
pub struct NodeListController {
    api: Arc<dyn NodesApi>,
    state: Mutex<NodeListState>,
    action_in_flight: AtomicBool,
    notifications: NotificationQueue,
}

/// Holds the single swarm-action slot; releasing it clears `loading_action`.
struct ActionSlot<'a> {
    controller: &'a NodeListController,
}

impl Drop for ActionSlot<'_> {
    fn drop(&mut self) {
        self.controller.update(|state| state.loading_action = false);
        self.controller
            .action_in_flight
            .store(false, Ordering::Release);
    }
}

impl NodeListController {
    pub fn new(api: Arc<dyn NodesApi>) -> Self {
        Self {
            api,
            state: Mutex::new(NodeListState::default()),
            action_in_flight: AtomicBool::new(false),
            notifications: NotificationQueue::default(),
        }
    }

    fn update<R>(&self, apply: impl FnOnce(&mut NodeListState) -> R) -> R {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        apply(&mut state)
    }

    pub fn snapshot(&self) -> NodeListState {
        self.update(|state| state.clone())
    }

    pub fn drain_notifications(&self) -> Vec<Notification> {
        self.notifications.drain()
    }

    pub async fn init(&self) {
        self.check_swarm().await;
        if self.update(|state| state.is_swarm_enabled) {
            self.load_nodes().await;
        } else {
            self.update(|state| state.loading = false);
        }
    }

    /// Failures read as "swarm disabled"; nothing is reported.
    pub async fn check_swarm(&self) {
        let response = self.api.swarm().await;
        let enabled = response.data.map(|status| status.enabled).unwrap_or(false);
        if response.error.is_some() {
            tracing::debug!(error = ?response.error, "swarm status unavailable");
        }
        self.update(|state| state.is_swarm_enabled = enabled);
    }

    pub async fn load_nodes(&self) {
        self.update(|state| state.loading = true);
        let response = self.api.list().await;
        match response.data {
            Some(nodes) => self.update(|state| state.nodes = nodes),
            None => {
                let text = response.failure_text(LOAD_NODES_FALLBACK);
                self.notifications.push(Notification::error(text));
            }
        }
        self.update(|state| state.loading = false);
    }

    fn try_acquire_action(&self) -> Option<ActionSlot<'_>> {
        self.action_in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        self.update(|state| state.loading_action = true);
        Some(ActionSlot { controller: self })
    }

    pub async fn init_swarm(&self) -> ActionOutcome {
        let Some(_slot) = self.try_acquire_action() else {
            tracing::debug!("init swarm ignored; another swarm action is in flight");
            return ActionOutcome::AlreadyInFlight;
        };

        let listen_addr = self.update(|state| state.listen_addr.clone());
        let response = self.api.init_swarm(&listen_addr).await;
        if response.is_success() {
            self.notifications
                .push(Notification::success("Swarm initialized successfully!"));
            self.update(|state| state.show_init_dialog = false);
            self.init().await;
            ActionOutcome::Completed
        } else {
            self.notifications
                .push(Notification::error(response.error_text(INIT_SWARM_FALLBACK)));
            ActionOutcome::Failed
        }
    }

    pub async fn join_swarm(&self) -> ActionOutcome {
        let Some(_slot) = self.try_acquire_action() else {
            tracing::debug!("join swarm ignored; another swarm action is in flight");
            return ActionOutcome::AlreadyInFlight;
        };

        let request = self.update(|state| JoinSwarmRequest {
            listen_addr: state.listen_addr.clone(),
            remote_addr: state.remote_addr.clone(),
            token: state.join_token.clone(),
        });
        let response = self.api.join_swarm(&request).await;
        if response.is_success() {
            self.notifications
                .push(Notification::success("Joined Swarm successfully!"));
            self.update(|state| state.show_join_dialog = false);
            self.init().await;
            ActionOutcome::Completed
        } else {
            self.notifications
                .push(Notification::error(response.error_text(JOIN_SWARM_FALLBACK)));
            ActionOutcome::Failed
        }
    }

    pub async fn load_tokens(&self) {
        let response = self.api.swarm_tokens().await;
        match response.data {
            Some(tokens) => self.update(|state| {
                state.swarm_tokens = Some(tokens);
                state.show_tokens_dialog = true;
            }),
            None => self
                .notifications
                .push(Notification::error(LOAD_TOKENS_FAILURE)),
        }
    }

    pub fn open_terminal(&self, id: &str, name: &str) {
        self.update(|state| {
            state.selected_node_id = Some(id.to_string());
            state.selected_node_name = Some(name.to_string());
            state.show_terminal = true;
        });
    }

    pub fn close_terminal(&self) {
        self.update(|state| {
            state.show_terminal = false;
            state.selected_node_id = None;
            state.selected_node_name = None;
        });
    }

    pub fn open_init_dialog(&self) {
        self.update(|state| state.show_init_dialog = true);
    }

    pub fn open_join_dialog(&self) {
        self.update(|state| state.show_join_dialog = true);
    }

    pub fn close_dialogs(&self) {
        self.update(|state| {
            state.show_init_dialog = false;
            state.show_join_dialog = false;
            state.show_tokens_dialog = false;
        });
    }

    pub fn set_listen_addr(&self, listen_addr: impl Into<String>) {
        let listen_addr = listen_addr.into();
        self.update(|state| state.listen_addr = listen_addr);
    }

    pub fn set_remote_addr(&self, remote_addr: impl Into<String>) {
        let remote_addr = remote_addr.into();
        self.update(|state| state.remote_addr = remote_addr);
    }

    pub fn set_join_token(&self, join_token: impl Into<String>) {
        let join_token = join_token.into();
        self.update(|state| state.join_token = join_token);
    }
}
