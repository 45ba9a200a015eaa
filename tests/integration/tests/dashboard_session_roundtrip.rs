use std::fs;
use std::sync::Arc;

use flotilla_api::{HttpApiClient, HttpApiConfig, SwarmNode};
use flotilla_dashboard::{
    ActionOutcome, GuardOutcome, Notification, NodeListController, RouteGuard, LOGIN_ROUTE,
};
use flotilla_session::{ActiveTeamStore, AuthSession, Persistence};
use httpmock::prelude::*;
use serde_json::json;
use tempfile::tempdir;

struct Harness {
    session: AuthSession,
    api: Arc<HttpApiClient>,
}

impl Harness {
    fn new(server: &MockServer, state_dir: &std::path::Path) -> Self {
        let session = AuthSession::new(Persistence::file(state_dir));
        let api = HttpApiClient::new(HttpApiConfig {
            api_base: server.base_url(),
            request_timeout_ms: 2_000,
        })
        .expect("api client")
        .with_token_provider(Arc::new(session.clone()));
        Self {
            session,
            api: Arc::new(api),
        }
    }

    fn guard(&self) -> RouteGuard {
        RouteGuard::new(self.session.clone(), self.api.clone())
    }

    fn node_list(&self) -> NodeListController {
        NodeListController::new(self.api.clone())
    }
}

#[tokio::test]
async fn integration_login_guard_and_node_list_share_cached_token() {
    let server = MockServer::start();
    let temp = tempdir().expect("tempdir");
    let login = server.mock(|when, then| {
        when.method(POST)
            .path("/api/auth/login")
            .json_body(json!({ "email": "ops@example.com", "password": "pw" }));
        then.status(200).json_body(json!({
            "token": "jwt-live",
            "user": { "id": "u1", "email": "ops@example.com", "role": "admin" }
        }));
    });
    let me = server.mock(|when, then| {
        when.method(GET)
            .path("/api/auth/me")
            .header("authorization", "Bearer jwt-live");
        then.status(200)
            .json_body(json!({ "id": "u1", "email": "ops@example.com", "role": "admin" }));
    });
    let swarm = server.mock(|when, then| {
        when.method(GET)
            .path("/api/nodes/swarm")
            .header("authorization", "Bearer jwt-live");
        then.status(200).json_body(json!({ "enabled": true }));
    });
    let list = server.mock(|when, then| {
        when.method(GET)
            .path("/api/nodes")
            .header("authorization", "Bearer jwt-live");
        then.status(200)
            .json_body(json!([{ "id": "n1", "name": "node-a" }]));
    });

    let harness = Harness::new(&server, temp.path());
    let user = harness
        .session
        .login(harness.api.as_ref(), "ops@example.com", "pw")
        .await;
    assert!(user.is_success());
    assert!(temp.path().join("token.json").exists());

    let outcome = harness.guard().check().await;
    assert!(outcome.is_allowed());

    let controller = harness.node_list();
    controller.init().await;
    let state = controller.snapshot();
    assert_eq!(state.nodes, vec![SwarmNode::new("n1", "node-a")]);
    assert!(!state.loading);

    login.assert();
    me.assert();
    swarm.assert();
    list.assert();
}

#[tokio::test]
async fn integration_missing_token_redirects_without_backend_traffic() {
    let server = MockServer::start();
    let temp = tempdir().expect("tempdir");
    let me = server.mock(|when, then| {
        when.method(GET).path("/api/auth/me");
        then.status(200).json_body(json!({ "id": "u1" }));
    });

    let harness = Harness::new(&server, temp.path());
    assert_eq!(
        harness.guard().check().await,
        GuardOutcome::Redirect {
            location: LOGIN_ROUTE
        }
    );
    me.assert_calls(0);
}

#[tokio::test]
async fn integration_rejected_token_purges_state_files() {
    let server = MockServer::start();
    let temp = tempdir().expect("tempdir");
    fs::write(temp.path().join("token.json"), "\"stale-token\"").expect("seed token");
    fs::write(
        temp.path().join("user.json"),
        r#"{"id":"u1","email":"ops@example.com","role":"admin"}"#,
    )
    .expect("seed user");
    let me = server.mock(|when, then| {
        when.method(GET)
            .path("/api/auth/me")
            .header("authorization", "Bearer stale-token");
        then.status(401)
            .json_body(json!({ "error": "unauthorized", "message": "token expired" }));
    });

    let harness = Harness::new(&server, temp.path());
    let outcome = harness.guard().check().await;

    assert_eq!(
        outcome,
        GuardOutcome::Redirect {
            location: LOGIN_ROUTE
        }
    );
    me.assert_calls(1);
    assert!(!temp.path().join("token.json").exists());
    assert!(!temp.path().join("user.json").exists());
}

#[tokio::test]
async fn integration_swarm_disabled_never_requests_node_list() {
    let server = MockServer::start();
    let temp = tempdir().expect("tempdir");
    server.mock(|when, then| {
        when.method(GET).path("/api/nodes/swarm");
        then.status(200).json_body(json!({ "enabled": false }));
    });
    let list = server.mock(|when, then| {
        when.method(GET).path("/api/nodes");
        then.status(500);
    });

    let controller = Harness::new(&server, temp.path()).node_list();
    controller.init().await;

    let state = controller.snapshot();
    assert!(!state.is_swarm_enabled);
    assert!(!state.loading);
    list.assert_calls(0);
}

#[tokio::test]
async fn integration_swarm_init_refreshes_from_server() {
    let server = MockServer::start();
    let temp = tempdir().expect("tempdir");
    let init = server.mock(|when, then| {
        when.method(POST)
            .path("/api/nodes/swarm/init")
            .json_body(json!({ "listen_addr": "0.0.0.0:2377" }));
        then.status(200).json_body(json!("node-1"));
    });
    server.mock(|when, then| {
        when.method(GET).path("/api/nodes/swarm");
        then.status(200).json_body(json!({ "enabled": true }));
    });
    server.mock(|when, then| {
        when.method(GET).path("/api/nodes");
        then.status(200)
            .json_body(json!([{ "id": "node-1", "hostname": "manager-1", "role": "manager" }]));
    });

    let controller = Harness::new(&server, temp.path()).node_list();
    controller.open_init_dialog();
    let outcome = controller.init_swarm().await;

    assert_eq!(outcome, ActionOutcome::Completed);
    let state = controller.snapshot();
    assert!(!state.show_init_dialog);
    assert!(!state.loading_action);
    assert_eq!(state.nodes.len(), 1);
    assert_eq!(state.nodes[0].name, "manager-1");
    assert_eq!(
        controller.drain_notifications(),
        vec![Notification::success("Swarm initialized successfully!")]
    );
    init.assert();
}

#[tokio::test]
async fn integration_node_list_failure_surfaces_server_message() {
    let server = MockServer::start();
    let temp = tempdir().expect("tempdir");
    server.mock(|when, then| {
        when.method(GET).path("/api/nodes");
        then.status(503)
            .json_body(json!({ "error": "unavailable", "message": "docker daemon unreachable" }));
    });

    let controller = Harness::new(&server, temp.path()).node_list();
    controller.load_nodes().await;

    assert!(!controller.snapshot().loading);
    assert_eq!(
        controller.drain_notifications(),
        vec![Notification::error("docker daemon unreachable")]
    );
}

#[test]
fn integration_corrupt_active_team_file_is_healed_on_startup() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("activeTeam.json");
    fs::write(&path, r#"{"team":{},"role":"admin"}"#).expect("seed");

    let store = ActiveTeamStore::initialize(Persistence::file(temp.path()));

    assert_eq!(store.current(), None);
    assert!(!path.exists());
}
