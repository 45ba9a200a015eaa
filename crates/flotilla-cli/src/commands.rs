use std::process::ExitCode;

use anyhow::{Context, Result};
use flotilla_api::{ActiveTeam, SwarmNode, SwarmTokens, TeamsApi, UserProfile};
use flotilla_dashboard::{
    ActionOutcome, GuardOutcome, Notification, NotificationLevel, NodeListController,
};
use serde_json::json;

use crate::bootstrap::DashboardContext;
use crate::cli_args::{Cli, CliCommand, SwarmCommand, TeamCommand};

pub(crate) async fn run_cli(cli: Cli) -> Result<ExitCode> {
    let context = DashboardContext::from_cli(&cli)?;
    let json_output = cli.json;
    match cli.command {
        CliCommand::Login { email, password } => {
            let response = context
                .session
                .login(context.api.as_ref(), &email, &password)
                .await;
            match response.data {
                Some(user) => {
                    print_user(&user, json_output)?;
                    Ok(ExitCode::SUCCESS)
                }
                None => {
                    eprintln!("error: {}", response.failure_text("Login failed"));
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        CliCommand::Logout => {
            context.session.logout(&context.teams);
            println!("logged out");
            Ok(ExitCode::SUCCESS)
        }
        CliCommand::Whoami => {
            let Some(user) = enter_dashboard(&context).await else {
                return Ok(ExitCode::FAILURE);
            };
            match user {
                Some(user) => print_user(&user, json_output)?,
                None => println!("anonymous (session persistence disabled)"),
            }
            Ok(ExitCode::SUCCESS)
        }
        CliCommand::Nodes => {
            if enter_dashboard(&context).await.is_none() {
                return Ok(ExitCode::FAILURE);
            }
            let controller = context.node_list();
            controller.init().await;
            print_node_list(&controller, json_output)?;
            Ok(exit_for(emit_notifications(&controller, json_output)))
        }
        CliCommand::Swarm(command) => run_swarm_command(&context, command, json_output).await,
        CliCommand::Team(command) => run_team_command(&context, command, json_output).await,
    }
}

/// Runs the route guard. `None` means the caller must stop: the user was
/// sent back to login.
async fn enter_dashboard(context: &DashboardContext) -> Option<Option<UserProfile>> {
    match context.route_guard().check().await {
        GuardOutcome::Allow { user } => Some(user),
        GuardOutcome::Redirect { location } => {
            eprintln!("error: not signed in or session expired; run `flotilla login` ({location})");
            None
        }
    }
}

async fn run_swarm_command(
    context: &DashboardContext,
    command: SwarmCommand,
    json_output: bool,
) -> Result<ExitCode> {
    if enter_dashboard(context).await.is_none() {
        return Ok(ExitCode::FAILURE);
    }
    let controller = context.node_list();

    match command {
        SwarmCommand::Status => {
            controller.check_swarm().await;
            let enabled = controller.snapshot().is_swarm_enabled;
            if json_output {
                println!("{}", json!({ "enabled": enabled }));
            } else {
                println!("swarm: {}", if enabled { "enabled" } else { "disabled" });
            }
            Ok(ExitCode::SUCCESS)
        }
        SwarmCommand::Init { listen_addr } => {
            controller.set_listen_addr(listen_addr);
            controller.open_init_dialog();
            let outcome = controller.init_swarm().await;
            finish_swarm_action(&controller, outcome, json_output)
        }
        SwarmCommand::Join {
            listen_addr,
            remote_addr,
            token,
        } => {
            controller.set_listen_addr(listen_addr);
            controller.set_remote_addr(remote_addr);
            controller.set_join_token(token);
            controller.open_join_dialog();
            let outcome = controller.join_swarm().await;
            finish_swarm_action(&controller, outcome, json_output)
        }
        SwarmCommand::Tokens => {
            controller.load_tokens().await;
            let state = controller.snapshot();
            if let (true, Some(tokens)) = (state.show_tokens_dialog, state.swarm_tokens.as_ref()) {
                print_tokens(tokens, json_output)?;
            }
            Ok(exit_for(emit_notifications(&controller, json_output)))
        }
    }
}

fn finish_swarm_action(
    controller: &NodeListController,
    outcome: ActionOutcome,
    json_output: bool,
) -> Result<ExitCode> {
    let had_error = emit_notifications(controller, json_output);
    if outcome == ActionOutcome::Completed {
        print_node_list(controller, json_output)?;
    }
    Ok(exit_for(had_error || outcome != ActionOutcome::Completed))
}

async fn run_team_command(
    context: &DashboardContext,
    command: TeamCommand,
    json_output: bool,
) -> Result<ExitCode> {
    match command {
        TeamCommand::Show => {
            match context.teams.current() {
                Some(team) => print_team(&team, true, json_output)?,
                None => println!("no active team"),
            }
            Ok(ExitCode::SUCCESS)
        }
        TeamCommand::Clear => {
            context.teams.reset();
            println!("active team cleared");
            Ok(ExitCode::SUCCESS)
        }
        TeamCommand::List => {
            if enter_dashboard(context).await.is_none() {
                return Ok(ExitCode::FAILURE);
            }
            let response = context.api.list_teams().await;
            let Some(teams) = response.data.as_ref() else {
                eprintln!("error: {}", response.failure_text("Failed to load teams"));
                return Ok(ExitCode::FAILURE);
            };
            let active_id = context.teams.current().map(|team| team.team.id);
            if json_output {
                println!(
                    "{}",
                    serde_json::to_string_pretty(teams).context("failed to encode teams")?
                );
            } else {
                for team in teams {
                    let active = active_id.as_deref() == Some(team.team.id.as_str());
                    println!("{}", render_team_line(team, active));
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        TeamCommand::Use { team_id } => {
            if enter_dashboard(context).await.is_none() {
                return Ok(ExitCode::FAILURE);
            }
            let response = context.api.list_teams().await;
            let Some(teams) = response.data.as_ref() else {
                eprintln!("error: {}", response.failure_text("Failed to load teams"));
                return Ok(ExitCode::FAILURE);
            };
            match select_team(teams, &team_id) {
                Some(team) => {
                    context.teams.set(Some(team.clone()));
                    print_team(team, true, json_output)?;
                    Ok(ExitCode::SUCCESS)
                }
                None => {
                    eprintln!("error: you are not a member of team '{team_id}'");
                    Ok(ExitCode::FAILURE)
                }
            }
        }
    }
}

fn select_team<'a>(teams: &'a [ActiveTeam], team_id: &str) -> Option<&'a ActiveTeam> {
    let wanted = team_id.trim();
    teams
        .iter()
        .find(|team| team.is_well_formed() && team.team.id == wanted)
}

/// Prints drained notifications to stderr; returns whether any was an error.
fn emit_notifications(controller: &NodeListController, json_output: bool) -> bool {
    let mut had_error = false;
    for notification in controller.drain_notifications() {
        had_error |= notification.level == NotificationLevel::Error;
        eprintln!("{}", render_notification(&notification, json_output));
    }
    had_error
}

fn render_notification(notification: &Notification, json_output: bool) -> String {
    if json_output {
        if let Ok(encoded) = serde_json::to_string(notification) {
            return encoded;
        }
    }
    format!("{}: {}", notification.level.as_str(), notification.text)
}

fn exit_for(had_error: bool) -> ExitCode {
    if had_error {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn print_node_list(controller: &NodeListController, json_output: bool) -> Result<()> {
    let state = controller.snapshot();
    if json_output {
        let payload = json!({
            "swarm_enabled": state.is_swarm_enabled,
            "nodes": state.nodes,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&payload).context("failed to encode nodes")?
        );
        return Ok(());
    }
    if !state.is_swarm_enabled {
        println!("swarm mode is not enabled; run `flotilla swarm init` or `flotilla swarm join`");
        return Ok(());
    }
    print!("{}", render_nodes_table(&state.nodes));
    Ok(())
}

fn print_tokens(tokens: &SwarmTokens, json_output: bool) -> Result<()> {
    if json_output {
        println!(
            "{}",
            serde_json::to_string_pretty(tokens).context("failed to encode tokens")?
        );
    } else {
        println!("manager: {}", tokens.manager);
        println!("worker:  {}", tokens.worker);
    }
    Ok(())
}

fn print_user(user: &UserProfile, json_output: bool) -> Result<()> {
    if json_output {
        println!(
            "{}",
            serde_json::to_string_pretty(user).context("failed to encode user")?
        );
    } else {
        println!("{} ({}) role={}", user.email, user.id, user.role);
    }
    Ok(())
}

fn print_team(team: &ActiveTeam, active: bool, json_output: bool) -> Result<()> {
    if json_output {
        println!(
            "{}",
            serde_json::to_string_pretty(team).context("failed to encode team")?
        );
    } else {
        println!("{}", render_team_line(team, active));
    }
    Ok(())
}

fn render_team_line(team: &ActiveTeam, active: bool) -> String {
    format!(
        "{} {} ({}) role={}",
        if active { "*" } else { " " },
        team.team.name,
        team.team.id,
        team.role
    )
}

fn render_nodes_table(nodes: &[SwarmNode]) -> String {
    if nodes.is_empty() {
        return "no nodes reported\n".to_string();
    }
    let id_width = nodes
        .iter()
        .map(|node| node.id.len())
        .chain(std::iter::once(2))
        .max()
        .unwrap_or(2);
    let name_width = nodes
        .iter()
        .map(|node| node.name.len())
        .chain(std::iter::once(4))
        .max()
        .unwrap_or(4);

    let mut table = format!("{:<id_width$}  {:<name_width$}  ROLE     STATUS\n", "ID", "NAME");
    for node in nodes {
        let role = if node.leader {
            format!("{} *", node.role)
        } else {
            node.role.clone()
        };
        table.push_str(&format!(
            "{:<id_width$}  {:<name_width$}  {:<8} {}\n",
            node.id,
            node.name,
            role,
            node.status.as_deref().unwrap_or("-"),
        ));
    }
    table
}

#[cfg(test)]
mod tests {
    use flotilla_api::{ActiveTeam, SwarmNode};
    use flotilla_dashboard::Notification;

    use super::{render_nodes_table, render_notification, render_team_line, select_team};

    #[test]
    fn unit_notifications_render_as_text_or_json_lines() {
        let failure = Notification::error("Failed to join Swarm");
        assert_eq!(
            render_notification(&failure, false),
            "error: Failed to join Swarm"
        );
        assert_eq!(
            render_notification(&failure, true),
            r#"{"level":"error","text":"Failed to join Swarm"}"#
        );
        assert_eq!(
            render_notification(&Notification::success("Joined Swarm successfully!"), false),
            "success: Joined Swarm successfully!"
        );
    }

    #[test]
    fn unit_nodes_table_aligns_columns() {
        let mut leader = SwarmNode::new("n1", "node-a");
        leader.role = "manager".to_string();
        leader.leader = true;
        leader.status = Some("ready".to_string());
        let worker = SwarmNode::new("n2-long", "b");

        let table = render_nodes_table(&[leader, worker]);
        let lines = table.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], "ID       NAME    ROLE     STATUS");
        assert_eq!(lines[1], "n1       node-a  manager * ready");
        assert_eq!(lines[2], "n2-long  b                -");
    }

    #[test]
    fn unit_empty_node_list_renders_placeholder() {
        assert_eq!(render_nodes_table(&[]), "no nodes reported\n");
    }

    #[test]
    fn unit_team_line_marks_active_team() {
        let team = ActiveTeam::new("t1", "core", "Owner");
        assert_eq!(render_team_line(&team, true), "* core (t1) role=Owner");
        assert_eq!(render_team_line(&team, false), "  core (t1) role=Owner");
    }

    #[test]
    fn regression_select_team_skips_ill_formed_memberships() {
        let teams = vec![
            ActiveTeam::new("t1", "core", ""),
            ActiveTeam::new("t1", "core", "Admin"),
        ];
        let selected = select_team(&teams, " t1 ").expect("team");
        assert_eq!(selected.role, "Admin");
        assert!(select_team(&teams, "t2").is_none());
    }
}
