use std::path::PathBuf;

use clap::{Parser, Subcommand};
use flotilla_api::{DEFAULT_API_BASE, DEFAULT_REQUEST_TIMEOUT_MS};
use flotilla_dashboard::DEFAULT_LISTEN_ADDR;

fn parse_positive_u64(value: &str) -> Result<u64, String> {
    let parsed = value
        .parse::<u64>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

#[derive(Debug, Parser)]
#[command(
    name = "flotilla",
    about = "Session client for the Flotilla cluster dashboard",
    version
)]
pub struct Cli {
    #[arg(
        long,
        env = "FLOTILLA_API_BASE",
        default_value = DEFAULT_API_BASE,
        help = "Base URL of the dashboard backend"
    )]
    pub api_base: String,

    #[arg(
        long,
        env = "FLOTILLA_STATE_DIR",
        default_value = ".flotilla",
        help = "Directory holding the cached token, profile and active team"
    )]
    pub state_dir: PathBuf,

    #[arg(
        long,
        env = "FLOTILLA_REQUEST_TIMEOUT_MS",
        default_value_t = DEFAULT_REQUEST_TIMEOUT_MS,
        value_parser = parse_positive_u64,
        help = "Per-request timeout for backend calls"
    )]
    pub request_timeout_ms: u64,

    #[arg(
        long,
        env = "FLOTILLA_NO_PERSISTENCE",
        help = "Run without durable session storage; the auth guard is skipped"
    )]
    pub no_persistence: bool,

    #[arg(long, help = "Print results as JSON instead of text")]
    pub json: bool,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Exchange credentials for a token and cache it.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "FLOTILLA_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the cached token, profile and active team.
    Logout,
    /// Validate the cached token and print the resolved user.
    Whoami,
    /// List swarm nodes.
    Nodes,
    #[command(subcommand)]
    Swarm(SwarmCommand),
    #[command(subcommand)]
    Team(TeamCommand),
}

#[derive(Debug, Subcommand)]
pub enum SwarmCommand {
    /// Report whether swarm mode is enabled.
    Status,
    /// Initialize a new swarm with this node as manager.
    Init {
        #[arg(long, default_value = DEFAULT_LISTEN_ADDR)]
        listen_addr: String,
    },
    /// Join an existing swarm.
    Join {
        #[arg(long, default_value = DEFAULT_LISTEN_ADDR)]
        listen_addr: String,
        #[arg(long)]
        remote_addr: String,
        #[arg(long, env = "FLOTILLA_JOIN_TOKEN", hide_env_values = true)]
        token: String,
    },
    /// Show manager and worker join tokens.
    Tokens,
}

#[derive(Debug, Subcommand)]
pub enum TeamCommand {
    /// Teams the current user belongs to.
    List,
    /// Show the active team.
    Show,
    /// Select the active team by id.
    Use { team_id: String },
    /// Clear the active team.
    Clear,
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cli, CliCommand, SwarmCommand, TeamCommand};

    #[test]
    fn unit_defaults_apply_for_nodes_command() {
        let cli = Cli::try_parse_from(["flotilla", "nodes"]).expect("parse");
        assert_eq!(cli.api_base, "http://127.0.0.1:8080");
        assert_eq!(cli.state_dir.to_str(), Some(".flotilla"));
        assert_eq!(cli.request_timeout_ms, 10_000);
        assert!(!cli.no_persistence);
        assert!(matches!(cli.command, CliCommand::Nodes));
    }

    #[test]
    fn unit_swarm_join_parses_addresses_and_token() {
        let cli = Cli::try_parse_from([
            "flotilla",
            "swarm",
            "join",
            "--remote-addr",
            "10.0.0.1:2377",
            "--token",
            "SWMTKN-1",
        ])
        .expect("parse");
        match cli.command {
            CliCommand::Swarm(SwarmCommand::Join {
                listen_addr,
                remote_addr,
                token,
            }) => {
                assert_eq!(listen_addr, "0.0.0.0:2377");
                assert_eq!(remote_addr, "10.0.0.1:2377");
                assert_eq!(token, "SWMTKN-1");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn unit_team_use_takes_positional_id() {
        let cli = Cli::try_parse_from(["flotilla", "team", "use", "t1"]).expect("parse");
        assert!(matches!(
            cli.command,
            CliCommand::Team(TeamCommand::Use { ref team_id }) if team_id == "t1"
        ));
    }

    #[test]
    fn regression_zero_timeout_is_rejected() {
        let parsed = Cli::try_parse_from(["flotilla", "--request-timeout-ms", "0", "whoami"]);
        assert!(parsed.is_err());
    }
}
