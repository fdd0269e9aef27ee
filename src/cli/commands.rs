//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - serve: run the control plane HTTP server
//! - status: merged loop states and participant counts
//! - loops: loop catalog of the active role
//! - toggle / off: drive a loop's state machine
//! - delay: broadcast delay on/off to every worker
//! - role: switch the active role

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// voxctl - voice loop control plane over a pool of relay workers
#[derive(Parser, Debug)]
#[command(name = "voxctl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Base URL of a running server (defaults to the configured bind address)
    #[arg(short, long, global = true)]
    pub url: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the control plane server
    Serve {
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Active role (overrides config)
        #[arg(short, long)]
        role: Option<String>,

        /// Record worker calls in memory instead of contacting workers
        #[arg(long)]
        dry_run: bool,
    },

    /// Show loop states and participant counts
    Status,

    /// List loops of the active role
    Loops,

    /// Advance a loop: OFF -> LISTEN -> TALK -> LISTEN
    Toggle {
        /// Loop name
        #[arg(value_name = "LOOP")]
        loop_name: String,
    },

    /// Turn a loop off and release its worker
    Off {
        /// Loop name
        #[arg(value_name = "LOOP")]
        loop_name: String,
    },

    /// Turn the delay on or off on every worker
    Delay {
        #[arg(value_enum)]
        switch: Switch,
    },

    /// Switch the active role
    Role {
        /// Role name (FLIGHT, CAPCOM, FAO, BME, CPOO, SCIENCE, EVA)
        role: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Switch {
    On,
    Off,
}

impl Switch {
    pub fn enabled(self) -> bool {
        self == Switch::On
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_requires_command() {
        assert!(Cli::try_parse_from(["voxctl"]).is_err());
    }

    #[test]
    fn test_cli_verbose_flag() {
        let cli = Cli::try_parse_from(["voxctl", "-v", "status"]).unwrap();
        assert!(cli.is_verbose());
    }

    #[test]
    fn test_cli_config_option() {
        let cli = Cli::try_parse_from(["voxctl", "-c", "/path/to/voxctl.yml", "status"]).unwrap();
        assert_eq!(cli.config.as_ref(), Some(&PathBuf::from("/path/to/voxctl.yml")));
    }

    #[test]
    fn test_serve_defaults() {
        let cli = Cli::try_parse_from(["voxctl", "serve"]).unwrap();
        match cli.command {
            Commands::Serve { port, role, dry_run } => {
                assert!(port.is_none());
                assert!(role.is_none());
                assert!(!dry_run);
            }
            _ => panic!("Expected serve command"),
        }
    }

    #[test]
    fn test_serve_overrides() {
        let cli = Cli::try_parse_from(["voxctl", "serve", "-p", "9090", "--role", "eva", "--dry-run"]).unwrap();
        match cli.command {
            Commands::Serve { port, role, dry_run } => {
                assert_eq!(port, Some(9090));
                assert_eq!(role.as_deref(), Some("eva"));
                assert!(dry_run);
            }
            _ => panic!("Expected serve command"),
        }
    }

    #[test]
    fn test_toggle_command() {
        let cli = Cli::try_parse_from(["voxctl", "toggle", "CMD"]).unwrap();
        match cli.command {
            Commands::Toggle { loop_name } => assert_eq!(loop_name, "CMD"),
            _ => panic!("Expected toggle command"),
        }
    }

    #[test]
    fn test_off_command_with_url() {
        let cli = Cli::try_parse_from(["voxctl", "off", "OBS", "--url", "http://10.0.0.2:8080"]).unwrap();
        assert_eq!(cli.url.as_deref(), Some("http://10.0.0.2:8080"));
        match cli.command {
            Commands::Off { loop_name } => assert_eq!(loop_name, "OBS"),
            _ => panic!("Expected off command"),
        }
    }

    #[test]
    fn test_delay_command() {
        let cli = Cli::try_parse_from(["voxctl", "delay", "on"]).unwrap();
        match cli.command {
            Commands::Delay { switch } => assert!(switch.enabled()),
            _ => panic!("Expected delay command"),
        }
        assert!(Cli::try_parse_from(["voxctl", "delay", "maybe"]).is_err());
    }

    #[test]
    fn test_role_command() {
        let cli = Cli::try_parse_from(["voxctl", "role", "capcom"]).unwrap();
        match cli.command {
            Commands::Role { role } => assert_eq!(role, "capcom"),
            _ => panic!("Expected role command"),
        }
    }

    #[test]
    fn test_cli_debug_assert() {
        Cli::command().debug_assert();
    }
}
