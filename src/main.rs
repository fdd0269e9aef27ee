use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

mod cli;

use cli::commands::Commands;
use cli::{Cli, ControlClient};
use voxctl::catalog::normalize_role;
use voxctl::config::{Config, SettingsUpdate};
use voxctl::control::{CommandOutcome, CommandRequest, OutcomeKind};
use voxctl::domain::LoopState;
use voxctl::server::{self, AppState};
use voxctl::worker::{HttpWorkerClient, RecordingWorkerClient, WorkerClient};

fn setup_logging(config: &Config) -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("voxctl")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("voxctl.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    let default_level = config.log_level.as_deref().unwrap_or("info");
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

async fn run_application(cli: &Cli, mut config: Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    let client = ControlClient::new(
        cli.url
            .clone()
            .unwrap_or_else(|| config.server.bind_addr()),
    );

    match &cli.command {
        Commands::Serve { port, role, dry_run } => {
            if let Some(port) = port {
                config.server.port = *port;
            }
            if let Some(role) = role {
                config.role = normalize_role(role);
            }
            handle_serve(cli, config, *dry_run).await
        }
        Commands::Status => handle_status(&client).await,
        Commands::Loops => handle_loops(&client).await,
        Commands::Toggle { loop_name } => handle_command(&client, CommandRequest::toggle(loop_name)).await,
        Commands::Off { loop_name } => handle_command(&client, CommandRequest::off(loop_name)).await,
        Commands::Delay { switch } => handle_command(&client, CommandRequest::delay(switch.enabled())).await,
        Commands::Role { role } => handle_role(&client, role).await,
    }
}

async fn handle_serve(cli: &Cli, config: Config, dry_run: bool) -> Result<()> {
    let workers: Arc<dyn WorkerClient> = if dry_run {
        println!("{}", "Dry run: worker calls are recorded, not sent".yellow());
        Arc::new(RecordingWorkerClient::new())
    } else {
        Arc::new(HttpWorkerClient::new(config.workers.http()).context("Failed to create worker client")?)
    };

    let bind_addr = config.server.bind_addr();
    let config_path = Config::locate(cli.config.as_ref());
    println!(
        "{} role {} on {} ({} workers)",
        "Serving:".green(),
        config.role.cyan(),
        bind_addr,
        config.workers.pool.len()
    );

    let state = AppState::from_config(config, config_path, workers);
    server::serve(state, &bind_addr).await.context("Server failed")?;
    Ok(())
}

async fn handle_status(client: &ControlClient) -> Result<()> {
    let status = client.status().await?;
    if status.states.is_empty() {
        println!("{}", "No loops".yellow());
    }
    for (name, state) in &status.states {
        let label = match state {
            LoopState::Off => "OFF".dimmed(),
            LoopState::Listen => "LISTEN".blue(),
            LoopState::Talk => "TALK".green().bold(),
        };
        println!("{:<16} {:<8} {} users", name, label, status.count_of(name));
    }
    Ok(())
}

async fn handle_loops(client: &ControlClient) -> Result<()> {
    for def in client.loops().await? {
        let listen = if def.can_listen { "listen" } else { "-" };
        let talk = if def.can_talk { "talk" } else { "-" };
        println!("{:<16} {:<7} {}", def.name, listen, talk);
    }
    Ok(())
}

async fn handle_command(client: &ControlClient, request: CommandRequest) -> Result<()> {
    info!("Sending command: {:?}", request);
    let outcome = client.command(&request).await?;
    print_outcome(&outcome);
    Ok(())
}

async fn handle_role(client: &ControlClient, role: &str) -> Result<()> {
    let result = client.save_settings(&SettingsUpdate::role(normalize_role(role))).await?;

    let active = result["settings"]["role"].as_str().unwrap_or(role);
    println!("{} {}", "Role:".green(), active.cyan());
    if let Some(released) = result["switch"]["released"].as_array() {
        println!("  released {} workers", released.len());
    }
    if let Some(error) = result["save_error"].as_str() {
        println!("  {} settings not saved: {}", "!".red(), error);
    }
    Ok(())
}

fn print_outcome(outcome: &CommandOutcome) {
    let label = match outcome.result {
        OutcomeKind::Ok => "ok".green(),
        OutcomeKind::Unchanged => "unchanged".normal(),
        OutcomeKind::Busy => "busy".yellow(),
        OutcomeKind::Rejected => "rejected".yellow(),
        OutcomeKind::PartialFailure => "partial failure".red(),
        OutcomeKind::Failed => "failed".red().bold(),
    };

    let mut line = format!("{}", label);
    if let Some(name) = &outcome.loop_name {
        line.push_str(&format!(" {}", name));
    }
    if let Some(state) = outcome.state {
        line.push_str(&format!(" -> {}", state));
    }
    if let Some(worker) = &outcome.worker {
        line.push_str(&format!(" on {}", worker));
    }
    println!("{}", line);

    if let Some(reason) = &outcome.reason {
        println!("  {}", reason);
    }
    for failure in &outcome.failures {
        println!("  {} {} on {}: {}", "!".red(), failure.op, failure.worker, failure.error);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    // Setup logging once the configured level is known
    setup_logging(&config).context("Failed to setup logging")?;

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(&cli, config).await.context("Application failed")?;

    Ok(())
}
