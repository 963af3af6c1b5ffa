// ABOUTME: Command-line front end for the migration console
// ABOUTME: Shows derived resource status, plan counts, and drives plan polling and close

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use mig_console::plan::get_pv_resources;
use mig_console::remote::client::fetch_snapshot;
use mig_console::status::{derive_status, plan_counts, plan_status, MigrationType};
use mig_console::{
    ChannelAlertSink, ConsoleConfig, PlanOperations, PollHandle, PollOutcome, RemoteClient,
    ResourceKind, ResourceSnapshot,
};

#[derive(Parser)]
#[command(name = "mig-console")]
#[command(about = "Status and plan operations for a cluster migration controller", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// API server URL, overrides the configuration file
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Namespace holding the migration resources
    #[arg(long, short = 'n', global = true)]
    namespace: Option<String>,

    /// Bearer token for the API server
    #[arg(long, env = "MIG_CONSOLE_TOKEN", hide_env_values = true, global = true)]
    token: Option<String>,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Derive the status of one migration resource
    Status {
        /// Resource kind, e.g. Backup, DirectVolumeMigration, Migration, Plan
        kind: String,
        name: String,
    },
    /// List plans with their status and dashboard counts
    Plans,
    /// Poll a plan until it reports a condition
    Watch {
        plan: String,
        #[arg(long, value_enum, default_value_t = WatchCondition::Ready)]
        condition: WatchCondition,
    },
    /// Wait for volume discovery on a plan and list the volumes
    Volumes {
        plan: String,
        /// Also fetch each PersistentVolume object
        #[arg(long)]
        details: bool,
    },
    /// Close a plan, optionally deleting it once the close is confirmed
    Close {
        plan: String,
        #[arg(long)]
        delete: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum WatchCondition {
    Ready,
    Closed,
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "mig_console=debug"
    } else {
        "mig_console=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<ConsoleConfig> {
    let mut config = match &cli.config {
        Some(path) => ConsoleConfig::load_from(path)?,
        None => ConsoleConfig::default(),
    };
    if let Some(url) = &cli.api_url {
        config.api.base_url = url.clone();
    }
    if let Some(namespace) = &cli.namespace {
        config.api.namespace = namespace.clone();
    }
    if let Some(token) = &cli.token {
        config.api.token = Some(token.clone());
    }
    Ok(config)
}

fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner} {msg} [{elapsed}]") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

async fn wait_with_spinner(handle: PollHandle, message: String) -> PollOutcome {
    let pb = spinner(message);
    let outcome = handle.wait().await;
    pb.finish_with_message(format!("{:?}", outcome));
    outcome
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(&cli)?;
    let mut client = RemoteClient::with_timeout(config.api.base_url.clone(), config.api_timeout())?;
    if let Some(token) = &config.api.token {
        client = client.with_token(token.clone());
    }
    let client = Arc::new(client);

    let (sink, mut notifications) = ChannelAlertSink::new();
    let printer = tokio::spawn(async move {
        while let Some(notification) = notifications.recv().await {
            eprintln!("{}", notification);
        }
    });

    let ops = PlanOperations::new(client.clone(), Arc::new(sink), &config);

    let result = tokio::select! {
        result = run(cli.command, &ops, client.as_ref(), &config.api.namespace) => result,
        _ = tokio::signal::ctrl_c() => {
            ops.supervisor().stop_all();
            Err(anyhow::anyhow!("Interrupted"))
        }
    };

    drop(ops);
    let _ = tokio::time::timeout(Duration::from_millis(500), printer).await;
    result
}

async fn run(
    command: Commands,
    ops: &PlanOperations<RemoteClient>,
    client: &RemoteClient,
    namespace: &str,
) -> Result<()> {
    match command {
        Commands::Status { kind, name } => {
            let kind: ResourceKind = kind.parse()?;
            let snapshot = fetch_snapshot(client, kind, namespace, &name)
                .await
                .with_context(|| format!("Failed to fetch {} {}", kind, name))?;
            match derive_status(&snapshot) {
                Some(derived) => {
                    let status = derived
                        .current_status
                        .map(|s| s.label())
                        .unwrap_or("Pending");
                    println!("{} {}: {}", kind, name, status);
                    println!(
                        "  running={} failure={} warning={} completed={}",
                        derived.has_running,
                        derived.has_failure,
                        derived.has_warning,
                        derived.has_completed
                    );
                }
                None => println!("{} {}: unknown", kind, name),
            }
        }
        Commands::Plans => {
            let plans = ops.list_plans_with_migrations().await?;
            for entry in &plans {
                let snapshot =
                    ResourceSnapshot::new("Plan", entry.plan.name(), entry.plan.status.clone());
                let current = derive_status(&snapshot)
                    .and_then(|d| d.current_status)
                    .map(|s| s.label())
                    .unwrap_or("-");
                let status = plan_status(entry);
                let latest = match status.latest_type {
                    Some(MigrationType::Stage) => "stage",
                    Some(MigrationType::Migration) => "migration",
                    None => "-",
                };
                println!(
                    "{:<32} {:<10} ready={:<5} closed={:<5} migrations={:<3} latest={}",
                    entry.plan.name(),
                    current,
                    status.has_ready_condition,
                    status.has_closed_condition,
                    entry.migrations.len(),
                    latest
                );
            }
            let counts = plan_counts(&plans);
            println!(
                "\nnot started: {}  in progress: {}  completed: {}",
                counts.not_started.len(),
                counts.in_progress.len(),
                counts.completed.len()
            );
        }
        Commands::Watch { plan, condition } => {
            let (handle, label) = match condition {
                WatchCondition::Ready => (ops.start_plan_status_polling(&plan)?, "Ready"),
                WatchCondition::Closed => (ops.start_closed_status_polling(&plan)?, "Closed"),
            };
            let outcome =
                wait_with_spinner(handle, format!("Waiting for plan {} to be {}", plan, label))
                    .await;
            if outcome != PollOutcome::Succeeded {
                anyhow::bail!("Plan {} did not report {} ({:?})", plan, label, outcome);
            }
        }
        Commands::Volumes { plan, details } => {
            let pb = spinner(format!("Discovering volumes for plan {}", plan));
            let volumes = ops.discover_volumes(&plan).await;
            pb.finish_and_clear();
            let volumes = volumes?;

            if volumes.is_empty() {
                println!("No persistent volumes discovered for plan {}", plan);
            }
            for volume in &volumes {
                println!("{}", volume.name);
            }
            if details && !volumes.is_empty() {
                for object in get_pv_resources(client, &volumes).await {
                    println!("{}", serde_json::to_string_pretty(&object)?);
                }
            }
        }
        Commands::Close { plan, delete } => {
            if delete {
                ops.close_and_delete(&plan).await?;
            } else {
                let handle = ops.close_plan(&plan).await?;
                let outcome =
                    wait_with_spinner(handle, format!("Closing plan {}", plan)).await;
                if outcome != PollOutcome::Succeeded {
                    anyhow::bail!("Plan {} was not closed ({:?})", plan, outcome);
                }
                println!("Plan {} closed", plan);
            }
        }
    }

    Ok(())
}
