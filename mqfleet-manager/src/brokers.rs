use anyhow::{anyhow, Context, Result};
use clap::Args;
use mqfleet_topology::{BatchOutcome, TopologyService};
use std::path::PathBuf;
use tokio::io::AsyncReadExt;
use tracing::{error, info};

#[derive(Debug, Args)]
pub(crate) struct Load {
    #[arg(long, help = "Version to load (default: the configured default version)")]
    version: Option<String>,
    #[arg(long, short, help = "Write the JSON to this file instead of stdout")]
    output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub(crate) struct Save {
    #[arg(help = "JSON file with one broker object or an array of them, '-' reads stdin")]
    file: String,
}

#[derive(Debug, Args)]
pub(crate) struct Provision {
    #[arg(long, help = "Name of the stored broker to provision")]
    broker: String,
    #[arg(long, help = "Version of the broker profile (default: the configured default version)")]
    version: Option<String>,
    #[arg(long, help = "Node provider scheme")]
    scheme: String,
    #[arg(long = "node", required = true, help = "Node to create (repeatable)")]
    nodes: Vec<String>,
    #[arg(long, help = "JVM options for the created nodes")]
    jvm_opts: Option<String>,
    #[arg(long, help = "Management user for child nodes")]
    username: Option<String>,
    #[arg(long, help = "Management password for child nodes")]
    password: Option<String>,
}

#[derive(Debug, Args)]
pub(crate) struct Assign {
    #[arg(long, help = "Broker profile to assign")]
    profile: String,
    #[arg(long, help = "Version of the profile (default: the configured default version)")]
    version: Option<String>,
    #[arg(long = "node", required = true, help = "Existing node to assign the profile to (repeatable)")]
    nodes: Vec<String>,
}

pub(crate) async fn load(service: &TopologyService, load: Load) -> Result<()> {
    let version = load
        .version
        .unwrap_or_else(|| service.default_version().to_string());
    let json = service.load_json(&version).await?;

    match load.output {
        Some(path) => {
            tokio::fs::write(&path, json)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(path = %path.display(), version = %version, "broker topology written");
        }
        None => println!("{}", json),
    }
    Ok(())
}

pub(crate) async fn save(service: &TopologyService, save: Save) -> Result<()> {
    let json = if save.file == "-" {
        let mut buffer = String::new();
        tokio::io::stdin()
            .read_to_string(&mut buffer)
            .await
            .context("Failed to read broker descriptions from stdin")?;
        buffer
    } else {
        tokio::fs::read_to_string(&save.file)
            .await
            .with_context(|| format!("Failed to read {}", save.file))?
    };

    let outcome = service.save_json(&json).await?;
    for profile in &outcome.completed {
        println!("saved {} (version {})", profile.id, profile.version);
    }
    check_outcome("broker descriptions", &outcome)
}

pub(crate) async fn provision(service: &TopologyService, provision: Provision) -> Result<()> {
    let version = provision
        .version
        .unwrap_or_else(|| service.default_version().to_string());
    let mut cfg = service
        .load_topology(&version)
        .await?
        .into_iter()
        .find(|cfg| cfg.name == provision.broker)
        .ok_or_else(|| {
            anyhow!(
                "broker {} is not managed in version {}",
                provision.broker,
                version
            )
        })?;
    cfg.jvm_opts = provision.jvm_opts;
    cfg.username = provision.username;
    cfg.password = provision.password;

    let outcome = service
        .provision(&cfg, &provision.scheme, &provision.nodes)
        .await?;
    println!("{}", serde_json::to_string_pretty(&outcome.completed)?);
    check_outcome("nodes", &outcome)
}

pub(crate) async fn assign(service: &TopologyService, assign: Assign) -> Result<()> {
    let version = assign
        .version
        .unwrap_or_else(|| service.default_version().to_string());
    let outcome = service
        .assign(&assign.profile, &version, &assign.nodes)
        .await?;
    for node in &outcome.completed {
        println!("assigned {} to {}", assign.profile, node);
    }
    check_outcome("nodes", &outcome)
}

/// Logs every failed element and turns a non-empty failure list into an error exit.
fn check_outcome<T>(what: &str, outcome: &BatchOutcome<T>) -> Result<()> {
    if outcome.all_succeeded() {
        return Ok(());
    }
    for failure in &outcome.failed {
        error!(item = %failure.item, error = %failure.error, "operation failed");
    }
    Err(anyhow!(
        "{} of {} {} failed",
        outcome.failed.len(),
        outcome.failed.len() + outcome.completed.len(),
        what
    ))
}
