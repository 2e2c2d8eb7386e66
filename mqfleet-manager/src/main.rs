mod brokers;
mod nodes;
mod service_configuration;

use std::{fs::read_to_string, path::PathBuf, sync::Arc};

use crate::{
    brokers::{Assign, Load, Provision, Save},
    nodes::Nodes,
    service_configuration::{LoadConfiguration, ServiceConfiguration},
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mqfleet_core::metadata::{FileStore, MetadataStorage};
use mqfleet_topology::{
    ConfiguredProvider, MetadataProfileStore, ProviderRegistry, StaticEnsemble, TopologyService,
    VersionedConfigResolver,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "mqfleet-manager")]
#[command(about = "Load, apply and provision the broker topology of an mqfleet fleet", long_about = None)]
struct Cli {
    #[arg(
        long,
        short = 'c',
        default_value = "config/mqfleet_manager.yml",
        help = "Path to config file"
    )]
    config_file: PathBuf,
    #[arg(long, help = "Metadata snapshot file, overrides store.path from the config file")]
    store_path: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Print the managed broker descriptions of a version as JSON")]
    Load(Load),
    #[command(about = "Apply broker descriptions read from a JSON file")]
    Save(Save),
    #[command(about = "Build provisioning plans for a broker on a set of nodes")]
    Provision(Provision),
    #[command(about = "Add a broker profile to existing nodes")]
    Assign(Assign),
    #[command(about = "Manage the nodes known to the fleet")]
    Node(Nodes),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load the configuration from the specified YAML file
    let config_content = read_to_string(&cli.config_file).with_context(|| {
        format!("Failed to read config file {}", cli.config_file.display())
    })?;
    let load_config: LoadConfiguration =
        serde_yaml::from_str(&config_content).context("Failed to parse config file")?;
    let mut service_config: ServiceConfiguration = load_config.try_into()?;

    // If `store_path` is provided via command-line args, override the value from the config file
    if let Some(store_path) = cli.store_path {
        service_config.store_path = store_path;
    }

    init_logging(&service_config.log_level);

    info!(
        fleet = %service_config.fleet_name,
        store = %service_config.store_path.display(),
        "opening fleet metadata store"
    );
    let file_store = FileStore::open(&service_config.store_path)
        .await
        .with_context(|| {
            format!(
                "Failed to open metadata store {}",
                service_config.store_path.display()
            )
        })?;
    let store = MetadataProfileStore::new(MetadataStorage::File(file_store));
    let service = topology_service(&service_config, store.clone());

    match cli.command {
        Commands::Load(load) => brokers::load(&service, load).await?,
        Commands::Save(save) => brokers::save(&service, save).await?,
        Commands::Provision(provision) => brokers::provision(&service, provision).await?,
        Commands::Assign(assign) => brokers::assign(&service, assign).await?,
        Commands::Node(nodes) => nodes::handle_command(&store, nodes).await?,
    }

    Ok(())
}

/// Logs to stderr so stdout stays clean for command output. RUST_LOG wins over the configured level.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn topology_service(config: &ServiceConfiguration, store: MetadataProfileStore) -> TopologyService {
    let mut providers = ProviderRegistry::new();
    for entry in &config.providers {
        let mut provider = ConfiguredProvider::new(entry.scheme.clone());
        if entry.child {
            provider = provider.with_child_nodes(entry.default_user.clone());
        }
        providers.register(Arc::new(provider));
    }
    info!(schemes = ?providers.schemes(), "node providers registered");

    let ensemble = StaticEnsemble::new(config.current_node.clone(), config.ensemble.clone());

    TopologyService::new(
        Arc::new(store),
        Arc::new(VersionedConfigResolver::new(config.base_profile.clone())),
        providers,
        Arc::new(ensemble),
    )
    .with_default_version(config.default_version.clone())
    .with_data_base(config.data_base.clone())
    .with_base_profile(config.base_profile.clone())
}
