use anyhow::Result;
use clap::{Args, Subcommand};
use mqfleet_core::Node;
use mqfleet_topology::{MetadataProfileStore, ProfileStore};

#[derive(Debug, Args)]
pub(crate) struct Nodes {
    #[command(subcommand)]
    command: NodesCommands,
}

#[derive(Debug, Subcommand)]
pub(crate) enum NodesCommands {
    #[command(about = "Record a node that exists outside the manager")]
    Register {
        #[arg(help = "Node name")]
        name: String,
        #[arg(long, help = "Version the node runs (default: any)")]
        version: Option<String>,
        #[arg(long = "profile", help = "Profile the node already carries (repeatable)")]
        profiles: Vec<String>,
    },
    #[command(about = "List the known nodes and their profiles")]
    List {
        #[arg(long, value_parser = ["json"], help = "Output format: json (default: plain)")]
        output: Option<String>,
    },
}

pub(crate) async fn handle_command(store: &MetadataProfileStore, nodes: Nodes) -> Result<()> {
    match nodes.command {
        NodesCommands::Register {
            name,
            version,
            profiles,
        } => {
            let mut node = Node::new(name);
            node.version = version;
            node.profiles = profiles.into_iter().collect();
            store.register_node(&node).await?;
            println!("registered node {}", node.name);
        }

        NodesCommands::List { output } => {
            let nodes = store.list_nodes().await?;
            if matches!(output.as_deref(), Some("json")) {
                println!("{}", serde_json::to_string_pretty(&nodes)?);
            } else {
                for node in nodes {
                    let profiles: Vec<&str> = node.profiles.iter().map(String::as_str).collect();
                    println!(
                        "{}\t{}\t{}",
                        node.name,
                        node.version.as_deref().unwrap_or("*"),
                        profiles.join(",")
                    );
                }
            }
        }
    }
    Ok(())
}
