//! Hatch MCP Server CLI

use clap::{Args, Parser, Subcommand};
use console::style;
use hatch_mcp_server::citation::CitationKind;
use hatch_mcp_server::config::{ConfigLoader, HatchConfig};
use hatch_mcp_server::HatchMCP;
use serde_json::{json, Value};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hatch-mcp")]
#[command(about = "Hatch MCP Server - MCP servers with citation resources")]
#[command(version = hatch_mcp_server::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve MCP over stdin/stdout
    Serve {
        #[command(flatten)]
        server: ServerArgs,
    },

    /// Print the citation resource URIs of a server
    Citations {
        /// Server name
        #[arg(short, long)]
        name: String,
    },

    /// Print the resources a server would expose, with their contents
    Inspect {
        #[command(flatten)]
        server: ServerArgs,
    },
}

#[derive(Args)]
struct ServerArgs {
    /// Config file (.toml, .yaml or .yml); defaults to the user config dir
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Server name (overrides the config file)
    #[arg(short, long)]
    name: Option<String>,

    /// Citation of the original software (overrides the config file)
    #[arg(long)]
    origin_citation: Option<String>,

    /// Citation of this MCP server implementation (overrides the config file)
    #[arg(long)]
    mcp_citation: Option<String>,
}

impl ServerArgs {
    fn resolve(self) -> anyhow::Result<HatchConfig> {
        let path = self
            .config
            .or_else(|| ConfigLoader::default_path().filter(|p| p.exists()));

        let mut config = match (path, &self.name) {
            (Some(path), _) => ConfigLoader::load(path)?,
            (None, Some(name)) => HatchConfig::new(name.clone()),
            (None, None) => {
                return Err(anyhow::anyhow!(
                    "No server name given. Pass --name or --config."
                ))
            }
        };

        if let Some(name) = self.name {
            config.name = name;
        }
        if self.origin_citation.is_some() {
            config.origin_citation = self.origin_citation;
        }
        if self.mcp_citation.is_some() {
            config.mcp_citation = self.mcp_citation;
        }
        Ok(config)
    }
}

fn init_logging(level: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.unwrap_or("info")));
    // stdout carries the protocol
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { server } => serve(server.resolve()?).await,
        Commands::Citations { name } => print_citations(&name),
        Commands::Inspect { server } => inspect(server.resolve()?).await,
    }
}

async fn serve(config: HatchConfig) -> anyhow::Result<()> {
    init_logging(config.log_level.as_deref());
    info!(
        server = %config.name,
        origin = config.origin_citation.is_some(),
        mcp = config.mcp_citation.is_some(),
        "Starting Hatch MCP server"
    );

    let hatch = config.into_builder().build().await?;
    eprintln!(
        "{}",
        style(format!("Serving '{}' over stdio", hatch.name())).bold().cyan()
    );
    hatch.run_stdio().await
}

fn print_citations(name: &str) -> anyhow::Result<()> {
    let name = name.trim();
    if name.is_empty() {
        return Err(anyhow::anyhow!("Server name must not be empty"));
    }

    for kind in CitationKind::ALL {
        println!("{:<8} {}", kind.key(), kind.uri(name));
    }
    Ok(())
}

async fn inspect(config: HatchConfig) -> anyhow::Result<()> {
    init_logging(config.log_level.as_deref().or(Some("warn")));

    let hatch: HatchMCP = config.into_builder().build().await?;

    eprintln!("{}", style(format!("Server: {}", hatch.name())).bold());
    println!("{}", serde_json::to_string_pretty(&inspect_entries(&hatch).await?)?);
    Ok(())
}

/// Every registered resource with its current contents, as one JSON array
async fn inspect_entries(hatch: &HatchMCP) -> anyhow::Result<Value> {
    let resources = hatch.server().resources();
    let mut entries = Vec::new();
    for resource in resources.list_resources().await {
        let contents = resources.read_resource(&resource.uri).await?;
        entries.push(json!({
            "resource": resource,
            "contents": contents,
        }));
    }
    Ok(Value::Array(entries))
}
