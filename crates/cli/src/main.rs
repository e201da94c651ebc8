mod config;
mod error;
mod logging;

use std::path::PathBuf;

use chrono::Local;
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::{info, warn};

use bridge::BridgeClient;
use host::{BridgeServer, Dispatcher, Document};
use mcp::{McpServer, ServerInfo};
use tools::CapabilityPublisher;

use config::{CONFIG_FILE, Config};
use error::{Error, Result};

const SERVER_NAME: &str = "rhino-mcp";

#[derive(Parser)]
#[command(name = "rhino-mcp")]
#[command(about = "Rhino tools for AI assistants over MCP", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (default: ./rhino-mcp.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve tools over MCP on stdin/stdout (default)
    Serve,
    /// Run the bridge server that executes operations
    Bridge {
        /// Listen address (default: bridge host and port from config)
        #[arg(short, long)]
        bind: Option<String>,
        /// Start with no Grasshopper definition loaded
        #[arg(long)]
        no_grasshopper: bool,
    },
    /// Print the published tool list as JSON
    Tools,
    /// Probe the bridge server
    Status,
    /// Invoke one tool and print the result envelope
    Call {
        /// Tool name
        tool: String,
        /// Arguments as a JSON object
        #[arg(short, long, default_value = "{}")]
        args: String,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(CONFIG_FILE)?,
    }
    .with_process_env()?;
    logging::init(&config.log.filter)?;

    match cli.command {
        Some(Commands::Serve) | None => cmd_serve(&config).await,
        Some(Commands::Bridge {
            bind,
            no_grasshopper,
        }) => cmd_bridge(&config, bind, no_grasshopper).await,
        Some(Commands::Tools) => cmd_tools(&config),
        Some(Commands::Status) => cmd_status(&config).await,
        Some(Commands::Call { tool, args }) => cmd_call(&config, &tool, &args).await,
    }
}

fn publisher(config: &Config) -> Result<CapabilityPublisher> {
    let client = BridgeClient::new(config.bridge_config()?)?;
    let discovery = tools::discover(&tools::catalog::builtin());
    Ok(CapabilityPublisher::new(discovery.registry, client))
}

async fn cmd_serve(config: &Config) -> Result<()> {
    let publisher = publisher(config)?;

    // The bridge may come up later; tool calls report it if it never does.
    match publisher.bridge().status().await {
        Ok(report) => info!(
            endpoints = report.endpoint_count,
            grasshopper = report.grasshopper_available,
            version = %report.version,
            "bridge server reachable"
        ),
        Err(e) => warn!(
            bridge_url = %publisher.bridge().config().base_url(),
            error = %e,
            "bridge server not reachable yet"
        ),
    }

    let info = ServerInfo {
        name: SERVER_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };
    info!(tools = publisher.registry().len(), "serving tools on stdio");
    McpServer::new(info, publisher).serve_stdio().await?;
    Ok(())
}

async fn cmd_bridge(config: &Config, bind: Option<String>, no_grasshopper: bool) -> Result<()> {
    host::install_panic_hook();

    let addr = bind.unwrap_or_else(|| format!("{}:{}", config.bridge.host, config.bridge.port));
    let discovery = host::discover(&host::ops::builtin());
    let document = if no_grasshopper {
        Document::without_grasshopper()
    } else {
        Document::new()
    };
    let dispatcher = Dispatcher::new(discovery.registry, document);

    let mut server = BridgeServer::bind(addr.as_str(), dispatcher).await?;
    println!("{} listening on http://{}", host::SERVER_NAME, server.addr());
    println!("Press Ctrl+C to stop.");

    tokio::signal::ctrl_c().await?;
    server.shutdown()?;
    server.wait().await?;
    println!("Bridge server stopped.");
    Ok(())
}

fn cmd_tools(config: &Config) -> Result<()> {
    let publisher = publisher(config)?;
    let tools = publisher.capabilities();
    println!("{}", serde_json::to_string_pretty(&tools)?);
    Ok(())
}

async fn cmd_status(config: &Config) -> Result<()> {
    let client = BridgeClient::new(config.bridge_config()?)?;
    let report = client.status().await?;

    let started = report
        .started_at
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S");
    println!("{:<14}  {}", "BRIDGE", client.config().base_url());
    println!("{:<14}  {}", "STATUS", report.status);
    println!("{:<14}  {}", "VERSION", report.version);
    println!("{:<14}  {}", "ENDPOINTS", report.endpoint_count);
    println!("{:<14}  {}", "GRASSHOPPER", yes_no(report.grasshopper_available));
    println!("{:<14}  {started} ({}s ago)", "STARTED", report.uptime_secs);
    Ok(())
}

async fn cmd_call(config: &Config, tool: &str, args: &str) -> Result<()> {
    let arguments: Value = serde_json::from_str(args).map_err(|e| Error::Arguments(e.to_string()))?;
    if !arguments.is_object() {
        return Err(Error::Arguments(format!("got {arguments}")));
    }

    let envelope = publisher(config)?.invoke(tool, arguments).await;
    println!("{}", serde_json::to_string_pretty(&envelope)?);
    if envelope.is_success() {
        Ok(())
    } else {
        let message = envelope.error().unwrap_or("unknown error").to_string();
        Err(Error::ToolFailed(message))
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}
