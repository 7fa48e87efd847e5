// Gateway server binary.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use teller_mcp::config::GatewayConfig;
use teller_mcp::dispatch::Dispatcher;
use teller_mcp::tools::ToolKind;

#[derive(Parser, Debug)]
#[command(name = "teller-mcp")]
#[command(about = "Teller - read-only SQL tool gateway for conversational agents", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "teller.toml")]
    config: PathBuf,

    /// Store connection URL override
    #[arg(long, env = "TELLER_DATABASE_URL")]
    database_url: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Host to bind to
    #[arg(long)]
    host: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "teller_mcp=info,tower_http=debug".into()),
        )
        .with_target(false)
        .init();

    let args = Args::parse();

    let mut config = GatewayConfig::load(&args.config)?;
    if args.database_url.is_some() {
        config.database.url = args.database_url;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(host) = args.host {
        config.server.host = host;
    }

    tracing::info!("Starting Teller gateway");
    tracing::info!("Registered {} tools", ToolKind::ALL.len());

    let dispatcher = Dispatcher::new(config.credential_provider());
    teller_mcp::server::serve(&config.bind_addr(), dispatcher).await
}
