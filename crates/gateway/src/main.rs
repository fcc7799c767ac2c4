use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use nv_domain::config::ServerConfig;
use nv_gateway::api;
use nv_gateway::state::AppState;

#[derive(Parser)]
#[command(name = "navium", about = "AI-powered UI automation server")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Start the HTTP server (default).
    Serve,
    /// Print the version and exit.
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        None | Some(Command::Serve) => {
            init_tracing();
            let config = ServerConfig::from_env().context("resolving configuration")?;
            run_server(config).await
        }
        Some(Command::Version) => {
            println!("navium {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,nv_gateway=debug")),
        )
        .init();
}

async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    tracing::info!(model = %config.model.label(), "Navium starting");

    let addr = format!("{}:{}", config.host, config.port);
    let state = AppState::new(config);
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding to {addr}"))?;

    tracing::info!(addr = %addr, "Navium listening");
    axum::serve(listener, app).await.context("serving HTTP")
}
