//! DBank server - Main entry point

use anyhow::Context;
use clap::{Parser, Subcommand};
use dbank_persistence::Database;
use dbank_rpc::context::open_ledger_store;
use dbank_rpc::{http, AppContext, ServerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "dbank")]
#[command(about = "DBank - transfer execution and ledger pipeline", long_about = None)]
struct Cli {
    #[command(flatten)]
    config: ServerConfig,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server and the event relay (default)
    Serve,

    /// Create the relational and ledger schemas and exit
    Migrate,

    /// Print the version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("{0},tower_http={0}", cli.config.log_level))),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(cli.config).await,
        Commands::Migrate => {
            let db = Database::connect(&cli.config.db_url).await?;
            db.migrate().await?;
            open_ledger_store(&db, &cli.config).await?;
            println!("✅ Schema ready at {}", cli.config.db_url);
            Ok(())
        }
        Commands::Version => {
            println!("dbank {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let ctx = AppContext::new(&config)
        .await
        .context("failed to initialize application")?;
    let relay = ctx.start_relay().await?;
    if let Err(e) = ctx.reconciler.replay_missing().await {
        tracing::error!(error = %e, "failed to replay transfers missing from the ledger");
    }

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("DBank server listening on http://{}", addr);

    axum::serve(listener, http::router(ctx))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    relay.stop().await;
    tracing::info!("DBank server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
