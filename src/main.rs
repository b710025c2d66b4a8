use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use page_relay::{ApiServer, ApiState, Config};

/// Page Relay - Messenger page webhook relay for AI assistants
#[derive(Parser)]
#[command(name = "page-relay", version, about)]
struct Cli {
    /// Port to listen on (falls back to `PORT`, then 3000)
    #[arg(long, env = "RELAY_PORT")]
    port: Option<u16>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins over -v flags
    let filter = match cli.verbose {
        0 => "info,page_relay=info",
        1 => "info,page_relay=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::from_env()?;
    tracing::debug!(?config, "loaded configuration");

    let port = cli.port.unwrap_or(config.port);

    tracing::info!(
        port,
        responder = %config.responder_url,
        send_url = %config.send_url,
        "starting page relay"
    );

    let state = ApiState::from_config(config)?;
    ApiServer::new(state, port).run().await?;

    Ok(())
}
