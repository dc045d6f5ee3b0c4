use anyhow::Result;
use brokerload::cli::{self, LoadTestCli};
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = LoadTestCli::parse();

    #[cfg(feature = "tracing")]
    init_logging(cli.quiet);

    #[cfg(feature = "tracing")]
    tracing::info!(config = ?cli.config, "start test");

    if let Err(e) = cli::run(&cli).await {
        #[cfg(feature = "tracing")]
        tracing::error!("load test failed: {e:#}");
        return Err(e);
    }
    Ok(())
}

#[cfg(feature = "tracing")]
fn init_logging(quiet: bool) {
    use tracing_subscriber::EnvFilter;

    let default = if quiet { "warn" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}
