mod auth;
mod cli;
mod date_range;
mod error;
mod insights;
mod providers;
mod report;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use log::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    info!("Starting deploy-metrics - GitHub Actions deployment metrics");
    cli.execute().await?;

    Ok(())
}

/// `RUST_LOG` wins; otherwise INFO, or DEBUG for this crate with `--verbose`.
fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "info,deploy_metrics=debug"
    } else {
        "info"
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .format_target(false)
        .init();
}
