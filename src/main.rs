/// `asana` command-line client
///
/// - Settings come from config files, environment and flags (see `config`)
/// - Logs go to stderr, results to stdout
/// - `events poll` runs until Ctrl+C or SIGTERM
use clap::Parser;
use tracing_subscriber::EnvFilter;

use asana_cli::cli::Cli;
use asana_cli::commands;
use asana_cli::config::{CliOverrides, Settings};
use asana_cli::utils::logging::log_config_loaded;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is normal outside development
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match dotenv {
        Ok(path) => tracing::debug!("Loaded {}", path.display()),
        Err(_) => tracing::debug!("No .env file, using process environment"),
    }

    let overrides = CliOverrides {
        token: cli.token.clone(),
        base_url: cli.base_url.clone(),
    };
    let settings = Settings::new(&overrides)
        .map_err(|e| anyhow::anyhow!("failed to load settings: {}", e))?;
    log_config_loaded(&Settings::run_mode(), &settings.asana.base_url);

    commands::run(cli.command, &settings).await?;
    Ok(())
}

/// `RUST_LOG` wins; otherwise `warn`, or `debug` with `--verbose`
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
