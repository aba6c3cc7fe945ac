//! Tripline command-line entry point

use anyhow::Context;
use clap::Parser;
use tripline_app::{commands, AppContext, Cli};
use tripline_infra::config::load_with_env;
use tripline_infra::init_logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before anything reads the environment
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse();

    let explicit = cli.config.as_ref().map(|path| path.display().to_string());
    let config = load_with_env(|key| match (key, &explicit) {
        ("TRIPLINE_CONFIG", Some(path)) => Some(path.clone()),
        _ => std::env::var(key).ok(),
    })
    .context("failed to load configuration")?;

    init_logging(&config.logging);
    match dotenv {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
        Err(err) => tracing::debug!(error = %err, "no .env file loaded"),
    }

    let mut ctx = AppContext::new(config).context("failed to initialise application context")?;
    let result = commands::execute(&ctx, &cli.command).await;
    ctx.shutdown().await;

    let output = result.context("command failed")?;
    let rendered = if cli.compact { serde_json::to_string(&output) } else { serde_json::to_string_pretty(&output) }
        .context("failed to render output")?;

    #[allow(clippy::print_stdout)]
    {
        println!("{rendered}");
    }
    Ok(())
}
