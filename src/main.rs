mod config;
mod error;
mod github;
mod stats;

use anyhow::Context;
use clap::Parser;
use github::GithubClient;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Sum a GitHub user's commit contributions per repository across every year.
#[derive(Parser, Debug)]
#[command(name = "contrib-stats", version)]
struct Cli {
    /// GitHub login to collect contributions for
    username: String,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("contrib_stats=info"));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let cli = Cli::parse();

    let client = GithubClient::from_env()?;

    let stats = client
        .all_contributor_stats(&cli.username)
        .await
        .with_context(|| format!("failed to collect contributor stats for {}", cli.username))?;

    let json = if cli.pretty {
        serde_json::to_string_pretty(&stats)?
    } else {
        serde_json::to_string(&stats)?
    };
    println!("{json}");

    Ok(())
}
