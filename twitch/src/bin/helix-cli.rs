use clap::{Args, Parser, Subcommand};
use eyre::Context;
use serde::Serialize;
use std::io::IsTerminal;
use std::time::Duration;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use twitch_helix::{Credentials, HelixClient, HelixConfig, RetryPolicy};

/// Look up Twitch users and live streams with an app access token.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    #[arg(long, env = "TWITCH_CLIENT_ID")]
    client_id: String,

    #[arg(long, env = "TWITCH_CLIENT_SECRET", hide_env_values = true)]
    client_secret: String,

    /// How often to retry a failed token request [default: 3].
    #[arg(long)]
    retries: Option<u32>,

    /// Milliseconds to wait between token request retries [default: 0].
    #[arg(long)]
    retry_delay_ms: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print a fresh app access token.
    Token,
    /// Look up users.
    Users(Keys),
    /// Look up live streams.
    Streams(Keys),
}

#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
struct Keys {
    /// Numeric user ids.
    #[arg(long, num_args = 1..)]
    id: Vec<String>,

    /// Login names.
    #[arg(long, num_args = 1..)]
    login: Vec<String>,
}

/// Overrides the library's default retry policy with whatever was given on the command line.
fn retry_policy(retries: Option<u32>, retry_delay_ms: Option<u64>) -> RetryPolicy {
    let default = RetryPolicy::default();
    RetryPolicy {
        max_retries: retries.unwrap_or(default.max_retries),
        delay: retry_delay_ms.map_or(default.delay, Duration::from_millis),
    }
}

fn print_json<T: Serialize>(records: &[T]) -> eyre::Result<()> {
    let json = serde_json::to_string_pretty(records).context("serialize records")?;
    println!("{json}");
    Ok(())
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .from_env_lossy(),
        )
        .with_ansi(std::io::stdout().is_terminal())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = HelixConfig::default().with_retry(retry_policy(cli.retries, cli.retry_delay_ms));
    let client = HelixClient::with_config(Credentials::new(cli.client_id, cli.client_secret), config)
        .context("set up Helix client")?;

    match cli.command {
        Command::Token => {
            let token = client.get_token().await.context("get app access token")?;
            println!("{token}");
        }
        Command::Users(Keys { id, login }) => {
            let users = if id.is_empty() {
                client.get_users_by_login(&login).await
            } else {
                client.get_users_by_id(&id).await
            }
            .context("look up users")?;
            print_json(&users)?;
        }
        Command::Streams(Keys { id, login }) => {
            let streams = if id.is_empty() {
                client.get_streams_by_login(&login).await
            } else {
                client.get_streams_by_id(&id).await
            }
            .context("look up streams")?;
            print_json(&streams)?;
        }
    }

    Ok(())
}
