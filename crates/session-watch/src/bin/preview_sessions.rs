//! Fetch the event's sessions once and print them, without diffing or
//! sending anything. Useful for checking credentials and the cursor filter.

use anyhow::{Context, Result};
use clap::Parser;
use session_types::{latest_modified, normalize, ModifiedTimestamp};
use std::path::PathBuf;

use session_watch::config::Config;
use session_watch::opus_client::OpusClient;

#[derive(Parser)]
#[command(name = "preview-sessions")]
#[command(about = "Fetch and print the current session list")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(
        short,
        long,
        default_value = "session-watch.toml",
        env = "SESSION_WATCH_CONFIG"
    )]
    config: PathBuf,

    /// Only fetch sessions modified after this time ("MM/DD/YYYY HH:mm:ss")
    #[arg(long)]
    since: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();
    session_watch::init_tracing();

    let config = Config::load(&cli.config)?;
    let since = cli
        .since
        .as_deref()
        .map(ModifiedTimestamp::parse_filter)
        .transpose()
        .context("--since must look like MM/DD/YYYY HH:mm:ss")?;

    let client = OpusClient::new(config.opus.clone(), config.request_timeout())?;
    let records = client
        .fetch_filtered(since.map(|ts| ts.filter_expression()))
        .await?;
    let fetched = records.len();
    let snapshot = normalize(records);

    println!("=== {} sessions ({} entries fetched) ===\n", snapshot.len(), fetched);
    for record in snapshot.records() {
        println!(
            "{:>8}  {:<12}  {}  [{}]  {}",
            record.session_id,
            record.session_status,
            record.session_start_date_time,
            record.room_name,
            record.session_name
        );
    }

    match latest_modified(snapshot.records()) {
        Ok(Some(cursor)) => println!("\nNext cursor: {}", cursor.filter_expression()),
        Ok(None) => println!("\nNo sessions, cursor unchanged"),
        Err(e) => println!("\nCursor could not be computed: {}", e),
    }

    Ok(())
}
