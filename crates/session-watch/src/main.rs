use anyhow::{bail, Result};
use clap::Parser;
use std::path::PathBuf;
use tokio::signal;

use session_watch::config::Config;
use session_watch::notifier::{LogNotifier, Notifier, SmtpNotifier};
use session_watch::opus_client::OpusClient;
use session_watch::poller::SessionPoller;
use session_watch::scheduler::PollingScheduler;

#[derive(Parser)]
#[command(name = "session-watch")]
#[command(about = "Poll Opus event sessions and email a summary of changes")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(
        short,
        long,
        default_value = "session-watch.toml",
        env = "SESSION_WATCH_CONFIG"
    )]
    config: PathBuf,

    /// Run a single poll cycle and exit
    #[arg(long)]
    once: bool,

    /// Log reports instead of emailing them
    #[arg(long)]
    dry_run: bool,

    /// Print an example configuration file and exit
    #[arg(long)]
    print_example_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.print_example_config {
        print!("{}", toml::to_string_pretty(&Config::example())?);
        return Ok(());
    }

    dotenvy::dotenv().ok();
    session_watch::init_tracing();

    tracing::info!("Starting session watch");

    let config = Config::load(&cli.config)?;
    let source = OpusClient::new(config.opus.clone(), config.request_timeout())?;

    if cli.dry_run {
        run(&cli, &config, source, LogNotifier).await
    } else {
        let notifier = SmtpNotifier::new(&config.smtp, &config.email, config.request_timeout())?;
        run(&cli, &config, source, notifier).await
    }
}

async fn run<N: Notifier>(cli: &Cli, config: &Config, source: OpusClient, notifier: N) -> Result<()> {
    let mut scheduler = PollingScheduler::new(
        SessionPoller::new(source, notifier),
        config.poll_interval(),
        config.failure_alert_threshold,
    );

    if cli.once {
        if !scheduler.tick().await {
            bail!("Poll cycle failed");
        }
        return Ok(());
    }

    tracing::info!("Session watch running. Press Ctrl+C to stop.");

    tokio::select! {
        _ = scheduler.run() => {}
        result = signal::ctrl_c() => {
            result?;
            tracing::info!("Shutdown signal received, stopping...");
        }
    }

    tracing::info!("Session watch stopped");
    Ok(())
}
