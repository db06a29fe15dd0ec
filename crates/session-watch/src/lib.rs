//! Polls the Opus session API, diffs each fetch against the last known
//! snapshot and emails a summary of what changed.

pub mod config;
pub mod error;
pub mod notifier;
pub mod opus_client;
pub mod poller;
pub mod scheduler;

/// Install the fmt subscriber used by every binary in this crate
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "session_watch=info,session_types=info,preview_sessions=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
