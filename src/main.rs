use anyhow::{Context, Result};
use clap::Parser;
use hostwatch::config::{load_config, HostwatchConfig};
use hostwatch::feed::{FeedProvider, FileFeed, LogMeInFeed};
use hostwatch::state::{Entity, Registry};
use hostwatch::watch::{event_channel, set_minimum_interval, Scheduler};
use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{info, warn};

const DEFAULT_CONFIG: &str = "hostwatch.toml";

/// Poll a LogMeIn host feed and print every change.
#[derive(Parser)]
#[command(name = "hostwatch", version, about = "LogMeIn host status watcher")]
struct Cli {
    /// Configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG)]
    config: PathBuf,
    /// Fetch once, print the hosts and exit
    #[arg(long)]
    once: bool,
    /// Read the feed from a saved document instead of HTTP
    #[arg(long)]
    file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hostwatch=info".into()),
        )
        .init();

    let cli = Cli::parse();

    // A missing default config file is fine; an explicit one must exist
    let mut config = if cli.config == PathBuf::from(DEFAULT_CONFIG) && !cli.config.exists() {
        let mut config = HostwatchConfig::default();
        config.apply_env();
        config
    } else {
        load_config(&cli.config)?
    };
    if let Some(file) = cli.file {
        config.feed.file = Some(file);
    }
    info!(config = ?config, "Configuration loaded");

    set_minimum_interval(config.watch.minimum_interval());

    let feed: Arc<dyn FeedProvider> = match &config.feed.file {
        Some(path) => Arc::new(FileFeed::new(path)),
        None => {
            if config.feed.profile_id == 0 || config.feed.key.is_empty() {
                anyhow::bail!(
                    "feed.profile_id and feed.key are required (or set HOSTWATCH_PROFILE_ID / HOSTWATCH_KEY)"
                );
            }
            Arc::new(LogMeInFeed::with_base_url(
                config.feed.profile_id,
                config.feed.key.clone(),
                config.feed.base_url.clone(),
                config.feed.request_timeout(),
            )?)
        }
    };
    info!(feed = feed.name(), "Feed provider initialized");

    let scheduler = Arc::new(
        Scheduler::new(feed, Arc::new(Registry::new()), config.watch.interval())
            .with_delivery(config.watch.delivery),
    );

    // Prime the registry so the first watch cycle only reports real changes
    let hosts = scheduler.fetch().await;
    let mut ids: Vec<u64> = hosts.keys().copied().collect();
    ids.sort_unstable();
    for id in ids {
        if let Some(entity) = hosts.get(&id) {
            info!(host_id = id, "FETCH {}", entity.name());
        }
    }

    if cli.once {
        return Ok(());
    }

    let server_handle = if config.api.enabled {
        let router = hostwatch::api::create_router(
            Arc::clone(&scheduler),
            config.api.admin_token.clone(),
        );
        let listener = tokio::net::TcpListener::bind(&config.api.bind)
            .await
            .with_context(|| format!("Failed to bind status API on {}", config.api.bind))?;
        info!(bind = %config.api.bind, "Status API listening");

        Some(tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!(error = %e, "Status API server error");
            }
        }))
    } else {
        None
    };

    let (events_tx, mut events_rx) = event_channel(config.watch.event_buffer);
    let (stop_tx, stop_rx) = oneshot::channel();
    let start_delayed = config.watch.start_delayed;

    let watcher = {
        let scheduler = Arc::clone(&scheduler);
        tokio::spawn(async move { scheduler.watch(events_tx, stop_rx, start_delayed).await })
    };

    let mut stop_tx = Some(stop_tx);
    loop {
        tokio::select! {
            event = events_rx.recv() => match event {
                Some(entity) => println!("{}", render_event(&entity)),
                None => break,
            },
            signal = tokio::signal::ctrl_c(), if stop_tx.is_some() => {
                if let Err(e) = signal {
                    warn!(error = %e, "Failed to listen for ctrl_c signal");
                }
                info!("Shutdown signal received");
                if let Some(stop) = stop_tx.take() {
                    let _ = stop.send(());
                }
            }
        }
    }

    watcher.await.context("Scheduler task panicked")??;
    if let Some(handle) = server_handle {
        handle.abort();
    }
    info!("hostwatch stopped");

    Ok(())
}

fn render_event(entity: &Entity) -> String {
    let view = entity.view();
    let current = &view.current;
    let previous = view.previous.as_ref();
    let show_address = |address: Option<IpAddr>| {
        address
            .map(|a| a.to_string())
            .unwrap_or_else(|| "-".to_string())
    };

    let mut lines = vec![format!(
        "{} {} {} {} {}",
        current.host_id,
        current.name,
        show_address(current.address),
        current.status,
        current.timestamp.to_rfc3339()
    )];

    let changes = view.changes;
    if changes.is_unchanged() {
        lines.push("Unchanged".to_string());
    }
    if changes.is_deleted() {
        lines.push("IsDeleted".to_string());
    }
    if changes.is_new() {
        lines.push("IsNew".to_string());
    }
    if changes.changed_host_id() {
        let old = previous.map(|p| p.host_id).unwrap_or_default();
        lines.push(format!("ChangedHostID [{} -> {}]", old, current.host_id));
    }
    if changes.changed_name() {
        let old = previous.map(|p| p.name.as_str()).unwrap_or_default();
        lines.push(format!("ChangedName [{} -> {}]", old, current.name));
    }
    if changes.changed_address() {
        lines.push(format!(
            "ChangedAddress [{} -> {}]",
            show_address(previous.and_then(|p| p.address)),
            show_address(current.address)
        ));
    }
    if changes.changed_status() {
        let old = previous.map(|p| p.status).unwrap_or_default();
        lines.push(format!("ChangedStatus [{} -> {}]", old, current.status));
    }

    lines.join("\n  • ")
}
