use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use rss_notify::config::StoreConfig;
use rss_notify::monitor::{Policy, PollCycle, Scheduler};
use rss_notify::store::{JsonFileBackend, SeenStore, StoreBackend};
use rss_notify::web::WebServer;
use rss_notify::{Config, KeywordFilter, RunMode, RssFetcher, StoreKind, WebhookNotifier};

/// Length of the webhook URL prefix shown in the startup banner.
const MASKED_URL_LEN: usize = 50;

#[derive(Parser, Debug)]
#[command(name = "rss-notify", version, about = "Forward new RSS items to a chat webhook")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Deliver the newest entry once and exit
    #[arg(long)]
    test: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check the feed on a schedule until stopped (default)
    Run,
    /// Serve the HTTP trigger endpoints
    Serve,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // A missing .env is fine
    let _ = dotenvy::dotenv();

    let mut config = match Config::load_with_env(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {}: {e}", cli.config.display());
            return ExitCode::FAILURE;
        }
    };
    if cli.test {
        config.monitor.mode = RunMode::Test;
    }

    if let Err(e) = rss_notify::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        rss_notify::logging::init_console_only(&config.logging.level);
    }

    if let Err(e) = config.validate() {
        error!("{e}");
        eprintln!("Error: {e}");
        return ExitCode::FAILURE;
    }

    log_banner(&config, cli.command.as_ref());

    let cycle = match build_cycle(&config).await {
        Ok(cycle) => Arc::new(cycle),
        Err(e) => {
            error!(error = %e, "Startup failed");
            return ExitCode::FAILURE;
        }
    };

    let outcome = match cli.command.unwrap_or(Command::Run) {
        Command::Run => run_process(&config, cycle).await,
        Command::Serve => serve(&config, cycle).await,
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Exited with error");
            ExitCode::FAILURE
        }
    }
}

fn log_banner(config: &Config, command: Option<&Command>) {
    info!("rss-notify {}", env!("CARGO_PKG_VERSION"));
    info!("Feed: {}", config.feed.url);
    info!("Webhook: {}", mask_url(&config.webhook.url));
    info!("Mode: {:?}", config.monitor.mode);
    info!("Store: {:?} at {}", config.store.backend, config.store.resolved_path());
    match command {
        Some(Command::Serve) => info!(
            "Serving triggers on {}:{}",
            config.web.host, config.web.port
        ),
        _ => info!(
            "Check interval: {} minute(s)",
            config.monitor.check_interval_minutes
        ),
    }
    if !config.monitor.keywords.is_empty() {
        info!("Keywords: {}", config.monitor.keywords.join(", "));
    }
}

fn mask_url(url: &str) -> String {
    if url.chars().count() > MASKED_URL_LEN {
        let prefix: String = url.chars().take(MASKED_URL_LEN).collect();
        format!("{prefix}...")
    } else {
        url.to_string()
    }
}

async fn open_backend(config: &StoreConfig) -> rss_notify::Result<Arc<dyn StoreBackend>> {
    match config.backend {
        StoreKind::File => Ok(Arc::new(JsonFileBackend::new(config.resolved_path()))),
        #[cfg(feature = "sqlite")]
        StoreKind::Sqlite => Ok(Arc::new(
            rss_notify::SqliteKvBackend::open(config.resolved_path()).await?,
        )),
        #[cfg(not(feature = "sqlite"))]
        StoreKind::Sqlite => Err(rss_notify::RelayError::Config(
            "sqlite store requested but the sqlite feature is disabled".to_string(),
        )),
    }
}

async fn build_cycle(config: &Config) -> rss_notify::Result<PollCycle> {
    let backend = open_backend(&config.store).await?;
    let store = Arc::new(SeenStore::with_capacity(backend, config.store.capacity));
    store.init().await?;

    let stats = store.stats().await;
    info!(total = stats.total, "Loaded seen-item store");

    let feed = Arc::new(RssFetcher::new(&config.feed)?);
    let notifier = Arc::new(WebhookNotifier::new(&config.webhook)?);

    Ok(PollCycle::new(feed, store, notifier)
        .with_filter(KeywordFilter::new(&config.monitor.keywords))
        .with_courtesy_delay(config.monitor.courtesy_delay()))
}

async fn run_process(config: &Config, cycle: Arc<PollCycle>) -> rss_notify::Result<()> {
    if config.monitor.mode == RunMode::Test {
        info!("Test mode: sending the newest entry");
        return match cycle.send_latest().await? {
            Some(delivery) if delivery.delivered => {
                info!("Test notification sent");
                Ok(())
            }
            Some(_) => Err(rss_notify::RelayError::Delivery(
                "test notification was rejected".to_string(),
            )),
            None => {
                warn!("Feed has no entries, nothing sent");
                Ok(())
            }
        };
    }

    let scheduler = Scheduler::start(cycle, Policy::FullWindow, config.monitor.check_interval());
    info!("Monitoring started, press Ctrl+C to stop");

    shutdown_signal().await;
    info!("Stopping monitor");
    scheduler.stop();
    scheduler.join().await;
    Ok(())
}

async fn serve(config: &Config, cycle: Arc<PollCycle>) -> rss_notify::Result<()> {
    let server = WebServer::new(&config.web, cycle)?;
    server.run_until(shutdown_signal()).await?;
    Ok(())
}

/// Resolves on SIGINT, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
