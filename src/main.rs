//! APC Looper GW
//!
//! Gateway to drive SooperLooper loops from an Akai APC Key 25 mk2.

use anyhow::Result;
use clap::Parser;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use apc_looper_gw::apc::{discovery, ApcDriver};
use apc_looper_gw::config::{AppConfig, ConfigWatcher};
use apc_looper_gw::looper::LooperLink;
use apc_looper_gw::router::{Outbound, Router};

/// Upper bound between surface reconnect attempts
const MAX_RECONNECT_DELAY: Duration = Duration::from_secs(10);

/// APC Looper Gateway - play SooperLooper from an Akai APC Key 25 mk2
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// List available MIDI ports
    #[arg(long)]
    list_ports: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_logging(&args.log_level)?;

    if args.list_ports {
        discovery::print_ports();
        return Ok(());
    }

    info!("Starting APC Looper GW...");
    info!("Configuration file: {}", args.config);

    // hot reload only when there is a file to watch
    let (watcher, config) = if Path::new(&args.config).exists() {
        let (watcher, config) = ConfigWatcher::new(args.config.clone()).await?;
        info!("Configuration loaded with hot-reload enabled");
        (Some(watcher), config)
    } else {
        (None, AppConfig::load_or_default(&args.config).await?)
    };

    run_app(config, watcher, shutdown_signal()).await?;

    info!("APC Looper GW shutdown complete");
    Ok(())
}

async fn run_app(
    config: AppConfig,
    mut config_watcher: Option<ConfigWatcher>,
    shutdown: impl std::future::Future<Output = ()>,
) -> Result<()> {
    let mut link = LooperLink::bind(
        config.looper.local_port,
        (&config.looper.host, config.looper.port),
        (&config.looper.sessions_host, config.looper.sessions_port),
    )
    .await?;

    let mut apc = ApcDriver::new(&config.midi);
    let mut apc_rx = apc
        .take_event_receiver()
        .ok_or_else(|| anyhow::anyhow!("Failed to get APC event receiver"))?;
    if let Err(e) = apc.connect() {
        warn!("APC not available yet: {:#}", e);
    }

    let mut router = Router::new(&config);
    router.start(Instant::now());
    drain(&mut router, &mut apc, &link).await;

    let mut reconnect_delay = Duration::from_secs(1);
    let mut next_reconnect = tokio::time::Instant::now() + reconnect_delay;

    info!("Ready");
    tokio::pin!(shutdown);

    loop {
        let timer_deadline = router
            .next_deadline()
            .map(tokio::time::Instant::from_std)
            .unwrap_or_else(|| tokio::time::Instant::now() + Duration::from_secs(3600));

        tokio::select! {
            Some(event) = apc_rx.recv() => {
                router.on_surface_midi(&event.raw_data, event.timestamp);
            }

            received = link.recv() => match received {
                Ok(results) => {
                    for result in results {
                        router.on_feedback_result(result);
                    }
                }
                Err(e) => warn!("Looper receive failed: {:#}", e),
            },

            _ = tokio::time::sleep_until(timer_deadline) => {
                router.poll_timers(Instant::now());
            }

            _ = tokio::time::sleep_until(next_reconnect), if !apc.is_connected() => {
                match apc.connect() {
                    Ok(()) => {
                        reconnect_delay = Duration::from_secs(1);
                        router.surface_reconnected();
                    }
                    Err(e) => {
                        debug!("APC reconnect failed: {:#}", e);
                        reconnect_delay = (reconnect_delay * 2).min(MAX_RECONNECT_DELAY);
                    }
                }
                next_reconnect = tokio::time::Instant::now() + reconnect_delay;
            }

            Some(new_config) = next_config(&mut config_watcher) => {
                info!("Configuration file changed, applying surface settings");
                if new_config.midi != config.midi || new_config.looper != config.looper {
                    warn!("MIDI and looper endpoint changes need a restart");
                }
                router.apply_surface_config(new_config.surface);
            }

            _ = &mut shutdown => {
                info!("Shutdown signal received, stopping event loop");
                break;
            }
        }

        drain(&mut router, &mut apc, &link).await;
    }

    info!("Shutting down...");
    apc.disconnect();
    Ok(())
}

/// Deliver everything the router queued
async fn drain(router: &mut Router, apc: &mut ApcDriver, link: &LooperLink) {
    for outbound in router.take_outbound() {
        match outbound {
            Outbound::Leds(cells) => {
                if !apc.is_connected() {
                    continue;
                }
                if let Err(e) = apc.send_cells(&cells) {
                    warn!("Failed to update pads: {:#}", e);
                }
            }
            Outbound::Remote(command) => {
                if let Err(e) = link.send(&command).await {
                    warn!("{:#}", e);
                }
            }
        }
    }
}

async fn next_config(watcher: &mut Option<ConfigWatcher>) -> Option<AppConfig> {
    match watcher {
        Some(watcher) => watcher.next_config().await,
        None => std::future::pending().await,
    }
}

fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false),
        )
        .init();

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for CTRL+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
