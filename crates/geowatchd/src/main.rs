//! geowatchd - The geowatch monitoring service
//!
//! This is the main entry point for the geowatchd service.
//! It wires together all the components:
//! - Configuration loading (file, environment, CLI overrides)
//! - Position source (HTTP)
//! - Notifier (SMTP or log) behind the dispatch queue
//! - Poll scheduler
//! - Signal handling

use anyhow::{Context, Result};
use clap::Parser;
use geowatch_adapter_api::{Notifier, PositionSource};
use geowatch_adapters::{HttpPositionSource, LogNotifier, SmtpConfig, SmtpNotifier};
use geowatch_config::{ConfigOverrides, MonitorConfig, NotifierSettings, SmtpSettings, load_config_with};
use geowatch_core::{Dispatcher, PollScheduler, SchedulerConfig};
use geowatch_util::{default_config_path, format_duration};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal::unix::{Signal, SignalKind, signal};
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// geowatchd - Safety zone monitoring service
#[derive(Parser, Debug)]
#[command(name = "geowatchd")]
#[command(about = "Polls entity positions and alerts when they leave their safety zone", long_about = None)]
struct Args {
    /// Configuration file path (default: ~/.config/geowatch/config.toml)
    #[arg(short, long, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Position API base URL override (or set API_BASE_URL env var)
    #[arg(short, long, env = "API_BASE_URL")]
    base_url: Option<String>,

    /// Stop after this many seconds
    #[arg(short, long, value_name = "SECONDS", conflicts_with = "forever")]
    run_duration: Option<u64>,

    /// Run until stopped, ignoring any configured run duration
    #[arg(long)]
    forever: bool,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            base_url: self.base_url.clone(),
            run_duration_seconds: self.run_duration,
            run_forever: self.forever,
        }
    }
}

/// Main service state
struct Service {
    config: MonitorConfig,
    source: Arc<dyn PositionSource>,
    notifier: Arc<dyn Notifier>,
}

impl Service {
    fn new(args: &Args) -> Result<Self> {
        let config = load_config_with(&args.config, &args.overrides())
            .with_context(|| format!("Failed to load config from {:?}", args.config))?;

        let monitor = &config.monitor;
        info!(
            config_path = %args.config.display(),
            entities = monitor.entities.len(),
            poll_interval = %format_duration(monitor.poll_interval),
            run_duration = %monitor
                .run_duration
                .map(format_duration)
                .unwrap_or_else(|| "until stopped".into()),
            "Configuration loaded"
        );

        let source: Arc<dyn PositionSource> = Arc::new(
            HttpPositionSource::new(&config.source.base_url, monitor.fetch_timeout)
                .context("Failed to create position source")?,
        );
        info!(base_url = %config.source.base_url, "Position source ready");

        let notifier = build_notifier(&config.notifier)?;
        info!(notifier = notifier.name(), "Notifier ready");

        Ok(Self {
            config,
            source,
            notifier,
        })
    }

    async fn run(self) -> Result<()> {
        let monitor = &self.config.monitor;

        let dispatcher = Dispatcher::spawn(self.notifier.clone());
        let scheduler = PollScheduler::new(
            monitor.entities.clone(),
            SchedulerConfig {
                poll_interval: monitor.poll_interval,
                run_duration: monitor.run_duration,
                fetch_timeout: monitor.fetch_timeout,
                debounce: monitor.debounce,
            },
            self.source.clone(),
            dispatcher.handle(),
        )
        .context("Failed to create scheduler")?;

        // Set up signal handlers
        let sigterm = signal(SignalKind::terminate()).context("Failed to create SIGTERM handler")?;
        let sigint = signal(SignalKind::interrupt()).context("Failed to create SIGINT handler")?;
        let sighup = signal(SignalKind::hangup()).context("Failed to create SIGHUP handler")?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::spawn(forward_signals(sigterm, sigint, sighup, shutdown_tx));

        info!("Service running");
        let summary = scheduler.run(shutdown_rx).await;

        // Graceful shutdown
        info!(
            ticks = summary.ticks,
            notifications = summary.notifications_submitted,
            entities_outside = summary.entities_outside().count(),
            elapsed = %format_duration(summary.elapsed),
            reason = ?summary.stop_reason,
            "Shutting down geowatchd"
        );

        for status in &summary.entities {
            info!(
                entity_id = %status.entity_id,
                inside = status.inside,
                out_secs = status.out_for.map(|d| d.as_secs()),
                followup_sent = status.followup_alert_sent,
                observations = status.observations,
                "Final entity status"
            );
        }

        let stats = dispatcher.shutdown(monitor.drain_timeout).await;
        if stats.failed > 0 {
            warn!(failed = stats.failed, "Some notifications were not delivered");
        }

        info!(delivered = stats.delivered, "Shutdown complete");
        Ok(())
    }
}

fn build_notifier(settings: &NotifierSettings) -> Result<Arc<dyn Notifier>> {
    match settings {
        NotifierSettings::Log => Ok(Arc::new(LogNotifier::new())),
        NotifierSettings::Smtp(smtp) => {
            let config = smtp_config(smtp)?;
            let notifier = SmtpNotifier::new(&config).context("Failed to create SMTP notifier")?;
            Ok(Arc::new(notifier))
        }
    }
}

fn smtp_config(smtp: &SmtpSettings) -> Result<SmtpConfig> {
    let password = std::env::var(&smtp.password_env)
        .with_context(|| format!("SMTP password env var {} not set", smtp.password_env))?;

    Ok(SmtpConfig {
        host: smtp.host.clone(),
        port: smtp.port,
        username: smtp.username.clone(),
        password,
        sender: smtp.sender.clone(),
        recipient: smtp.recipient.clone(),
    })
}

/// Flip the shutdown flag on the first termination signal
async fn forward_signals(
    mut sigterm: Signal,
    mut sigint: Signal,
    mut sighup: Signal,
    shutdown_tx: watch::Sender<bool>,
) {
    tokio::select! {
        _ = sigterm.recv() => info!("Received SIGTERM, shutting down gracefully"),
        _ = sigint.recv() => info!("Received SIGINT, shutting down gracefully"),
        _ = sighup.recv() => info!("Received SIGHUP, shutting down gracefully"),
    }
    let _ = shutdown_tx.send(true);
}

#[tokio::main]
async fn main() -> Result<()> {
    // Pick up API_BASE_URL, SMTP_PASSWORD and friends from a local .env
    let dotenv_path = dotenv::dotenv().ok();

    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if args.log_json {
        builder.json().init();
    } else {
        builder.init();
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        dotenv = ?dotenv_path,
        "geowatchd starting"
    );

    let service = Service::new(&args)?;
    service.run().await
}
