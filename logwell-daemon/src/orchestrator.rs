//! Service orchestration -- configuration, startup, signal handling, shutdown.
//!
//! The [`Orchestrator`] turns a validated [`LogwellConfig`] into a running
//! [`SyslogService`], optionally installs the Prometheus recorder, waits for
//! SIGINT/SIGTERM and stops the service within its shutdown grace period.

use std::path::Path;
use std::time::Instant;

use anyhow::Result;

use logwell_collector::{CollectorConfig, ServiceState, SyslogService};
use logwell_core::config::LogwellConfig;
use logwell_core::types::HealthStatus;

use crate::metrics_server;

/// The daemon orchestrator.
pub struct Orchestrator {
    /// Loaded and validated configuration.
    config: LogwellConfig,
    /// The syslog collector service.
    service: SyslogService,
    /// Daemon start time (for uptime reporting).
    start_time: Instant,
}

impl Orchestrator {
    /// Load configuration (creating the file with defaults if missing) and build.
    pub async fn build(config_path: &Path) -> Result<Self> {
        let config = LogwellConfig::load_or_create(config_path)
            .await
            .map_err(|e| anyhow::anyhow!("failed to load config: {}", e))?;
        Self::build_from_config(config)
    }

    /// Build from an already-loaded configuration.
    ///
    /// Does not install the metrics recorder; see [`Orchestrator::run`].
    pub fn build_from_config(config: LogwellConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;

        let collector_config = CollectorConfig::from_core(&config.collector)
            .map_err(|e| anyhow::anyhow!("invalid collector config: {}", e))?;

        tracing::debug!(
            bind_addr = %collector_config.bind_addr,
            log_dir = %collector_config.log_dir.display(),
            "collector configured"
        );

        Ok(Self {
            config,
            service: SyslogService::new(collector_config),
            start_time: Instant::now(),
        })
    }

    /// Effective configuration.
    pub fn config(&self) -> &LogwellConfig {
        &self.config
    }

    /// Start the collector service.
    pub async fn start(&mut self) -> Result<()> {
        self.service
            .start()
            .await
            .map_err(|e| anyhow::anyhow!("failed to start syslog service: {}", e))?;

        if let Some(addr) = self.service.local_addr() {
            tracing::info!(listen_addr = %addr, "logwell-daemon accepting syslog datagrams");
        }
        Ok(())
    }

    /// Stop the collector service (raises cancellation, waits for the grace period).
    pub async fn shutdown(&mut self) -> Result<()> {
        if self.service.state() == ServiceState::Idle {
            return Ok(());
        }
        if let Err(e) = self.service.stop().await {
            tracing::warn!(error = %e, "syslog service was not running at shutdown");
        }

        tracing::info!(
            uptime_secs = self.start_time.elapsed().as_secs(),
            writers = self.service.writer_count().await,
            "logwell-daemon shut down"
        );
        Ok(())
    }

    /// Current health of the collector service.
    pub fn health(&self) -> HealthStatus {
        self.service.health_check()
    }

    /// Run until a shutdown signal arrives.
    ///
    /// Installs the metrics recorder when enabled, starts the service,
    /// waits for SIGTERM/SIGINT (ctrl-c on non-unix) and shuts down.
    pub async fn run(&mut self) -> Result<()> {
        if self.config.metrics.enabled {
            metrics_server::install_metrics_recorder(&self.config.metrics)?;
        }

        self.start().await?;

        let signal = wait_for_shutdown_signal().await?;
        tracing::info!(signal, "shutdown signal received");

        self.shutdown().await
    }
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() -> Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("failed to install SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("failed to install SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("failed to listen for ctrl-c: {}", e))?;
    Ok("ctrl-c")
}
