//! CLI argument definitions for logwell-daemon.
//!
//! Uses `clap` v4 derive macros to parse command-line arguments.

use std::path::PathBuf;

use clap::Parser;
use logwell_core::config::LogwellConfig;
use logwell_core::error::LogwellError;

/// logwell UDP syslog collector daemon.
///
/// Receives syslog datagrams and writes them to one rotating log file
/// per sender and day.
#[derive(Parser, Debug)]
#[command(name = "logwell-daemon")]
#[command(version, about, long_about = None)]
pub struct DaemonCli {
    /// Path to logwell.toml configuration file.
    ///
    /// Created with default values if it does not exist (except with `--validate`).
    #[arg(short, long, default_value = "logwell.toml")]
    pub config: PathBuf,

    /// Override the UDP listen port.
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Override the log directory (relative paths are resolved against the executable).
    #[arg(long)]
    pub log_dir: Option<String>,

    /// Override log level (trace, debug, info, warn, error).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_format: Option<String>,

    /// Validate configuration, print the effective config and exit.
    #[arg(long)]
    pub validate: bool,
}

impl DaemonCli {
    /// Build the effective configuration: file, then env, then CLI flags, then validation.
    ///
    /// With `--validate` a missing file is an error instead of being created.
    pub async fn load_config(&self) -> Result<LogwellConfig, LogwellError> {
        if !self.validate {
            LogwellConfig::create_if_missing(&self.config).await?;
        }
        let mut config = LogwellConfig::load_unvalidated(&self.config).await?;
        self.apply_overrides(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Apply command-line overrides on top of the loaded configuration.
    pub fn apply_overrides(&self, config: &mut LogwellConfig) {
        if let Some(port) = self.port {
            config.collector.port = port;
        }
        if let Some(dir) = &self.log_dir {
            config.collector.log_directory.clone_from(dir);
        }
        if let Some(level) = &self.log_level {
            config.general.log_level.clone_from(level);
        }
        if let Some(format) = &self.log_format {
            config.general.log_format.clone_from(format);
        }
    }
}
