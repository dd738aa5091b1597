//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! Every section and every key is optional; missing values take the
//! defaults below.
//!
//! ```toml
//! [link]
//! environment = "sitl"        # or "deployment"
//! serial_port = "/dev/ttyUSB0"
//! baud_rate = 57600
//! sitl_host = "127.0.0.1"
//! sitl_port = 5760
//! stream_rate_hz = 30.0
//! settle_delay_ms = 500
//!
//! [recorder]
//! enabled = true
//! rate_hz = 10.0
//! log_dir = "logs/"
//! base_filename = "fc_telemetry_log.csv"
//!
//! [printer]
//! enabled = true
//! rate_hz = 1.0
//!
//! [logging]
//! level = "info"
//! # file = "logs/fc_telemetry.log"
//! ```

use chrono::{DateTime, Local};
use serde::de::Error;
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tokio::time::Duration;

use crate::error::{FcTelemetryError, Result};
use crate::telemetry::schedule::{tick_interval, MAX_RATE_HZ, MIN_RATE_HZ};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub link: LinkConfig,
    #[serde(default)]
    pub recorder: RecorderConfig,
    #[serde(default)]
    pub printer: PrinterConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where the flight controller is reached
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Software-in-the-loop simulator over TCP
    #[default]
    Sitl,
    /// Real flight controller over a serial port
    Deployment,
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Sitl => f.write_str("sitl"),
            Environment::Deployment => f.write_str("deployment"),
        }
    }
}

/// Flight controller link configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LinkConfig {
    #[serde(default)]
    pub environment: Environment,

    #[serde(default = "default_serial_port")]
    pub serial_port: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    #[serde(default = "default_sitl_host")]
    pub sitl_host: String,

    #[serde(default = "default_sitl_port")]
    pub sitl_port: u16,

    #[serde(default = "default_stream_rate_hz")]
    pub stream_rate_hz: f64,

    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
}

/// CSV recorder configuration
#[derive(Debug, Deserialize, Clone)]
pub struct RecorderConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default = "default_recorder_rate_hz")]
    pub rate_hz: f64,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    #[serde(default = "default_base_filename")]
    pub base_filename: String,
}

/// Diagnostic printer configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PrinterConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default = "default_printer_rate_hz")]
    pub rate_hz: f64,
}

/// Process logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Write logs to this file instead of stdout
    #[serde(default)]
    pub file: Option<String>,
}

// Default value functions
fn default_serial_port() -> String {
    "/dev/ttyUSB0".to_string()
}
fn default_baud_rate() -> u32 {
    57600
}
fn default_sitl_host() -> String {
    "127.0.0.1".to_string()
}
fn default_sitl_port() -> u16 {
    5760
}
fn default_stream_rate_hz() -> f64 {
    30.0
}
fn default_settle_delay_ms() -> u64 {
    500
}

fn default_enabled() -> bool {
    true
}
fn default_recorder_rate_hz() -> f64 {
    10.0
}
fn default_log_dir() -> String {
    "logs/".to_string()
}
fn default_base_filename() -> String {
    "fc_telemetry_log.csv".to_string()
}

fn default_printer_rate_hz() -> f64 {
    1.0
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            serial_port: default_serial_port(),
            baud_rate: default_baud_rate(),
            sitl_host: default_sitl_host(),
            sitl_port: default_sitl_port(),
            stream_rate_hz: default_stream_rate_hz(),
            settle_delay_ms: default_settle_delay_ms(),
        }
    }
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            rate_hz: default_recorder_rate_hz(),
            log_dir: default_log_dir(),
            base_filename: default_base_filename(),
        }
    }
}

impl Default for PrinterConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            rate_hz: default_printer_rate_hz(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl LinkConfig {
    /// MAVLink system address for the configured environment
    ///
    /// # Examples
    ///
    /// ```
    /// use fc_telemetry::config::LinkConfig;
    ///
    /// let link = LinkConfig::default();
    /// assert_eq!(link.system_address(), "tcp://127.0.0.1:5760");
    /// ```
    pub fn system_address(&self) -> String {
        match self.environment {
            Environment::Deployment => format!("serial://{}:{}", self.serial_port, self.baud_rate),
            Environment::Sitl => format!("tcp://{}:{}", self.sitl_host, self.sitl_port),
        }
    }

    /// Pause between rate negotiation and subscribing
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

impl RecorderConfig {
    /// Build a fresh log file path stamped with the current local time
    ///
    /// Creates `log_dir` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if `log_dir` cannot be created.
    pub fn log_file_path(&self) -> Result<PathBuf> {
        let dir = Path::new(&self.log_dir);
        fs::create_dir_all(dir)?;
        Ok(dir.join(log_file_name(&self.base_filename, Local::now())))
    }
}

/// `<stem>_<YYYY-mm-dd_HH-MM-SS><.ext>` for `base_filename`
fn log_file_name(base_filename: &str, now: DateTime<Local>) -> String {
    let base = Path::new(base_filename);
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = base
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    format!("{}_{}{}", stem, now.format("%Y-%m-%d_%H-%M-%S"), extension)
}

fn invalid(message: impl fmt::Display) -> FcTelemetryError {
    FcTelemetryError::Config(toml::de::Error::custom(message))
}

fn validate_rate(name: &str, rate_hz: f64) -> Result<()> {
    if tick_interval(rate_hz).is_err() {
        return Err(invalid(format!(
            "{} must be between {} and {} Hz",
            name, MIN_RATE_HZ, MAX_RATE_HZ
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use fc_telemetry::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        validate_rate("stream_rate_hz", self.link.stream_rate_hz)?;
        validate_rate("recorder rate_hz", self.recorder.rate_hz)?;
        validate_rate("printer rate_hz", self.printer.rate_hz)?;

        if self.link.environment == Environment::Deployment && self.link.serial_port.is_empty() {
            return Err(invalid("serial_port cannot be empty in deployment"));
        }

        if self.link.environment == Environment::Sitl && self.link.sitl_host.is_empty() {
            return Err(invalid("sitl_host cannot be empty in sitl"));
        }

        if self.link.settle_delay_ms > 10_000 {
            return Err(invalid("settle_delay_ms must be at most 10000"));
        }

        if self.recorder.enabled && self.recorder.log_dir.is_empty() {
            return Err(invalid("recorder log_dir cannot be empty when enabled"));
        }

        if self.recorder.enabled && Path::new(&self.recorder.base_filename).file_stem().is_none() {
            return Err(invalid("recorder base_filename must name a file when enabled"));
        }

        if self.logging.level.parse::<tracing::Level>().is_err() {
            return Err(invalid(format!(
                "logging level '{}' must be one of: trace, debug, info, warn, error",
                self.logging.level
            )));
        }

        Ok(())
    }
}
