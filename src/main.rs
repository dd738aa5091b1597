//! # FC Telemetry
//!
//! Aggregate flight controller telemetry into a timestamped CSV log.
//!
//! This application subscribes to every telemetry channel of the flight
//! controller, keeps the latest value of each field, and samples that
//! snapshot into a CSV file and a periodic console report.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use fc_telemetry::config::{Config, Environment, LoggingConfig};
use fc_telemetry::link::sim::SimulatedVehicle;
use fc_telemetry::session::run_session;

/// Main entry point for FC Telemetry application
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Load configuration from the path given as first argument, or defaults
///    - Set up logging with tracing subscriber
///    - Connect to the vehicle for the configured environment
///
/// 2. **Main Loop**
///    - Negotiate stream rates, then ingest all six channels
///    - Record CSV rows and print reports on their own cadences
///    - Handle Ctrl+C for graceful shutdown
///
/// 3. **Graceful Shutdown**
///    - Signal every task to stop
///    - Wait for ingestors, recorder and printer
///    - Log what each one did
///
/// Recording and printing carry on after the telemetry streams end; only
/// Ctrl+C or a failed rate negotiation stops them.
///
/// # Errors
///
/// Returns error if:
/// - The configuration file cannot be loaded
/// - The log directory cannot be created
/// - Stream rate negotiation fails
///
/// # Examples
///
/// ```bash
/// cargo run --release -- config/default.toml
/// ```
///
/// Expected output:
/// ```text
/// INFO fc_telemetry: FC Telemetry v0.1.0 starting...
/// INFO fc_telemetry: Connecting to flight controller at tcp://127.0.0.1:5760
/// INFO fc_telemetry::telemetry::collector: Setting telemetry stream rates to 30.0 Hz
/// INFO fc_telemetry::telemetry::recorder: Starting telemetry logging to logs/...csv at 10.0 Hz
/// ```
#[tokio::main]
async fn main() -> Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => Config::load(&path)
            .with_context(|| format!("Failed to load configuration from {}", path))?,
        None => Config::default(),
    };

    let _log_guard = init_logging(&config.logging)?;

    info!("FC Telemetry v{} starting...", env!("CARGO_PKG_VERSION"));
    info!("Environment: {}", config.link.environment);
    info!("Connecting to flight controller at {}", config.link.system_address());

    let vehicle = Arc::new(vehicle_for(config.link.environment));
    info!("Press Ctrl+C to exit");

    let shutdown = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down..."),
            Err(e) => error!("Unable to listen for Ctrl+C, shutting down: {}", e),
        }
    };
    let report = run_session(&config, vehicle, shutdown).await?;

    let failed = report.ingestors.iter().filter(|o| o.is_err()).count();
    info!(
        "{} telemetry streams ended ({} failed)",
        report.ingestors.len(),
        failed
    );

    match report.recorder {
        Some(Ok(recorder)) => info!(
            "Recorder wrote {} rows ({} dropped)",
            recorder.rows_written, recorder.rows_dropped
        ),
        Some(Err(e)) => error!("Recorder failed: {}", e),
        None => {}
    }

    if let Some(printer) = report.printer {
        info!("Printer emitted {} reports", printer.samples_printed);
    }

    Ok(())
}

/// Install the global tracing subscriber
///
/// `RUST_LOG` takes precedence over the configured level. The returned guard
/// must be held until exit so buffered file logs are flushed.
fn init_logging(logging: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.level.to_lowercase()));

    let Some(file) = &logging.file else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
        return Ok(None);
    };

    let Some((dir, name)) = log_file_parts(file) else {
        bail!("Logging file '{}' does not name a file", file);
    };
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

    let appender = tracing_appender::rolling::never(dir, name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Ok(Some(guard))
}

/// Split a log file path into directory and file name
fn log_file_parts(file: &str) -> Option<(PathBuf, PathBuf)> {
    let path = Path::new(file);
    let name = path.file_name()?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Some((dir, PathBuf::from(name)))
}

/// Vehicle for the configured environment
///
/// SITL autopilots refuse an actuator output rate, so the simulated vehicle
/// does the same there.
fn vehicle_for(environment: Environment) -> SimulatedVehicle {
    match environment {
        Environment::Sitl => SimulatedVehicle::new().without_actuator_rate(),
        Environment::Deployment => SimulatedVehicle::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fc_telemetry::link::{Channel, TelemetrySource};

    #[test]
    fn test_log_file_parts() {
        assert_eq!(
            log_file_parts("logs/fc_telemetry.log"),
            Some((PathBuf::from("logs"), PathBuf::from("fc_telemetry.log")))
        );
        assert_eq!(
            log_file_parts("fc_telemetry.log"),
            Some((PathBuf::from("."), PathBuf::from("fc_telemetry.log")))
        );
        assert_eq!(log_file_parts(""), None);
        assert_eq!(log_file_parts("/"), None);
    }

    #[tokio::test]
    async fn test_sitl_vehicle_refuses_actuator_rate() {
        let sitl = vehicle_for(Environment::Sitl);
        assert!(sitl.set_rate(Channel::ActuatorOutput, 30.0).await.is_err());
        assert!(sitl.set_rate(Channel::Position, 30.0).await.is_ok());

        let deployment = vehicle_for(Environment::Deployment);
        assert!(deployment.set_rate(Channel::ActuatorOutput, 30.0).await.is_ok());
    }
}
