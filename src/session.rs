//! # Telemetry Session
//!
//! Wires a [`Collector`], the [`Recorder`] and the [`Printer`] together for
//! one run of the application.
//!
//! The recorder and printer sample until shutdown is requested, even after
//! every telemetry stream has ended; the snapshot then simply stops
//! changing. Only a failed rate negotiation ends the session early.

use std::future::Future;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::{RecorderError, Result};
use crate::link::TelemetrySource;
use crate::telemetry::collector::Collector;
use crate::telemetry::ingest::IngestOutcome;
use crate::telemetry::printer::{Printer, PrinterReport};
use crate::telemetry::recorder::{CsvFile, Recorder, RecorderReport};
use crate::telemetry::schedule::stop_signal;

/// What every task of a finished session did
#[derive(Debug)]
pub struct SessionReport {
    /// One outcome per ingestor
    pub ingestors: Vec<IngestOutcome>,
    /// `None` when recording is disabled
    pub recorder: Option<std::result::Result<RecorderReport, RecorderError>>,
    /// `None` when printing is disabled
    pub printer: Option<PrinterReport>,
}

/// Run ingestion, recording and printing until `shutdown` resolves
///
/// # Errors
///
/// Returns error if:
/// - The log directory cannot be created
/// - A configured rate is invalid
/// - Stream rate negotiation fails (`FcTelemetryError::Link`)
/// - A task panics
pub async fn run_session<S, F>(
    config: &Config,
    source: Arc<S>,
    shutdown: F,
) -> Result<SessionReport>
where
    S: TelemetrySource + 'static,
    F: Future<Output = ()>,
{
    let collector = Collector::new(source);
    let (stop_handle, stop) = stop_signal();

    let recorder = if config.recorder.enabled {
        let path = config.recorder.log_file_path()?;
        let target = CsvFile::new(path);
        let recorder = Recorder::new(collector.store(), target, config.recorder.rate_hz)?;
        Some(tokio::spawn(recorder.run(stop.clone())))
    } else {
        info!("CSV recording disabled");
        None
    };

    let printer = if config.printer.enabled {
        let printer = Printer::new(collector.store(), config.printer.rate_hz)?;
        Some(tokio::spawn(printer.run(stop.clone())))
    } else {
        None
    };

    let mut streams = tokio::spawn({
        let collector = collector.clone();
        let link = config.link.clone();
        let stop = stop.clone();
        async move { collector.run_streams(&link, stop).await }
    });

    tokio::pin!(shutdown);
    let finished_early = tokio::select! {
        _ = &mut shutdown => None,
        joined = &mut streams => Some(joined?),
    };

    if let Some(Ok(outcomes)) = &finished_early {
        let failed = outcomes.iter().filter(|o| o.is_err()).count();
        warn!(
            "All {} telemetry streams ended ({} failed); sampling last known values",
            outcomes.len(),
            failed
        );
        shutdown.await;
    }

    stop_handle.stop();
    let streams_result = match finished_early {
        Some(result) => result,
        None => streams.await?,
    };

    let recorder = match recorder {
        Some(task) => Some(task.await?),
        None => None,
    };
    let printer = match printer {
        Some(task) => Some(task.await?),
        None => None,
    };

    match streams_result {
        Ok(ingestors) => {
            info!("Session ended with {} telemetry streams", ingestors.len());
            Ok(SessionReport {
                ingestors,
                recorder,
                printer,
            })
        }
        Err(e) => {
            error!("Telemetry streams did not start: {}", e);
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FcTelemetryError, LinkError};
    use crate::link::mocks::{scripted, ScriptedSource};
    use crate::link::types::*;
    use crate::link::MockTelemetrySource;
    use crate::telemetry::ingest::IngestExit;
    use tokio::time::{sleep, Duration};

    fn config_in(dir: &std::path::Path) -> Config {
        let mut config = Config::default();
        config.recorder.log_dir = dir.to_string_lossy().into_owned();
        config.link.settle_delay_ms = 0;
        config.printer.enabled = false;
        config
    }

    fn recorded_rows(dir: &std::path::Path) -> Vec<String> {
        let entries: Vec<_> = std::fs::read_dir(dir).unwrap().collect();
        assert_eq!(entries.len(), 1);
        let path = entries.into_iter().next().unwrap().unwrap().path();
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .skip(1)
            .map(str::to_string)
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_recording_continues_after_streams_end() {
        let dir = tempfile::tempdir().unwrap();
        let source = ScriptedSource {
            position: scripted(vec![Ok(PositionFix::default())]),
            velocity: scripted(vec![]),
            euler: scripted(vec![]),
            quaternion: scripted(vec![]),
            imu: scripted(vec![Err(LinkError::Decode("bad frame".to_string()))]),
            actuator: scripted(vec![Ok(ActuatorOutputStatus {
                active: 11,
                actuator: vec![1500.0; 11],
            })]),
        };

        let report = run_session(
            &config_in(dir.path()),
            Arc::new(source),
            sleep(Duration::from_secs(2)),
        )
        .await
        .unwrap();

        assert_eq!(report.ingestors.len(), 6);
        assert_eq!(report.ingestors.iter().filter(|o| o.is_err()).count(), 1);
        assert!(report
            .ingestors
            .iter()
            .filter_map(|o| o.as_ref().ok())
            .all(|r| r.exit == IngestExit::Exhausted));

        // Ticks at 0, 100, ... 1900 ms at least
        let recorder = report.recorder.unwrap().unwrap();
        assert!(recorder.rows_written >= 20);

        let rows = recorded_rows(dir.path());
        assert_eq!(rows.len() as u64, recorder.rows_written);
        assert!(rows.last().unwrap().ends_with(",1500,1500,1500,1500"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_running_streams() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());
        config.printer.enabled = true;

        let report = run_session(
            &config,
            Arc::new(ScriptedSource::default()),
            sleep(Duration::from_millis(2500)),
        )
        .await
        .unwrap();

        assert_eq!(report.ingestors.len(), 6);
        assert!(report
            .ingestors
            .iter()
            .all(|o| matches!(o, Ok(r) if r.exit == IngestExit::Stopped)));
        assert!(report.printer.unwrap().samples_printed >= 2);
        assert!(report.recorder.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_rate_negotiation_failure_ends_session() {
        let dir = tempfile::tempdir().unwrap();
        let mut mock = MockTelemetrySource::new();
        mock.expect_set_rate()
            .returning(|_, _| Err(LinkError::Transport("no heartbeat".to_string())));
        mock.expect_position().never();

        let result = run_session(
            &config_in(dir.path()),
            Arc::new(mock),
            std::future::pending(),
        )
        .await;

        assert!(matches!(
            result,
            Err(FcTelemetryError::Link(LinkError::Transport(_)))
        ));
    }

    #[tokio::test]
    async fn test_invalid_recorder_rate_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());
        config.recorder.rate_hz = 1e-20;

        let result = run_session(
            &config,
            Arc::new(ScriptedSource::default()),
            std::future::ready(()),
        )
        .await;

        assert!(matches!(result, Err(FcTelemetryError::InvalidRate(_))));
    }
}
