//! # Periodic Recorder
//!
//! Samples the [`SnapshotStore`] at a fixed rate and appends one CSV row per
//! tick to a durable sink.
//!
//! ## Lifecycle
//!
//! 1. Open the sink. Failure here is fatal to the recorder and nothing is held.
//! 2. Write the header row once.
//! 3. On every tick: read a snapshot copy, render it, write it. A failed
//!    write drops that tick's row and the loop carries on.
//! 4. On stop: flush and close the sink exactly once.

use async_trait::async_trait;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use tokio::time::Duration;
use tracing::{debug, error, info, warn};

use super::format::header_record;
use super::schedule::{tick_interval, ticker, StopSignal};
use super::store::SnapshotStore;
use crate::error::{RecorderError, Result};

/// An open, append-only destination for records
#[async_trait]
pub trait RowSink: Send {
    /// Append one record
    async fn write_record(&mut self, record: &[String]) -> io::Result<()>;

    /// Flush and release the underlying resource
    async fn close(&mut self) -> io::Result<()>;
}

/// Something a [`RowSink`] can be opened on
#[async_trait]
pub trait SinkTarget: Send + Sync {
    type Sink: RowSink;

    /// Location shown in log messages
    fn path(&self) -> &Path;

    async fn open(&self) -> io::Result<Self::Sink>;
}

/// CSV file target, truncated on open
#[derive(Debug, Clone)]
pub struct CsvFile {
    path: PathBuf,
}

impl CsvFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// Open CSV file, flushed after every record
pub struct CsvFileSink {
    writer: csv::Writer<File>,
}

#[async_trait]
impl RowSink for CsvFileSink {
    async fn write_record(&mut self, record: &[String]) -> io::Result<()> {
        self.writer.write_record(record)?;
        self.writer.flush()
    }

    async fn close(&mut self) -> io::Result<()> {
        self.writer.flush()?;
        self.writer.get_ref().sync_all()
    }
}

#[async_trait]
impl SinkTarget for CsvFile {
    type Sink = CsvFileSink;

    fn path(&self) -> &Path {
        &self.path
    }

    async fn open(&self) -> io::Result<CsvFileSink> {
        let file = File::create(&self.path)?;
        let writer = csv::WriterBuilder::new()
            .has_headers(false)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(file);
        Ok(CsvFileSink { writer })
    }
}

/// Counters reported by a recorder that ran to a normal stop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecorderReport {
    /// Data rows appended (header excluded)
    pub rows_written: u64,
    /// Ticks whose row could not be appended
    pub rows_dropped: u64,
}

/// Periodic snapshot-to-CSV recorder
pub struct Recorder<T: SinkTarget> {
    store: SnapshotStore,
    target: T,
    period: Duration,
}

impl<T: SinkTarget> Recorder<T> {
    /// Create a recorder sampling at `rate_hz`
    ///
    /// # Errors
    ///
    /// Returns `InvalidRate` if the rate is not finite or out of range.
    pub fn new(store: SnapshotStore, target: T, rate_hz: f64) -> Result<Self> {
        Ok(Self {
            store,
            target,
            period: tick_interval(rate_hz)?,
        })
    }

    /// Record until `stop` is signalled
    ///
    /// # Errors
    ///
    /// - `SinkOpen` if the sink cannot be opened; nothing is held afterwards
    /// - `Header` if the header cannot be written; the sink is closed first
    pub async fn run(
        self,
        mut stop: StopSignal,
    ) -> std::result::Result<RecorderReport, RecorderError> {
        let path = self.target.path().to_path_buf();
        info!(
            "Starting telemetry logging to {} at {:.1} Hz",
            path.display(),
            1.0 / self.period.as_secs_f64()
        );

        let mut sink = match self.target.open().await {
            Ok(sink) => sink,
            Err(source) => {
                error!("Failed to open log file {}: {}", path.display(), source);
                return Err(RecorderError::SinkOpen { path, source });
            }
        };

        if let Err(source) = sink.write_record(&header_record()).await {
            error!("Failed to write header to {}: {}", path.display(), source);
            release(&mut sink, &path).await;
            return Err(RecorderError::Header { path, source });
        }

        let report = self.record(&mut sink, &mut stop).await;
        release(&mut sink, &path).await;
        info!(
            "Telemetry logging stopped: {} rows written, {} dropped",
            report.rows_written, report.rows_dropped
        );
        Ok(report)
    }

    async fn record(&self, sink: &mut T::Sink, stop: &mut StopSignal) -> RecorderReport {
        let mut report = RecorderReport::default();
        let mut ticker = ticker(self.period);

        loop {
            tokio::select! {
                biased;
                _ = stop.stopped() => break,
                _ = ticker.tick() => {}
            }

            let snapshot = self.store.read().await;
            match sink.write_record(&snapshot.to_record()).await {
                Ok(()) => report.rows_written += 1,
                Err(e) => {
                    error!("Error logging telemetry data: {}", e);
                    report.rows_dropped += 1;
                }
            }
        }

        debug!("Recorder loop exited after {} ticks", report.rows_written + report.rows_dropped);
        report
    }
}

async fn release<S: RowSink>(sink: &mut S, path: &Path) {
    match sink.close().await {
        Ok(()) => info!("Closed log file {}", path.display()),
        Err(e) => warn!("Error closing log file {}: {}", path.display(), e),
    }
}

#[cfg(test)]
pub mod mocks {
    use super::*;
    use crate::telemetry::schedule::StopHandle;
    use std::sync::{Arc, Mutex};

    /// Shared record of what happened to a mock sink
    #[derive(Debug, Default)]
    pub struct SinkLog {
        pub opens: usize,
        pub closes: usize,
        /// Every record successfully written, comma joined, header first
        pub lines: Vec<String>,
        /// Data row attempts, failed ones included
        pub row_attempts: usize,
    }

    /// Mock target with injectable faults
    #[derive(Clone, Default)]
    pub struct MockTarget {
        pub log: Arc<Mutex<SinkLog>>,
        pub fail_open: bool,
        pub fail_header: bool,
        /// 1-based data row attempts that fail
        pub fail_rows: Vec<usize>,
        /// Request stop after this many data row attempts
        pub stop_after: Option<(usize, Arc<StopHandle>)>,
    }

    pub struct MockSink {
        target: MockTarget,
        header_written: bool,
    }

    #[async_trait]
    impl RowSink for MockSink {
        async fn write_record(&mut self, record: &[String]) -> io::Result<()> {
            let line = record.join(",");
            let t = &self.target;
            let mut log = t.log.lock().unwrap();

            if !self.header_written {
                if t.fail_header {
                    return Err(io::Error::new(io::ErrorKind::Other, "Mock header error"));
                }
                self.header_written = true;
                log.lines.push(line);
                return Ok(());
            }

            log.row_attempts += 1;
            let attempt = log.row_attempts;
            if let Some((limit, handle)) = &t.stop_after {
                if attempt >= *limit {
                    handle.stop();
                }
            }
            if t.fail_rows.contains(&attempt) {
                return Err(io::Error::new(io::ErrorKind::Other, "Mock write error"));
            }
            log.lines.push(line);
            Ok(())
        }

        async fn close(&mut self) -> io::Result<()> {
            self.target.log.lock().unwrap().closes += 1;
            Ok(())
        }
    }

    #[async_trait]
    impl SinkTarget for MockTarget {
        type Sink = MockSink;

        fn path(&self) -> &Path {
            Path::new("mock.csv")
        }

        async fn open(&self) -> io::Result<MockSink> {
            if self.fail_open {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "Mock open error"));
            }
            self.log.lock().unwrap().opens += 1;
            Ok(MockSink { target: self.clone(), header_written: false })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mocks::*;
    use super::*;
    use crate::telemetry::format::FIELDS;

    fn header_line() -> String {
        header_record().join(",")
    }
    use crate::telemetry::schedule::stop_signal;
    use crate::telemetry::snapshot::{ActuatorFields, PositionFields};
    use std::sync::Arc;

    #[test]
    fn test_invalid_rate_rejected() {
        let result = Recorder::new(SnapshotStore::new(), MockTarget::default(), 0.0);
        assert!(result.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_records_one_row_per_tick() {
        let (handle, stop) = stop_signal();
        let target = MockTarget {
            stop_after: Some((5, Arc::new(handle))),
            ..MockTarget::default()
        };
        let log = target.log.clone();

        let recorder = Recorder::new(SnapshotStore::new(), target, 10.0).unwrap();
        let report = recorder.run(stop).await.unwrap();

        assert_eq!(report, RecorderReport { rows_written: 5, rows_dropped: 0 });
        let log = log.lock().unwrap();
        assert_eq!(log.lines.len(), 6);
        assert_eq!(log.lines[0], header_line());
        for row in &log.lines[1..] {
            assert_eq!(row.split(',').count(), FIELDS.len());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_faulted_tick_drops_only_its_row() {
        const TICKS: usize = 6;
        const FAULT_AT: usize = 3;

        let store = SnapshotStore::new();
        store.update(ActuatorFields { motor_out: 1500, ..ActuatorFields::default() }).await;

        let (handle, stop) = stop_signal();
        let target = MockTarget {
            fail_rows: vec![FAULT_AT],
            stop_after: Some((TICKS, Arc::new(handle))),
            ..MockTarget::default()
        };
        let log = target.log.clone();

        let report = Recorder::new(store, target, 20.0).unwrap().run(stop).await.unwrap();

        assert_eq!(report.rows_written, (TICKS - 1) as u64);
        assert_eq!(report.rows_dropped, 1);

        let log = log.lock().unwrap();
        assert_eq!(log.row_attempts, TICKS);
        assert_eq!(log.lines.len(), 1 + TICKS - 1);
        // The row after the fault is complete and well formed
        let after_fault = &log.lines[FAULT_AT];
        assert_eq!(after_fault.split(',').count(), FIELDS.len());
        assert!(after_fault.ends_with(",1500,0,0,0"));
        assert_eq!(log.closes, 1);
    }

    #[tokio::test]
    async fn test_open_failure_is_fatal_and_holds_nothing() {
        let (_handle, stop) = stop_signal();
        let target = MockTarget { fail_open: true, ..MockTarget::default() };
        let log = target.log.clone();

        let recorder = Recorder::new(SnapshotStore::new(), target, 10.0).unwrap();
        let err = recorder.run(stop).await.unwrap_err();

        assert!(matches!(err, RecorderError::SinkOpen { .. }));
        let log = log.lock().unwrap();
        assert_eq!(log.opens, 0);
        assert_eq!(log.closes, 0);
        assert!(log.lines.is_empty());
    }

    #[tokio::test]
    async fn test_header_failure_closes_sink() {
        let (_handle, stop) = stop_signal();
        let target = MockTarget { fail_header: true, ..MockTarget::default() };
        let log = target.log.clone();

        let recorder = Recorder::new(SnapshotStore::new(), target, 10.0).unwrap();
        let err = recorder.run(stop).await.unwrap_err();

        assert!(matches!(err, RecorderError::Header { .. }));
        let log = log.lock().unwrap();
        assert_eq!((log.opens, log.closes), (1, 1));
    }

    #[tokio::test]
    async fn test_stop_before_first_tick_closes_once() {
        let (handle, stop) = stop_signal();
        handle.stop();
        let target = MockTarget::default();
        let log = target.log.clone();

        let recorder = Recorder::new(SnapshotStore::new(), target, 10.0).unwrap();
        let report = recorder.run(stop).await.unwrap();

        assert_eq!(report, RecorderReport::default());
        let log = log.lock().unwrap();
        assert_eq!((log.opens, log.closes), (1, 1));
        assert_eq!(log.lines, vec![header_line()]);
    }

    #[tokio::test]
    async fn test_csv_file_at_ten_hz() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("telemetry.csv");

        let store = SnapshotStore::new();
        store
            .update(PositionFields {
                latitude_deg: 47.397742,
                longitude_deg: 8.545594,
                altitude_m_amsl: 488.0,
                altitude_m_rel: 0.0,
            })
            .await;

        let (handle, stop) = stop_signal();
        let recorder = Recorder::new(store, CsvFile::new(&path), 10.0).unwrap();
        let task = tokio::spawn(recorder.run(stop));

        tokio::time::sleep(Duration::from_millis(1050)).await;
        handle.stop();
        let report = task.await.unwrap().unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(!contents.contains('\r'));
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines[0], header_line());

        let rows = &lines[1..];
        assert!((10..=11).contains(&rows.len()), "expected 10 or 11 rows, got {}", rows.len());
        assert_eq!(rows.len() as u64, report.rows_written);

        let mut last_timestamp = f64::MIN;
        for row in rows {
            let (timestamp, values) = row.split_once(',').unwrap();
            assert_eq!(row.split(',').count(), FIELDS.len());
            assert_eq!(values, rows[0].split_once(',').unwrap().1);
            let timestamp: f64 = timestamp.parse().unwrap();
            assert!(timestamp > last_timestamp);
            last_timestamp = timestamp;
        }
        assert!(rows[0].contains(",47.39774200,8.54559400,488.00,0.00,"));
    }

    #[tokio::test]
    async fn test_csv_file_open_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("telemetry.csv");
        let (_handle, stop) = stop_signal();

        let result = Recorder::new(SnapshotStore::new(), CsvFile::new(&path), 10.0)
            .unwrap()
            .run(stop)
            .await;

        assert!(matches!(result, Err(RecorderError::SinkOpen { .. })));
        assert!(!path.exists());
    }
}
