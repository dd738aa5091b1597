//! # Periodic Printer
//!
//! Human-readable twin of the recorder: samples the store on its own cadence
//! and emits a multi-line report for operators watching the logs.

use std::io;
use tokio::time::Duration;
use tracing::{debug, error, info};

use super::schedule::{tick_interval, ticker, StopSignal};
use super::snapshot::Snapshot;
use super::store::SnapshotStore;
use crate::error::Result;

/// Destination for rendered reports
pub trait ReportSink: Send {
    fn emit(&mut self, report: &str) -> io::Result<()>;
}

/// Emits reports through `tracing` at info level
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReport;

impl ReportSink for LogReport {
    fn emit(&mut self, report: &str) -> io::Result<()> {
        info!("{}", report);
        Ok(())
    }
}

/// Render a snapshot for humans
///
/// # Examples
///
/// ```
/// use fc_telemetry::telemetry::printer::render_report;
/// use fc_telemetry::telemetry::snapshot::Snapshot;
///
/// let report = render_report(&Snapshot::new(12.5));
/// assert!(report.starts_with("\n=== Telemetry Data (t=12.50) ==="));
/// assert!(report.contains("Quaternion: w=1.000, x=0.000, y=0.000, z=0.000"));
/// ```
pub fn render_report(s: &Snapshot) -> String {
    let p = &s.position;
    let v = &s.velocity;
    let e = &s.euler;
    let q = &s.quaternion;
    let i = &s.inertial;
    let a = &s.actuators;

    [
        format!("\n=== Telemetry Data (t={:.2}) ===", s.timestamp_ms),
        format!(
            "Position: Lat={:.6}°, Lon={:.6}°, Alt={:.2}m",
            p.latitude_deg, p.longitude_deg, p.altitude_m_rel
        ),
        format!(
            "Velocity: N={:.2}, E={:.2}, D={:.2} m/s",
            v.velocity_north_mps, v.velocity_east_mps, v.velocity_down_mps
        ),
        format!(
            "Attitude: Roll={:.1}°, Pitch={:.1}°, Yaw={:.1}°",
            e.roll_deg, e.pitch_deg, e.yaw_deg
        ),
        format!("Quaternion: w={:.3}, x={:.3}, y={:.3}, z={:.3}", q.q_w, q.q_x, q.q_y, q.q_z),
        format!(
            "Acceleration: X={:.2}, Y={:.2}, Z={:.2} m/s²",
            i.accel_body_x_m_per_s2, i.accel_body_y_m_per_s2, i.accel_body_z_m_per_s2
        ),
        format!(
            "Angular Vel: X={:.3}, Y={:.3}, Z={:.3} rad/s",
            i.angular_vel_body_x_rad_ps, i.angular_vel_body_y_rad_ps, i.angular_vel_body_z_rad_ps
        ),
        format!("Motor: {} µs", a.motor_out),
        format!("Servos: [{}, {}, {}] µs", a.servo1_out, a.servo2_out, a.servo3_out),
    ]
    .join("\n")
}

/// Counters reported when the printer stops
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PrinterReport {
    pub samples_printed: u64,
    pub samples_dropped: u64,
}

/// Periodic diagnostic printer
pub struct Printer<W: ReportSink = LogReport> {
    store: SnapshotStore,
    sink: W,
    period: Duration,
}

impl Printer<LogReport> {
    /// Printer logging through `tracing` at `rate_hz`
    pub fn new(store: SnapshotStore, rate_hz: f64) -> Result<Self> {
        Self::with_sink(store, LogReport, rate_hz)
    }
}

impl<W: ReportSink> Printer<W> {
    pub fn with_sink(store: SnapshotStore, sink: W, rate_hz: f64) -> Result<Self> {
        Ok(Self {
            store,
            sink,
            period: tick_interval(rate_hz)?,
        })
    }

    /// Print until `stop` is signalled
    ///
    /// A report that cannot be emitted is logged and skipped.
    pub async fn run(mut self, mut stop: StopSignal) -> PrinterReport {
        info!(
            "Stream logging output enabled at {:.1} Hz",
            1.0 / self.period.as_secs_f64()
        );
        let mut report = PrinterReport::default();
        let mut ticker = ticker(self.period);

        loop {
            tokio::select! {
                biased;
                _ = stop.stopped() => break,
                _ = ticker.tick() => {}
            }

            let snapshot = self.store.read().await;
            match self.sink.emit(&render_report(&snapshot)) {
                Ok(()) => report.samples_printed += 1,
                Err(e) => {
                    error!("Error printing telemetry: {}", e);
                    report.samples_dropped += 1;
                }
            }
        }

        debug!("Printer stopped after {} samples", report.samples_printed);
        report
    }
}
