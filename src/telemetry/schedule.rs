//! # Task Scheduling
//!
//! Cooperative stop signalling and tick intervals shared by the ingestors,
//! the recorder and the printer.
//!
//! A task observes the stop signal only at its suspension points (waiting for
//! the next record or the next tick). Work already in progress, such as a row
//! being written, always completes first.

use tokio::sync::watch;
use tokio::time::{interval, Duration, Interval, MissedTickBehavior};

use crate::error::{FcTelemetryError, Result};

/// Highest accepted sample rate
pub const MAX_RATE_HZ: f64 = 1000.0;

/// Lowest accepted sample rate, one sample every 1000 s
pub const MIN_RATE_HZ: f64 = 0.001;

/// Sending half of the stop signal
#[derive(Debug)]
pub struct StopHandle {
    tx: watch::Sender<bool>,
}

/// Receiving half of the stop signal, cloned into every task
#[derive(Debug, Clone)]
pub struct StopSignal {
    rx: watch::Receiver<bool>,
}

/// Create a connected stop handle and signal
///
/// # Examples
///
/// ```
/// use fc_telemetry::telemetry::schedule::stop_signal;
///
/// let (handle, signal) = stop_signal();
/// assert!(!signal.is_stopped());
/// handle.stop();
/// assert!(signal.is_stopped());
/// ```
pub fn stop_signal() -> (StopHandle, StopSignal) {
    let (tx, rx) = watch::channel(false);
    (StopHandle { tx }, StopSignal { rx })
}

impl StopHandle {
    /// Ask every task holding a matching [`StopSignal`] to stop
    pub fn stop(&self) {
        self.tx.send_replace(true);
    }

    /// A new signal connected to this handle
    pub fn signal(&self) -> StopSignal {
        StopSignal { rx: self.tx.subscribe() }
    }
}

impl StopSignal {
    /// Whether stop has been requested
    pub fn is_stopped(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once stop has been requested
    ///
    /// If the handle is dropped without requesting stop this never resolves.
    pub async fn stopped(&mut self) {
        if self.rx.wait_for(|stopped| *stopped).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Tick period for a sample rate in Hz
///
/// # Errors
///
/// Returns `InvalidRate` unless the rate lies in
/// [`MIN_RATE_HZ`]..=[`MAX_RATE_HZ`] and yields a non-zero period.
pub fn tick_interval(rate_hz: f64) -> Result<Duration> {
    if !(MIN_RATE_HZ..=MAX_RATE_HZ).contains(&rate_hz) {
        return Err(FcTelemetryError::InvalidRate(rate_hz));
    }
    match Duration::try_from_secs_f64(1.0 / rate_hz) {
        Ok(period) if !period.is_zero() => Ok(period),
        _ => Err(FcTelemetryError::InvalidRate(rate_hz)),
    }
}

/// Ticker whose first tick completes immediately
///
/// Ticks missed while a slow sink is being written are skipped so the
/// cadence stays on its grid.
pub fn ticker(period: Duration) -> Interval {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_interval() {
        assert_eq!(tick_interval(10.0).unwrap(), Duration::from_millis(100));
        assert_eq!(tick_interval(1.0).unwrap(), Duration::from_secs(1));
        assert_eq!(tick_interval(MAX_RATE_HZ).unwrap(), Duration::from_millis(1));
        assert_eq!(tick_interval(MIN_RATE_HZ).unwrap(), Duration::from_secs(1000));
    }

    #[test]
    fn test_tick_interval_rejects_bad_rates() {
        let rates = [
            0.0,
            -1.0,
            1e-20,
            1e12,
            f64::MIN_POSITIVE,
            f64::NAN,
            f64::INFINITY,
            MAX_RATE_HZ + 1.0,
        ];
        for rate in rates {
            assert!(
                matches!(tick_interval(rate), Err(FcTelemetryError::InvalidRate(_))),
                "rate {} should be rejected",
                rate
            );
        }
    }

    #[tokio::test]
    async fn test_stopped_resolves_after_stop() {
        let (handle, mut signal) = stop_signal();
        let mut other = handle.signal();

        let waiter = tokio::spawn(async move {
            signal.stopped().await;
        });
        handle.stop();

        tokio_test::assert_ok!(waiter.await);
        other.stopped().await;
        assert!(other.is_stopped());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_handle_never_stops() {
        let (handle, mut signal) = stop_signal();
        drop(handle);

        let result = tokio::time::timeout(Duration::from_secs(5), signal.stopped()).await;
        assert!(result.is_err());
        assert!(!signal.is_stopped());
    }
}
