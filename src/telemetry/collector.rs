//! # Telemetry Collector
//!
//! Owns the [`SnapshotStore`] and drives the six channel ingestors against a
//! [`TelemetrySource`].
//!
//! Startup sequence:
//! 1. Request a delivery rate for every channel
//! 2. Wait for the flight controller to apply the new rates
//! 3. Spawn one ingestor per channel
//! 4. Supervise the ingestors until every one of them has ended

use std::sync::Arc;
use tokio::task::JoinSet;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use super::ingest::{ingest, IngestOutcome};
use super::schedule::StopSignal;
use super::snapshot::Snapshot;
use super::store::SnapshotStore;
use crate::config::{Environment, LinkConfig};
use crate::error::LinkError;
use crate::link::{Channel, TelemetrySource};

/// Aggregates every telemetry channel of one source into a shared snapshot
pub struct Collector<S> {
    source: Arc<S>,
    store: SnapshotStore,
}

impl<S> Clone for Collector<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            store: self.store.clone(),
        }
    }
}

impl<S: TelemetrySource + 'static> Collector<S> {
    /// Create a collector with a default snapshot
    pub fn new(source: Arc<S>) -> Self {
        Self {
            source,
            store: SnapshotStore::new(),
        }
    }

    /// Store handle for the recorder and printer
    pub fn store(&self) -> SnapshotStore {
        self.store.clone()
    }

    /// Copy of the latest snapshot, stamped with the current time
    pub async fn latest(&self) -> Snapshot {
        self.store.read().await
    }

    /// Request `rate_hz` on every channel
    ///
    /// Many autopilots refuse a rate for the actuator output channel; that
    /// refusal is tolerated, and only reported outside SITL.
    ///
    /// # Errors
    ///
    /// Returns the first failure on any other channel.
    pub async fn configure_stream_rates(
        &self,
        rate_hz: f64,
        environment: Environment,
    ) -> Result<(), LinkError> {
        info!("Setting telemetry stream rates to {:.1} Hz", rate_hz);

        for channel in Channel::ALL {
            match self.source.set_rate(channel, rate_hz).await {
                Ok(()) => debug!("{} rate set", channel),
                Err(e) if channel == Channel::ActuatorOutput => {
                    if environment != Environment::Sitl {
                        warn!("Could not set actuator output rate: {}", e);
                    }
                }
                Err(e) => {
                    error!("Failed to set telemetry rates: {}", e);
                    return Err(e);
                }
            }
        }

        info!("Telemetry stream rates configured");
        Ok(())
    }

    /// Start one ingestor per channel
    pub fn spawn_ingestors(&self, stop: &StopSignal) -> JoinSet<IngestOutcome> {
        let source = &self.source;
        let mut ingestors = JoinSet::new();

        ingestors.spawn(ingest(source.position(), self.store.clone(), stop.clone()));
        ingestors.spawn(ingest(source.velocity_ned(), self.store.clone(), stop.clone()));
        ingestors.spawn(ingest(source.attitude_euler(), self.store.clone(), stop.clone()));
        ingestors.spawn(ingest(source.attitude_quaternion(), self.store.clone(), stop.clone()));
        ingestors.spawn(ingest(source.imu(), self.store.clone(), stop.clone()));
        ingestors.spawn(ingest(source.actuator_output_status(), self.store.clone(), stop.clone()));

        debug!("Spawned {} ingestors", ingestors.len());
        ingestors
    }

    /// Configure rates, wait for them to settle, then ingest until every
    /// channel ends
    ///
    /// # Errors
    ///
    /// Returns the rate negotiation failure; no ingestor is started then.
    pub async fn run_streams(
        &self,
        link: &LinkConfig,
        stop: StopSignal,
    ) -> Result<Vec<IngestOutcome>, LinkError> {
        self.configure_stream_rates(link.stream_rate_hz, link.environment)
            .await?;
        sleep(link.settle_delay()).await;

        let ingestors = self.spawn_ingestors(&stop);
        info!("Telemetry streams started");
        Ok(supervise(ingestors).await)
    }
}

/// Wait for every ingestor and log how each one ended
pub async fn supervise(mut ingestors: JoinSet<IngestOutcome>) -> Vec<IngestOutcome> {
    let mut outcomes = Vec::with_capacity(ingestors.len());

    while let Some(joined) = ingestors.join_next().await {
        match joined {
            Ok(outcome) => {
                match &outcome {
                    Ok(report) => info!("{} ingestor finished: {:?}", report.channel, report.exit),
                    Err(e) => error!("{} stream error: {}", e.channel, e),
                }
                outcomes.push(outcome);
            }
            Err(e) => error!("Ingestor task failed: {}", e),
        }
    }

    outcomes
}
