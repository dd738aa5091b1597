//! # Channel Ingestors
//!
//! One ingestor per telemetry channel. An ingestor pulls records from its
//! channel's stream and writes the channel's field group into the
//! [`SnapshotStore`]. It ends when stop is requested, when the stream ends,
//! or when the stream yields an error; none of these affect other channels.
//!
//! ## Channel to field group mapping
//!
//! | Channel | Record | Field group |
//! |---------|--------|-------------|
//! | Position | [`PositionFix`] | [`PositionFields`] |
//! | Velocity | [`VelocityNed`] | [`VelocityFields`] |
//! | Attitude Euler | [`EulerAngle`] | [`EulerFields`] |
//! | Attitude Quaternion | [`Quaternion`] | [`QuaternionFields`] |
//! | IMU | [`Imu`] | [`InertialFields`] |
//! | Actuator output | [`ActuatorOutputStatus`] | [`ActuatorFields`] |

use futures::StreamExt;
use tracing::{debug, info};

use super::schedule::StopSignal;
use super::snapshot::*;
use super::store::SnapshotStore;
use crate::error::IngestError;
use crate::link::types::*;
use crate::link::{Channel, RecordStream};

/// Actuator index carrying the primary motor output
pub const MOTOR_INDEX: usize = 0;

/// First actuator index carrying a servo output (servo1..servo3 follow)
pub const SERVO_OFFSET: usize = 8;

/// A channel record that maps onto one snapshot field group
pub trait ChannelRecord: Send + 'static {
    /// Channel this record arrives on
    const CHANNEL: Channel;

    /// Field group the record writes
    type Fields: FieldGroup;

    fn fields(&self) -> Self::Fields;
}

impl ChannelRecord for PositionFix {
    const CHANNEL: Channel = Channel::Position;
    type Fields = PositionFields;

    fn fields(&self) -> PositionFields {
        PositionFields {
            latitude_deg: self.latitude_deg,
            longitude_deg: self.longitude_deg,
            altitude_m_amsl: self.absolute_altitude_m as f64,
            altitude_m_rel: self.relative_altitude_m as f64,
        }
    }
}

impl ChannelRecord for VelocityNed {
    const CHANNEL: Channel = Channel::VelocityNed;
    type Fields = VelocityFields;

    fn fields(&self) -> VelocityFields {
        VelocityFields {
            velocity_north_mps: self.north_m_s as f64,
            velocity_east_mps: self.east_m_s as f64,
            velocity_down_mps: self.down_m_s as f64,
        }
    }
}

impl ChannelRecord for EulerAngle {
    const CHANNEL: Channel = Channel::AttitudeEuler;
    type Fields = EulerFields;

    fn fields(&self) -> EulerFields {
        EulerFields {
            roll_deg: self.roll_deg as f64,
            pitch_deg: self.pitch_deg as f64,
            yaw_deg: self.yaw_deg as f64,
        }
    }
}

impl ChannelRecord for Quaternion {
    const CHANNEL: Channel = Channel::AttitudeQuaternion;
    type Fields = QuaternionFields;

    fn fields(&self) -> QuaternionFields {
        QuaternionFields {
            q_w: self.w as f64,
            q_x: self.x as f64,
            q_y: self.y as f64,
            q_z: self.z as f64,
        }
    }
}

impl ChannelRecord for Imu {
    const CHANNEL: Channel = Channel::Imu;
    type Fields = InertialFields;

    fn fields(&self) -> InertialFields {
        let accel = &self.acceleration_frd;
        let rate = &self.angular_velocity_frd;
        InertialFields {
            accel_body_x_m_per_s2: accel.forward_m_s2 as f64,
            accel_body_y_m_per_s2: accel.right_m_s2 as f64,
            accel_body_z_m_per_s2: accel.down_m_s2 as f64,
            angular_vel_body_x_rad_ps: rate.forward_rad_s as f64,
            angular_vel_body_y_rad_ps: rate.right_rad_s as f64,
            angular_vel_body_z_rad_ps: rate.down_rad_s as f64,
        }
    }
}

impl ChannelRecord for ActuatorOutputStatus {
    const CHANNEL: Channel = Channel::ActuatorOutput;
    type Fields = ActuatorFields;

    fn fields(&self) -> ActuatorFields {
        ActuatorFields {
            motor_out: output_at(&self.actuator, MOTOR_INDEX),
            servo1_out: output_at(&self.actuator, SERVO_OFFSET),
            servo2_out: output_at(&self.actuator, SERVO_OFFSET + 1),
            servo3_out: output_at(&self.actuator, SERVO_OFFSET + 2),
        }
    }
}

/// Output value at `index` truncated toward zero, or 0 when absent
fn output_at(values: &[f32], index: usize) -> i64 {
    values.get(index).map_or(0, |&v| v as i64)
}

/// Why an ingestor ended without error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestExit {
    /// Stop was requested
    Stopped,
    /// The source stream ended
    Exhausted,
}

/// Summary of an ingestor that ended without error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub channel: Channel,
    /// Records applied to the store
    pub records: u64,
    pub exit: IngestExit,
}

/// Result of one ingestor task
pub type IngestOutcome = std::result::Result<IngestReport, IngestError>;

/// Run one channel ingestor to completion
///
/// Each record is applied to `store` as a single group write. The stop
/// signal is raced against the next record, so a stream that never yields
/// again still lets the ingestor stop.
///
/// # Errors
///
/// Returns [`IngestError`] carrying the source fault when the stream yields
/// an error. Fields written before the fault keep their last value.
pub async fn ingest<R: ChannelRecord>(
    mut records: RecordStream<R>,
    store: SnapshotStore,
    mut stop: StopSignal,
) -> IngestOutcome {
    let channel = R::CHANNEL;
    let mut applied: u64 = 0;
    debug!("{} stream started", channel);

    loop {
        let next = tokio::select! {
            biased;
            _ = stop.stopped() => {
                info!("{} stream stopped after {} records", channel, applied);
                return Ok(IngestReport { channel, records: applied, exit: IngestExit::Stopped });
            }
            next = records.next() => next,
        };

        match next {
            Some(Ok(record)) => {
                store.update(record.fields()).await;
                applied += 1;
            }
            Some(Err(source)) => {
                return Err(IngestError { channel, records: applied, source });
            }
            None => {
                info!("{} stream ended after {} records", channel, applied);
                return Ok(IngestReport { channel, records: applied, exit: IngestExit::Exhausted });
            }
        }
    }
}
