//! # Flight Controller Link Module
//!
//! Interface boundary between the aggregator and the flight controller link.
//!
//! This module handles:
//! - Naming the six telemetry channels
//! - The [`TelemetrySource`] trait a connected vehicle implements
//! - Channel record types
//! - A simulated vehicle for running without hardware
//!
//! Establishing and retrying the physical link is the job of whoever
//! implements [`TelemetrySource`]; the aggregator only consumes the
//! subscriptions it hands out.

pub mod sim;
pub mod types;

use async_trait::async_trait;
use futures::stream::BoxStream;
use std::fmt;

use crate::error::LinkError;
use types::*;

/// Lazy, infinite, non-restartable sequence of channel records
pub type RecordStream<T> = BoxStream<'static, Result<T, LinkError>>;

/// Telemetry channels delivered by the flight controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Position,
    VelocityNed,
    AttitudeEuler,
    AttitudeQuaternion,
    Imu,
    ActuatorOutput,
}

impl Channel {
    /// All channels, in the order their ingestors are started
    pub const ALL: [Channel; 6] = [
        Channel::Position,
        Channel::VelocityNed,
        Channel::AttitudeEuler,
        Channel::AttitudeQuaternion,
        Channel::Imu,
        Channel::ActuatorOutput,
    ];

    /// Human readable channel name used in log messages
    pub fn name(self) -> &'static str {
        match self {
            Channel::Position => "Position",
            Channel::VelocityNed => "Velocity",
            Channel::AttitudeEuler => "Attitude Euler",
            Channel::AttitudeQuaternion => "Attitude Quaternion",
            Channel::Imu => "IMU",
            Channel::ActuatorOutput => "Actuator output",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A connected vehicle exposing one telemetry subscription per channel
///
/// Each subscription call hands out a fresh stream. Streams are expected to
/// be infinite; ending or yielding an error terminates the consuming
/// ingestor only.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TelemetrySource: Send + Sync {
    /// Request a delivery rate for one channel
    async fn set_rate(&self, channel: Channel, rate_hz: f64) -> Result<(), LinkError>;

    fn position(&self) -> RecordStream<PositionFix>;

    fn velocity_ned(&self) -> RecordStream<VelocityNed>;

    fn attitude_euler(&self) -> RecordStream<EulerAngle>;

    fn attitude_quaternion(&self) -> RecordStream<Quaternion>;

    fn imu(&self) -> RecordStream<Imu>;

    fn actuator_output_status(&self) -> RecordStream<ActuatorOutputStatus>;
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_all_channels_are_distinct() {
        let unique: HashSet<_> = Channel::ALL.iter().collect();
        assert_eq!(unique.len(), 6);
    }

    #[test]
    fn test_channel_display_names() {
        assert_eq!(Channel::Position.to_string(), "Position");
        assert_eq!(Channel::Imu.to_string(), "IMU");
        assert_eq!(Channel::ActuatorOutput.to_string(), "Actuator output");
    }

    #[test]
    fn test_default_quaternion_is_identity() {
        let q = Quaternion::default();
        assert_eq!((q.w, q.x, q.y, q.z), (1.0, 0.0, 0.0, 0.0));
    }
}
