//! # Simulated Vehicle
//!
//! A [`TelemetrySource`] producing deterministic synthetic telemetry: the
//! vehicle flies a level circle around a fixed home position at constant
//! speed. Every channel ticks at its own negotiated rate.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::f64::consts::TAU;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::time::{interval, Duration, Interval, MissedTickBehavior};
use tracing::debug;

use super::types::*;
use super::{Channel, RecordStream, TelemetrySource};
use crate::error::LinkError;
use crate::telemetry::schedule::tick_interval;

/// Rate used for channels that were never configured
pub const DEFAULT_SIM_RATE_HZ: f64 = 30.0;

/// Circle radius in metres
const ORBIT_RADIUS_M: f64 = 50.0;

/// One orbit takes this many seconds
const ORBIT_PERIOD_S: f64 = 30.0;

/// Metres per degree of latitude
const METRES_PER_DEG: f64 = 111_320.0;

/// Orbit altitude above home
const ORBIT_ALTITUDE_M: f64 = 20.0;

/// Servo outputs start at this actuator index
const SIM_SERVO_OFFSET: usize = 8;

/// Synthetic flight controller
#[derive(Debug, Clone)]
pub struct SimulatedVehicle {
    rates: Arc<[AtomicU64; 6]>,
    home: (f64, f64, f64),
    actuator_rate_supported: bool,
}

impl Default for SimulatedVehicle {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedVehicle {
    /// Create a vehicle orbiting a default home position
    pub fn new() -> Self {
        let rate_bits = DEFAULT_SIM_RATE_HZ.to_bits();
        Self {
            rates: Arc::new(std::array::from_fn(|_| AtomicU64::new(rate_bits))),
            home: (47.397_742, 8.545_594, 488.0),
            actuator_rate_supported: true,
        }
    }

    /// Reject actuator output rate requests, as SITL autopilots often do
    pub fn without_actuator_rate(mut self) -> Self {
        self.actuator_rate_supported = false;
        self
    }

    /// Currently configured rate for a channel
    pub fn rate(&self, channel: Channel) -> f64 {
        f64::from_bits(self.rates[slot(channel)].load(Ordering::Relaxed))
    }

    /// Tick period for a channel; only validated rates are ever stored
    fn period(&self, channel: Channel) -> Duration {
        tick_interval(self.rate(channel)).unwrap_or(Duration::from_millis(33))
    }

    fn ticker(&self, channel: Channel) -> Interval {
        let mut ticker = interval(self.period(channel));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    }

    /// Build a stream that emits `make(t)` on every tick, `t` in seconds
    fn ticking<T, F>(&self, channel: Channel, make: F) -> RecordStream<T>
    where
        T: Send + 'static,
        F: Fn(f64) -> T + Send + 'static,
    {
        let period = self.period(channel).as_secs_f64();
        debug!("Simulated {} stream at {:.1} Hz", channel, 1.0 / period);

        stream::unfold((self.ticker(channel), 0u64), move |(mut ticker, n)| async move {
            ticker.tick().await;
            Some((n, (ticker, n + 1)))
        })
        .map(move |n| Ok(make(n as f64 * period)))
        .boxed()
    }
}

fn slot(channel: Channel) -> usize {
    match channel {
        Channel::Position => 0,
        Channel::VelocityNed => 1,
        Channel::AttitudeEuler => 2,
        Channel::AttitudeQuaternion => 3,
        Channel::Imu => 4,
        Channel::ActuatorOutput => 5,
    }
}

fn orbit_angle(t: f64) -> f64 {
    TAU * t / ORBIT_PERIOD_S
}

fn orbit_speed() -> f64 {
    TAU * ORBIT_RADIUS_M / ORBIT_PERIOD_S
}

/// Bank angle for a coordinated turn on the orbit
fn bank_deg() -> f64 {
    let omega = TAU / ORBIT_PERIOD_S;
    (orbit_speed() * omega / 9.81).atan().to_degrees()
}

/// Heading, counter-clockwise orbit flown nose-first
fn heading_deg(t: f64) -> f64 {
    (orbit_angle(t).to_degrees() + 90.0).rem_euclid(360.0)
}

fn position_at(home: (f64, f64, f64), t: f64) -> PositionFix {
    let (lat0, lon0, amsl0) = home;
    let a = orbit_angle(t);
    let north = ORBIT_RADIUS_M * a.sin();
    let east = ORBIT_RADIUS_M * a.cos();
    PositionFix {
        latitude_deg: lat0 + north / METRES_PER_DEG,
        longitude_deg: lon0 + east / (METRES_PER_DEG * lat0.to_radians().cos()),
        absolute_altitude_m: (amsl0 + ORBIT_ALTITUDE_M) as f32,
        relative_altitude_m: ORBIT_ALTITUDE_M as f32,
    }
}

fn velocity_at(t: f64) -> VelocityNed {
    let a = orbit_angle(t);
    let v = orbit_speed();
    VelocityNed {
        north_m_s: (v * a.cos()) as f32,
        east_m_s: (-v * a.sin()) as f32,
        down_m_s: 0.0,
    }
}

fn euler_at(t: f64) -> EulerAngle {
    EulerAngle {
        roll_deg: -bank_deg() as f32,
        pitch_deg: 0.0,
        yaw_deg: heading_deg(t) as f32,
    }
}

/// ZYX Euler to quaternion
fn quaternion_at(t: f64) -> Quaternion {
    let e = euler_at(t);
    let (hr, hp, hy) = (
        (e.roll_deg as f64).to_radians() / 2.0,
        (e.pitch_deg as f64).to_radians() / 2.0,
        (e.yaw_deg as f64).to_radians() / 2.0,
    );
    let (sr, cr) = hr.sin_cos();
    let (sp, cp) = hp.sin_cos();
    let (sy, cy) = hy.sin_cos();
    Quaternion {
        w: (cr * cp * cy + sr * sp * sy) as f32,
        x: (sr * cp * cy - cr * sp * sy) as f32,
        y: (cr * sp * cy + sr * cp * sy) as f32,
        z: (cr * cp * sy - sr * sp * cy) as f32,
    }
}

fn imu_at(_t: f64) -> Imu {
    let omega = TAU / ORBIT_PERIOD_S;
    let bank = bank_deg().to_radians();
    Imu {
        acceleration_frd: AccelerationFrd {
            forward_m_s2: 0.0,
            right_m_s2: 0.0,
            down_m_s2: (-9.81 / bank.cos()) as f32,
        },
        angular_velocity_frd: AngularVelocityFrd {
            forward_rad_s: 0.0,
            right_rad_s: (-omega * bank.sin()) as f32,
            down_rad_s: (-omega * bank.cos()) as f32,
        },
    }
}

fn actuators_at(t: f64) -> ActuatorOutputStatus {
    let mut actuator = vec![0.0f32; SIM_SERVO_OFFSET + 3];
    actuator[0] = 1550.0;
    let aileron = 1500.0 - 5.0 * bank_deg();
    actuator[SIM_SERVO_OFFSET] = aileron as f32;
    actuator[SIM_SERVO_OFFSET + 1] = (1500.0 + 20.0 * (orbit_angle(t) * 4.0).sin()) as f32;
    actuator[SIM_SERVO_OFFSET + 2] = 1500.0;
    ActuatorOutputStatus {
        active: actuator.len() as u32,
        actuator,
    }
}

#[async_trait]
impl TelemetrySource for SimulatedVehicle {
    async fn set_rate(&self, channel: Channel, rate_hz: f64) -> Result<(), LinkError> {
        if channel == Channel::ActuatorOutput && !self.actuator_rate_supported {
            return Err(LinkError::Rejected {
                channel,
                reason: "command unsupported".to_string(),
            });
        }
        if let Err(e) = tick_interval(rate_hz) {
            return Err(LinkError::Rejected {
                channel,
                reason: e.to_string(),
            });
        }
        self.rates[slot(channel)].store(rate_hz.to_bits(), Ordering::Relaxed);
        Ok(())
    }

    fn position(&self) -> RecordStream<PositionFix> {
        let home = self.home;
        self.ticking(Channel::Position, move |t| position_at(home, t))
    }

    fn velocity_ned(&self) -> RecordStream<VelocityNed> {
        self.ticking(Channel::VelocityNed, velocity_at)
    }

    fn attitude_euler(&self) -> RecordStream<EulerAngle> {
        self.ticking(Channel::AttitudeEuler, euler_at)
    }

    fn attitude_quaternion(&self) -> RecordStream<Quaternion> {
        self.ticking(Channel::AttitudeQuaternion, quaternion_at)
    }

    fn imu(&self) -> RecordStream<Imu> {
        self.ticking(Channel::Imu, imu_at)
    }

    fn actuator_output_status(&self) -> RecordStream<ActuatorOutputStatus> {
        self.ticking(Channel::ActuatorOutput, actuators_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_rate_updates_channel() {
        let vehicle = SimulatedVehicle::new();
        assert_eq!(vehicle.rate(Channel::Imu), DEFAULT_SIM_RATE_HZ);

        vehicle.set_rate(Channel::Imu, 50.0).await.unwrap();
        assert_eq!(vehicle.rate(Channel::Imu), 50.0);
        assert_eq!(vehicle.rate(Channel::Position), DEFAULT_SIM_RATE_HZ);
    }

    #[tokio::test]
    async fn test_rejects_invalid_rate() {
        let vehicle = SimulatedVehicle::new();
        assert!(vehicle.set_rate(Channel::Position, 0.0).await.is_err());
        assert!(vehicle.set_rate(Channel::Position, f64::NAN).await.is_err());
        assert!(vehicle.set_rate(Channel::Position, 1e-20).await.is_err());
        assert!(vehicle.set_rate(Channel::Position, 1e12).await.is_err());
        assert_eq!(vehicle.rate(Channel::Position), DEFAULT_SIM_RATE_HZ);
    }

    #[tokio::test]
    async fn test_actuator_rate_can_be_unsupported() {
        let vehicle = SimulatedVehicle::new().without_actuator_rate();
        let err = vehicle.set_rate(Channel::ActuatorOutput, 30.0).await.unwrap_err();
        assert!(matches!(err, LinkError::Rejected { channel: Channel::ActuatorOutput, .. }));
        assert!(vehicle.set_rate(Channel::Imu, 30.0).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_streams_yield_records() {
        let vehicle = SimulatedVehicle::new();
        let mut positions = vehicle.position();

        let first = positions.next().await.unwrap().unwrap();
        let second = positions.next().await.unwrap().unwrap();
        assert_eq!(first.relative_altitude_m, ORBIT_ALTITUDE_M as f32);
        assert_ne!(first.latitude_deg, second.latitude_deg);
    }

    #[tokio::test(start_paused = true)]
    async fn test_actuator_layout_covers_servo_slots() {
        let vehicle = SimulatedVehicle::new();
        let status = vehicle.actuator_output_status().next().await.unwrap().unwrap();
        assert_eq!(status.actuator.len(), SIM_SERVO_OFFSET + 3);
        assert_eq!(status.actuator[0], 1550.0);
    }

    #[test]
    fn test_quaternion_is_unit_and_follows_heading() {
        let q = quaternion_at(0.0);
        let norm = (q.w * q.w + q.x * q.x + q.y * q.y + q.z * q.z).sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
        assert!(q.z > 0.0);
    }
}
