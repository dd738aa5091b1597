//! # Channel Record Types
//!
//! Records delivered by the flight controller on each telemetry channel.
//! Units and frames follow the MAVLink telemetry plugin conventions.

/// Global position fix
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PositionFix {
    /// Latitude in degrees
    pub latitude_deg: f64,
    /// Longitude in degrees
    pub longitude_deg: f64,
    /// Altitude above mean sea level in metres
    pub absolute_altitude_m: f32,
    /// Altitude relative to the home position in metres
    pub relative_altitude_m: f32,
}

/// Velocity in the North-East-Down frame
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VelocityNed {
    pub north_m_s: f32,
    pub east_m_s: f32,
    pub down_m_s: f32,
}

/// Euler attitude in degrees
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EulerAngle {
    pub roll_deg: f32,
    pub pitch_deg: f32,
    pub yaw_deg: f32,
}

/// Attitude quaternion (Hamilton convention, w first)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quaternion {
    pub w: f32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Default for Quaternion {
    fn default() -> Self {
        Self { w: 1.0, x: 0.0, y: 0.0, z: 0.0 }
    }
}

/// Acceleration in the Forward-Right-Down body frame
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AccelerationFrd {
    pub forward_m_s2: f32,
    pub right_m_s2: f32,
    pub down_m_s2: f32,
}

/// Angular velocity in the Forward-Right-Down body frame
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AngularVelocityFrd {
    pub forward_rad_s: f32,
    pub right_rad_s: f32,
    pub down_rad_s: f32,
}

/// Inertial measurement sample
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Imu {
    pub acceleration_frd: AccelerationFrd,
    pub angular_velocity_frd: AngularVelocityFrd,
}

/// Actuator output status
///
/// `actuator` holds raw output values (usually PWM microseconds) indexed by
/// output number. The flight controller may send fewer entries than it has
/// outputs.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ActuatorOutputStatus {
    /// Number of active outputs
    pub active: u32,
    /// Output values by index
    pub actuator: Vec<f32>,
}
