//! # Field-Format Table
//!
//! Static, ordered table of snapshot fields and their textual precision.
//! Both the header record and every data record are produced by walking
//! [`FIELDS`], so a record always has exactly as many values as the header
//! has names.
//!
//! | Quantity | Format |
//! |----------|--------|
//! | Timestamp | 3 decimals (ms) |
//! | Latitude / longitude | 8 decimals |
//! | Altitudes | 2 decimals |
//! | NED velocity | 3 decimals |
//! | Euler angles | 2 decimals |
//! | Quaternion | 4 decimals |
//! | Body acceleration | 3 decimals |
//! | Body angular rate | 4 decimals |
//! | Motor / servo outputs | integer |

use super::snapshot::Snapshot;

/// One column of the persisted record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    TimestampMs,
    LatitudeDeg,
    LongitudeDeg,
    AltitudeAmsl,
    AltitudeRel,
    VelocityNorth,
    VelocityEast,
    VelocityDown,
    Roll,
    Pitch,
    Yaw,
    QuaternionW,
    QuaternionX,
    QuaternionY,
    QuaternionZ,
    AccelX,
    AccelY,
    AccelZ,
    AngularVelX,
    AngularVelY,
    AngularVelZ,
    MotorOut,
    Servo1Out,
    Servo2Out,
    Servo3Out,
}

/// Every field in column order
pub const FIELDS: [Field; 25] = [
    Field::TimestampMs,
    Field::LatitudeDeg,
    Field::LongitudeDeg,
    Field::AltitudeAmsl,
    Field::AltitudeRel,
    Field::VelocityNorth,
    Field::VelocityEast,
    Field::VelocityDown,
    Field::Roll,
    Field::Pitch,
    Field::Yaw,
    Field::QuaternionW,
    Field::QuaternionX,
    Field::QuaternionY,
    Field::QuaternionZ,
    Field::AccelX,
    Field::AccelY,
    Field::AccelZ,
    Field::AngularVelX,
    Field::AngularVelY,
    Field::AngularVelZ,
    Field::MotorOut,
    Field::Servo1Out,
    Field::Servo2Out,
    Field::Servo3Out,
];

/// Textual encoding of one field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Fixed-point with the given number of decimals
    Fixed(usize),
    /// Whole number
    Integer,
}

/// Raw value of one field
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Float(f64),
    Int(i64),
}

impl Value {
    /// Render under `format`
    ///
    /// A value whose kind does not match the format falls back to its
    /// default `Display` text.
    pub fn render(self, format: Format) -> String {
        match (self, format) {
            (Value::Float(v), Format::Fixed(decimals)) => format!("{:.*}", decimals, v),
            (Value::Int(v), Format::Integer) => v.to_string(),
            (Value::Float(v), Format::Integer) => v.to_string(),
            (Value::Int(v), Format::Fixed(_)) => v.to_string(),
        }
    }
}

impl Field {
    /// Column name used in the CSV header
    pub fn name(self) -> &'static str {
        match self {
            Field::TimestampMs => "timestamp_ms",
            Field::LatitudeDeg => "latitude_deg",
            Field::LongitudeDeg => "longitude_deg",
            Field::AltitudeAmsl => "altitude_m_amsl",
            Field::AltitudeRel => "altitude_m_rel",
            Field::VelocityNorth => "velocity_north_mps",
            Field::VelocityEast => "velocity_east_mps",
            Field::VelocityDown => "velocity_down_mps",
            Field::Roll => "roll_deg",
            Field::Pitch => "pitch_deg",
            Field::Yaw => "yaw_deg",
            Field::QuaternionW => "q_w",
            Field::QuaternionX => "q_x",
            Field::QuaternionY => "q_y",
            Field::QuaternionZ => "q_z",
            Field::AccelX => "accel_body_x_m_per_s2",
            Field::AccelY => "accel_body_y_m_per_s2",
            Field::AccelZ => "accel_body_z_m_per_s2",
            Field::AngularVelX => "angular_vel_body_x_rad_ps",
            Field::AngularVelY => "angular_vel_body_y_rad_ps",
            Field::AngularVelZ => "angular_vel_body_z_rad_ps",
            Field::MotorOut => "motor_out",
            Field::Servo1Out => "servo1_out",
            Field::Servo2Out => "servo2_out",
            Field::Servo3Out => "servo3_out",
        }
    }

    pub fn format(self) -> Format {
        match self {
            Field::TimestampMs => Format::Fixed(3),
            Field::LatitudeDeg | Field::LongitudeDeg => Format::Fixed(8),
            Field::AltitudeAmsl | Field::AltitudeRel => Format::Fixed(2),
            Field::VelocityNorth | Field::VelocityEast | Field::VelocityDown => Format::Fixed(3),
            Field::Roll | Field::Pitch | Field::Yaw => Format::Fixed(2),
            Field::QuaternionW | Field::QuaternionX | Field::QuaternionY | Field::QuaternionZ => {
                Format::Fixed(4)
            }
            Field::AccelX | Field::AccelY | Field::AccelZ => Format::Fixed(3),
            Field::AngularVelX | Field::AngularVelY | Field::AngularVelZ => Format::Fixed(4),
            Field::MotorOut | Field::Servo1Out | Field::Servo2Out | Field::Servo3Out => {
                Format::Integer
            }
        }
    }
}

impl Snapshot {
    /// Read one field
    pub fn value(&self, field: Field) -> Value {
        use Value::{Float, Int};

        match field {
            Field::TimestampMs => Float(self.timestamp_ms),
            Field::LatitudeDeg => Float(self.position.latitude_deg),
            Field::LongitudeDeg => Float(self.position.longitude_deg),
            Field::AltitudeAmsl => Float(self.position.altitude_m_amsl),
            Field::AltitudeRel => Float(self.position.altitude_m_rel),
            Field::VelocityNorth => Float(self.velocity.velocity_north_mps),
            Field::VelocityEast => Float(self.velocity.velocity_east_mps),
            Field::VelocityDown => Float(self.velocity.velocity_down_mps),
            Field::Roll => Float(self.euler.roll_deg),
            Field::Pitch => Float(self.euler.pitch_deg),
            Field::Yaw => Float(self.euler.yaw_deg),
            Field::QuaternionW => Float(self.quaternion.q_w),
            Field::QuaternionX => Float(self.quaternion.q_x),
            Field::QuaternionY => Float(self.quaternion.q_y),
            Field::QuaternionZ => Float(self.quaternion.q_z),
            Field::AccelX => Float(self.inertial.accel_body_x_m_per_s2),
            Field::AccelY => Float(self.inertial.accel_body_y_m_per_s2),
            Field::AccelZ => Float(self.inertial.accel_body_z_m_per_s2),
            Field::AngularVelX => Float(self.inertial.angular_vel_body_x_rad_ps),
            Field::AngularVelY => Float(self.inertial.angular_vel_body_y_rad_ps),
            Field::AngularVelZ => Float(self.inertial.angular_vel_body_z_rad_ps),
            Field::MotorOut => Int(self.actuators.motor_out),
            Field::Servo1Out => Int(self.actuators.servo1_out),
            Field::Servo2Out => Int(self.actuators.servo2_out),
            Field::Servo3Out => Int(self.actuators.servo3_out),
        }
    }

    /// Render every field in column order
    ///
    /// # Examples
    ///
    /// ```
    /// use fc_telemetry::telemetry::format::header_record;
    /// use fc_telemetry::telemetry::snapshot::Snapshot;
    ///
    /// let record = Snapshot::new(1000.0).to_record();
    /// assert_eq!(record[0], "1000.000");
    /// assert_eq!(record[1], "0.00000000");
    /// assert_eq!(record.len(), header_record().len());
    /// ```
    pub fn to_record(&self) -> Vec<String> {
        FIELDS
            .iter()
            .map(|field| self.value(*field).render(field.format()))
            .collect()
    }
}

/// Header record: every field name in column order
pub fn header_record() -> Vec<String> {
    FIELDS.iter().map(|field| field.name().to_string()).collect()
}
