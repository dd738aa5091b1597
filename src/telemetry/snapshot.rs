//! # Telemetry Snapshot
//!
//! The aggregate record of the most recently known value of every tracked
//! quantity. Fields are grouped by the channel that owns them; each group is
//! written as a whole by exactly one ingestor through [`FieldGroup::apply`].

/// Current wall-clock time in milliseconds since the Unix epoch
pub fn now_ms() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1000.0
}

/// Position group, owned by the position ingestor
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PositionFields {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    /// Above mean sea level
    pub altitude_m_amsl: f64,
    /// Relative to home
    pub altitude_m_rel: f64,
}

/// NED velocity group
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VelocityFields {
    pub velocity_north_mps: f64,
    pub velocity_east_mps: f64,
    pub velocity_down_mps: f64,
}

/// Euler attitude group
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EulerFields {
    pub roll_deg: f64,
    pub pitch_deg: f64,
    pub yaw_deg: f64,
}

/// Quaternion attitude group
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuaternionFields {
    pub q_w: f64,
    pub q_x: f64,
    pub q_y: f64,
    pub q_z: f64,
}

impl Default for QuaternionFields {
    fn default() -> Self {
        Self { q_w: 1.0, q_x: 0.0, q_y: 0.0, q_z: 0.0 }
    }
}

/// Body-frame (FRD) acceleration and angular rate
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InertialFields {
    pub accel_body_x_m_per_s2: f64,
    pub accel_body_y_m_per_s2: f64,
    pub accel_body_z_m_per_s2: f64,
    pub angular_vel_body_x_rad_ps: f64,
    pub angular_vel_body_y_rad_ps: f64,
    pub angular_vel_body_z_rad_ps: f64,
}

/// Motor and servo outputs (PWM)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActuatorFields {
    pub motor_out: i64,
    pub servo1_out: i64,
    pub servo2_out: i64,
    pub servo3_out: i64,
}

/// Complete telemetry snapshot
///
/// Copies handed out by the store are plain values: mutating one never
/// affects the store or any other copy.
///
/// # Examples
///
/// ```
/// use fc_telemetry::telemetry::snapshot::Snapshot;
///
/// let snapshot = Snapshot::default();
/// assert_eq!(snapshot.quaternion.q_w, 1.0);
/// assert_eq!(snapshot.actuators.motor_out, 0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Snapshot {
    /// Time the copy was taken, not the time of the last update
    pub timestamp_ms: f64,
    pub position: PositionFields,
    pub velocity: VelocityFields,
    pub euler: EulerFields,
    pub quaternion: QuaternionFields,
    pub inertial: InertialFields,
    pub actuators: ActuatorFields,
}

impl Snapshot {
    /// Snapshot holding defaults, stamped with `timestamp_ms`
    pub fn new(timestamp_ms: f64) -> Self {
        Self {
            timestamp_ms,
            ..Self::default()
        }
    }
}

/// A disjoint group of snapshot fields written as one unit
pub trait FieldGroup: Copy + Send + 'static {
    /// Overwrite this group's fields in `snapshot`, leaving every other field alone
    fn apply(self, snapshot: &mut Snapshot);
}

impl FieldGroup for PositionFields {
    fn apply(self, snapshot: &mut Snapshot) {
        snapshot.position = self;
    }
}

impl FieldGroup for VelocityFields {
    fn apply(self, snapshot: &mut Snapshot) {
        snapshot.velocity = self;
    }
}

impl FieldGroup for EulerFields {
    fn apply(self, snapshot: &mut Snapshot) {
        snapshot.euler = self;
    }
}

impl FieldGroup for QuaternionFields {
    fn apply(self, snapshot: &mut Snapshot) {
        snapshot.quaternion = self;
    }
}

impl FieldGroup for InertialFields {
    fn apply(self, snapshot: &mut Snapshot) {
        snapshot.inertial = self;
    }
}

impl FieldGroup for ActuatorFields {
    fn apply(self, snapshot: &mut Snapshot) {
        snapshot.actuators = self;
    }
}
