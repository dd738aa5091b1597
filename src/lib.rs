//! # FC Telemetry Library
//!
//! Aggregate flight controller telemetry into a single snapshot and record it.
//!
//! This library subscribes to six telemetry channels (position, velocity,
//! attitude as Euler angles and as a quaternion, IMU, actuator outputs),
//! keeps the latest value of every field, and samples that snapshot into a
//! timestamped CSV log and a periodic console report.

pub mod config;
pub mod error;
pub mod link;
pub mod session;
pub mod telemetry;
