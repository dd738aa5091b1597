//! # Shared State Store
//!
//! Owns the canonical [`Snapshot`]. Every write and every read goes through
//! one mutex; a lock is held for one field-group write or one full copy and
//! never across another await point.

use std::sync::Arc;
use tokio::sync::Mutex;

use super::snapshot::{now_ms, FieldGroup, Snapshot};

/// Cloneable handle to the shared snapshot
///
/// # Examples
///
/// ```
/// use fc_telemetry::telemetry::snapshot::VelocityFields;
/// use fc_telemetry::telemetry::store::SnapshotStore;
///
/// # tokio_test::block_on(async {
/// let store = SnapshotStore::new();
/// store
///     .update(VelocityFields {
///         velocity_north_mps: 3.0,
///         velocity_east_mps: 0.0,
///         velocity_down_mps: -1.0,
///     })
///     .await;
///
/// let snapshot = store.read().await;
/// assert_eq!(snapshot.velocity.velocity_north_mps, 3.0);
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    inner: Arc<Mutex<Snapshot>>,
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotStore {
    /// Create a store holding a default snapshot
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Snapshot::new(now_ms()))),
        }
    }

    /// Overwrite one field group under exclusive access
    pub async fn update<G: FieldGroup>(&self, group: G) {
        let mut snapshot = self.inner.lock().await;
        group.apply(&mut snapshot);
    }

    /// Copy the snapshot under exclusive access, stamped with the read time
    pub async fn read(&self) -> Snapshot {
        let snapshot = self.inner.lock().await;
        Snapshot {
            timestamp_ms: now_ms(),
            ..*snapshot
        }
    }
}
