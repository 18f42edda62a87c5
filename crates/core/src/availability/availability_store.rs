use dashmap::DashMap;

use super::availability_model::{PropertyAvailability, WindowRecord};

/// Owned key-value store of per-property window records.
///
/// Records are exclusively mutated by [`super::AvailabilityService`];
/// everything else reads snapshots. Instances are independent so tests can
/// construct isolated stores.
#[derive(Default)]
pub struct AvailabilityStore {
    windows: DashMap<String, WindowRecord>,
}

impl AvailabilityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest snapshot for a property, if a window exists.
    pub fn snapshot(&self, property_id: &str) -> Option<PropertyAvailability> {
        self.windows
            .get(property_id)
            .map(|record| record.snapshot.clone())
    }

    /// Next timer generation for a property (1 for the first window).
    pub(crate) fn next_generation(&self, property_id: &str) -> u64 {
        self.windows
            .get(property_id)
            .map(|record| record.generation + 1)
            .unwrap_or(1)
    }

    /// Installs or overwrites a property's window record.
    pub(crate) fn put(&self, record: WindowRecord) {
        self.windows
            .insert(record.snapshot.property_id.clone(), record);
    }

    /// Mutates a property's record under its entry lock. The closure
    /// returns the new snapshot to publish, or None to leave the record as
    /// it stands (stale-timer no-op). Absent records yield None.
    pub(crate) fn mutate<F>(&self, property_id: &str, mutate: F) -> Option<PropertyAvailability>
    where
        F: FnOnce(&mut WindowRecord) -> bool,
    {
        let mut record = self.windows.get_mut(property_id)?;
        if mutate(&mut record) {
            Some(record.snapshot.clone())
        } else {
            None
        }
    }
}
