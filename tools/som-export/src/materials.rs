//! Scene-wide material registry
//!
//! Converts object-local material slot indices into global material indices
//! while collecting the RGBA records of bound slots.

use serde::Deserialize;

use crate::data::MaterialRecord;
use crate::scene::MaterialColor;

/// How the running offset advances after each object
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum MaterialOffsetPolicy {
    /// Advance by the object's slot count, empty slots included (SOM exporter compatible).
    /// Indices can run past the emitted records when slots are empty.
    #[default]
    SlotCount,
    /// Advance by the records actually emitted; slot indices are remapped onto bound slots
    RecordCount,
}

impl MaterialOffsetPolicy {
    /// Object-local index of `slot` under this policy
    ///
    /// `RecordCount` maps a bound slot to its position among the bound slots
    /// and an empty slot to 0, the object's base offset.
    pub fn local_index(self, slots: &[Option<MaterialColor>], slot: usize) -> usize {
        match self {
            MaterialOffsetPolicy::SlotCount => slot,
            MaterialOffsetPolicy::RecordCount => match slots.get(slot) {
                Some(Some(_)) => slots[..slot].iter().filter(|s| s.is_some()).count(),
                _ => 0,
            },
        }
    }
}

/// Running material offset plus the emitted material records
#[derive(Debug, Default)]
pub struct MaterialRegistry {
    policy: MaterialOffsetPolicy,
    offset: usize,
    records: Vec<MaterialRecord>,
}

impl MaterialRegistry {
    pub fn new(policy: MaterialOffsetPolicy) -> Self {
        Self {
            policy,
            offset: 0,
            records: Vec::new(),
        }
    }

    pub fn policy(&self) -> MaterialOffsetPolicy {
        self.policy
    }

    /// Reserve indices for an object's `slot_count` slots and return its base offset
    ///
    /// Under `RecordCount` the base is the number of records emitted so far and
    /// the offset follows [`record_material`](Self::record_material) instead.
    pub fn allocate(&mut self, slot_count: usize) -> usize {
        match self.policy {
            MaterialOffsetPolicy::SlotCount => {
                let base = self.offset;
                self.offset += slot_count;
                base
            }
            MaterialOffsetPolicy::RecordCount => self.records.len(),
        }
    }

    /// Append the RGBA record of a bound slot
    pub fn record_material(&mut self, color: MaterialColor) {
        self.records.push(MaterialRecord::from_color(color));
    }

    pub fn records(&self) -> &[MaterialRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<MaterialRecord> {
        self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: MaterialColor = MaterialColor {
        r: 1.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };

    #[test]
    fn test_offset_counts_empty_slots() {
        let mut registry = MaterialRegistry::new(MaterialOffsetPolicy::SlotCount);

        // Object 1: [empty, red]
        assert_eq!(registry.allocate(2), 0);
        registry.record_material(RED);

        // Object 2: [empty, red]
        assert_eq!(registry.allocate(2), 2);
        registry.record_material(RED);

        assert_eq!(registry.records().len(), 2);
    }

    #[test]
    fn test_trailing_empty_slot_points_past_records() {
        let mut registry = MaterialRegistry::new(MaterialOffsetPolicy::SlotCount);
        let slots = [Some(RED), None];

        let base = registry.allocate(slots.len());
        registry.record_material(RED);

        let index = base + MaterialOffsetPolicy::SlotCount.local_index(&slots, 1);
        assert_eq!(index, 1);
        assert!(index >= registry.records().len());
    }

    #[test]
    fn test_record_count_policy_tracks_records() {
        let mut registry = MaterialRegistry::new(MaterialOffsetPolicy::RecordCount);
        let slots = [None, Some(RED)];

        assert_eq!(registry.allocate(slots.len()), 0);
        registry.record_material(RED);
        assert_eq!(MaterialOffsetPolicy::RecordCount.local_index(&slots, 1), 0);

        assert_eq!(registry.allocate(slots.len()), 1);
    }

    #[test]
    fn test_record_count_empty_slot_resolves_to_base() {
        let slots = [Some(RED), None, Some(RED)];
        let policy = MaterialOffsetPolicy::RecordCount;
        assert_eq!(policy.local_index(&slots, 0), 0);
        assert_eq!(policy.local_index(&slots, 1), 0);
        assert_eq!(policy.local_index(&slots, 2), 1);
        assert_eq!(policy.local_index(&slots, 7), 0);
    }

    #[test]
    fn test_record_scaling() {
        let mut registry = MaterialRegistry::default();
        registry.record_material(MaterialColor::new(1.0, 0.5, 0.0, 0.25));
        let record = registry.records()[0];
        assert_eq!(record.values(), [255.0, 127.5, 0.0, 63.75]);
    }
}
