//! Connection slot to field mapping for table shapes.
//!
//! A table shape exposes its connection slots in a fixed layout: the first
//! `first_field_slot` slots belong to the shape body, then every field owns
//! `slots_per_field` consecutive slots (its left and right anchors) in
//! attribute-list order.

use serde::Deserialize;

pub const FIRST_FIELD_SLOT: usize = 12;
pub const SLOTS_PER_FIELD: usize = 2;
/// Handle connect type of a compound key's table anchors.
pub const ANCHOR_CONNECT_TYPE: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SlotLayout {
    pub first_field_slot: usize,
    pub slots_per_field: usize,
    pub anchor_connect_type: u8,
}

impl Default for SlotLayout {
    fn default() -> Self {
        Self {
            first_field_slot: FIRST_FIELD_SLOT,
            slots_per_field: SLOTS_PER_FIELD,
            anchor_connect_type: ANCHOR_CONNECT_TYPE,
        }
    }
}

impl SlotLayout {
    /// Field position a slot would map to, without bounds checking.
    pub fn field_index(&self, slot: usize) -> Option<usize> {
        slot.checked_sub(self.first_field_slot)?
            .checked_div(self.slots_per_field)
    }
}

/// Field names of one table plus the reverse lookup from slot to field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSlots {
    fields: Vec<String>,
    by_slot: Vec<Option<usize>>,
}

impl FieldSlots {
    /// `slot_count` is the number of connection slots the shape exposes.
    pub fn new(fields: Vec<String>, slot_count: usize, layout: &SlotLayout) -> Self {
        let by_slot = (0..slot_count)
            .map(|slot| layout.field_index(slot).filter(|&i| i < fields.len()))
            .collect();
        Self { fields, by_slot }
    }

    pub fn field_index(&self, slot: usize) -> Option<usize> {
        self.by_slot.get(slot).copied().flatten()
    }

    pub fn field(&self, slot: usize) -> Option<&str> {
        self.field_index(slot).map(|i| self.fields[i].as_str())
    }
}
