//! Contact decoding
//!
//! Pure transform from a raw sensor frame to the ordered contact records
//! the object emits. No hidden state: the same frame always decodes to the
//! same sequence.

use sensel_sdk::RawFrame;
use serde::{Deserialize, Serialize};

/// Outlet list schema selection
///
/// Earlier revisions of the external emitted 18 values (no leading contact
/// index); the canonical shape is 19. Decoding always produces the full
/// record, the schema only controls flattening at the outlet boundary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactSchema {
    /// 19 values, leading contact index
    #[default]
    Full,
    /// 18 values, contact index dropped
    Legacy,
}

impl ContactSchema {
    /// Number of values in one outlet list
    pub fn arity(&self) -> usize {
        match self {
            ContactSchema::Full => 19,
            ContactSchema::Legacy => 18,
        }
    }
}

/// One decoded touch point, ready for emission
///
/// Field order matches the emitted list. Contacts are numbered from 1 in
/// the order the sensor reported them within a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactRecord {
    /// 1-based position of this contact within its frame
    pub index: u32,
    pub orientation: f32,
    pub major_axis: f32,
    pub minor_axis: f32,
    pub dx: f32,
    pub dy: f32,
    pub delta_force: f32,
    pub delta_area: f32,
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
    pub peak_x: f32,
    pub peak_y: f32,
    pub peak_force: f32,
    pub x: f32,
    pub y: f32,
    pub total_force: f32,
    pub area: f32,
}

impl ContactRecord {
    /// Flatten to the outlet list shape selected by the schema
    pub fn to_list(&self, schema: ContactSchema) -> Vec<f32> {
        let mut values = Vec::with_capacity(schema.arity());
        if schema == ContactSchema::Full {
            values.push(self.index as f32);
        }
        values.extend_from_slice(&[
            self.orientation,
            self.major_axis,
            self.minor_axis,
            self.dx,
            self.dy,
            self.delta_force,
            self.delta_area,
            self.min_x,
            self.min_y,
            self.max_x,
            self.max_y,
            self.peak_x,
            self.peak_y,
            self.peak_force,
            self.x,
            self.y,
            self.total_force,
            self.area,
        ]);
        values
    }
}

/// Decode one raw frame into ordered contact records
///
/// A frame with zero contacts decodes to an empty sequence; emission policy
/// for that case lives in the object, not here.
pub fn decode_frame(frame: &RawFrame) -> Vec<ContactRecord> {
    frame
        .contacts
        .iter()
        .enumerate()
        .map(|(i, c)| ContactRecord {
            index: (i + 1) as u32,
            orientation: c.orientation,
            major_axis: c.major_axis,
            minor_axis: c.minor_axis,
            dx: c.delta_x,
            dy: c.delta_y,
            delta_force: c.delta_force,
            delta_area: c.delta_area,
            min_x: c.min_x,
            min_y: c.min_y,
            max_x: c.max_x,
            max_y: c.max_y,
            peak_x: c.peak_x,
            peak_y: c.peak_y,
            peak_force: c.peak_force,
            x: c.x_pos,
            y: c.y_pos,
            total_force: c.total_force,
            area: c.area,
        })
        .collect()
}
