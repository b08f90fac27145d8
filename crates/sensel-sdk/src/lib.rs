//! Sensel Morph vendor SDK boundary
//!
//! This crate defines the seam between the plugin core and the vendor's
//! native sensor SDK: plain data types mirroring the vendor structs, plus
//! the [`SenselApi`] (enumeration/open) and [`SenselDevice`] (per-handle
//! operations) traits. A production build implements these traits over the
//! C SDK via FFI; the [`mock`] module provides a scriptable in-memory
//! implementation that the rest of the workspace tests against.
//!
//! The firmware wire protocol itself is deliberately not reimplemented
//! here; everything below `open` is the vendor's problem.

mod device;
mod types;

pub mod mock;

pub use device::{SdkError, SenselApi, SenselDevice};
pub use types::{
    ContactMask, DeviceInfo, FirmwareInfo, FrameContent, RawContact, RawFrame, SensorInfo,
    MAX_DEVICES,
};
