//! SDK access traits
//!
//! Two seams: [`SenselApi`] for process-level enumeration and open, and
//! [`SenselDevice`] for everything done with an open handle. The plugin core
//! only ever talks to these traits, never to the vendor library directly.

use crate::types::{ContactMask, DeviceInfo, FirmwareInfo, FrameContent, RawFrame, SensorInfo};

/// Error type for vendor SDK operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum SdkError {
    #[error("failed to enumerate devices: {0}")]
    EnumerationFailed(String),

    #[error("failed to open device '{serial}': {reason}")]
    OpenFailed { serial: String, reason: String },

    #[error("sensor read failed: {0}")]
    ReadFailed(String),

    #[error("SDK call failed: {0}")]
    Api(String),

    #[error("device handle is closed")]
    Closed,
}

/// Process-level SDK entry points: enumeration and open
///
/// Shared by every plugin instance, hence `Send + Sync`. Enumeration is
/// side-effect-free from the caller's point of view but does touch the
/// hardware bus, so callers must not overlap it with an in-flight poll
/// cycle on the same device.
pub trait SenselApi: Send + Sync {
    /// List all currently discoverable devices, claimed or not
    fn enumerate(&self) -> Result<Vec<DeviceInfo>, SdkError>;

    /// Open a device from an enumeration entry
    fn open(&self, info: &DeviceInfo) -> Result<Box<dyn SenselDevice>, SdkError>;
}

/// Operations on one open device handle
///
/// Exclusively owned by the instance that opened it. All calls are
/// synchronous and assumed bounded in latency by the vendor; there is no
/// timeout layer on top.
pub trait SenselDevice: Send {
    /// Sensor geometry (fetched from the handle, stable for its lifetime)
    fn sensor_info(&self) -> Result<SensorInfo, SdkError>;

    /// Firmware version of the connected device
    fn firmware_info(&self) -> Result<FirmwareInfo, SdkError>;

    /// Select what the sensor reports per frame
    fn set_frame_content(&mut self, content: FrameContent) -> Result<(), SdkError>;

    /// Select which optional per-contact field groups are populated
    fn set_contacts_mask(&mut self, mask: ContactMask) -> Result<(), SdkError>;

    /// Begin a scanning period; frames accumulate until `stop_scanning`
    fn start_scanning(&mut self) -> Result<(), SdkError>;

    /// End the current scanning period
    fn stop_scanning(&mut self) -> Result<(), SdkError>;

    /// Pull all buffered samples from the device into the SDK-side buffer
    fn read_sensor(&mut self) -> Result<(), SdkError>;

    /// Number of decoded frames available after the last `read_sensor`
    fn available_frames(&mut self) -> Result<u32, SdkError>;

    /// Copy the next available frame into the caller's frame buffer
    fn read_frame(&mut self, frame: &mut RawFrame) -> Result<(), SdkError>;

    /// Close the handle, releasing vendor-side resources
    fn close(self: Box<Self>) -> Result<(), SdkError>;
}
