//! Data types mirroring the vendor SDK structs
//!
//! Field sets follow the vendor's `SenselDeviceID`, `SenselSensorInfo`,
//! `SenselFirmwareInfo` and `SenselContact` structs, with C fixed-width
//! types mapped to their natural Rust counterparts.

/// Maximum number of devices the vendor SDK can enumerate at once.
///
/// Also bounds the plugin's claimed-device registry.
pub const MAX_DEVICES: usize = 16;

/// One entry from device enumeration
///
/// Immutable once obtained; the serial number is the identity used for
/// claiming, the index is the vendor's opaque open handle key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Device serial number
    pub serial: String,
    /// Vendor-assigned enumeration index (opaque, only valid for open)
    pub idx: u8,
}

/// Sensor geometry, fetched once per connection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorInfo {
    /// Active area width in millimeters
    pub width: f32,
    /// Active area height in millimeters
    pub height: f32,
    /// Sensor element columns
    pub num_cols: u16,
    /// Sensor element rows
    pub num_rows: u16,
}

/// Firmware version reported by an open device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirmwareInfo {
    pub major: u8,
    pub minor: u8,
    pub build: u16,
}

impl std::fmt::Display for FirmwareInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.build)
    }
}

/// Frame content selection mask (what the sensor reports per frame)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameContent(pub u8);

impl FrameContent {
    /// Per-element pressure map
    pub const PRESSURE: FrameContent = FrameContent(0x01);
    /// Per-element label map
    pub const LABELS: FrameContent = FrameContent(0x02);
    /// Decoded contact list (the only content this plugin uses)
    pub const CONTACTS: FrameContent = FrameContent(0x04);
    /// Accelerometer sample
    pub const ACCEL: FrameContent = FrameContent(0x08);
}

/// Per-contact field group visibility mask
///
/// Groups beyond position/force are opt-in on the sensor; the plugin
/// enables all of them since the emitted record carries every field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactMask(pub u8);

impl ContactMask {
    /// Orientation and major/minor axes
    pub const ELLIPSE: ContactMask = ContactMask(0x01);
    /// Positional/force/area deltas
    pub const DELTAS: ContactMask = ContactMask(0x02);
    /// Bounding box min/max
    pub const BOUNDING_BOX: ContactMask = ContactMask(0x04);
    /// Peak position and force
    pub const PEAK: ContactMask = ContactMask(0x08);
    /// Every optional field group
    pub const ALL: ContactMask = ContactMask(0x0F);
}

/// One detected touch point as reported by the vendor SDK
///
/// All distances are millimeters, forces are grams, area is square
/// millimeters, orientation is degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RawContact {
    pub orientation: f32,
    pub major_axis: f32,
    pub minor_axis: f32,
    pub delta_x: f32,
    pub delta_y: f32,
    pub delta_force: f32,
    pub delta_area: f32,
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
    pub peak_x: f32,
    pub peak_y: f32,
    pub peak_force: f32,
    pub x_pos: f32,
    pub y_pos: f32,
    pub total_force: f32,
    pub area: f32,
}

/// One hardware sample snapshot, zero or more contacts
///
/// Acts as the reusable frame buffer the vendor SDK fills on each
/// `read_frame` call. Allocated once at connect time, released with the
/// connection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawFrame {
    /// Contacts in the order the sensor reported them
    pub contacts: Vec<RawContact>,
}

impl RawFrame {
    /// Allocate a frame buffer sized for the given sensor
    ///
    /// The Morph tracks at most 16 simultaneous contacts regardless of
    /// geometry, so the capacity is fixed; geometry is accepted to keep the
    /// allocation tied to an open connection.
    pub fn for_sensor(_info: &SensorInfo) -> Self {
        RawFrame {
            contacts: Vec::with_capacity(16),
        }
    }
}
