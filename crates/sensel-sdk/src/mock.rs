//! Scriptable in-memory SDK implementation for tests
//!
//! Simulates the vendor SDK without hardware: tests script the device list
//! and the frames each poll cycle returns, and can inject read failures.
//! All handles share one interior-mutable state so a test can keep
//! inspecting call counts after the plugin has taken ownership of the
//! opened device.

use crate::device::{SdkError, SenselApi, SenselDevice};
use crate::types::{
    ContactMask, DeviceInfo, FirmwareInfo, FrameContent, RawContact, RawFrame, SensorInfo,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Geometry reported by every mock device (the Morph's real dimensions)
const MOCK_SENSOR: SensorInfo = SensorInfo {
    width: 240.0,
    height: 139.0,
    num_cols: 185,
    num_rows: 105,
};

const MOCK_FIRMWARE: FirmwareInfo = FirmwareInfo {
    major: 0,
    minor: 19,
    build: 88,
};

#[derive(Default)]
struct MockState {
    devices: Vec<DeviceInfo>,
    /// Scripted poll cycles: each entry is the frames one `read_sensor`
    /// makes available
    cycles: VecDeque<Vec<RawFrame>>,
    fail_next_read: bool,
    fail_next_configure: bool,
    hold_reads: bool,
    open_serials: Vec<String>,
    closed_serials: Vec<String>,
    scan_starts: u32,
    scan_stops: u32,
    enumerate_calls: u32,
    frame_content: Option<FrameContent>,
    contacts_mask: Option<ContactMask>,
}

/// Scriptable mock SDK
///
/// Clones share state, so a test can hold one copy while the plugin holds
/// another behind `Arc<dyn SenselApi>`.
#[derive(Clone, Default)]
pub struct MockSensel {
    state: Arc<Mutex<MockState>>,
}

impl MockSensel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a discoverable device
    pub fn add_device(&self, serial: &str) {
        let mut state = self.state.lock().unwrap();
        let idx = state.devices.len() as u8;
        state.devices.push(DeviceInfo {
            serial: serial.to_string(),
            idx,
        });
    }

    /// Remove all discoverable devices (empty enumeration)
    pub fn clear_devices(&self) {
        self.state.lock().unwrap().devices.clear();
    }

    /// Script the frames returned by the next unscripted `read_sensor`
    ///
    /// Cycles are consumed FIFO; a `read_sensor` with no scripted cycle
    /// yields zero frames.
    pub fn push_cycle(&self, frames: Vec<RawFrame>) {
        self.state.lock().unwrap().cycles.push_back(frames);
    }

    /// Make the next `read_sensor` fail with a hardware read error
    pub fn fail_next_read(&self) {
        self.state.lock().unwrap().fail_next_read = true;
    }

    /// Make the next `set_frame_content` fail (connect-time configure error)
    pub fn fail_next_configure(&self) {
        self.state.lock().unwrap().fail_next_configure = true;
    }

    /// Park every `read_sensor` call until released with `hold_reads(false)`
    ///
    /// Lets a test keep a poll cycle in flight while it does something
    /// else, e.g. fire more triggers at the worker.
    pub fn hold_reads(&self, hold: bool) {
        self.state.lock().unwrap().hold_reads = hold;
    }

    /// Serials of currently open (not yet closed) handles
    pub fn open_serials(&self) -> Vec<String> {
        self.state.lock().unwrap().open_serials.clone()
    }

    /// Serials whose handles have been closed
    pub fn closed_serials(&self) -> Vec<String> {
        self.state.lock().unwrap().closed_serials.clone()
    }

    pub fn scan_starts(&self) -> u32 {
        self.state.lock().unwrap().scan_starts
    }

    pub fn scan_stops(&self) -> u32 {
        self.state.lock().unwrap().scan_stops
    }

    pub fn enumerate_calls(&self) -> u32 {
        self.state.lock().unwrap().enumerate_calls
    }

    /// Frame content mask set by the plugin at connect, if any
    pub fn frame_content(&self) -> Option<FrameContent> {
        self.state.lock().unwrap().frame_content
    }

    /// Contact field mask set by the plugin at connect, if any
    pub fn contacts_mask(&self) -> Option<ContactMask> {
        self.state.lock().unwrap().contacts_mask
    }

    /// Build a contact with the three fields most tests care about;
    /// everything else stays zero
    pub fn contact(x: f32, y: f32, force: f32) -> RawContact {
        RawContact {
            x_pos: x,
            y_pos: y,
            total_force: force,
            ..RawContact::default()
        }
    }

    /// Build a frame from contacts
    pub fn frame(contacts: Vec<RawContact>) -> RawFrame {
        RawFrame { contacts }
    }
}

impl SenselApi for MockSensel {
    fn enumerate(&self) -> Result<Vec<DeviceInfo>, SdkError> {
        let mut state = self.state.lock().unwrap();
        state.enumerate_calls += 1;
        Ok(state.devices.clone())
    }

    fn open(&self, info: &DeviceInfo) -> Result<Box<dyn SenselDevice>, SdkError> {
        let mut state = self.state.lock().unwrap();
        if !state.devices.iter().any(|d| d.serial == info.serial) {
            return Err(SdkError::OpenFailed {
                serial: info.serial.clone(),
                reason: "no such device".to_string(),
            });
        }
        state.open_serials.push(info.serial.clone());
        Ok(Box::new(MockDevice {
            serial: info.serial.clone(),
            state: self.state.clone(),
            available: VecDeque::new(),
            closed: false,
        }))
    }
}

/// One open mock handle
struct MockDevice {
    serial: String,
    state: Arc<Mutex<MockState>>,
    /// Frames made available by the last `read_sensor`
    available: VecDeque<RawFrame>,
    closed: bool,
}

impl MockDevice {
    fn check_open(&self) -> Result<(), SdkError> {
        if self.closed {
            Err(SdkError::Closed)
        } else {
            Ok(())
        }
    }
}

impl SenselDevice for MockDevice {
    fn sensor_info(&self) -> Result<SensorInfo, SdkError> {
        self.check_open()?;
        Ok(MOCK_SENSOR)
    }

    fn firmware_info(&self) -> Result<FirmwareInfo, SdkError> {
        self.check_open()?;
        Ok(MOCK_FIRMWARE)
    }

    fn set_frame_content(&mut self, content: FrameContent) -> Result<(), SdkError> {
        self.check_open()?;
        let mut state = self.state.lock().unwrap();
        if state.fail_next_configure {
            state.fail_next_configure = false;
            return Err(SdkError::Api("simulated configure error".to_string()));
        }
        state.frame_content = Some(content);
        Ok(())
    }

    fn set_contacts_mask(&mut self, mask: ContactMask) -> Result<(), SdkError> {
        self.check_open()?;
        self.state.lock().unwrap().contacts_mask = Some(mask);
        Ok(())
    }

    fn start_scanning(&mut self) -> Result<(), SdkError> {
        self.check_open()?;
        self.state.lock().unwrap().scan_starts += 1;
        Ok(())
    }

    fn stop_scanning(&mut self) -> Result<(), SdkError> {
        self.check_open()?;
        self.state.lock().unwrap().scan_stops += 1;
        Ok(())
    }

    fn read_sensor(&mut self) -> Result<(), SdkError> {
        self.check_open()?;
        loop {
            {
                let mut state = self.state.lock().unwrap();
                if !state.hold_reads {
                    if state.fail_next_read {
                        state.fail_next_read = false;
                        return Err(SdkError::ReadFailed("simulated I/O error".to_string()));
                    }
                    if let Some(frames) = state.cycles.pop_front() {
                        self.available.extend(frames);
                    }
                    return Ok(());
                }
            }
            // Held: park outside the state lock so the test can keep
            // inspecting and release.
            std::thread::sleep(std::time::Duration::from_millis(1));
        }
    }

    fn available_frames(&mut self) -> Result<u32, SdkError> {
        self.check_open()?;
        Ok(self.available.len() as u32)
    }

    fn read_frame(&mut self, frame: &mut RawFrame) -> Result<(), SdkError> {
        self.check_open()?;
        match self.available.pop_front() {
            Some(next) => {
                frame.contacts.clear();
                frame.contacts.extend(next.contacts);
                Ok(())
            }
            None => Err(SdkError::ReadFailed("no frame available".to_string())),
        }
    }

    fn close(mut self: Box<Self>) -> Result<(), SdkError> {
        self.check_open()?;
        self.closed = true;
        let mut state = self.state.lock().unwrap();
        state.open_serials.retain(|s| s != &self.serial);
        state.closed_serials.push(self.serial.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enumerate_and_open() {
        let sdk = MockSensel::new();
        sdk.add_device("SM-001");
        sdk.add_device("SM-002");

        let devices = sdk.enumerate().unwrap();
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].serial, "SM-001");
        assert_eq!(devices[1].idx, 1);

        let device = sdk.open(&devices[0]).unwrap();
        assert_eq!(sdk.open_serials(), vec!["SM-001".to_string()]);

        device.close().unwrap();
        assert!(sdk.open_serials().is_empty());
        assert_eq!(sdk.closed_serials(), vec!["SM-001".to_string()]);
    }

    #[test]
    fn test_scripted_cycles_consumed_fifo() {
        let sdk = MockSensel::new();
        sdk.add_device("SM-001");
        sdk.push_cycle(vec![MockSensel::frame(vec![MockSensel::contact(
            1.0, 2.0, 3.0,
        )])]);
        sdk.push_cycle(vec![]);

        let devices = sdk.enumerate().unwrap();
        let mut device = sdk.open(&devices[0]).unwrap();
        let mut frame = RawFrame::default();

        device.read_sensor().unwrap();
        assert_eq!(device.available_frames().unwrap(), 1);
        device.read_frame(&mut frame).unwrap();
        assert_eq!(frame.contacts.len(), 1);
        assert_eq!(frame.contacts[0].total_force, 3.0);

        // Second scripted cycle is empty, third is unscripted; both yield
        // zero frames.
        device.read_sensor().unwrap();
        assert_eq!(device.available_frames().unwrap(), 0);
        device.read_sensor().unwrap();
        assert_eq!(device.available_frames().unwrap(), 0);
    }

    #[test]
    fn test_injected_read_failure_is_one_shot() {
        let sdk = MockSensel::new();
        sdk.add_device("SM-001");
        sdk.fail_next_read();

        let devices = sdk.enumerate().unwrap();
        let mut device = sdk.open(&devices[0]).unwrap();

        assert!(device.read_sensor().is_err());
        assert!(device.read_sensor().is_ok());
    }

    #[test]
    fn test_open_unknown_serial_fails() {
        let sdk = MockSensel::new();
        let result = sdk.open(&DeviceInfo {
            serial: "nope".to_string(),
            idx: 0,
        });
        assert!(matches!(result, Err(SdkError::OpenFailed { .. })));
    }
}
