//! Device connection state machine
//!
//! Per-instance Disconnected ⇄ Connected transitions over the vendor SDK
//! traits. All operations here run on the host's dispatch thread; the
//! single device mutex they share with the acquisition worker is what keeps
//! disconnect/identify from overlapping an in-flight poll cycle.

use crate::host::Host;
use crate::registry::{DeviceRegistry, RegistryError};
use sensel_sdk::{
    ContactMask, DeviceInfo, FirmwareInfo, FrameContent, RawFrame, SdkError, SenselApi,
    SenselDevice, SensorInfo,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Error type for connection operations
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("already connected, disconnect first")]
    AlreadyConnected,

    #[error("no device connected")]
    NotConnected,

    #[error("device '{0}' is in use by another instance")]
    DeviceBusy(String),

    #[error("device '{0}' not found")]
    DeviceNotFound(String),

    #[error("no Sensel device found")]
    NoDevicesFound,

    #[error("all Sensel devices are in use")]
    AllDevicesBusy,

    #[error("device registry is full")]
    RegistryFull,

    #[error(transparent)]
    Sdk(#[from] sensel_sdk::SdkError),
}

impl From<RegistryError> for ConnectionError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::Busy(serial) => ConnectionError::DeviceBusy(serial),
            RegistryError::Full => ConnectionError::RegistryFull,
        }
    }
}

/// Everything owned while Connected
///
/// The frame buffer lives and dies with the connection; the handle is
/// closed exactly once, at disconnect.
pub(crate) struct ActiveConnection {
    pub serial: String,
    pub device: Box<dyn SenselDevice>,
    pub sensor: SensorInfo,
    pub frame: RawFrame,
}

/// State shared between the host-thread operations and the worker
///
/// `device` is both the connected-state store and the cycle mutex: whoever
/// holds it may touch the hardware. `connected` mirrors `device.is_some()`
/// so `bang`/`poll` can check state without ever blocking on the mutex.
pub(crate) struct Shared {
    pub device: Mutex<Option<ActiveConnection>>,
    pub connected: AtomicBool,
    pub shutdown: AtomicBool,
}

impl Shared {
    pub fn new() -> Self {
        Self {
            device: Mutex::new(None),
            connected: AtomicBool::new(false),
            shutdown: AtomicBool::new(false),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    pub(crate) fn lock_device(&self) -> MutexGuard<'_, Option<ActiveConnection>> {
        self.device.lock().expect("device mutex poisoned")
    }
}

/// Per-instance connection manager
pub(crate) struct ConnectionManager {
    shared: Arc<Shared>,
    registry: Arc<DeviceRegistry>,
    sdk: Arc<dyn SenselApi>,
    host: Arc<dyn Host>,
}

impl ConnectionManager {
    pub fn new(
        shared: Arc<Shared>,
        registry: Arc<DeviceRegistry>,
        sdk: Arc<dyn SenselApi>,
        host: Arc<dyn Host>,
    ) -> Self {
        Self {
            shared,
            registry,
            sdk,
            host,
        }
    }

    /// Connect to the device with the given serial number
    pub fn connect_by_serial(&self, serial: &str) -> Result<(), ConnectionError> {
        let mut guard = self.shared.lock_device();
        if guard.is_some() {
            return Err(ConnectionError::AlreadyConnected);
        }
        if self.registry.is_claimed(serial) {
            return Err(ConnectionError::DeviceBusy(serial.to_string()));
        }

        let devices = self.sdk.enumerate()?;
        let info = devices
            .iter()
            .find(|d| d.serial == serial)
            .ok_or_else(|| ConnectionError::DeviceNotFound(serial.to_string()))?;

        self.open_into(info, &mut guard)
    }

    /// Connect to the first enumerated device not claimed elsewhere
    pub fn discover(&self) -> Result<(), ConnectionError> {
        let mut guard = self.shared.lock_device();
        if guard.is_some() {
            return Err(ConnectionError::AlreadyConnected);
        }

        let devices = self.sdk.enumerate()?;
        if devices.is_empty() {
            return Err(ConnectionError::NoDevicesFound);
        }
        let info = devices
            .iter()
            .find(|d| !self.registry.is_claimed(&d.serial))
            .ok_or(ConnectionError::AllDevicesBusy)?;

        self.open_into(info, &mut guard)
    }

    /// Open, configure, claim, and transition; no partial state on failure
    fn open_into(
        &self,
        info: &DeviceInfo,
        guard: &mut MutexGuard<'_, Option<ActiveConnection>>,
    ) -> Result<(), ConnectionError> {
        let mut device = self.sdk.open(info)?;

        // Once open succeeds, every failure path must close the handle or
        // the device stays claimed vendor-side.
        let (firmware, sensor) = match Self::configure(device.as_mut()) {
            Ok(v) => v,
            Err(e) => {
                let _ = device.close();
                return Err(e.into());
            }
        };
        let frame = RawFrame::for_sensor(&sensor);

        if let Err(e) = self.registry.claim(&info.serial) {
            let _ = device.close();
            return Err(e.into());
        }

        log::info!("sensel: connected to device {}", info.serial);
        log::info!("sensel: firmware version {firmware}");
        log::info!(
            "sensel: sensor {}mm x {}mm, {} cols, {} rows",
            sensor.width,
            sensor.height,
            sensor.num_cols,
            sensor.num_rows
        );

        **guard = Some(ActiveConnection {
            serial: info.serial.clone(),
            device,
            sensor,
            frame,
        });
        self.shared.connected.store(true, Ordering::Release);
        self.host.send_status(1.0);
        Ok(())
    }

    /// Fetch connect-time device info and select frame/contact content
    fn configure(device: &mut dyn SenselDevice) -> Result<(FirmwareInfo, SensorInfo), SdkError> {
        let firmware = device.firmware_info()?;
        let sensor = device.sensor_info()?;
        device.set_frame_content(FrameContent::CONTACTS)?;
        // The record carries ellipse/delta/bbox/peak fields, so ask the
        // sensor for all of them.
        device.set_contacts_mask(ContactMask::ALL)?;
        Ok((firmware, sensor))
    }

    /// Close the device and release the claim
    ///
    /// Taking the device mutex waits out any in-flight worker cycle, so the
    /// handle is never closed under the worker.
    pub fn disconnect(&self) -> Result<(), ConnectionError> {
        let mut guard = self.shared.lock_device();
        let conn = guard.take().ok_or(ConnectionError::NotConnected)?;
        self.shared.connected.store(false, Ordering::Release);

        if let Err(e) = conn.device.close() {
            log::warn!("sensel: error closing device {}: {e}", conn.serial);
        }
        self.registry.release(&conn.serial);
        log::info!("sensel: disconnected from device {}", conn.serial);
        self.host.send_status(0.0);
        Ok(())
    }

    /// Log every discoverable device serial, claimed or not
    ///
    /// Holds the device mutex for the whole enumeration: overlapping
    /// enumerate with a poll cycle is unsafe on some platforms.
    pub fn identify(&self) -> Result<(), ConnectionError> {
        let _guard = self.shared.lock_device();
        let devices = self.sdk.enumerate()?;
        if devices.is_empty() {
            log::info!("sensel: no devices found");
            return Ok(());
        }
        log::info!("sensel: {} device(s) found:", devices.len());
        for info in &devices {
            log::info!("sensel:   {}", info.serial);
        }
        Ok(())
    }

    /// Serial of the connected device, if any (for diagnostics)
    pub fn connected_serial(&self) -> Option<String> {
        self.shared.lock_device().as_ref().map(|c| c.serial.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sensel_sdk::mock::MockSensel;

    struct NullHost {
        status: Mutex<Vec<f32>>,
    }

    impl NullHost {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                status: Mutex::new(Vec::new()),
            })
        }
    }

    impl Host for NullHost {
        fn send_contacts(&self, _values: &[f32]) {}
        fn send_status(&self, value: f32) {
            self.status.lock().unwrap().push(value);
        }
        fn request_drain(&self) {}
    }

    fn manager(sdk: &MockSensel, registry: &Arc<DeviceRegistry>) -> (ConnectionManager, Arc<NullHost>) {
        let host = NullHost::new();
        let mgr = ConnectionManager::new(
            Arc::new(Shared::new()),
            registry.clone(),
            Arc::new(sdk.clone()),
            host.clone(),
        );
        (mgr, host)
    }

    #[test]
    fn test_connect_disconnect_roundtrip() {
        let sdk = MockSensel::new();
        sdk.add_device("SM-001");
        let registry = Arc::new(DeviceRegistry::new());
        let (mgr, host) = manager(&sdk, &registry);

        mgr.connect_by_serial("SM-001").unwrap();
        assert!(registry.is_claimed("SM-001"));
        assert_eq!(mgr.connected_serial().as_deref(), Some("SM-001"));
        assert_eq!(sdk.frame_content(), Some(FrameContent::CONTACTS));
        assert_eq!(sdk.contacts_mask(), Some(ContactMask::ALL));

        mgr.disconnect().unwrap();
        assert!(!registry.is_claimed("SM-001"));
        assert_eq!(sdk.closed_serials(), vec!["SM-001".to_string()]);
        assert_eq!(*host.status.lock().unwrap(), vec![1.0, 0.0]);
    }

    #[test]
    fn test_connect_while_connected_is_rejected() {
        let sdk = MockSensel::new();
        sdk.add_device("SM-001");
        sdk.add_device("SM-002");
        let registry = Arc::new(DeviceRegistry::new());
        let (mgr, _host) = manager(&sdk, &registry);

        mgr.connect_by_serial("SM-001").unwrap();
        assert!(matches!(
            mgr.connect_by_serial("SM-002"),
            Err(ConnectionError::AlreadyConnected)
        ));
        assert!(matches!(
            mgr.discover(),
            Err(ConnectionError::AlreadyConnected)
        ));
        // State unchanged, no double open
        assert_eq!(mgr.connected_serial().as_deref(), Some("SM-001"));
        assert_eq!(sdk.open_serials(), vec!["SM-001".to_string()]);
    }

    #[test]
    fn test_serial_exclusive_across_instances() {
        let sdk = MockSensel::new();
        sdk.add_device("SM-001");
        let registry = Arc::new(DeviceRegistry::new());
        let (first, _) = manager(&sdk, &registry);
        let (second, _) = manager(&sdk, &registry);

        first.connect_by_serial("SM-001").unwrap();
        assert!(matches!(
            second.connect_by_serial("SM-001"),
            Err(ConnectionError::DeviceBusy(_))
        ));

        // Released claim is immediately reusable
        first.disconnect().unwrap();
        second.connect_by_serial("SM-001").unwrap();
    }

    #[test]
    fn test_discover_skips_claimed_device() {
        let sdk = MockSensel::new();
        sdk.add_device("SM-001");
        sdk.add_device("SM-002");
        let registry = Arc::new(DeviceRegistry::new());
        let (first, _) = manager(&sdk, &registry);
        let (second, _) = manager(&sdk, &registry);

        first.connect_by_serial("SM-001").unwrap();
        second.discover().unwrap();
        assert_eq!(second.connected_serial().as_deref(), Some("SM-002"));
    }

    #[test]
    fn test_discover_error_cases() {
        let sdk = MockSensel::new();
        let registry = Arc::new(DeviceRegistry::new());
        let (mgr, _) = manager(&sdk, &registry);

        assert!(matches!(
            mgr.discover(),
            Err(ConnectionError::NoDevicesFound)
        ));
        assert!(mgr.connected_serial().is_none());

        sdk.add_device("SM-001");
        let (other, _) = manager(&sdk, &registry);
        other.connect_by_serial("SM-001").unwrap();
        assert!(matches!(
            mgr.discover(),
            Err(ConnectionError::AllDevicesBusy)
        ));
    }

    #[test]
    fn test_connect_unknown_serial() {
        let sdk = MockSensel::new();
        sdk.add_device("SM-001");
        let registry = Arc::new(DeviceRegistry::new());
        let (mgr, host) = manager(&sdk, &registry);

        assert!(matches!(
            mgr.connect_by_serial("SM-999"),
            Err(ConnectionError::DeviceNotFound(_))
        ));
        // Failed connect leaves no claim, no handle, no status signal
        assert!(registry.is_empty());
        assert!(sdk.open_serials().is_empty());
        assert!(host.status.lock().unwrap().is_empty());
    }

    #[test]
    fn test_failed_configure_closes_handle() {
        let sdk = MockSensel::new();
        sdk.add_device("SM-001");
        let registry = Arc::new(DeviceRegistry::new());
        let (mgr, host) = manager(&sdk, &registry);

        sdk.fail_next_configure();
        assert!(matches!(
            mgr.connect_by_serial("SM-001"),
            Err(ConnectionError::Sdk(_))
        ));

        // The opened handle was closed on the way out; no claim, no status,
        // no lingering open
        assert_eq!(sdk.closed_serials(), vec!["SM-001".to_string()]);
        assert!(sdk.open_serials().is_empty());
        assert!(registry.is_empty());
        assert!(host.status.lock().unwrap().is_empty());
        assert!(mgr.connected_serial().is_none());

        // The device is immediately connectable again
        mgr.connect_by_serial("SM-001").unwrap();
    }

    #[test]
    fn test_disconnect_when_not_connected() {
        let sdk = MockSensel::new();
        let registry = Arc::new(DeviceRegistry::new());
        let (mgr, _) = manager(&sdk, &registry);
        assert!(matches!(
            mgr.disconnect(),
            Err(ConnectionError::NotConnected)
        ));
    }

    #[test]
    fn test_identify_enumerates_without_state_change() {
        let sdk = MockSensel::new();
        sdk.add_device("SM-001");
        let registry = Arc::new(DeviceRegistry::new());
        let (mgr, _) = manager(&sdk, &registry);

        mgr.identify().unwrap();
        assert_eq!(sdk.enumerate_calls(), 1);
        assert!(mgr.connected_serial().is_none());
        assert!(registry.is_empty());
    }
}
