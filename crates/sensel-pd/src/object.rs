//! The `sensel` object: host-facing dispatch surface
//!
//! One [`SenselObject`] per object box in the patch. The host adapter
//! translates inbound messages (`bang`, `connect <serial>`, `discover`,
//! `disconnect`, `identify`, `poll`) into the methods here, and calls
//! [`SenselObject::drain`] when the scheduler tick requested via
//! [`Host::request_drain`] fires.

use crate::config::SenselConfig;
use crate::connection::{ConnectionError, ConnectionManager, Shared};
use crate::host::Host;
use crate::queue::{self, PendingOutput};
use crate::registry::DeviceRegistry;
use crate::worker::AcquisitionThread;
use flume::Receiver;
use sensel_sdk::SenselApi;
use std::sync::Arc;

/// Creation argument from the object box
///
/// Only feeds the auxiliary patch-introspection output, never the device
/// core. An integer names how many canvas levels to walk up (clamped at
/// zero), a symbol names a remote target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreationArg {
    Depth(u32),
    Remote(String),
}

impl CreationArg {
    /// Parse the first object-box atom; no argument means depth 0
    pub fn parse(arg: Option<&str>) -> Self {
        match arg {
            None | Some("") => CreationArg::Depth(0),
            Some(s) => match s.parse::<i64>() {
                Ok(depth) => CreationArg::Depth(depth.max(0) as u32),
                Err(_) => CreationArg::Remote(s.to_string()),
            },
        }
    }
}

impl Default for CreationArg {
    fn default() -> Self {
        CreationArg::Depth(0)
    }
}

/// Process-scoped plugin state, created once at plugin load
///
/// Owns the claimed-device registry and the SDK entry points shared by
/// every object instance; the host adapter keeps one of these alive for
/// the life of the loaded plugin.
pub struct SenselPlugin {
    registry: Arc<DeviceRegistry>,
    sdk: Arc<dyn SenselApi>,
    config: SenselConfig,
}

impl SenselPlugin {
    pub fn new(sdk: Arc<dyn SenselApi>, config: SenselConfig) -> Self {
        Self {
            registry: Arc::new(DeviceRegistry::new()),
            sdk,
            config,
        }
    }

    /// Instantiate one object (host object-box constructor)
    pub fn instantiate(&self, host: Arc<dyn Host>, arg: CreationArg) -> SenselObject {
        SenselObject::new(
            host,
            self.sdk.clone(),
            self.registry.clone(),
            self.config,
            arg,
        )
    }

    /// The shared registry (exposed for host adapters and tests)
    pub fn registry(&self) -> &Arc<DeviceRegistry> {
        &self.registry
    }
}

/// One `sensel` object instance
pub struct SenselObject {
    arg: CreationArg,
    config: SenselConfig,
    shared: Arc<Shared>,
    manager: ConnectionManager,
    out_rx: Receiver<PendingOutput>,
    host: Arc<dyn Host>,
    // Joined in its own Drop, after the explicit disconnect below.
    worker: AcquisitionThread,
}

impl SenselObject {
    pub fn new(
        host: Arc<dyn Host>,
        sdk: Arc<dyn SenselApi>,
        registry: Arc<DeviceRegistry>,
        config: SenselConfig,
        arg: CreationArg,
    ) -> Self {
        let shared = Arc::new(Shared::new());
        let (out_tx, out_rx) = queue::pending_channel();
        let worker = AcquisitionThread::spawn(
            shared.clone(),
            host.clone(),
            out_tx,
            config.emit_empty_frames,
        );
        let manager = ConnectionManager::new(shared.clone(), registry, sdk, host.clone());

        Self {
            arg,
            config,
            shared,
            manager,
            out_rx,
            host,
            worker,
        }
    }

    /// `connect <serial>` message
    pub fn connect(&self, serial: &str) {
        self.report(self.manager.connect_by_serial(serial));
    }

    /// `discover` message: first unclaimed device wins
    pub fn discover(&self) {
        self.report(self.manager.discover());
    }

    /// `disconnect` message
    pub fn disconnect(&self) {
        self.report(self.manager.disconnect());
    }

    /// `identify` message: log all discoverable serials
    pub fn identify(&self) {
        self.report(self.manager.identify());
    }

    /// `bang` message: trigger one poll cycle
    pub fn bang(&self) {
        self.poll();
    }

    /// `poll` message: trigger one poll cycle
    ///
    /// Never blocks the dispatch thread: checks the connected flag and
    /// latches the wake signal, nothing more.
    pub fn poll(&self) {
        if !self.shared.is_connected() {
            log::info!("sensel: no device connected, send 'connect <serial>' or 'discover' first");
            return;
        }
        self.worker.wake();
    }

    /// Scheduler-tick callback: move queued output onto the outlets
    ///
    /// Host thread only. Emits every pending cycle in FIFO order, one list
    /// per contact.
    pub fn drain(&self) {
        queue::drain_into_host(&self.out_rx, self.host.as_ref(), self.config.schema);
    }

    /// Whether this instance currently holds a device
    pub fn is_connected(&self) -> bool {
        self.shared.is_connected()
    }

    /// Serial of the connected device, if any
    pub fn connected_serial(&self) -> Option<String> {
        self.manager.connected_serial()
    }

    /// The creation argument, for the patch-introspection output path
    pub fn creation_arg(&self) -> &CreationArg {
        &self.arg
    }

    fn report(&self, result: Result<(), ConnectionError>) {
        if let Err(e) = result {
            log::error!("sensel: {e}");
        }
    }
}

impl Drop for SenselObject {
    fn drop(&mut self) {
        // Unconditional teardown: disconnect if connected (releases the
        // claim and signals status), silently tolerate the rest. The worker
        // field's own Drop then joins the thread; no hardware call can
        // follow, the handle is already closed.
        match self.manager.disconnect() {
            Ok(()) | Err(ConnectionError::NotConnected) => {}
            Err(e) => log::warn!("sensel: teardown disconnect failed: {e}"),
        }
    }
}
