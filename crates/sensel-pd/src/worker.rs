//! Acquisition worker thread
//!
//! One dedicated thread per instance for its whole lifetime. It parks on a
//! depth-1 wake channel between cycles; `try_send` on a full channel means
//! a trigger landed mid-cycle and gets latched into the already-pending
//! wake rather than queued. Each cycle runs entirely under the shared
//! device mutex: scan-start, read, decode, scan-stop. Results go out
//! through the pending queue, followed by a drain request to the host.

use crate::connection::{ActiveConnection, Shared};
use crate::decoder::{decode_frame, ContactRecord};
use crate::host::Host;
use crate::queue::PendingOutput;
use flume::{Receiver, Sender, TrySendError};
use sensel_sdk::SdkError;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;

/// Handle to the acquisition thread
///
/// Owns the join handle; dropping it signals shutdown, wakes the thread,
/// and joins before returning. Resources the worker may touch must outlive
/// this handle.
pub(crate) struct AcquisitionThread {
    shared: Arc<Shared>,
    wake_tx: Sender<()>,
    handle: Option<thread::JoinHandle<()>>,
}

impl AcquisitionThread {
    /// Spawn the worker for one instance
    pub fn spawn(
        shared: Arc<Shared>,
        host: Arc<dyn Host>,
        out_tx: Sender<PendingOutput>,
        emit_empty_frames: bool,
    ) -> Self {
        let (wake_tx, wake_rx) = flume::bounded::<()>(1);
        let thread_shared = shared.clone();

        let handle = thread::Builder::new()
            .name("sensel-acquire".into())
            .spawn(move || {
                Self::run(wake_rx, thread_shared, host, out_tx, emit_empty_frames);
            })
            .expect("failed to spawn acquisition thread");

        Self {
            shared,
            wake_tx,
            handle: Some(handle),
        }
    }

    /// Latch a wake signal; non-blocking, coalesces with a pending one
    pub fn wake(&self) {
        match self.wake_tx.try_send(()) {
            Ok(()) | Err(TrySendError::Full(())) => {}
            Err(TrySendError::Disconnected(())) => {
                log::warn!("sensel: acquisition thread is gone, poll dropped");
            }
        }
    }

    fn run(
        wake_rx: Receiver<()>,
        shared: Arc<Shared>,
        host: Arc<dyn Host>,
        out_tx: Sender<PendingOutput>,
        emit_empty_frames: bool,
    ) {
        log::debug!("sensel: acquisition thread started");

        while wake_rx.recv().is_ok() {
            if shared.shutdown.load(Ordering::Acquire) {
                break;
            }

            let records = {
                let mut guard = shared.lock_device();
                match guard.as_mut() {
                    // Disconnected between the trigger and now; idle again.
                    None => continue,
                    Some(conn) => match Self::cycle(conn) {
                        Ok(records) => records,
                        Err(e) => {
                            // Abort this cycle only; the next trigger
                            // retries from a clean state.
                            log::error!("sensel: read cycle failed: {e}");
                            continue;
                        }
                    },
                }
            };

            if records.is_empty() && !emit_empty_frames {
                continue;
            }
            if out_tx.send(PendingOutput { records }).is_err() {
                break;
            }
            host.request_drain();
        }

        log::debug!("sensel: acquisition thread stopped");
    }

    /// One wake-to-idle cycle, caller holds the device mutex
    fn cycle(conn: &mut ActiveConnection) -> Result<Vec<ContactRecord>, SdkError> {
        conn.device.start_scanning()?;
        let result = Self::read_all(conn);
        let stopped = conn.device.stop_scanning();
        let records = result?;
        stopped?;
        Ok(records)
    }

    fn read_all(conn: &mut ActiveConnection) -> Result<Vec<ContactRecord>, SdkError> {
        conn.device.read_sensor()?;
        let available = conn.device.available_frames()?;

        let mut records = Vec::new();
        for _ in 0..available {
            conn.device.read_frame(&mut conn.frame)?;
            records.extend(decode_frame(&conn.frame));
        }
        Ok(records)
    }
}

impl Drop for AcquisitionThread {
    fn drop(&mut self) {
        self.shared.shutdown.store(true, Ordering::Release);
        let _ = self.wake_tx.try_send(());
        if let Some(handle) = self.handle.take() {
            log::debug!("sensel: waiting for acquisition thread to stop");
            let _ = handle.join();
        }
    }
}
