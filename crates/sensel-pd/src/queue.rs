//! Pending-output queue
//!
//! Bridges the acquisition worker's timeline to the host callback's
//! timeline: the worker is the only producer, the host-scheduled drain the
//! only consumer. FIFO, unbounded (polling is host-paced, so depth stays
//! small in practice; no backpressure by design).

use crate::decoder::{ContactRecord, ContactSchema};
use crate::host::Host;
use flume::{Receiver, Sender};

/// Everything one poll cycle produced, in decode order
///
/// Ownership passes to the queue at enqueue and to the drain at dequeue;
/// records are discarded after emission.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingOutput {
    pub records: Vec<ContactRecord>,
}

/// Create the per-instance worker → drain channel
pub fn pending_channel() -> (Sender<PendingOutput>, Receiver<PendingOutput>) {
    flume::unbounded()
}

/// Empty the queue into the host's data outlet, FIFO
///
/// Each record becomes one list message; a cycle with no records (queued
/// only when empty-frame emission is enabled) becomes one empty list.
/// Runs on the host thread.
pub fn drain_into_host(rx: &Receiver<PendingOutput>, host: &dyn Host, schema: ContactSchema) {
    while let Ok(output) = rx.try_recv() {
        if output.records.is_empty() {
            host.send_contacts(&[]);
            continue;
        }
        for record in &output.records {
            host.send_contacts(&record.to_list(schema));
        }
    }
}
