//! Sensel Morph object core for a dataflow audio host
//!
//! This crate provides:
//! - Per-instance device connection management over the `sensel-sdk` traits
//! - A process-wide registry preventing double-connection to one device
//! - A dedicated acquisition thread per instance (poll → decode → enqueue)
//! - A FIFO hand-off queue drained on a host-scheduled tick
//! - Pure contact decoding into fixed-arity outlet lists
//!
//! # Architecture
//!
//! ```text
//! host message ──► SenselObject ──┬─► ConnectionManager ─► vendor SDK
//!        (bang/poll)              └─► wake latch ─► acquisition thread
//!                                                         │ read + decode
//!                                 pending queue ◄─────────┘
//!        host tick ──► drain ─────────┴─► data outlet (one list/contact)
//! ```
//!
//! The host dispatch thread never blocks on the worker: `bang`/`poll` latch
//! a wake signal and return; the worker pushes decoded cycles into the
//! queue and asks the host for a zero-delay callback, which empties the
//! queue on the host's own thread.

mod config;
mod connection;
mod decoder;
mod host;
mod object;
mod queue;
mod registry;
mod worker;

pub use config::{default_config_path, load_config, SenselConfig};
pub use connection::ConnectionError;
pub use decoder::{decode_frame, ContactRecord, ContactSchema};
pub use host::Host;
pub use object::{CreationArg, SenselObject, SenselPlugin};
pub use queue::PendingOutput;
pub use registry::{DeviceRegistry, RegistryError};
