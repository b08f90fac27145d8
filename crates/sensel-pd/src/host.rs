//! Host runtime boundary
//!
//! The dataflow host (outlets, scheduler) is a pre-existing native runtime;
//! this trait is the whole surface the device core needs from it. A real
//! deployment implements it over the host's C API; tests implement it with
//! plain vectors.

/// Outlet and scheduler access provided by the host adapter
///
/// `send_*` must only be called from the host's dispatch thread (the drain
/// and the connection operations run there). `request_drain` is called from
/// the acquisition worker and must be safe from any thread: it asks the
/// host to run the object's drain callback on the next scheduler tick
/// (a zero-delay clock in Pd terms).
pub trait Host: Send + Sync {
    /// Emit one contact as a fixed-arity list on the data outlet
    fn send_contacts(&self, values: &[f32]);

    /// Emit connection state on the status outlet (1.0 connected, 0.0 not)
    fn send_status(&self, value: f32);

    /// Schedule the object's drain callback on the host thread, delay zero
    fn request_drain(&self);
}
