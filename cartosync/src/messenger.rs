use maybe_sync::{MaybeSend, MaybeSync};

/// Notifies the host application that the layer set changed and its declarative tree should be
/// evaluated again.
///
/// The map calls the messenger while it is in the middle of an operation, so the implementation
/// must only schedule the re-evaluation and never run it synchronously.
pub trait Messenger: MaybeSend + MaybeSync {
    /// Requests a new evaluation pass of the host tree.
    fn request_refresh(&self);
}

impl<F: Fn() + MaybeSend + MaybeSync> Messenger for F {
    fn request_refresh(&self) {
        self()
    }
}
