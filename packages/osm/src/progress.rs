//! Progress reporting for passes over an extract.
//!
//! The size of a streamed extract is unknown until it has been read, so
//! progress is reported as a running element count rather than a fraction.
//! Rendering lives in the binaries; library code only talks to the
//! [`ProgressCallback`] trait.

use std::sync::Arc;

/// Receives progress updates from a pass over an extract.
pub trait ProgressCallback: Send + Sync {
    /// Advance the element count by `delta`.
    fn inc(&self, delta: u64);

    /// Replace the message shown next to the counter.
    fn set_message(&self, msg: String);

    /// Mark the pass as complete with a final message.
    fn finish(&self, msg: String);

    /// Mark the pass as complete and remove the indicator.
    fn finish_and_clear(&self);
}

/// Ignores every update. Used by tests and library callers that do not
/// render progress.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
    fn finish_and_clear(&self) {}
}

/// Returns a shared [`NullProgress`].
#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}
