//! Internal stack of cleanup handles with LIFO release.

use crate::error::CleanupFailure;
use crate::options::CleanupPolicy;
use crate::traits::CleanupHandle;

/// Cleanup handles in construction order, released last-in first-out.
///
/// Each handle is tagged with the field whose producer returned it so
/// failures can be attributed.
#[derive(Default)]
pub(crate) struct ReleaseStack {
    handles: Vec<(String, Box<dyn CleanupHandle>)>,
}

impl ReleaseStack {
    /// Add a handle for `field`.
    pub(crate) fn push(&mut self, field: &str, handle: Box<dyn CleanupHandle>) {
        self.handles.push((field.to_string(), handle));
    }

    /// Release every handle in reverse order (LIFO).
    ///
    /// Under [`CleanupPolicy::DrainAll`] every handle runs and all failures
    /// are collected. Under [`CleanupPolicy::StopOnFirstError`] the first
    /// failure ends the drain and the remaining handles are dropped without
    /// being released.
    pub(crate) fn release_all_reverse(&mut self, policy: CleanupPolicy) -> Vec<CleanupFailure> {
        let mut failures = Vec::new();
        while let Some((field, handle)) = self.handles.pop() {
            tracing::trace!(field = %field, "releasing");
            if let Err(error) = handle.release() {
                tracing::warn!(field = %field, error = %error, "cleanup failed");
                failures.push(CleanupFailure { field, error });
                if policy == CleanupPolicy::StopOnFirstError {
                    if !self.is_empty() {
                        tracing::warn!(
                            skipped = self.handles.len(),
                            "stopping teardown after first cleanup failure"
                        );
                    }
                    self.handles.clear();
                    break;
                }
            }
        }
        failures
    }

    /// Number of handles still waiting to be released.
    pub(crate) fn len(&self) -> usize {
        self.handles.len()
    }

    /// Check if the stack is empty (nothing left to release).
    pub(crate) fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}
