//! Cleanup traits for resource teardown.

use crate::error::BoxError;

/// One-shot release of whatever a producer acquired.
///
/// A handle is returned next to the value it guards (see
/// [`Produced`](crate::Produced)) and is released exactly once when the scope
/// that built the value closes. Handles are released in the reverse order of
/// construction, so a handle can rely on everything its producer depended on
/// still being alive.
///
/// Any `FnOnce() -> Result<(), BoxError> + Send` closure is a handle.
///
/// # Examples
///
/// ```
/// use almond_di::{CleanupHandle, BoxError};
///
/// struct CloseSocket(u16);
///
/// impl CleanupHandle for CloseSocket {
///     fn release(self: Box<Self>) -> Result<(), BoxError> {
///         println!("closing port {}", self.0);
///         Ok(())
///     }
/// }
///
/// let handle: Box<dyn CleanupHandle> = Box::new(CloseSocket(8080));
/// handle.release().unwrap();
/// ```
pub trait CleanupHandle: Send {
    /// Run the cleanup. Consumes the handle.
    fn release(self: Box<Self>) -> Result<(), BoxError>;
}

impl<F> CleanupHandle for F
where
    F: FnOnce() -> Result<(), BoxError> + Send,
{
    fn release(self: Box<Self>) -> Result<(), BoxError> {
        (*self)()
    }
}

/// Trait for values that know how to tear themselves down.
///
/// Implement this for values that need structured teardown (flushing
/// buffers, closing connections) and hand them to
/// [`Produced::with_disposer`](crate::Produced::with_disposer). The value
/// stays shared with the built instance; `dispose` runs when the scope
/// closes.
///
/// # Examples
///
/// ```
/// use almond_di::{Dispose, Produced};
/// use std::sync::Arc;
///
/// struct Cache {
///     name: String,
/// }
///
/// impl Dispose for Cache {
///     fn dispose(&self) {
///         println!("Flushing cache: {}", self.name);
///     }
/// }
///
/// let cache = Arc::new(Cache { name: "user_cache".to_string() });
/// let produced = Produced::shared(cache.clone()).with_disposer(cache);
/// assert!(produced.has_cleanup());
/// ```
pub trait Dispose: Send + Sync + 'static {
    /// Perform synchronous cleanup of resources.
    fn dispose(&self);
}
