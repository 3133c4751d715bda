//! Scoped builds: ordered acquisition and reverse-order release.
//!
//! A [`Scope`] is one build-to-teardown cycle of a compiled schema. Opening
//! it runs every producer in plan order, feeding each one the values its
//! dependencies produced earlier in the same scope. Closing it (explicitly,
//! by drop, or by unwinding) releases every cleanup handle in the exact
//! reverse of the order they were acquired.

mod dependencies;
mod instance;

use std::ops::Deref;

pub use dependencies::Dependencies;
pub use instance::Instance;

use crate::error::{CleanupFailure, DiError, DiResult};
use crate::internal::ReleaseStack;
use crate::key::KeyMap;
use crate::options::CleanupPolicy;
use crate::producer::AnyArc;
use crate::resolver::{CompiledSchema, PlanEntry};
use crate::schema::Injectable;

/// A built instance plus the cleanup handles that keep its resources alive.
///
/// Derefs to [`Instance`]. Call [`close`](Scope::close) to tear down and see
/// cleanup failures; a scope that is simply dropped tears down as well and
/// logs failures instead.
///
/// # Examples
///
/// ```
/// use almond_di::{Context, FnProducer, Schema};
/// use std::sync::{Arc, Mutex};
///
/// let log = Arc::new(Mutex::new(Vec::new()));
/// let log_clone = log.clone();
///
/// let mut context = Context::new();
/// context.provide::<String, _>(
///     FnProducer::builder::<String>().build_with_release(move |_| {
///         let log = log_clone.clone();
///         Ok(("connected".to_string(), move || log.lock().unwrap().push("released")))
///     }),
/// );
///
/// let compiled = Schema::new("Client").field::<String>("conn").compile(&context).unwrap();
///
/// let scope = compiled.open_scope().unwrap();
/// assert_eq!(*scope.get::<String>("conn").unwrap(), "connected");
/// assert!(log.lock().unwrap().is_empty());
///
/// scope.close().unwrap();
/// assert_eq!(*log.lock().unwrap(), vec!["released"]);
/// ```
pub struct Scope {
    instance: Instance,
    releases: ReleaseStack,
    policy: CleanupPolicy,
    closed: bool,
}

impl Scope {
    /// The built instance.
    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    /// Number of cleanup handles not yet released.
    pub fn pending_releases(&self) -> usize {
        self.releases.len()
    }

    /// Releases every cleanup handle in reverse construction order.
    ///
    /// Returns [`DiError::Cleanup`] listing the handles that failed, in
    /// release order.
    pub fn close(mut self) -> DiResult<()> {
        let failures = self.teardown();
        if failures.is_empty() {
            Ok(())
        } else {
            Err(DiError::Cleanup(failures))
        }
    }

    fn teardown(&mut self) -> Vec<CleanupFailure> {
        if self.closed {
            return Vec::new();
        }
        self.closed = true;
        tracing::debug!(
            schema = self.instance.schema_name(),
            releases = self.releases.len(),
            "closing scope"
        );
        self.releases.release_all_reverse(self.policy)
    }

    fn build_entry(&mut self, entry: &PlanEntry, cache: &mut KeyMap<AnyArc>) -> DiResult<()> {
        let mut values = Vec::with_capacity(entry.dependencies().len());
        for dep in entry.dependencies() {
            // Dependencies always sit at a lower level, so they are cached already
            let value = cache
                .get(dep)
                .ok_or_else(|| DiError::NotRegistered(dep.display_name()))?;
            values.push((*dep, value.clone()));
        }

        let deps = Dependencies::new(entry.field(), values);
        let produced = entry.producer().produce(&deps).map_err(|source| DiError::Produce {
            field: entry.field().to_string(),
            source,
        })?;

        let (value, cleanup) = produced.into_parts();
        if let Some(handle) = cleanup {
            self.releases.push(entry.field(), handle);
        }
        if (*value).type_id() != entry.key().id() {
            return Err(DiError::TypeMismatch {
                name: entry.field().to_string(),
                expected: entry.key().display_name(),
            });
        }

        tracing::trace!(field = entry.field(), level = entry.level(), "produced");
        cache.insert(entry.key(), value.clone());
        self.instance.assign(entry.field(), entry.key(), value);
        Ok(())
    }
}

impl Deref for Scope {
    type Target = Instance;

    fn deref(&self) -> &Instance {
        &self.instance
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        let failures = self.teardown();
        for failure in &failures {
            tracing::error!(
                schema = self.instance.schema_name(),
                field = %failure.field,
                error = %failure.error,
                "cleanup failed while dropping scope"
            );
        }
    }
}

impl std::fmt::Debug for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scope")
            .field("instance", &self.instance)
            .field("pending_releases", &self.releases.len())
            .field("closed", &self.closed)
            .finish()
    }
}

impl CompiledSchema {
    /// Builds every field in plan order and returns the live scope.
    ///
    /// If a producer fails, everything built so far is released in reverse
    /// order before the error is returned; the build error wins over any
    /// cleanup failure, which is logged.
    pub fn open_scope(&self) -> DiResult<Scope> {
        let mut scope = Scope {
            instance: Instance::new(self.shared_name(), self.len()),
            releases: ReleaseStack::default(),
            policy: self.options().policy(),
            closed: false,
        };
        tracing::debug!(schema = self.name(), fields = self.len(), "opening scope");

        let mut cache = KeyMap::default();
        for entry in self.entries() {
            if let Err(err) = scope.build_entry(entry, &mut cache) {
                let failures = scope.teardown();
                for failure in &failures {
                    tracing::error!(
                        schema = self.name(),
                        field = %failure.field,
                        error = %failure.error,
                        "cleanup failed while unwinding a partial build"
                    );
                }
                return Err(err);
            }
        }
        Ok(scope)
    }

    /// Runs `body` against a freshly built instance, then tears it down.
    ///
    /// Teardown happens on every exit path, including panics. When both the
    /// body and teardown fail, the body's error is returned and the cleanup
    /// failure is logged.
    ///
    /// # Examples
    ///
    /// ```
    /// use almond_di::{Context, DiError, Schema};
    ///
    /// let mut context = Context::new();
    /// context.with_static(12i32).with_dynamic(|| 0.25f64);
    ///
    /// let compiled = Schema::new("WhatIsUp")
    ///     .field::<i32>("want_this")
    ///     .field::<f64>("and_this")
    ///     .compile(&context)
    ///     .unwrap();
    ///
    /// let (a, b) = compiled
    ///     .with_scope(|what| {
    ///         Ok::<_, DiError>((*what.get::<i32>("want_this")?, *what.get::<f64>("and_this")?))
    ///     })
    ///     .unwrap();
    /// assert_eq!(a, 12);
    /// assert_eq!(b, 0.25);
    /// ```
    pub fn with_scope<F, R, E>(&self, body: F) -> Result<R, E>
    where
        F: FnOnce(&Instance) -> Result<R, E>,
        E: From<DiError>,
    {
        let scope = self.open_scope().map_err(E::from)?;
        let result = body(scope.instance());
        finish(scope, result)
    }

    /// Like [`with_scope`](Self::with_scope), handing the body a typed
    /// value assembled by [`Injectable::assemble`].
    pub fn with_scope_as<T, F, R, E>(&self, body: F) -> Result<R, E>
    where
        T: Injectable,
        F: FnOnce(&T) -> Result<R, E>,
        E: From<DiError>,
    {
        let scope = self.open_scope().map_err(E::from)?;
        let result = T::assemble(scope.instance())
            .map_err(E::from)
            .and_then(|value| body(&value));
        finish(scope, result)
    }
}

fn finish<R, E>(scope: Scope, result: Result<R, E>) -> Result<R, E>
where
    E: From<DiError>,
{
    match (result, scope.close()) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(cleanup)) => Err(E::from(cleanup)),
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(cleanup)) => {
            tracing::error!(error = %cleanup, "cleanup failed after scope body error");
            Err(err)
        }
    }
}
