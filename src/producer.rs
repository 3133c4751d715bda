//! Built-in producers and the two-phase `Produced` result.
//!
//! A producer runs once per scope and hands back a [`Produced`]: the value
//! for the field plus an optional [`CleanupHandle`] that the scope releases
//! on teardown. Three producers cover the common cases:
//!
//! - [`StaticProducer`]: a fixed value, shared by every scope
//! - [`DynamicProducer`]: a zero-argument factory, called once per scope
//! - [`FnProducer`]: user logic with declared dependencies and optional cleanup

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::BoxError;
use crate::key::{key_of, TypeKey};
use crate::scope::Dependencies;
use crate::traits::{CleanupHandle, Dispose, Producer};

// Type-erased Arc for built values
pub(crate) type AnyArc = Arc<dyn Any + Send + Sync>;

/// A produced value and the cleanup that goes with it.
///
/// # Examples
///
/// ```
/// use almond_di::Produced;
/// use std::sync::{Arc, Mutex};
///
/// let log = Arc::new(Mutex::new(Vec::new()));
/// let log_clone = log.clone();
///
/// let produced = Produced::new(8080u16)
///     .with_release(move || log_clone.lock().unwrap().push("released"));
///
/// assert!(produced.has_cleanup());
/// assert_eq!(produced.value().downcast_ref::<u16>(), Some(&8080));
/// ```
pub struct Produced {
    value: AnyArc,
    cleanup: Option<Box<dyn CleanupHandle>>,
}

impl Produced {
    /// Wraps an owned value.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self::shared(Arc::new(value))
    }

    /// Wraps a value that is already shared, e.g. with a disposer.
    pub fn shared<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Self::from_any(value)
    }

    /// Wraps a type-erased value.
    pub fn from_any(value: AnyArc) -> Self {
        Self { value, cleanup: None }
    }

    /// Attaches a cleanup handle, replacing any previous one.
    pub fn with_cleanup<H: CleanupHandle + 'static>(mut self, handle: H) -> Self {
        self.cleanup = Some(Box::new(handle));
        self
    }

    /// Attaches an infallible release closure.
    pub fn with_release<F>(self, release: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.with_cleanup(move || -> Result<(), BoxError> {
            release();
            Ok(())
        })
    }

    /// Attaches a release closure that may fail.
    pub fn with_fallible_release<F, E>(self, release: F) -> Self
    where
        F: FnOnce() -> Result<(), E> + Send + 'static,
        E: Into<BoxError>,
    {
        self.with_cleanup(move || -> Result<(), BoxError> { release().map_err(Into::into) })
    }

    /// Calls [`Dispose::dispose`] on `service` at teardown.
    pub fn with_disposer<T: Dispose>(self, service: Arc<T>) -> Self {
        self.with_release(move || service.dispose())
    }

    /// The produced value.
    pub fn value(&self) -> &AnyArc {
        &self.value
    }

    /// Whether a cleanup handle is attached.
    pub fn has_cleanup(&self) -> bool {
        self.cleanup.is_some()
    }

    /// Splits into value and cleanup handle.
    pub fn into_parts(self) -> (AnyArc, Option<Box<dyn CleanupHandle>>) {
        (self.value, self.cleanup)
    }
}

impl fmt::Debug for Produced {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Produced")
            .field("has_cleanup", &self.has_cleanup())
            .finish_non_exhaustive()
    }
}

/// Produces a precomputed value.
///
/// The value is shared by every scope built from the plan; no cleanup runs.
/// Class-level defaults are turned into static producers by the resolver.
pub struct StaticProducer<T> {
    value: Arc<T>,
}

impl<T: Any + Send + Sync> StaticProducer<T> {
    /// Creates a producer that always yields `value`.
    pub fn new(value: T) -> Self {
        Self { value: Arc::new(value) }
    }

    /// Creates a producer from an already shared value.
    pub fn from_arc(value: Arc<T>) -> Self {
        Self { value }
    }
}

impl<T: Any + Send + Sync> Producer for StaticProducer<T> {
    fn required_types(&self) -> &[TypeKey] {
        &[]
    }

    fn produce(&self, _deps: &Dependencies<'_>) -> Result<Produced, BoxError> {
        Ok(Produced::shared(self.value.clone()))
    }

    fn produced_type(&self) -> Option<TypeKey> {
        Some(key_of::<T>())
    }
}

impl<T: fmt::Debug> fmt::Debug for StaticProducer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StaticProducer").field(&self.value).finish()
    }
}

/// Produces a fresh value from a zero-argument factory on every scope.
pub struct DynamicProducer<T, F> {
    factory: F,
    _marker: PhantomData<fn() -> T>,
}

impl<T, F> DynamicProducer<T, F>
where
    T: Any + Send + Sync,
    F: Fn() -> T + Send + Sync,
{
    /// Creates a producer calling `factory` once per scope.
    pub fn new(factory: F) -> Self {
        Self { factory, _marker: PhantomData }
    }
}

impl<T, F> Producer for DynamicProducer<T, F>
where
    T: Any + Send + Sync,
    F: Fn() -> T + Send + Sync,
{
    fn required_types(&self) -> &[TypeKey] {
        &[]
    }

    fn produce(&self, _deps: &Dependencies<'_>) -> Result<Produced, BoxError> {
        Ok(Produced::new((self.factory)()))
    }

    fn produced_type(&self) -> Option<TypeKey> {
        Some(key_of::<T>())
    }
}

impl<T, F> fmt::Debug for DynamicProducer<T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicProducer")
            .field("produces", &std::any::type_name::<T>())
            .finish_non_exhaustive()
    }
}

type ProduceFn = dyn Fn(&Dependencies<'_>) -> Result<Produced, BoxError> + Send + Sync;

/// User-defined producer with an explicit dependency list.
///
/// Built through [`FnProducer::builder`]: declare each dependency type with
/// `depends_on`, then supply the body. The body only sees the declared
/// dependencies.
///
/// # Examples
///
/// ```
/// use almond_di::{Context, FnProducer, Schema};
///
/// struct Config { url: String }
/// struct Pool { url: String }
///
/// let pool = FnProducer::builder::<Pool>()
///     .depends_on::<Config>()
///     .build_with_release(|deps| {
///         let config = deps.get::<Config>()?;
///         let pool = Pool { url: config.url.clone() };
///         Ok((pool, || println!("pool closed")))
///     });
///
/// let mut context = Context::new();
/// context
///     .with_static(Config { url: "postgres://localhost".to_string() })
///     .provide::<Pool, _>(pool);
///
/// let compiled = Schema::new("Repo")
///     .field::<Config>("config")
///     .field::<Pool>("pool")
///     .compile(&context)
///     .unwrap();
///
/// let url = compiled
///     .with_scope(|repo| {
///         let pool = repo.get::<Pool>("pool")?;
///         Ok::<_, almond_di::DiError>(pool.url.clone())
///     })
///     .unwrap();
/// assert_eq!(url, "postgres://localhost");
/// ```
pub struct FnProducer {
    produces: TypeKey,
    requires: Vec<TypeKey>,
    body: Box<ProduceFn>,
}

impl FnProducer {
    /// Starts a producer for values of type `T`.
    pub fn builder<T: Any + Send + Sync>() -> FnProducerBuilder<T> {
        FnProducerBuilder { requires: Vec::new(), _marker: PhantomData }
    }
}

impl Producer for FnProducer {
    fn required_types(&self) -> &[TypeKey] {
        &self.requires
    }

    fn produce(&self, deps: &Dependencies<'_>) -> Result<Produced, BoxError> {
        (self.body)(deps)
    }

    fn produced_type(&self) -> Option<TypeKey> {
        Some(self.produces)
    }
}

impl fmt::Debug for FnProducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnProducer")
            .field("produces", &self.produces)
            .field("requires", &self.requires)
            .finish_non_exhaustive()
    }
}

/// Builder for [`FnProducer`].
pub struct FnProducerBuilder<T> {
    requires: Vec<TypeKey>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Any + Send + Sync> FnProducerBuilder<T> {
    /// Declares a dependency on `D`. Declaring the same type twice is a no-op.
    pub fn depends_on<D: Any + Send + Sync>(mut self) -> Self {
        let key = key_of::<D>();
        if !self.requires.contains(&key) {
            self.requires.push(key);
        }
        self
    }

    /// Finishes with a body returning the full [`Produced`].
    pub fn build_produced<F>(self, body: F) -> FnProducer
    where
        F: Fn(&Dependencies<'_>) -> Result<Produced, BoxError> + Send + Sync + 'static,
    {
        FnProducer {
            produces: key_of::<T>(),
            requires: self.requires,
            body: Box::new(body),
        }
    }

    /// Finishes with a body returning just the value.
    pub fn build<F>(self, body: F) -> FnProducer
    where
        F: Fn(&Dependencies<'_>) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        self.build_produced(move |deps| body(deps).map(Produced::new))
    }

    /// Finishes with a body returning the value and its release closure.
    pub fn build_with_release<F, R>(self, body: F) -> FnProducer
    where
        F: Fn(&Dependencies<'_>) -> Result<(T, R), BoxError> + Send + Sync + 'static,
        R: FnOnce() + Send + 'static,
    {
        self.build_produced(move |deps| {
            let (value, release) = body(deps)?;
            Ok(Produced::new(value).with_release(release))
        })
    }
}

/// Shorthand for [`StaticProducer::new`].
pub fn static_value<T: Any + Send + Sync>(value: T) -> StaticProducer<T> {
    StaticProducer::new(value)
}

/// Shorthand for [`DynamicProducer::new`].
pub fn dynamic<T, F>(factory: F) -> DynamicProducer<T, F>
where
    T: Any + Send + Sync,
    F: Fn() -> T + Send + Sync,
{
    DynamicProducer::new(factory)
}
