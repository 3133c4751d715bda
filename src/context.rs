//! Producer context: which producer builds which target type.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::key::{key_of, KeyMap, TypeKey};
use crate::producer::{DynamicProducer, StaticProducer};
use crate::traits::{Producer, SharedProducer};

/// Mapping from target type to the producer that builds it.
///
/// A context is only consulted while compiling a schema; the compiled plan
/// keeps its own references to the producers it picked, so the context can
/// be dropped or reused afterwards.
///
/// # Examples
///
/// ```
/// use almond_di::{key_of, Context};
///
/// let mut context = Context::new();
/// context
///     .with_static(12i32)
///     .with_dynamic(|| 0.5f64);
///
/// assert_eq!(context.len(), 2);
/// assert!(context.contains(&key_of::<i32>()));
/// assert!(!context.contains(&key_of::<bool>()));
/// ```
#[derive(Default, Clone)]
pub struct Context {
    producers: KeyMap<SharedProducer>,
}

impl Context {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `producer` for `T`, replacing any earlier one.
    pub fn provide<T, P>(&mut self, producer: P) -> &mut Self
    where
        T: Any + Send + Sync,
        P: Producer + 'static,
    {
        self.provide_shared(key_of::<T>(), Arc::new(producer))
    }

    /// Registers an already shared producer under `key`.
    pub fn provide_shared(&mut self, key: TypeKey, producer: SharedProducer) -> &mut Self {
        if let Some(produced) = producer.produced_type() {
            if produced != key {
                tracing::warn!(
                    key = %key.short_name(),
                    produces = %produced.short_name(),
                    "producer registered under a different type than it produces"
                );
            }
        }
        if self.producers.insert(key, producer).is_some() {
            tracing::debug!(key = %key.short_name(), "replaced producer");
        }
        self
    }

    /// Registers a [`StaticProducer`] for `T`.
    pub fn with_static<T: Any + Send + Sync>(&mut self, value: T) -> &mut Self {
        self.provide::<T, _>(StaticProducer::new(value))
    }

    /// Registers a [`DynamicProducer`] for `T`.
    pub fn with_dynamic<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Any + Send + Sync,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.provide::<T, _>(DynamicProducer::new(factory))
    }

    /// Producer registered for `key`, if any.
    pub fn get(&self, key: &TypeKey) -> Option<SharedProducer> {
        self.producers.get(key).cloned()
    }

    /// Whether a producer is registered for `key`.
    pub fn contains(&self, key: &TypeKey) -> bool {
        self.producers.contains_key(key)
    }

    /// Number of registered producers.
    pub fn len(&self) -> usize {
        self.producers.len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.producers.is_empty()
    }

    /// Copies every producer from `other`, replacing entries for the same type.
    pub fn extend(&mut self, other: &Context) -> &mut Self {
        for (key, producer) in &other.producers {
            self.producers.insert(*key, producer.clone());
        }
        self
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&'static str> =
            self.producers.keys().map(TypeKey::display_name).collect();
        names.sort_unstable();
        f.debug_struct("Context").field("producers", &names).finish()
    }
}
