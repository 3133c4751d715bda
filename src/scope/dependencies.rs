//! Typed view of already-built values handed to a producer.

use std::any::{type_name, Any};
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::key::{key_of, TypeKey};
use crate::producer::AnyArc;

/// The values a producer declared it needs, already built in this scope.
///
/// Only declared dependencies are visible; asking for anything else fails
/// with [`DiError::UndeclaredDependency`].
pub struct Dependencies<'a> {
    field: &'a str,
    values: Vec<(TypeKey, AnyArc)>,
}

impl Dependencies<'static> {
    /// An empty view, for calling producers outside a scope.
    pub fn none() -> Self {
        Self { field: "", values: Vec::new() }
    }
}

impl<'a> Dependencies<'a> {
    pub(crate) fn new(field: &'a str, values: Vec<(TypeKey, AnyArc)>) -> Self {
        Self { field, values }
    }

    /// Value built for dependency type `T`.
    pub fn get<T: Any + Send + Sync>(&self) -> DiResult<Arc<T>> {
        let key = key_of::<T>();
        let value = self.get_by_key(&key).ok_or_else(|| DiError::UndeclaredDependency {
            field: self.field.to_string(),
            ty: key.display_name(),
        })?;
        value.clone().downcast::<T>().map_err(|_| DiError::TypeMismatch {
            name: key.display_name().to_string(),
            expected: type_name::<T>(),
        })
    }

    /// Type-erased value for `key`, if declared.
    pub fn get_by_key(&self, key: &TypeKey) -> Option<&AnyArc> {
        self.values.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Field being built.
    pub fn field(&self) -> &str {
        self.field
    }

    /// Declared dependency types, in declaration order.
    pub fn keys(&self) -> impl Iterator<Item = TypeKey> + '_ {
        self.values.iter().map(|(k, _)| *k)
    }

    /// Number of dependencies.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when the producer declared no dependencies.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
