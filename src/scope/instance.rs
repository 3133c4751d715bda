//! The built instance: field values assigned during one scope.

use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::key::TypeKey;
use crate::producer::AnyArc;

struct Slot {
    field: String,
    key: TypeKey,
    value: AnyArc,
}

/// Field values of one scoped build, in construction order.
///
/// Fields left out of the plan (no producer, no default) are simply absent.
pub struct Instance {
    schema: Arc<str>,
    slots: Vec<Slot>,
}

impl Instance {
    pub(crate) fn new(schema: Arc<str>, capacity: usize) -> Self {
        Self { schema, slots: Vec::with_capacity(capacity) }
    }

    pub(crate) fn assign(&mut self, field: &str, key: TypeKey, value: AnyArc) {
        self.slots.push(Slot { field: field.to_string(), key, value });
    }

    /// Value of `field` as `T`.
    ///
    /// Fails with [`DiError::UnknownField`] if the field was not built and
    /// [`DiError::TypeMismatch`] if it holds another type.
    pub fn get<T: Any + Send + Sync>(&self, field: &str) -> DiResult<Arc<T>> {
        let value = self
            .get_raw(field)
            .ok_or_else(|| DiError::UnknownField(field.to_string()))?;
        value.clone().downcast::<T>().map_err(|_| DiError::TypeMismatch {
            name: field.to_string(),
            expected: type_name::<T>(),
        })
    }

    /// Type-erased value of `field`.
    pub fn get_raw(&self, field: &str) -> Option<&AnyArc> {
        self.slot(field).map(|s| &s.value)
    }

    /// Target type `field` was built for.
    pub fn key_of_field(&self, field: &str) -> Option<TypeKey> {
        self.slot(field).map(|s| s.key)
    }

    /// Whether `field` was built.
    pub fn contains(&self, field: &str) -> bool {
        self.slot(field).is_some()
    }

    /// Built field names in construction order.
    pub fn fields(&self) -> impl Iterator<Item = &str> + '_ {
        self.slots.iter().map(|s| s.field.as_str())
    }

    /// Number of built fields.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True when nothing was built.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Name of the schema this instance was built from.
    pub fn schema_name(&self) -> &str {
        &self.schema
    }

    fn slot(&self, field: &str) -> Option<&Slot> {
        self.slots.iter().find(|s| s.field == field)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut fields = f.debug_map();
        for slot in &self.slots {
            fields.entry(&slot.field, &slot.key);
        }
        fields.finish()
    }
}
