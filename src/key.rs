//! Target type keys for graph nodes, contexts and per-scope caches.

use std::any::TypeId;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Identity of "the kind of value a field wants".
///
/// A key pairs the [`TypeId`] used for lookups with the `type_name` used in
/// diagnostics. Equality, ordering and hashing only look at the `TypeId`, so
/// two keys built for the same type always collide no matter how the name
/// was spelled.
///
/// # Examples
///
/// ```rust
/// use almond_di::{key_of, TypeKey};
/// use std::any::TypeId;
///
/// let key = key_of::<u32>();
/// assert_eq!(key, TypeKey::new(TypeId::of::<u32>(), "whatever"));
/// assert_eq!(key.display_name(), "u32");
///
/// let string = key_of::<String>();
/// assert_eq!(string.display_name(), "alloc::string::String");
/// assert_eq!(string.short_name(), "String");
/// ```
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    /// Creates a key from a raw `TypeId` and a diagnostic name.
    pub const fn new(id: TypeId, name: &'static str) -> Self {
        Self { id, name }
    }

    /// The `TypeId` this key identifies.
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Full type name, as reported by `std::any::type_name`.
    pub fn display_name(&self) -> &'static str {
        self.name
    }

    /// Type name with module paths stripped, including inside generics.
    ///
    /// `alloc::vec::Vec<alloc::string::String>` becomes `Vec<String>`.
    pub fn short_name(&self) -> String {
        let mut out = String::with_capacity(self.name.len());
        let mut segment = String::new();
        for ch in self.name.chars() {
            match ch {
                '<' | '>' | ',' | ' ' | '(' | ')' | '[' | ']' | '&' | ';' => {
                    out.push_str(last_path_segment(&segment));
                    segment.clear();
                    out.push(ch);
                }
                _ => segment.push(ch),
            }
        }
        out.push_str(last_path_segment(&segment));
        out
    }
}

fn last_path_segment(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path)
}

impl PartialEq for TypeKey {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl PartialOrd for TypeKey {
    #[inline(always)]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TypeKey {
    #[inline(always)]
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

// TypeId only; the name is diagnostic
impl Hash for TypeKey {
    #[inline(always)]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypeKey").field(&self.name).finish()
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Builds the key for `T`.
#[inline(always)]
pub fn key_of<T: ?Sized + 'static>() -> TypeKey {
    TypeKey::new(TypeId::of::<T>(), std::any::type_name::<T>())
}

/// Hash map keyed by [`TypeKey`], using `ahash` when the feature is on.
#[cfg(feature = "ahash")]
pub(crate) type KeyMap<V> = std::collections::HashMap<TypeKey, V, ahash::RandomState>;
#[cfg(not(feature = "ahash"))]
pub(crate) type KeyMap<V> = std::collections::HashMap<TypeKey, V>;

