//! Error types for schema compilation and scoped builds.

use std::fmt;

use thiserror::Error;

/// Boxed error returned by user producers and cleanup handles.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependency injection errors
///
/// Compilation errors (`MissingDependency`, `Circular`, `DuplicateField`)
/// abort `compile` entirely. Build and teardown errors (`Produce`,
/// `Cleanup`) surface from a scope after whatever was already built has been
/// released.
///
/// # Examples
///
/// ```rust
/// use almond_di::DiError;
///
/// let circular = DiError::Circular(vec!["A", "B", "A"]);
/// assert_eq!(circular.to_string(), "Circular dependency: A -> B -> A");
///
/// let unknown = DiError::UnknownField("port".to_string());
/// assert_eq!(unknown.to_string(), "Unknown field: port");
/// ```
#[derive(Debug, Error)]
pub enum DiError {
    /// A member's producer needs types that no member of the schema provides
    #[error(
        "Cannot build field \"{field}\" ({ty}) of {schema}: unmet dependencies [{}]; \
         provide them through the context or give them a default value",
        .missing.join(", ")
    )]
    MissingDependency {
        schema: String,
        field: String,
        ty: &'static str,
        missing: Vec<&'static str>,
    },
    /// Dependency cycle (includes path, first node repeated at the end)
    #[error("Circular dependency: {}", .0.join(" -> "))]
    Circular(Vec<&'static str>),
    /// Edge recorded for a consumer that was never added to the graph
    #[error("Type not registered in dependency graph: {0}")]
    NotRegistered(&'static str),
    /// Same field name declared twice on one schema
    #[error("Field \"{field}\" declared more than once in {schema}")]
    DuplicateField { schema: String, field: String },
    /// Instance has no field with this name
    #[error("Unknown field: {0}")]
    UnknownField(String),
    /// Field or dependency exists but holds a different type
    #[error("Type mismatch for \"{name}\": expected {expected}")]
    TypeMismatch { name: String, expected: &'static str },
    /// A producer asked for a type it did not declare as a dependency
    #[error("Field \"{field}\" did not declare a dependency on {ty}")]
    UndeclaredDependency { field: String, ty: &'static str },
    /// A producer failed while building a field
    #[error("Failed to produce field \"{field}\": {source}")]
    Produce {
        field: String,
        #[source]
        source: BoxError,
    },
    /// One or more cleanup handles failed during teardown
    #[error("Cleanup failed for {} field(s): {}", .0.len(), DisplayFailures(.0))]
    Cleanup(Vec<CleanupFailure>),
    /// Scope options could not be parsed
    #[cfg(feature = "config")]
    #[error("Invalid scope options: {0}")]
    InvalidOptions(String),
}

/// One failed cleanup handle, tagged with the field it belonged to.
#[derive(Debug)]
pub struct CleanupFailure {
    /// Field whose producer registered the handle
    pub field: String,
    /// Error returned by the handle
    pub error: BoxError,
}

impl fmt::Display for CleanupFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.error)
    }
}

struct DisplayFailures<'a>(&'a [CleanupFailure]);

impl fmt::Display for DisplayFailures<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, failure) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", failure)?;
        }
        Ok(())
    }
}

impl DiError {
    /// Cleanup failures carried by this error, if it is a `Cleanup` error.
    pub fn cleanup_failures(&self) -> &[CleanupFailure] {
        match self {
            DiError::Cleanup(failures) => failures,
            _ => &[],
        }
    }
}

/// Result type for DI operations
pub type DiResult<T> = Result<T, DiError>;
