//! The producer capability consumed by the resolver and the scope builder.

use std::sync::Arc;

use crate::error::BoxError;
use crate::key::TypeKey;
use crate::producer::Produced;
use crate::scope::Dependencies;

/// Something that builds exactly one value per scope, optionally with a
/// cleanup handle.
///
/// Producers declare the types they need up front through
/// [`required_types`](Producer::required_types); the resolver turns those
/// into graph edges and the scope hands the already-built values back
/// through [`Dependencies`] when [`produce`](Producer::produce) runs.
///
/// Most code uses the built-in producers ([`StaticProducer`],
/// [`DynamicProducer`], [`FnProducer`]) rather than implementing this trait.
///
/// [`StaticProducer`]: crate::StaticProducer
/// [`DynamicProducer`]: crate::DynamicProducer
/// [`FnProducer`]: crate::FnProducer
///
/// # Examples
///
/// ```
/// use almond_di::{key_of, BoxError, Dependencies, Produced, Producer, TypeKey};
///
/// struct Greeting {
///     needs: [TypeKey; 1],
/// }
///
/// impl Producer for Greeting {
///     fn required_types(&self) -> &[TypeKey] {
///         &self.needs
///     }
///
///     fn produce(&self, deps: &Dependencies<'_>) -> Result<Produced, BoxError> {
///         let name = deps.get::<String>()?;
///         Ok(Produced::new(format!("hello, {}", name)))
///     }
/// }
///
/// let greeting = Greeting { needs: [key_of::<String>()] };
/// assert_eq!(greeting.required_types(), &[key_of::<String>()]);
/// ```
pub trait Producer: Send + Sync {
    /// Types that must already be built before this producer runs.
    fn required_types(&self) -> &[TypeKey];

    /// Builds the value for one scope.
    ///
    /// Errors are attributed to the field being built by the scope.
    fn produce(&self, deps: &Dependencies<'_>) -> Result<Produced, BoxError>;

    /// Type of the produced value, when the producer knows it.
    fn produced_type(&self) -> Option<TypeKey> {
        None
    }
}

/// Producer shared between a context and the plans compiled from it.
pub type SharedProducer = Arc<dyn Producer>;
