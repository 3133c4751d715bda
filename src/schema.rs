//! Explicit declaration of injectable fields.
//!
//! A [`Schema`] lists the fields of a "class" that want injected values,
//! each with its target type and an optional default. Compiling it against a
//! [`Context`] yields a [`CompiledSchema`] that can open any number of
//! scopes.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::context::Context;
use crate::error::DiResult;
use crate::key::{key_of, TypeKey};
use crate::options::ScopeOptions;
use crate::producer::StaticProducer;
use crate::resolver::{self, CompiledSchema};
use crate::scope::Instance;
use crate::traits::SharedProducer;

/// One injectable field: its name, target type and optional default.
#[derive(Clone)]
pub struct MemberDeclaration {
    field: String,
    key: TypeKey,
    default: Option<SharedProducer>,
}

impl MemberDeclaration {
    /// Declares `field` as wanting a value of type `key`.
    pub fn new(field: impl Into<String>, key: TypeKey) -> Self {
        Self { field: field.into(), key, default: None }
    }

    /// Uses `producer` when the context has nothing for this type.
    pub fn with_default(mut self, producer: SharedProducer) -> Self {
        self.default = Some(producer);
        self
    }

    /// Field name.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Target type.
    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// Fallback producer built from the default value.
    pub fn default_producer(&self) -> Option<&SharedProducer> {
        self.default.as_ref()
    }

    /// Whether a default was declared.
    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }
}

impl fmt::Debug for MemberDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberDeclaration")
            .field("field", &self.field)
            .field("key", &self.key)
            .field("has_default", &self.has_default())
            .finish()
    }
}

/// Ordered set of injectable fields for one "class".
///
/// Declaration order matters: among fields at the same dependency level,
/// earlier fields are built first.
///
/// # Examples
///
/// ```
/// use almond_di::{Context, Schema};
///
/// let mut context = Context::new();
/// context.with_static(12i32);
///
/// let compiled = Schema::new("WhatIsUp")
///     .field::<i32>("want_this")
///     .field_with_default("port", 8080u16)
///     .field::<bool>("unset") // no producer, no default: skipped
///     .compile(&context)
///     .unwrap();
///
/// assert_eq!(compiled.field_order(), vec!["want_this", "port"]);
/// ```
#[derive(Clone)]
pub struct Schema {
    name: String,
    members: Vec<MemberDeclaration>,
    options: ScopeOptions,
}

impl Schema {
    /// Starts an empty schema; `name` appears in error messages.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
            options: ScopeOptions::default(),
        }
    }

    /// Declares a field wanting a value of type `T`, without default.
    pub fn field<T: Any + Send + Sync>(mut self, name: impl Into<String>) -> Self {
        self.members.push(MemberDeclaration::new(name, key_of::<T>()));
        self
    }

    /// Declares a field wanting `T`, falling back to `default` when the
    /// context has no producer for `T`.
    pub fn field_with_default<T: Any + Send + Sync>(
        mut self,
        name: impl Into<String>,
        default: T,
    ) -> Self {
        let producer: SharedProducer = Arc::new(StaticProducer::new(default));
        self.members
            .push(MemberDeclaration::new(name, key_of::<T>()).with_default(producer));
        self
    }

    /// Appends a prepared declaration.
    pub fn member(mut self, member: MemberDeclaration) -> Self {
        self.members.push(member);
        self
    }

    /// Sets the options carried into the compiled schema.
    pub fn options(mut self, options: ScopeOptions) -> Self {
        self.options = options;
        self
    }

    /// Schema name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared fields in declaration order.
    pub fn members(&self) -> &[MemberDeclaration] {
        &self.members
    }

    /// Options for scopes opened from this schema.
    pub fn scope_options(&self) -> ScopeOptions {
        self.options
    }

    /// Resolves every field against `context` into an ordered build plan.
    pub fn compile(&self, context: &Context) -> DiResult<CompiledSchema> {
        resolver::compile(self, context)
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("name", &self.name)
            .field("members", &self.members)
            .field("options", &self.options)
            .finish()
    }
}

/// A typed "class" whose fields are injected.
///
/// `schema` declares the fields; `assemble` reads them back out of a built
/// [`Instance`].
///
/// # Examples
///
/// ```
/// use almond_di::{Context, DiResult, Injectable, Instance, Schema};
/// use std::sync::Arc;
///
/// struct Server {
///     host: Arc<String>,
///     port: Arc<u16>,
/// }
///
/// impl Injectable for Server {
///     fn schema() -> Schema {
///         Schema::new("Server")
///             .field::<String>("host")
///             .field_with_default("port", 8080u16)
///     }
///
///     fn assemble(instance: &Instance) -> DiResult<Self> {
///         Ok(Server {
///             host: instance.get("host")?,
///             port: instance.get("port")?,
///         })
///     }
/// }
///
/// let mut context = Context::new();
/// context.with_static("localhost".to_string());
///
/// let compiled = Server::compile(&context).unwrap();
/// let addr = compiled
///     .with_scope_as(|server: &Server| {
///         Ok::<_, almond_di::DiError>(format!("{}:{}", server.host, server.port))
///     })
///     .unwrap();
/// assert_eq!(addr, "localhost:8080");
/// ```
pub trait Injectable: Sized {
    /// Field declarations for this type.
    fn schema() -> Schema;

    /// Builds `Self` from the values of a scope.
    fn assemble(instance: &Instance) -> DiResult<Self>;

    /// Compiles [`schema`](Injectable::schema) against `context`.
    fn compile(context: &Context) -> DiResult<CompiledSchema> {
        Self::schema().compile(context)
    }
}
