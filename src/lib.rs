//! # almond-di
//!
//! Field-level dependency injection with compiled build plans and scoped,
//! reverse-order teardown.
//!
//! ## Features
//!
//! - **Explicit schemas**: declare injectable fields by name and type, with optional defaults
//! - **Compiled plans**: dependencies are validated and ordered once, up front
//! - **Cycle detection**: dependency cycles fail compilation with the offending path
//! - **Scoped lifecycles**: values are acquired in dependency order and released in exact reverse
//! - **Unwind safety**: partial builds, errors and panics still release what was acquired
//!
//! ## Quick Start
//!
//! ```rust
//! use almond_di::{Context, DiError, FnProducer, Schema};
//!
//! struct Config {
//!     url: String,
//! }
//!
//! struct Pool {
//!     url: String,
//! }
//!
//! // Producers, keyed by the type they build
//! let mut context = Context::new();
//! context.with_static(Config { url: "postgres://localhost".to_string() });
//! context.provide::<Pool, _>(
//!     FnProducer::builder::<Pool>()
//!         .depends_on::<Config>()
//!         .build_with_release(|deps| {
//!             let config = deps.get::<Config>()?;
//!             Ok((Pool { url: config.url.clone() }, || println!("pool closed")))
//!         }),
//! );
//!
//! // Fields, in any order; the plan sorts them by dependency level
//! let compiled = Schema::new("Repository")
//!     .field::<Pool>("pool")
//!     .field::<Config>("config")
//!     .compile(&context)
//!     .unwrap();
//! assert_eq!(compiled.field_order(), vec!["config", "pool"]);
//!
//! // Build, use, tear down
//! let url = compiled
//!     .with_scope(|repo| Ok::<_, DiError>(repo.get::<Pool>("pool")?.url.clone()))
//!     .unwrap();
//! assert_eq!(url, "postgres://localhost");
//! ```
//!
//! ## Lifecycle
//!
//! A [`CompiledSchema`] is built once and reused. Every
//! [`open_scope`](CompiledSchema::open_scope) runs the producers in plan
//! order; every close releases their cleanup handles last-in first-out. Two
//! scopes never share anything but the plan.

// Module declarations
pub mod context;
pub mod error;
pub mod graph;
pub mod key;
pub mod options;
pub mod producer;
pub mod resolver;
pub mod schema;
pub mod scope;
pub mod traits;

// Internal modules
mod internal;

// Re-export core types
pub use context::Context;
pub use error::{BoxError, CleanupFailure, DiError, DiResult};
pub use graph::DependencyGraph;
pub use key::{key_of, TypeKey};
pub use options::{CleanupPolicy, ScopeOptions};
pub use producer::{
    dynamic, static_value, DynamicProducer, FnProducer, FnProducerBuilder, Produced,
    StaticProducer,
};
pub use resolver::{resolve, CompiledSchema, PlanEntry};
pub use schema::{Injectable, MemberDeclaration, Schema};
pub use scope::{Dependencies, Instance, Scope};
pub use traits::{CleanupHandle, Dispose, Producer, SharedProducer};
