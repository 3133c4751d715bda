//! Resolution of declared fields into a validated, ordered build plan.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::context::Context;
use crate::error::{DiError, DiResult};
use crate::graph::DependencyGraph;
use crate::key::TypeKey;
use crate::options::ScopeOptions;
use crate::schema::{MemberDeclaration, Schema};
use crate::traits::SharedProducer;

/// One resolved build step.
#[derive(Clone)]
pub struct PlanEntry {
    field: String,
    key: TypeKey,
    level: usize,
    dependencies: Vec<TypeKey>,
    producer: SharedProducer,
}

impl PlanEntry {
    /// Field the value is assigned to.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Target type of the field.
    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// Graph level; every dependency has a strictly lower level.
    pub fn level(&self) -> usize {
        self.level
    }

    /// Types the producer needs, in declaration order.
    pub fn dependencies(&self) -> &[TypeKey] {
        &self.dependencies
    }

    /// Producer chosen for this field.
    pub fn producer(&self) -> &SharedProducer {
        &self.producer
    }
}

impl fmt::Debug for PlanEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlanEntry")
            .field("field", &self.field)
            .field("key", &self.key)
            .field("level", &self.level)
            .field("dependencies", &self.dependencies)
            .finish_non_exhaustive()
    }
}

/// Validated build plan for one schema, sorted by ascending level.
///
/// Immutable and cheap to clone; every scope opened from it shares the plan
/// and nothing else.
#[derive(Clone)]
pub struct CompiledSchema {
    name: Arc<str>,
    entries: Arc<[PlanEntry]>,
    options: ScopeOptions,
}

impl CompiledSchema {
    /// Name of the schema this plan was compiled from.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Build steps in construction order.
    pub fn entries(&self) -> &[PlanEntry] {
        &self.entries
    }

    /// Number of build steps.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no field made it into the plan.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Field names in construction order.
    pub fn field_order(&self) -> Vec<&str> {
        self.entries.iter().map(PlanEntry::field).collect()
    }

    /// Step for `field`, if it is part of the plan.
    pub fn entry(&self, field: &str) -> Option<&PlanEntry> {
        self.entries.iter().find(|e| e.field == field)
    }

    /// Options applied to scopes.
    pub fn options(&self) -> ScopeOptions {
        self.options
    }

    pub(crate) fn shared_name(&self) -> Arc<str> {
        self.name.clone()
    }

    /// Same plan with different scope options.
    pub fn with_options(mut self, options: ScopeOptions) -> Self {
        self.options = options;
        self
    }
}

impl fmt::Debug for CompiledSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledSchema")
            .field("name", &self.name)
            .field("entries", &self.entries)
            .field("options", &self.options)
            .finish()
    }
}

/// Compiles `schema` against `context`.
pub(crate) fn compile(schema: &Schema, context: &Context) -> DiResult<CompiledSchema> {
    let entries = resolve(schema.name(), schema.members(), context)?;
    tracing::debug!(
        schema = schema.name(),
        declared = schema.members().len(),
        planned = entries.len(),
        "compiled schema"
    );
    Ok(CompiledSchema {
        name: Arc::from(schema.name()),
        entries: entries.into(),
        options: schema.scope_options(),
    })
}

/// Resolves declared members into plan entries sorted by dependency level.
///
/// For each member the producer comes from `context`, else from the
/// member's default; members with neither are left out of the plan. Every
/// producer dependency must itself be a planned member, otherwise
/// [`DiError::MissingDependency`] is returned. Dependency cycles fail with
/// [`DiError::Circular`]. Members at the same level keep declaration order.
pub fn resolve(
    schema_name: &str,
    members: &[MemberDeclaration],
    context: &Context,
) -> DiResult<Vec<PlanEntry>> {
    let mut seen = HashSet::with_capacity(members.len());
    for member in members {
        if !seen.insert(member.field()) {
            return Err(DiError::DuplicateField {
                schema: schema_name.to_string(),
                field: member.field().to_string(),
            });
        }
    }

    let mut graph = DependencyGraph::new();
    let mut entries = Vec::with_capacity(members.len());
    for member in members {
        let key = member.key();
        let producer = match context.get(&key) {
            Some(producer) => producer,
            None => match member.default_producer() {
                Some(default) => default.clone(),
                None => {
                    tracing::debug!(
                        schema = schema_name,
                        field = member.field(),
                        ty = %key.short_name(),
                        "no producer and no default, field left unset"
                    );
                    continue;
                }
            },
        };

        let dependencies = producer.required_types().to_vec();
        graph.add(key);
        for dep in &dependencies {
            graph.connect(key, *dep)?;
        }
        entries.push(PlanEntry {
            field: member.field().to_string(),
            key,
            level: 0,
            dependencies,
            producer,
        });
    }

    // Fields sharing a target type overwrite each other's graph node, so
    // each entry is checked against its own dependency list
    for entry in &entries {
        let mut missing: Vec<&'static str> = Vec::new();
        for dep in entry.dependencies.iter().filter(|dep| !graph.contains(**dep)) {
            if !missing.contains(&dep.display_name()) {
                missing.push(dep.display_name());
            }
        }
        if !missing.is_empty() {
            return Err(DiError::MissingDependency {
                schema: schema_name.to_string(),
                field: entry.field.clone(),
                ty: entry.key.display_name(),
                missing,
            });
        }
    }

    let levels = graph.levels()?;
    for entry in &mut entries {
        let deepest = entry
            .dependencies
            .iter()
            .map(|dep| levels.get(dep).copied().unwrap_or_default())
            .max()
            .unwrap_or_default();
        entry.level = deepest + 1;
    }
    entries.sort_by_key(PlanEntry::level);

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::key_of;
    use crate::producer::{FnProducer, StaticProducer};

    struct A;
    struct B;
    struct C;

    fn needs<T: Send + Sync + 'static, D: Send + Sync + 'static>(value: fn() -> T) -> FnProducer {
        FnProducer::builder::<T>()
            .depends_on::<D>()
            .build(move |_| Ok(value()))
    }

    #[test]
    fn entries_sorted_by_level_then_declaration() {
        let mut context = Context::new();
        context
            .provide::<C, _>(needs::<C, B>(|| C))
            .provide::<B, _>(needs::<B, A>(|| B))
            .with_static(A)
            .with_static(7u8);

        let members = vec![
            MemberDeclaration::new("c", key_of::<C>()),
            MemberDeclaration::new("b", key_of::<B>()),
            MemberDeclaration::new("n", key_of::<u8>()),
            MemberDeclaration::new("a", key_of::<A>()),
        ];
        let entries = resolve("Sorted", &members, &context).unwrap();
        let order: Vec<_> = entries.iter().map(|e| (e.field(), e.level())).collect();
        assert_eq!(order, vec![("n", 1), ("a", 1), ("b", 2), ("c", 3)]);
    }

    #[test]
    fn missing_dependency_names_only_unmet_types() {
        let mut context = Context::new();
        context.provide::<B, _>(
            FnProducer::builder::<B>()
                .depends_on::<A>()
                .depends_on::<u8>()
                .build(|_| Ok(B)),
        );
        context.with_static(1u8);

        let members = vec![
            MemberDeclaration::new("b", key_of::<B>()),
            MemberDeclaration::new("n", key_of::<u8>()),
        ];
        match resolve("Broken", &members, &context) {
            Err(DiError::MissingDependency { schema, field, ty, missing }) => {
                assert_eq!(schema, "Broken");
                assert_eq!(field, "b");
                assert_eq!(ty, key_of::<B>().display_name());
                assert_eq!(missing, vec![key_of::<A>().display_name()]);
            }
            other => panic!("expected MissingDependency, got {:?}", other),
        }
    }

    #[test]
    fn duplicate_field_rejected() {
        let mut context = Context::new();
        context.with_static(1u8);
        let members = vec![
            MemberDeclaration::new("n", key_of::<u8>()),
            MemberDeclaration::new("n", key_of::<u8>()),
        ];
        assert!(matches!(
            resolve("Dup", &members, &context),
            Err(DiError::DuplicateField { .. })
        ));
    }

    #[test]
    fn shared_target_type_checks_each_members_dependencies() {
        let with_deps: SharedProducer = Arc::new(needs::<A, B>(|| A));
        let plain: SharedProducer = Arc::new(StaticProducer::new(A));

        let members = vec![
            MemberDeclaration::new("first", key_of::<A>()).with_default(with_deps),
            MemberDeclaration::new("second", key_of::<A>()).with_default(plain),
        ];
        match resolve("Shared", &members, &Context::new()) {
            Err(DiError::MissingDependency { field, missing, .. }) => {
                assert_eq!(field, "first");
                assert_eq!(missing, vec![key_of::<B>().display_name()]);
            }
            other => panic!("expected MissingDependency, got {:?}", other),
        }
    }

    #[test]
    fn shared_target_type_levels_follow_own_dependencies() {
        let with_deps: SharedProducer = Arc::new(needs::<A, B>(|| A));
        let plain: SharedProducer = Arc::new(StaticProducer::new(A));
        let b: SharedProducer = Arc::new(StaticProducer::new(B));

        let members = vec![
            MemberDeclaration::new("first", key_of::<A>()).with_default(with_deps),
            MemberDeclaration::new("second", key_of::<A>()).with_default(plain),
            MemberDeclaration::new("b", key_of::<B>()).with_default(b),
        ];
        let entries = resolve("Shared", &members, &Context::new()).unwrap();
        let order: Vec<_> = entries.iter().map(|e| (e.field(), e.level())).collect();
        assert_eq!(order, vec![("second", 1), ("b", 1), ("first", 2)]);
    }

    #[test]
    fn cycle_between_members_fails() {
        let mut context = Context::new();
        context
            .provide::<A, _>(needs::<A, B>(|| A))
            .provide::<B, _>(needs::<B, A>(|| B));
        let members = vec![
            MemberDeclaration::new("a", key_of::<A>()),
            MemberDeclaration::new("b", key_of::<B>()),
        ];
        assert!(matches!(
            resolve("Cyclic", &members, &context),
            Err(DiError::Circular(_))
        ));
    }
}
