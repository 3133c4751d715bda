//! Dependency graph over target types.
//!
//! One node per target type, each holding the direct dependencies of the
//! producer that builds it. The graph answers two questions for the
//! resolver: "is every direct dependency of this node itself a node?" and
//! "how deep is the longest dependency chain below this node?" (its level).
//! Building fields in ascending level order guarantees every dependency is
//! built before its dependents.

use crate::error::{DiError, DiResult};
use crate::key::{KeyMap, TypeKey};

/// Adjacency structure from consumer type to the types it depends on.
///
/// # Examples
///
/// ```rust
/// use almond_di::{key_of, DependencyGraph};
///
/// struct Config;
/// struct Pool;
/// struct Repo;
///
/// let mut graph = DependencyGraph::new();
/// graph.add(key_of::<Config>());
/// graph.add(key_of::<Pool>());
/// graph.add(key_of::<Repo>());
/// graph.connect(key_of::<Pool>(), key_of::<Config>()).unwrap();
/// graph.connect(key_of::<Repo>(), key_of::<Pool>()).unwrap();
///
/// assert_eq!(graph.level(key_of::<Config>()).unwrap(), 1);
/// assert_eq!(graph.level(key_of::<Repo>()).unwrap(), 3);
/// assert!(graph.has_all_dependencies(key_of::<Repo>()));
/// ```
#[derive(Debug, Default, Clone)]
pub struct DependencyGraph {
    nodes: KeyMap<Vec<TypeKey>>,
    order: Vec<TypeKey>,
}

impl DependencyGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `key` with an empty dependency list.
    ///
    /// Re-adding an existing node resets its list, so edges must be recorded
    /// after the node is added.
    pub fn add(&mut self, key: TypeKey) {
        if self.nodes.insert(key, Vec::new()).is_none() {
            self.order.push(key);
        }
    }

    /// Records that `consumer` depends on `dependency`.
    ///
    /// `dependency` does not need to be a node (that is what
    /// [`has_all_dependencies`](Self::has_all_dependencies) reports), but
    /// `consumer` must have been added first.
    pub fn connect(&mut self, consumer: TypeKey, dependency: TypeKey) -> DiResult<()> {
        match self.nodes.get_mut(&consumer) {
            Some(deps) => {
                deps.push(dependency);
                Ok(())
            }
            None => Err(DiError::NotRegistered(consumer.display_name())),
        }
    }

    /// Whether `key` is a node.
    pub fn contains(&self, key: TypeKey) -> bool {
        self.nodes.contains_key(&key)
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when no node has been added.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes in first-added order.
    pub fn nodes(&self) -> &[TypeKey] {
        &self.order
    }

    /// Direct dependencies of `key`; empty for unknown keys.
    pub fn dependencies_of(&self, key: TypeKey) -> &[TypeKey] {
        self.nodes.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Shallow satisfiability check.
    ///
    /// False for unknown keys, true for nodes without dependencies, otherwise
    /// true iff every direct dependency is a node. Dependencies of
    /// dependencies are not inspected; each node is checked on its own.
    pub fn has_all_dependencies(&self, key: TypeKey) -> bool {
        match self.nodes.get(&key) {
            None => false,
            Some(deps) => deps.iter().all(|dep| self.nodes.contains_key(dep)),
        }
    }

    /// Direct dependencies of `key` that are not nodes, in declaration order.
    pub fn missing_dependencies(&self, key: TypeKey) -> Vec<TypeKey> {
        let mut missing: Vec<TypeKey> = Vec::new();
        for dep in self.dependencies_of(key) {
            if !self.nodes.contains_key(dep) && !missing.contains(dep) {
                missing.push(*dep);
            }
        }
        missing
    }

    /// Length of the longest dependency chain starting at `key`.
    ///
    /// Unknown keys are level 0, a node without dependencies is level 1,
    /// and every other node sits one above its deepest dependency. Only the
    /// relative order matters: a node always sits strictly above each of
    /// its dependencies. A cycle reachable from `key` fails with
    /// [`DiError::Circular`].
    pub fn level(&self, key: TypeKey) -> DiResult<usize> {
        let mut memo = KeyMap::default();
        self.level_of(key, &mut Vec::new(), &mut memo)
    }

    /// Levels of every node, computed in one pass.
    pub fn levels(&self) -> DiResult<KeyMap<usize>> {
        let mut memo = KeyMap::default();
        let mut stack = Vec::new();
        for key in &self.order {
            self.level_of(*key, &mut stack, &mut memo)?;
        }
        Ok(memo)
    }

    fn level_of(
        &self,
        key: TypeKey,
        stack: &mut Vec<TypeKey>,
        memo: &mut KeyMap<usize>,
    ) -> DiResult<usize> {
        let Some(deps) = self.nodes.get(&key) else {
            return Ok(0);
        };
        if let Some(level) = memo.get(&key) {
            return Ok(*level);
        }

        // Back edge: key is still being expanded further up
        if let Some(start) = stack.iter().position(|k| *k == key) {
            let mut path: Vec<&'static str> =
                stack[start..].iter().map(TypeKey::display_name).collect();
            path.push(key.display_name());
            return Err(DiError::Circular(path));
        }

        stack.push(key);
        let mut deepest = 0;
        for dep in deps {
            match self.level_of(*dep, stack, memo) {
                Ok(level) => deepest = deepest.max(level),
                Err(err) => {
                    stack.clear();
                    return Err(err);
                }
            }
        }
        stack.pop();

        let level = deepest + 1;
        memo.insert(key, level);
        Ok(level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::key_of;

    struct A;
    struct B;
    struct C;
    struct D;

    #[test]
    fn re_adding_resets_dependencies() {
        let mut graph = DependencyGraph::new();
        graph.add(key_of::<A>());
        graph.connect(key_of::<A>(), key_of::<B>()).unwrap();
        assert_eq!(graph.dependencies_of(key_of::<A>()), &[key_of::<B>()]);

        graph.add(key_of::<A>());
        assert!(graph.dependencies_of(key_of::<A>()).is_empty());
        assert_eq!(graph.nodes(), &[key_of::<A>()]);
    }

    #[test]
    fn connect_requires_consumer() {
        let mut graph = DependencyGraph::new();
        match graph.connect(key_of::<A>(), key_of::<B>()) {
            Err(DiError::NotRegistered(name)) => assert!(name.ends_with("A")),
            other => panic!("expected NotRegistered, got {:?}", other),
        }
    }

    #[test]
    fn levels_follow_longest_chain() {
        // D -> B -> A, D -> C, C -> A
        let mut graph = DependencyGraph::new();
        for key in [key_of::<A>(), key_of::<B>(), key_of::<C>(), key_of::<D>()] {
            graph.add(key);
        }
        graph.connect(key_of::<B>(), key_of::<A>()).unwrap();
        graph.connect(key_of::<C>(), key_of::<A>()).unwrap();
        graph.connect(key_of::<D>(), key_of::<B>()).unwrap();
        graph.connect(key_of::<D>(), key_of::<C>()).unwrap();

        let levels = graph.levels().unwrap();
        assert_eq!(levels[&key_of::<A>()], 1);
        assert_eq!(levels[&key_of::<B>()], 2);
        assert_eq!(levels[&key_of::<C>()], 2);
        assert_eq!(levels[&key_of::<D>()], 3);
        assert_eq!(graph.level(key_of::<D>()).unwrap(), 3);
    }

    #[test]
    fn unknown_dependencies_count_as_level_zero() {
        let mut graph = DependencyGraph::new();
        graph.add(key_of::<A>());
        graph.connect(key_of::<A>(), key_of::<B>()).unwrap();

        assert_eq!(graph.level(key_of::<B>()).unwrap(), 0);
        assert_eq!(graph.level(key_of::<A>()).unwrap(), 1);
        assert!(!graph.has_all_dependencies(key_of::<A>()));
        assert!(!graph.has_all_dependencies(key_of::<B>()));
        assert_eq!(graph.missing_dependencies(key_of::<A>()), vec![key_of::<B>()]);
    }

    #[test]
    fn cycle_reports_path() {
        let mut graph = DependencyGraph::new();
        graph.add(key_of::<A>());
        graph.add(key_of::<B>());
        graph.add(key_of::<C>());
        graph.connect(key_of::<A>(), key_of::<B>()).unwrap();
        graph.connect(key_of::<B>(), key_of::<C>()).unwrap();
        graph.connect(key_of::<C>(), key_of::<B>()).unwrap();

        match graph.level(key_of::<A>()) {
            Err(DiError::Circular(path)) => {
                assert_eq!(path.len(), 3);
                assert!(path[0].ends_with("B"));
                assert!(path[1].ends_with("C"));
                assert!(path[2].ends_with("B"));
            }
            other => panic!("expected Circular, got {:?}", other),
        }
        assert!(graph.levels().is_err());
    }

    #[test]
    fn self_dependency_is_a_cycle() {
        let mut graph = DependencyGraph::new();
        graph.add(key_of::<A>());
        graph.connect(key_of::<A>(), key_of::<A>()).unwrap();

        match graph.level(key_of::<A>()) {
            Err(DiError::Circular(path)) => assert_eq!(path.len(), 2),
            other => panic!("expected Circular, got {:?}", other),
        }
    }
}
