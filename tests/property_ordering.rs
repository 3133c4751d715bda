/// Property-based tests for build and release ordering
///
/// Random dependency DAGs over eight marker types, declared in random
/// order: every dependency is built before its dependents, and teardown
/// releases in the exact reverse of construction.

use almond_di::{
    key_of, BoxError, Context, DiError, Dependencies, MemberDeclaration, Produced, Producer,
    Schema, TypeKey,
};
use proptest::prelude::*;
use std::any::Any;
use std::sync::{Arc, Mutex};

const MAX_NODES: usize = 8;

struct Node<const N: usize>;

fn node_key(index: usize) -> TypeKey {
    match index {
        0 => key_of::<Node<0>>(),
        1 => key_of::<Node<1>>(),
        2 => key_of::<Node<2>>(),
        3 => key_of::<Node<3>>(),
        4 => key_of::<Node<4>>(),
        5 => key_of::<Node<5>>(),
        6 => key_of::<Node<6>>(),
        _ => key_of::<Node<7>>(),
    }
}

fn node_value(index: usize) -> Arc<dyn Any + Send + Sync> {
    match index {
        0 => Arc::new(Node::<0>),
        1 => Arc::new(Node::<1>),
        2 => Arc::new(Node::<2>),
        3 => Arc::new(Node::<3>),
        4 => Arc::new(Node::<4>),
        5 => Arc::new(Node::<5>),
        6 => Arc::new(Node::<6>),
        _ => Arc::new(Node::<7>),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Event {
    Build(usize),
    Release(usize),
}

type Log = Arc<Mutex<Vec<Event>>>;

struct Recorder {
    index: usize,
    requires: Vec<TypeKey>,
    fail: bool,
    log: Log,
}

impl Producer for Recorder {
    fn required_types(&self) -> &[TypeKey] {
        &self.requires
    }

    fn produce(&self, deps: &Dependencies<'_>) -> Result<Produced, BoxError> {
        for key in &self.requires {
            if deps.get_by_key(key).is_none() {
                return Err(format!("{} was not built yet", key).into());
            }
        }
        if self.fail {
            return Err("refused".into());
        }
        self.log.lock().unwrap().push(Event::Build(self.index));
        let log = self.log.clone();
        let index = self.index;
        Ok(Produced::from_any(node_value(index))
            .with_release(move || log.lock().unwrap().push(Event::Release(index))))
    }

    fn produced_type(&self) -> Option<TypeKey> {
        Some(node_key(self.index))
    }
}

/// Node count, lower-triangular adjacency (i may only depend on j < i) and
/// a declaration order.
fn dag() -> impl Strategy<Value = (usize, Vec<Vec<bool>>, Vec<usize>)> {
    (1..=MAX_NODES).prop_flat_map(|n| {
        (
            Just(n),
            prop::collection::vec(prop::collection::vec(any::<bool>(), n), n),
            Just((0..n).collect::<Vec<_>>()).prop_shuffle(),
        )
    })
}

fn dependencies(adjacency: &[Vec<bool>], index: usize) -> Vec<usize> {
    (0..index).filter(|&j| adjacency[index][j]).collect()
}

fn setup(
    n: usize,
    adjacency: &[Vec<bool>],
    declared: &[usize],
    failing: Option<TypeKey>,
    log: &Log,
) -> (Context, Schema) {
    let mut context = Context::new();
    for index in 0..n {
        let producer = Recorder {
            index,
            requires: dependencies(adjacency, index).into_iter().map(node_key).collect(),
            fail: failing == Some(node_key(index)),
            log: log.clone(),
        };
        context.provide_shared(node_key(index), Arc::new(producer));
    }

    let mut schema = Schema::new("Dag");
    for &index in declared {
        schema = schema.member(MemberDeclaration::new(format!("n{}", index), node_key(index)));
    }
    (context, schema)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn dependencies_built_first_and_released_last((n, adjacency, declared) in dag()) {
        let log: Log = Arc::default();
        let (context, schema) = setup(n, &adjacency, &declared, None, &log);
        let compiled = schema.compile(&context).unwrap();
        prop_assert_eq!(compiled.len(), n);

        // Levels strictly exceed the levels of direct dependencies
        for index in 0..n {
            let level = compiled.entry(&format!("n{}", index)).unwrap().level();
            for dep in dependencies(&adjacency, index) {
                let dep_level = compiled.entry(&format!("n{}", dep)).unwrap().level();
                prop_assert!(level > dep_level);
            }
        }

        let scope = compiled.open_scope().unwrap();
        prop_assert_eq!(scope.len(), n);
        prop_assert_eq!(scope.pending_releases(), n);
        scope.close().unwrap();

        let events = log.lock().unwrap().clone();
        let built: Vec<usize> = events
            .iter()
            .filter_map(|e| match e { Event::Build(i) => Some(*i), _ => None })
            .collect();
        let released: Vec<usize> = events
            .iter()
            .filter_map(|e| match e { Event::Release(i) => Some(*i), _ => None })
            .collect();

        let position = |i: usize| built.iter().position(|&b| b == i).unwrap();
        for index in 0..n {
            for dep in dependencies(&adjacency, index) {
                prop_assert!(position(dep) < position(index));
            }
        }
        let mut reversed = built.clone();
        reversed.reverse();
        prop_assert_eq!(released, reversed);
        // Every build precedes every release
        prop_assert!(events[..n].iter().all(|e| matches!(e, Event::Build(_))));
    }

    #[test]
    fn interrupted_build_releases_prefix_in_reverse(
        (n, adjacency, declared) in dag(),
        cut in 0..MAX_NODES,
    ) {
        let cut = cut % n;
        let probe_log: Log = Arc::default();
        let (context, schema) = setup(n, &adjacency, &declared, None, &probe_log);
        let failing = schema.compile(&context).unwrap().entries()[cut].key();

        let log: Log = Arc::default();
        let (context, schema) = setup(n, &adjacency, &declared, Some(failing), &log);
        let compiled = schema.compile(&context).unwrap();
        prop_assert_eq!(compiled.entries()[cut].key(), failing);

        match compiled.open_scope() {
            Err(DiError::Produce { field, .. }) => {
                prop_assert_eq!(field.as_str(), compiled.entries()[cut].field());
            }
            other => prop_assert!(false, "expected Produce, got {:?}", other),
        }

        let events = log.lock().unwrap().clone();
        prop_assert_eq!(events.len(), 2 * cut);
        let built: Vec<Event> = events[..cut].to_vec();
        let mut expected_release: Vec<Event> = built
            .iter()
            .map(|e| match e { Event::Build(i) => Event::Release(*i), other => *other })
            .collect();
        expected_release.reverse();
        prop_assert_eq!(&events[cut..], &expected_release[..]);
    }
}
