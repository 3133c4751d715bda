/// Unit tests for error messages and error plumbing

use almond_di::{BoxError, CleanupFailure, DiError};
use std::error::Error;

#[test]
fn test_missing_dependency_display() {
    let err = DiError::MissingDependency {
        schema: "Repository".to_string(),
        field: "pool".to_string(),
        ty: "app::Pool",
        missing: vec!["app::Config", "app::Secrets"],
    };
    assert_eq!(
        err.to_string(),
        "Cannot build field \"pool\" (app::Pool) of Repository: unmet dependencies \
         [app::Config, app::Secrets]; provide them through the context or give them a default value"
    );
}

#[test]
fn test_circular_display() {
    let err = DiError::Circular(vec!["A", "B", "C", "A"]);
    assert_eq!(err.to_string(), "Circular dependency: A -> B -> C -> A");
}

#[test]
fn test_not_registered_display() {
    let err = DiError::NotRegistered("app::Pool");
    assert_eq!(err.to_string(), "Type not registered in dependency graph: app::Pool");
}

#[test]
fn test_type_mismatch_display() {
    let err = DiError::TypeMismatch { name: "port".to_string(), expected: "u16" };
    assert_eq!(err.to_string(), "Type mismatch for \"port\": expected u16");
}

#[test]
fn test_undeclared_dependency_display() {
    let err = DiError::UndeclaredDependency { field: "pool".to_string(), ty: "app::Config" };
    assert_eq!(err.to_string(), "Field \"pool\" did not declare a dependency on app::Config");
}

#[test]
fn test_produce_error_keeps_source() {
    let source: BoxError = "connection refused".into();
    let err = DiError::Produce { field: "pool".to_string(), source };

    assert_eq!(err.to_string(), "Failed to produce field \"pool\": connection refused");
    let source = err.source().expect("source should be kept");
    assert_eq!(source.to_string(), "connection refused");
}

#[test]
fn test_cleanup_display_lists_failures_in_order() {
    let err = DiError::Cleanup(vec![
        CleanupFailure { field: "b".to_string(), error: "b broke".into() },
        CleanupFailure { field: "a".to_string(), error: "a broke".into() },
    ]);
    assert_eq!(err.to_string(), "Cleanup failed for 2 field(s): b: b broke; a: a broke");

    let fields: Vec<_> = err.cleanup_failures().iter().map(|f| f.field.as_str()).collect();
    assert_eq!(fields, vec!["b", "a"]);
}

#[test]
fn test_cleanup_failures_empty_for_other_variants() {
    assert!(DiError::UnknownField("x".to_string()).cleanup_failures().is_empty());
}

#[test]
fn test_error_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync + 'static>() {}
    assert_send_sync::<DiError>();

    // Converts into the boxed error producers return
    let boxed: BoxError = DiError::UnknownField("x".to_string()).into();
    assert_eq!(boxed.to_string(), "Unknown field: x");
}
