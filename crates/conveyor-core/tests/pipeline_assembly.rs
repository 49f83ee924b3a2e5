use conveyor_core::models::{ConfigStore, CoreErrorKind, TaskConfig};
use conveyor_core::namespace::{Binding, Namespace, NamespaceSet};
use conveyor_core::pipeline::assemble;
use serde_json::json;

#[test]
fn groups_are_spliced_in_order_before_following_references() {
    let mut store = ConfigStore::new();
    let first = store.insert(TaskConfig::new("Downloader").with_name("a0"));
    let second = store.insert(TaskConfig::new("Parser").with_name("a1"));
    let single = store.insert(TaskConfig::new("Reporter"));

    let mut namespaces = NamespaceSet::new();
    namespaces
        .insert(
            "jobs",
            Namespace::new()
                .with("a", Binding::Group(vec![first, second]))
                .with("b", Binding::Task(single)),
        )
        .unwrap();

    let pipeline = assemble(&["a", "b"], &namespaces).unwrap();

    assert_eq!(pipeline, vec![first, second, single]);
}

#[test]
fn repeated_references_are_not_deduplicated() {
    let mut store = ConfigStore::new();
    let task = store.insert(TaskConfig::new("Logger"));
    let mut namespaces = NamespaceSet::new();
    namespaces
        .insert("jobs", Namespace::new().with("log", Binding::Task(task)))
        .unwrap();

    let pipeline = assemble(&["log", "jobs.log"], &namespaces).unwrap();

    assert_eq!(pipeline, vec![task, task]);
}

#[test]
fn assembling_twice_yields_the_same_identities() {
    let mut store = ConfigStore::new();
    let fetch = store.insert(TaskConfig::new("Downloader"));
    let parse = store.insert(TaskConfig::new("Parser"));
    let mut namespaces = NamespaceSet::new();
    namespaces
        .insert(
            "jobs",
            Namespace::new()
                .with("all", Binding::Group(vec![fetch, parse]))
                .with("parse", Binding::Task(parse)),
        )
        .unwrap();
    let references = vec!["all".to_string(), "parse".to_string()];

    let first = assemble(&references, &namespaces).unwrap();
    let second = assemble(&references, &namespaces).unwrap();

    assert_eq!(first, second);
    assert_eq!(
        store.snapshot(&first).unwrap(),
        store.snapshot(&second).unwrap()
    );
}

#[test]
fn resolution_failure_aborts_assembly() {
    let namespaces = NamespaceSet::new();

    let error = assemble(&["ghost"], &namespaces).unwrap_err();

    assert_eq!(error.kind, CoreErrorKind::VariableNotFound);
}

#[test]
fn plain_values_cannot_join_the_pipeline() {
    let mut namespaces = NamespaceSet::new();
    namespaces
        .insert(
            "jobs",
            Namespace::new().with("retries", Binding::Value(json!(3))),
        )
        .unwrap();

    let error = assemble(&["retries"], &namespaces).unwrap_err();

    assert_eq!(error.kind, CoreErrorKind::NotATask);
    assert!(error.message.contains("'retries'"));
}
