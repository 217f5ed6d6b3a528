//! Lazy handler resolution shared across threads

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use jbi_actions::{
    ActionRecord, Actions, FnFactory, Handler, HandlerCatalog, ParamKind, ParamSchema, RawContact,
};
use serde_json::{json, Value};

struct Tagger {
    label: String,
}

impl Handler for Tagger {
    fn handle(&self, payload: &Value) -> anyhow::Result<Value> {
        Ok(json!({ "label": self.label, "payload": payload }))
    }
}

fn counting_catalog(calls: Arc<AtomicUsize>) -> HandlerCatalog {
    let mut catalog = HandlerCatalog::new();
    catalog.register_factory(
        "tests.tagger",
        Arc::new(FnFactory::new(
            ParamSchema::new().required("label", ParamKind::String),
            move |parameters| {
                calls.fetch_add(1, Ordering::SeqCst);
                let label = parameters["label"].as_str().unwrap_or_default().to_string();
                Ok(Arc::new(Tagger { label }) as Arc<dyn Handler>)
            },
        )),
    );
    catalog
}

fn actions(calls: Arc<AtomicUsize>) -> Actions {
    let records = vec![
        ActionRecord::new("Foo", RawContact::One("foo@mozilla.com".to_string()), "foo")
            .with_module("tests.tagger")
            .with_parameter("label", json!("foo")),
        ActionRecord::new("bar", RawContact::One("bar@mozilla.com".to_string()), "bar")
            .with_module("tests.tagger")
            .with_parameter("label", json!("bar")),
    ];
    Actions::from_records(records, &counting_catalog(calls)).unwrap()
}

#[test]
fn test_loading_does_not_initialize() {
    let calls = Arc::new(AtomicUsize::new(0));
    let actions = actions(calls.clone());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(actions.iter().all(|a| !a.is_handler_initialized()));
}

#[test]
fn test_handler_initialized_once_per_action() {
    let calls = Arc::new(AtomicUsize::new(0));
    let actions = actions(calls.clone());

    let foo = actions.get(Some("FOO")).unwrap();
    for _ in 0..3 {
        let out = foo.handler().unwrap().handle(&json!(1)).unwrap();
        assert_eq!(out["label"], "foo");
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    actions.get(Some("bar")).unwrap().handler().unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_concurrent_first_access_initializes_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let actions = Arc::new(actions(calls.clone()));
    let threads = 8;
    let barrier = Arc::new(Barrier::new(threads));

    let workers: Vec<_> = (0..threads)
        .map(|_| {
            let actions = Arc::clone(&actions);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let spec = actions.get(Some("foo")).unwrap();
                spec.handler().unwrap().handle(&Value::Null).unwrap()
            })
        })
        .collect();

    for worker in workers {
        let out = worker.join().unwrap();
        assert_eq!(out["label"], "foo");
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}
