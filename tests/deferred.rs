use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use lattice_di::{Container, DiResult, InjectionLink, Registry, ServiceObject, Value};

/// The "real" service hiding behind a deferred proxy.
struct Report {
    body: String,
    link: InjectionLink,
}

impl Report {
    fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            link: InjectionLink::new(),
        }
    }
}

impl ServiceObject for Report {
    fn dispatch(&self, method: &str, _args: &[Value]) -> Option<DiResult<Value>> {
        match method {
            "length" => Some(Ok(Value::new(self.body.len()))),
            "body" => Some(Ok(Value::new(self.body.clone()))),
            _ => None,
        }
    }

    fn injection_link(&self) -> &InjectionLink {
        &self.link
    }
}

fn report_registry(runs: Arc<AtomicUsize>) -> Arc<Registry> {
    let mut services = Registry::builder();
    services.deferred("report", move |_, _| {
        runs.fetch_add(1, Ordering::SeqCst);
        Ok(Value::object(Report::new("quarterly numbers")))
    });
    services.build()
}

#[test]
fn test_deferred_does_not_run_until_used() {
    let runs = Arc::new(AtomicUsize::new(0));
    let container = Container::new(report_registry(runs.clone()));

    // Requesting the service hands out a proxy without running anything.
    let proxy = container.invoke("report", &[]).unwrap();
    let proxy_again = container.invoke("report", &[]).unwrap();
    assert!(Value::ptr_eq(&proxy, &proxy_again)); // One proxy per instance
    assert_eq!(runs.load(Ordering::SeqCst), 0);

    // The first method call forces the implementation and forwards.
    let length = proxy.call("length", &[]).unwrap();
    assert_eq!(*length.downcast_ref::<usize>().unwrap(), "quarterly numbers".len());
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[test]
fn test_deferred_runs_exactly_once_across_calls() {
    let runs = Arc::new(AtomicUsize::new(0));
    let container = Container::new(report_registry(runs.clone()));

    let proxy = container.invoke("report", &[]).unwrap();
    for _ in 0..4 {
        proxy.call("body", &[]).unwrap();
    }
    proxy.call("length", &[]).unwrap();

    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[test]
fn test_accessor_returns_real_value_after_resolution() {
    let runs = Arc::new(AtomicUsize::new(0));
    let container = Container::new(report_registry(runs.clone()));

    let proxy = container.invoke("report", &[]).unwrap();
    assert!(!proxy.is::<Report>());

    proxy.call("body", &[]).unwrap();

    // Once resolved, the accessor checks the cache slot before handing
    // out the proxy again.
    let resolved = container.invoke("report", &[]).unwrap();
    assert!(resolved.is::<Report>());
    assert!(Value::ptr_eq(&resolved, &container.invoke("report", &[]).unwrap()));
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[test]
fn test_unused_deferred_never_runs() {
    let runs = Arc::new(AtomicUsize::new(0));
    {
        let container = Container::new(report_registry(runs.clone()));
        let _proxy = container.invoke("report", &[]).unwrap();
    }
    assert_eq!(runs.load(Ordering::SeqCst), 0);
}

#[test]
fn test_deferred_value_is_injected_on_resolution() {
    let mut services = Registry::builder();
    services.deferred("report", |_, _| Ok(Value::object(Report::new("wired"))));
    services.singleton("recipient", |_, _| Ok(Value::new("the board".to_string())));

    let container = Container::new(services.build());
    let proxy = container.invoke("report", &[]).unwrap();

    // The resolved report has no "recipient" method of its own; the call
    // delegates through the link established at resolution time.
    let recipient = proxy.call("recipient", &[]).unwrap();
    assert_eq!(recipient.downcast_ref::<String>().unwrap(), "the board");
}

#[test]
fn test_proxy_forwarding_to_plain_value_fails_cleanly() {
    let mut services = Registry::builder();
    services.uninjected();
    services.deferred("opaque", |_, _| Ok(Value::new(5u8)));

    let container = Container::new(services.build());
    let proxy = container.invoke("opaque", &[]).unwrap();

    // The implementation runs, but a bare u8 has no dynamic surface.
    assert!(proxy.call("bits", &[]).is_err());

    // The resolved value is still cached and retrievable as data.
    let resolved = container.invoke("opaque", &[]).unwrap();
    assert_eq!(*resolved.downcast_ref::<u8>().unwrap(), 5);
}
