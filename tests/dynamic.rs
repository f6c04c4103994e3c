use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use lattice_di::{Arity, Container, DiError, Registry, Value};

#[test]
fn test_zero_arity_defines_a_singleton() {
    let container = Container::new(Registry::builder().build());

    assert!(matches!(
        container.invoke("greeting", &[]),
        Err(DiError::UnknownService(_))
    ));

    let runs = Arc::new(AtomicUsize::new(0));
    let counter = runs.clone();
    container.define("greeting", Arity::None, move |_, _| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(Value::new("Hello, world".to_string()))
    });

    // Declaring does not run the implementation.
    assert_eq!(runs.load(Ordering::SeqCst), 0);

    let a = container.invoke("greeting", &[]).unwrap();
    let b = container.invoke("greeting", &[]).unwrap();
    assert!(Value::ptr_eq(&a, &b));
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[test]
fn test_one_arity_defines_a_multiton() {
    let container = Container::new(Registry::builder().build());
    container.define("double", Arity::One, |_, args| {
        let n = *args[0].downcast_ref::<i64>().unwrap();
        Ok(Value::new(n * 2))
    });

    let four = container.invoke("double", &[Value::key(2i64)]).unwrap();
    let four_again = container.invoke("double", &[Value::key(2i64)]).unwrap();
    let six = container.invoke("double", &[Value::key(3i64)]).unwrap();

    assert!(Value::ptr_eq(&four, &four_again));
    assert!(!Value::ptr_eq(&four, &six));
    assert_eq!(*six.downcast_ref::<i64>().unwrap(), 6);

    // Multiton arity is enforced on the dynamic definition too.
    assert!(matches!(
        container.invoke("double", &[]),
        Err(DiError::ArityMismatch { .. })
    ));
}

#[test]
fn test_many_arity_defines_a_multikey_multiton() {
    let container = Container::new(Registry::builder().build());
    container.define("sum", Arity::Many, |_, args| {
        let total: i64 = args
            .iter()
            .map(|arg| *arg.downcast_ref::<i64>().unwrap())
            .sum();
        Ok(Value::new(total))
    });

    let a = container
        .invoke("sum", &[Value::key(1i64), Value::key(2i64), Value::key(3i64)])
        .unwrap();
    let b = container
        .invoke("sum", &[Value::key(1i64), Value::key(2i64), Value::key(3i64)])
        .unwrap();
    let c = container.invoke("sum", &[Value::key(10i64)]).unwrap();

    assert!(Value::ptr_eq(&a, &b));
    assert!(!Value::ptr_eq(&a, &c));
    assert_eq!(*a.downcast_ref::<i64>().unwrap(), 6);
    assert_eq!(*c.downcast_ref::<i64>().unwrap(), 10);
}

#[test]
fn test_definition_is_shared_across_existing_instances() {
    let registry = Registry::builder().build();
    let veteran = Container::new(registry.clone());
    let sibling = Container::new(registry.clone());

    veteran.define("late", Arity::None, |_, _| Ok(Value::new(1u8)));

    // The class gained the service, so every instance resolves it, but
    // each still caches its own value.
    let a = veteran.invoke("late", &[]).unwrap();
    let b = sibling.invoke("late", &[]).unwrap();
    assert!(!Value::ptr_eq(&a, &b));

    // Instances created afterward resolve it too.
    let newcomer = Container::new(registry);
    newcomer.invoke("late", &[]).unwrap();
}

#[test]
fn test_dynamic_definition_uses_build_time_injection_mode() {
    use lattice_di::{InjectionLink, ServiceObject};

    #[derive(Default)]
    struct Probe {
        link: InjectionLink,
    }

    impl ServiceObject for Probe {
        fn injection_link(&self) -> &InjectionLink {
            &self.link
        }
    }

    // Mode at build() was uninjected; dynamically defined services follow it.
    let mut services = Registry::builder();
    services.uninjected();
    let container = Container::new(services.build());
    container.define("probe", Arity::None, |_, _| Ok(Value::object(Probe::default())));

    let probe = container.invoke("probe", &[]).unwrap();
    assert!(!probe
        .downcast_arc::<Probe>()
        .unwrap()
        .injection_link()
        .is_linked());

    // Default mode is injected.
    let wired = Container::new(Registry::builder().build());
    wired.define("probe", Arity::None, |_, _| Ok(Value::object(Probe::default())));

    let probe = wired.invoke("probe", &[]).unwrap();
    assert!(probe
        .downcast_arc::<Probe>()
        .unwrap()
        .injection_link()
        .is_linked());
}

#[test]
fn test_unknown_name_without_definition_still_fails() {
    let container = Container::new(Registry::builder().build());
    container.define("known", Arity::None, |_, _| Ok(Value::new(())));

    match container.invoke("unknown", &[]) {
        Err(DiError::UnknownService(name)) => assert_eq!(name, "unknown"),
        other => panic!("expected UnknownService, got {:?}", other),
    }
}
