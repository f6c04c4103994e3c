#![no_main]

use lattice_di::{
    inject_into, Container, DiError, DiResult, InjectionLink, Registry, ServiceObject, Value,
};
use libfuzzer_sys::fuzz_target;

#[derive(Default)]
struct Widget {
    link: InjectionLink,
}

impl ServiceObject for Widget {
    fn dispatch(&self, method: &str, _args: &[Value]) -> Option<DiResult<Value>> {
        match method {
            "own" => Some(Ok(Value::new(0u8))),
            _ => None,
        }
    }

    fn injection_link(&self) -> &InjectionLink {
        &self.link
    }
}

// Exercises the delegation fallback and the at-most-one-container rule
// under arbitrary method-name and relink sequences.
fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    let mut services = Registry::builder();
    services.singleton("widget", |_, _| Ok(Value::object(Widget::default())));
    services.singleton("sibling", |_, _| Ok(Value::new(7u32)));
    let registry = services.build();

    let container = Container::new(registry.clone());
    let widget = container.invoke("widget", &[]).unwrap();

    // Dynamic calls: own dispatch wins, declared names delegate, anything
    // else is the original not-understood condition.
    let method = String::from_utf8_lossy(&data[1..]).into_owned();
    match widget.call(&method, &[]) {
        Ok(value) => match method.as_str() {
            "own" => assert_eq!(*value.downcast_ref::<u8>().unwrap(), 0),
            "sibling" => assert_eq!(*value.downcast_ref::<u32>().unwrap(), 7),
            "widget" => assert!(value.is::<Widget>()),
            _ => panic!("resolved undeclared method {:?}", method),
        },
        Err(DiError::MethodNotUnderstood { .. }) => {
            assert!(!matches!(method.as_str(), "own" | "sibling" | "widget"));
        }
        Err(other) => panic!("unexpected error: {:?}", other),
    }

    let object = widget.downcast_arc::<Widget>().unwrap();

    // Relinking the owning container is always a no-op.
    container.inject_into(object.as_ref()).unwrap();
    inject_into(object.as_ref(), container.as_resolvable()).unwrap();

    // Any other container must be rejected, however often we try.
    let intruder = Container::new(registry);
    for _ in 0..(data[0] % 4) + 1 {
        assert!(matches!(
            intruder.inject_into(object.as_ref()),
            Err(DiError::NonUniqueContainer)
        ));
    }

    // The rejected attempts did not break the original link.
    let sibling = widget.call("sibling", &[]);
    assert!(sibling.is_ok());
});
