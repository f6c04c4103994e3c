#![no_main]

use std::collections::HashMap;

use lattice_di::{Container, Registry, Value};
use libfuzzer_sys::fuzz_target;

// Keyed resolution against a reference model: whatever sequence of keys
// arrives, each distinct key must be instantiated exactly once and always
// resolve to the same allocation.
fuzz_target!(|data: &[u8]| {
    let mut services = Registry::builder();
    services.multiton("slot", |_, args| {
        Ok(Value::new(*args[0].downcast_ref::<u8>().unwrap()))
    });
    services.multikey_multiton("pair", |_, args| {
        let a = *args[0].downcast_ref::<u8>().unwrap();
        let b = *args[1].downcast_ref::<u8>().unwrap();
        Ok(Value::new((a, b)))
    });
    let container = Container::new(services.build());

    let mut single_model: HashMap<u8, Value> = HashMap::new();
    let mut pair_model: HashMap<(u8, u8), Value> = HashMap::new();

    for chunk in data.chunks_exact(2) {
        let (key, second) = (chunk[0], chunk[1]);

        let value = container.invoke("slot", &[Value::key(key)]).unwrap();
        assert_eq!(*value.downcast_ref::<u8>().unwrap(), key);
        match single_model.get(&key) {
            Some(previous) => assert!(Value::ptr_eq(previous, &value)),
            None => {
                single_model.insert(key, value);
            }
        }

        let value = container
            .invoke("pair", &[Value::key(key), Value::key(second)])
            .unwrap();
        assert_eq!(*value.downcast_ref::<(u8, u8)>().unwrap(), (key, second));
        match pair_model.get(&(key, second)) {
            Some(previous) => assert!(Value::ptr_eq(previous, &value)),
            None => {
                pair_model.insert((key, second), value);
            }
        }
    }

    // A second container over the same registry shares no cache slots.
    if let Some((key, cached)) = single_model.iter().next() {
        let other = Container::new(container.registry().clone());
        let fresh = other.invoke("slot", &[Value::key(*key)]).unwrap();
        assert!(!Value::ptr_eq(cached, &fresh));
    }
});
