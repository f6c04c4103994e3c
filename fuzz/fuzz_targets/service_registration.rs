#![no_main]

use lattice_di::{Arity, Container, Registry, Value};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() < 8 {
        return;
    }

    // First 4 bytes select the registration pattern, next 4 the value.
    let pattern = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
    let value = i32::from_le_bytes([data[4], data[5], data[6], data[7]]);

    match pattern % 6 {
        0 => {
            // Singleton declaration and stable resolution
            let mut services = Registry::builder();
            services.singleton("svc", move |_, _| Ok(Value::new(value)));
            let container = Container::new(services.build());

            let a = container.invoke("svc", &[]).unwrap();
            let b = container.invoke("svc", &[]).unwrap();
            assert_eq!(*a.downcast_ref::<i32>().unwrap(), value);
            assert!(Value::ptr_eq(&a, &b));
        }
        1 => {
            // Generic declaration never caches
            let mut services = Registry::builder();
            services.generic("svc", move |_, _| Ok(Value::new(value)));
            let container = Container::new(services.build());

            let a = container.invoke("svc", &[]).unwrap();
            let b = container.invoke("svc", &[]).unwrap();
            assert!(!Value::ptr_eq(&a, &b));
        }
        2 => {
            // Redeclaration: last write wins for fresh resolutions
            let mut services = Registry::builder();
            services.singleton("svc", |_, _| Ok(Value::new(0i32)));
            let registry = services.build();
            registry.define("svc", Arity::None, move |_, _| Ok(Value::new(value)));

            let container = Container::new(registry);
            let v = container.invoke("svc", &[]).unwrap();
            assert_eq!(*v.downcast_ref::<i32>().unwrap(), value);
        }
        3 => {
            // Dynamic definition on a live container
            let container = Container::new(Registry::builder().build());
            assert!(container.invoke("svc", &[]).is_err());

            container.define("svc", Arity::None, move |_, _| Ok(Value::new(value)));
            let v = container.invoke("svc", &[]).unwrap();
            assert_eq!(*v.downcast_ref::<i32>().unwrap(), value);
        }
        4 => {
            // Derived registry shadows without touching the parent
            let mut base = Registry::builder();
            base.singleton("svc", |_, _| Ok(Value::new(i32::MIN)));
            let base = base.build();

            let mut derived = Registry::derive(&base);
            derived.singleton("svc", move |_, _| Ok(Value::new(value)));
            let derived = derived.build();

            let child = Container::new(derived);
            let parent = Container::new(base);
            assert_eq!(*child.get::<i32>("svc").unwrap(), value);
            assert_eq!(*parent.get::<i32>("svc").unwrap(), i32::MIN);
        }
        _ => {
            // Arity-inferred declaration via the builder shortcut
            let arity = match value.rem_euclid(3) {
                0 => Arity::None,
                1 => Arity::One,
                _ => Arity::Many,
            };
            let mut services = Registry::builder();
            services.service("svc", arity, move |_, args| {
                Ok(Value::new((value, args.len())))
            });
            let container = Container::new(services.build());

            let args: Vec<Value> = match arity {
                Arity::None => Vec::new(),
                Arity::One => vec![Value::key(value)],
                Arity::Many => vec![Value::key(value), Value::key(!value)],
            };
            let v = container.invoke("svc", &args).unwrap();
            assert_eq!(
                *v.downcast_ref::<(i32, usize)>().unwrap(),
                (value, args.len())
            );
        }
    }
});
