use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use lattice_di::{Container, Registry, Value};

// ===== Micro Benchmarks =====

fn bench_singleton_hit(c: &mut Criterion) {
    let mut services = Registry::builder();
    services.singleton("answer", |_, _| Ok(Value::new(42u64)));
    let container = Container::new(services.build());

    // Prime the singleton
    let _ = container.invoke("answer", &[]).unwrap();

    c.bench_function("singleton_hit_u64", |b| {
        b.iter(|| {
            let v = container.invoke("answer", &[]).unwrap();
            black_box(v);
        })
    });
}

fn bench_singleton_cold(c: &mut Criterion) {
    c.bench_function("singleton_cold_expensive", |b| {
        b.iter_batched(
            || {
                let mut services = Registry::builder();
                services.singleton("table", |_, _| {
                    Ok(Value::new((0..1000).collect::<Vec<u64>>()))
                });
                Container::new(services.build())
            },
            |container| {
                let v = container.invoke("table", &[]).unwrap();
                black_box(v.downcast_ref::<Vec<u64>>().unwrap().len());
            },
            criterion::BatchSize::SmallInput,
        )
    });
}

fn bench_policy_hit_paths(c: &mut Criterion) {
    let mut services = Registry::builder();
    services.singleton("single", |_, _| Ok(Value::new(0u64)));
    services.generic("fresh", |_, _| Ok(Value::new(0u64)));
    services.multiton("keyed", |_, args| {
        Ok(Value::new(*args[0].downcast_ref::<u64>().unwrap()))
    });
    services.threaded("local", |_, _| Ok(Value::new(0u64)));
    let container = Container::new(services.build());

    // Prime every cache once
    container.invoke("single", &[]).unwrap();
    container.invoke("keyed", &[Value::key(7u64)]).unwrap();
    container.invoke("local", &[]).unwrap();

    let mut group = c.benchmark_group("policy_hit");

    group.bench_function("singleton", |b| {
        b.iter(|| black_box(container.invoke("single", &[]).unwrap()))
    });
    group.bench_function("generic", |b| {
        b.iter(|| black_box(container.invoke("fresh", &[]).unwrap()))
    });
    group.bench_function("multiton", |b| {
        b.iter(|| {
            black_box(
                container
                    .invoke("keyed", &[Value::key(7u64)])
                    .unwrap(),
            )
        })
    });
    group.bench_function("threaded", |b| {
        b.iter(|| black_box(container.invoke("local", &[]).unwrap()))
    });

    group.finish();
}

fn bench_multiton_key_count(c: &mut Criterion) {
    let mut group = c.benchmark_group("multiton_lookup_by_population");

    for key_count in [1u64, 16, 256] {
        let mut services = Registry::builder();
        services.multiton("slot", |_, args| {
            Ok(Value::new(*args[0].downcast_ref::<u64>().unwrap()))
        });
        let container = Container::new(services.build());
        for key in 0..key_count {
            container.invoke("slot", &[Value::key(key)]).unwrap();
        }

        group.bench_with_input(
            BenchmarkId::from_parameter(key_count),
            &key_count,
            |b, &count| {
                b.iter(|| {
                    let v = container
                        .invoke("slot", &[Value::key(count / 2)])
                        .unwrap();
                    black_box(v);
                })
            },
        );
    }

    group.finish();
}

fn bench_dependency_graph(c: &mut Criterion) {
    let mut services = Registry::builder();
    services.singleton("greeting", |_, _| Ok(Value::new("Hello, world".to_string())));
    services.multikey_multiton("pair", |_, args| {
        let x = *args[0].downcast_ref::<i32>().unwrap();
        let y = *args[1].downcast_ref::<i32>().unwrap();
        Ok(Value::new(vec![x, y]))
    });
    services.generic("stuff", |c, _| {
        let greeting = c.get::<String>("greeting")?;
        let pair = c.get_with::<Vec<i32>>("pair", &[Value::key(100), Value::key(200)])?;
        Ok(Value::new(((*greeting).clone(), (*pair).clone())))
    });
    let container = Container::new(services.build());

    // `stuff` is generic, so every iteration walks the graph; its
    // dependencies stay cached.
    c.bench_function("graph_resolution", |b| {
        b.iter(|| {
            let v = container.invoke("stuff", &[]).unwrap();
            black_box(v);
        })
    });
}

fn bench_delegated_call(c: &mut Criterion) {
    use lattice_di::{DiResult, InjectionLink, ServiceObject};

    #[derive(Default)]
    struct Widget {
        link: InjectionLink,
    }

    impl ServiceObject for Widget {
        fn dispatch(&self, method: &str, _args: &[Value]) -> Option<DiResult<Value>> {
            match method {
                "local" => Some(Ok(Value::new(1u64))),
                _ => None,
            }
        }

        fn injection_link(&self) -> &InjectionLink {
            &self.link
        }
    }

    let mut services = Registry::builder();
    services.singleton("widget", |_, _| Ok(Value::object(Widget::default())));
    services.singleton("sibling", |_, _| Ok(Value::new(2u64)));
    let container = Container::new(services.build());
    let widget = container.invoke("widget", &[]).unwrap();

    let mut group = c.benchmark_group("dynamic_call");

    group.bench_function("own_dispatch", |b| {
        b.iter(|| black_box(widget.call("local", &[]).unwrap()))
    });
    group.bench_function("delegated_to_container", |b| {
        b.iter(|| black_box(widget.call("sibling", &[]).unwrap()))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_singleton_hit,
    bench_singleton_cold,
    bench_policy_hit_paths,
    bench_multiton_key_count,
    bench_dependency_graph,
    bench_delegated_call
);
criterion_main!(benches);
