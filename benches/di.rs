use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::sync::{Arc, OnceLock};
use wrought_di::{Bean, BeanDefinition, BeanValue, Container};

struct Leaf {
    value: u64,
}
impl Bean for Leaf {}

struct Node {
    leaf: OnceLock<Arc<Leaf>>,
}
impl Bean for Node {}

// ===== Micro Benchmarks =====

fn bench_singleton_hit(c: &mut Criterion) {
    let container = Container::new();
    container
        .register_definition(
            "leaf",
            BeanDefinition::for_type::<Leaf>().constructor(|_| Ok(Leaf { value: 42 })),
        )
        .unwrap();

    // Prime the singleton
    let _ = container.get("leaf").unwrap();

    c.bench_function("singleton_hit", |b| {
        b.iter(|| {
            let v = container.get_as::<Leaf>("leaf").unwrap();
            black_box(v.value);
        })
    });
}

fn bench_singleton_cold(c: &mut Criterion) {
    c.bench_function("singleton_cold_expensive", |b| {
        b.iter_batched(
            || {
                let container = Container::new();
                container
                    .register_definition(
                        "leaf",
                        BeanDefinition::for_type::<Leaf>().constructor(|_| {
                            Ok(Leaf {
                                value: (0..1000u64).sum(),
                            })
                        }),
                    )
                    .unwrap();
                container
            },
            |container| {
                let v = container.get_as::<Leaf>("leaf").unwrap();
                black_box(v.value);
            },
            criterion::BatchSize::SmallInput,
        )
    });
}

fn bench_prototype_resolution(c: &mut Criterion) {
    let container = Container::new();
    container
        .register_definition(
            "leaf",
            BeanDefinition::for_type::<Leaf>()
                .prototype()
                .constructor(|_| Ok(Leaf { value: 7 })),
        )
        .unwrap();

    c.bench_function("prototype", |b| {
        b.iter(|| {
            let v = container.get_as::<Leaf>("leaf").unwrap();
            black_box(v.value);
        })
    });
}

fn bench_wired_graph(c: &mut Criterion) {
    c.bench_function("wired_graph_cold", |b| {
        b.iter_batched(
            || {
                let container = Container::new();
                container
                    .register_definition(
                        "leaf",
                        BeanDefinition::for_type::<Leaf>().constructor(|_| Ok(Leaf { value: 1 })),
                    )
                    .unwrap();
                container
                    .register_definition(
                        "node",
                        BeanDefinition::for_type::<Node>()
                            .constructor(|_| Ok(Node { leaf: OnceLock::new() }))
                            .setter("leaf", |n: &Node, l: Arc<Leaf>| {
                                let _ = n.leaf.set(l);
                            })
                            .property("leaf", BeanValue::reference("leaf")),
                    )
                    .unwrap();
                container
            },
            |container| {
                let node = container.get_as::<Node>("node").unwrap();
                black_box(node.leaf.get().unwrap().value);
            },
            criterion::BatchSize::SmallInput,
        )
    });
}

fn bench_alias_resolution(c: &mut Criterion) {
    let container = Container::new();
    container
        .register_definition(
            "leaf",
            BeanDefinition::for_type::<Leaf>().constructor(|_| Ok(Leaf { value: 3 })),
        )
        .unwrap();
    container.register_alias("leaf", "l1").unwrap();
    container.register_alias("l1", "l2").unwrap();
    let _ = container.get("leaf").unwrap();

    c.bench_function("alias_chain_hit", |b| {
        b.iter(|| {
            let v = container.get_as::<Leaf>("l2").unwrap();
            black_box(v.value);
        })
    });
}

criterion_group!(
    benches,
    bench_singleton_hit,
    bench_singleton_cold,
    bench_prototype_resolution,
    bench_wired_graph,
    bench_alias_resolution
);
criterion_main!(benches);
