use criterion::*;
use std::hint::black_box;

mod common;
use common::*;


#[derive(Clone, Copy)]
struct Marker {
    _flag: u8,
}

fn transition_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("transition");

    // First add/remove on a type pair computes the target archetype; every
    // later transition over the same pair is an edge-cache hit.
    group.bench_function("add_remove_component_10k_warm_edges", |b| {
        b.iter_batched(
            || {
                let mut world = make_world();
                world.register::<Marker>().unwrap();
                populate(&mut world, ENTITIES_MED);
                let (position, _, _) = ids(&world);
                let handles: Vec<_> = world
                    .query(&[position])
                    .iter()
                    .map(|r| r.entity())
                    .collect();

                // Warm the add/remove edges with one round trip.
                world.add(handles[0], Marker { _flag: 1 });
                world.remove::<Marker>(handles[0]);
                (world, handles)
            },
            |(mut world, handles)| {
                for &handle in &handles {
                    world.add(handle, Marker { _flag: 1 });
                }
                for &handle in &handles {
                    world.remove::<Marker>(handle);
                }
                black_box(world);
            },
            BatchSize::LargeInput,
        );
    });

    group.bench_function("add_component_1k_cold_graph", |b| {
        b.iter_batched(
            || {
                let mut world = make_world();
                world.register::<Marker>().unwrap();
                populate(&mut world, ENTITIES_SMALL);
                let (position, _, _) = ids(&world);
                let handles: Vec<_> = world
                    .query(&[position])
                    .iter()
                    .map(|r| r.entity())
                    .collect();
                (world, handles)
            },
            |(mut world, handles)| {
                for &handle in &handles {
                    world.add(handle, Marker { _flag: 0 });
                }
                black_box(world);
            },
            BatchSize::LargeInput,
        );
    });

    group.finish();
}

criterion_group!(benches, transition_benchmark);
criterion_main!(benches);
