use criterion::*;
use std::hint::black_box;

use lattice_ecs::QuerySystem;

mod common;
use common::*;


fn iterate_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("iterate");

    group.bench_function("cached_query_write_position_100k", |b| {
        b.iter_batched(
            || {
                let mut world = make_world();
                populate(&mut world, ENTITIES_LARGE);
                let (position, velocity, _) = ids(&world);
                let query = QuerySystem::new(vec![position, velocity]);
                (world, query, position, velocity)
            },
            |(world, mut query, position, velocity)| {
                for row in query.query(&world) {
                    unsafe {
                        let vel = row.get::<Velocity>(velocity).unwrap();
                        let pos = row.get_mut::<Position>(position).unwrap();
                        pos.x += vel.dx;
                        pos.y += vel.dy;
                    }
                }
                black_box(world);
            },
            BatchSize::LargeInput,
        );
    });

    group.bench_function("warm_cache_requery_100k", |b| {
        b.iter_batched(
            || {
                let mut world = make_world();
                populate(&mut world, ENTITIES_LARGE);
                let (position, velocity, _) = ids(&world);
                let mut query = QuerySystem::new(vec![position, velocity]);
                // Prime the archetype cache once.
                black_box(query.query(&world).len());
                (world, query)
            },
            |(world, mut query)| {
                black_box(query.query(&world).len());
            },
            BatchSize::LargeInput,
        );
    });

    group.bench_function("count_100k", |b| {
        b.iter_batched(
            || {
                let mut world = make_world();
                populate(&mut world, ENTITIES_LARGE);
                let (position, _, _) = ids(&world);
                (world, QuerySystem::new(vec![position]))
            },
            |(world, mut query)| {
                black_box(query.count(&world));
            },
            BatchSize::LargeInput,
        );
    });

    group.bench_function("query_chunked_100k_by_4096", |b| {
        b.iter_batched(
            || {
                let mut world = make_world();
                populate(&mut world, ENTITIES_LARGE);
                let (position, _, _) = ids(&world);
                (world, QuerySystem::new(vec![position]))
            },
            |(world, mut query)| {
                let chunks = query.query_chunked(&world, 4096);
                black_box(chunks.len());
            },
            BatchSize::LargeInput,
        );
    });

    group.finish();
}

criterion_group!(benches, iterate_benchmark);
criterion_main!(benches);
