use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use envsim::sim::{GeneratorConfig, ReadingGenerator, SensorType};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::hint::black_box;

fn benchmark_single_sensor_ticks(c: &mut Criterion) {
    let mut group = c.benchmark_group("generator_ticks");
    group.throughput(Throughput::Elements(1));

    for sensor_type in SensorType::ALL {
        let generator = ReadingGenerator::new(GeneratorConfig::default());
        let mut rng = StdRng::seed_from_u64(7);
        let at = chrono::Utc::now();

        group.bench_with_input(
            BenchmarkId::new("tick", sensor_type.as_str()),
            &sensor_type,
            |b, sensor_type| {
                b.iter(|| {
                    let reading = generator.generate_at_with_rng(*sensor_type, 1, at, &mut rng);
                    black_box(reading);
                });
            },
        );
    }

    group.finish();
}

/// Many sensors sharing one registry, as in a large fleet
fn benchmark_fleet_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("fleet_sweep");

    for fleet in [100u64, 1_000, 10_000] {
        let generator = ReadingGenerator::default();
        let mut rng = StdRng::seed_from_u64(11);
        let at = chrono::Utc::now();
        group.throughput(Throughput::Elements(fleet));

        group.bench_with_input(BenchmarkId::from_parameter(fleet), &fleet, |b, &fleet| {
            b.iter(|| {
                for id in 0..fleet {
                    let sensor_type = SensorType::ALL[(id % 6) as usize];
                    black_box(generator.generate_at_with_rng(sensor_type, id, at, &mut rng));
                }
            });
        });
    }

    group.finish();
}

fn benchmark_batch_history(c: &mut Criterion) {
    c.bench_function("batch_history_1000", |b| {
        b.iter(|| {
            let generator = ReadingGenerator::default();
            black_box(generator.batch_history(SensorType::Co2, 1, 1_000));
        });
    });
}

criterion_group!(
    benches,
    benchmark_single_sensor_ticks,
    benchmark_fleet_sweep,
    benchmark_batch_history
);
criterion_main!(benches);
