//! Benchmarks for the per-packet ingestion path
//!
//! Measures the cost of routing packets through the coordinator:
//! - Packet validation and sample extraction
//! - Accumulation and boundary detection over a synthetic multi-lap session
//! - Artifact encoding of a full lap
//!
//! Platform: Cross-platform (synthetic data, in-memory sink, CI-safe)

use criterion::{BatchSize, Criterion, Throughput, criterion_group, criterion_main};
use lapsink::sinks::format::encode_record;
use lapsink::test_utils::synthetic_session;
use lapsink::{
    IngestionCoordinator, LapRecord, MemoryLapSink, Packet, PacketEvent, RecorderConfig,
    ValueFormat,
};
use std::hint::black_box;

fn bench_packet_validation(c: &mut Criterion) {
    let events = synthetic_session(1, 1_000);

    let mut group = c.benchmark_group("packet_validation");
    group.throughput(Throughput::Elements(events.len() as u64));

    group.bench_function("try_from_and_sample", |b| {
        b.iter(|| {
            for event in &events {
                let packet = Packet::try_from(black_box(event.clone())).expect("valid packet");
                black_box(packet.sample());
            }
        })
    });

    group.finish();
}

fn bench_session_ingest(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("Failed to build runtime");
    let events: Vec<PacketEvent> = synthetic_session(5, 2_000);

    let mut group = c.benchmark_group("session_ingest");
    group.throughput(Throughput::Elements(events.len() as u64));

    group.bench_function("five_laps_memory_sink", |b| {
        b.iter_batched(
            || {
                let coordinator =
                    IngestionCoordinator::new(MemoryLapSink::new(), &RecorderConfig::default());
                (coordinator, events.clone())
            },
            |(mut coordinator, events)| {
                runtime.block_on(async {
                    for event in events {
                        coordinator.handle(event).await.expect("ingest");
                    }
                    black_box(coordinator.report().laps_written.len())
                })
            },
            BatchSize::LargeInput,
        )
    });

    group.finish();
}

fn bench_lap_encoding(c: &mut Criterion) {
    let samples = synthetic_session(1, 5_000)
        .into_iter()
        .map(|event| Packet::try_from(event).expect("valid packet").sample())
        .collect();
    let record = LapRecord::new(1, samples, Some(90_000));

    let mut group = c.benchmark_group("lap_encoding");
    group.throughput(Throughput::Elements(record.len() as u64));

    group.bench_function("fixed_two_decimals", |b| {
        b.iter(|| black_box(encode_record(black_box(&record), ValueFormat::default())))
    });
    group.bench_function("raw_numbers", |b| {
        b.iter(|| black_box(encode_record(black_box(&record), ValueFormat::Raw)))
    });

    group.finish();
}

criterion_group!(benches, bench_packet_validation, bench_session_ingest, bench_lap_encoding);
criterion_main!(benches);
