//! Benchmarks for end-to-end log decoding
//!
//! Measures throughput of:
//! - Clean logs with a typical mix of record types
//! - Logs interleaved with garbage bytes that force header resynchronisation
//! - Chunk sizes from tiny (many partial records) to large
//!
//! Platform: Cross-platform (synthetic logs, CI-safe)

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use dataflash::test_utils::{LogBuilder, Payload};
use dataflash::{MemorySink, ParserConfig, Session, TracingObserver};
use std::hint::black_box;

const RECORDS: u64 = 20_000;

/// Build a log resembling a short flight: IMU, baro, GPS and parameters.
fn synthetic_log(garbage_every: Option<u64>) -> Vec<u8> {
    let mut log = LogBuilder::new()
        .schema(0x80, "FMT", "BBnNZ", "Type,Length,Name,Format,Columns")
        .schema(0x81, "IMU", "Qffffff", "TimeUS,GyrX,GyrY,GyrZ,AccX,AccY,AccZ")
        .schema(0x82, "BARO", "Qffc", "TimeUS,Alt,Press,Temp")
        .schema(0x83, "GPS", "QBIHBcLLe", "TimeUS,Status,GMS,GWk,NSats,HDop,Lat,Lng,Alt")
        .schema(0x84, "PARM", "QNf", "TimeUS,Name,Value");

    for time in 0..RECORDS {
        let payload = match time % 4 {
            0 | 1 => Payload::new()
                .u64(time)
                .f32(0.01)
                .f32(-0.02)
                .f32(0.03)
                .f32(0.1)
                .f32(0.2)
                .f32(-9.8),
            2 => Payload::new().u64(time).f32(102.5).f32(1013.2).i16(2150),
            _ => Payload::new()
                .u64(time)
                .u8(3)
                .u32(345_600_000)
                .u16(2210)
                .u8(12)
                .i16(90)
                .i32(-353_632_610)
                .i32(1_491_652_590)
                .i32(58_420),
        };
        let type_code = match time % 4 {
            0 | 1 => 0x81,
            2 => 0x82,
            _ => 0x83,
        };
        log = log.record(type_code, &payload.build());

        if garbage_every.is_some_and(|every| time % every == 0) {
            log = log.raw(&[0x00, 0xA3, 0x7F, 0x95]);
        }
    }

    log.build()
}

fn decode(log: &[u8], chunk_size: usize) -> usize {
    let mut sink = MemorySink::new();
    let config = ParserConfig { chunk_size, ..Default::default() };
    let status = Session::with_config(&mut sink, TracingObserver, config)
        .expect("valid config")
        .parse(log, log.len() as u64);
    status.valid_reads
}

fn bench_clean_log(c: &mut Criterion) {
    let log = synthetic_log(None);

    let mut group = c.benchmark_group("clean_log");
    group.throughput(Throughput::Bytes(log.len() as u64));
    group.bench_function("default_chunk", |b| b.iter(|| black_box(decode(black_box(&log), 8192))));
    group.finish();
}

fn bench_corrupt_log(c: &mut Criterion) {
    let log = synthetic_log(Some(16));

    let mut group = c.benchmark_group("corrupt_log");
    group.throughput(Throughput::Bytes(log.len() as u64));
    group.bench_function("garbage_every_16", |b| {
        b.iter(|| black_box(decode(black_box(&log), 8192)))
    });
    group.finish();
}

fn bench_chunk_sizes(c: &mut Criterion) {
    let log = synthetic_log(None);

    let mut group = c.benchmark_group("chunk_size");
    group.throughput(Throughput::Bytes(log.len() as u64));
    for chunk_size in [64usize, 512, 8192, 65_536] {
        group.bench_with_input(BenchmarkId::from_parameter(chunk_size), &chunk_size, |b, &size| {
            b.iter(|| black_box(decode(black_box(&log), size)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_clean_log, bench_corrupt_log, bench_chunk_sizes);
criterion_main!(benches);
