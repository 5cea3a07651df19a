//! Benchmarks for yEnc binary encoding/decoding
//!
//! Decoding speed bounds download throughput, encoding speed bounds posting.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use usenet_wire::yenc::{DecodeResult, Decoder, Encoder, LineEnding};

const SIZES: [usize; 4] = [1_024, 102_400, 1_024_000, 10_240_000];

fn sample(size: usize) -> Vec<u8> {
    (0..size).map(|i| (i % 256) as u8).collect()
}

fn encoded_sample(size: usize) -> Vec<u8> {
    let data = sample(size);
    usenet_wire::yenc::encode_buffer(&data, "bench.bin", 128).expect("encode")
}

fn bench_yenc_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("yenc_encode");

    for size in SIZES {
        group.throughput(Throughput::Bytes(size as u64));
        let data = sample(size);
        let mut out = Vec::with_capacity(size + size / 16);

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}KB", size / 1024)),
            &size,
            |b, _| {
                b.iter(|| {
                    out.clear();
                    let mut encoder = Encoder::new("bench.bin").with_line_ending(LineEnding::CrLf);
                    encoder.init(&mut out, data.len() as u64, None).unwrap();
                    encoder.encode_usenet_chunk(&mut out, black_box(&data)).unwrap();
                    encoder.close(&mut out).unwrap();
                    out.len()
                });
            },
        );
    }

    group.finish();
}

fn bench_yenc_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("yenc_decode");

    for size in SIZES {
        group.throughput(Throughput::Bytes(size as u64));
        let encoded = encoded_sample(size);
        let mut out = vec![0u8; size];

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}KB", size / 1024)),
            &size,
            |b, _| {
                b.iter(|| {
                    let mut decoder = Decoder::new();
                    let mut len = 0;
                    for line in black_box(&encoded).split(|&b| b == b'\n') {
                        if decoder.decode_into(line, &mut out, &mut len) == DecodeResult::Complete {
                            break;
                        }
                    }
                    decoder.actual_crc32()
                });
            },
        );
    }

    group.finish();
}

fn bench_yenc_crc32(c: &mut Criterion) {
    let mut group = c.benchmark_group("yenc_crc32");

    for size in SIZES {
        group.throughput(Throughput::Bytes(size as u64));
        let data = vec![0u8; size];

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}KB", size / 1024)),
            &size,
            |b, _| {
                b.iter(|| {
                    let mut crc = usenet_wire::Crc32::new();
                    crc.update(black_box(&data));
                    crc.value()
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_yenc_encode, bench_yenc_decode, bench_yenc_crc32);
criterion_main!(benches);
