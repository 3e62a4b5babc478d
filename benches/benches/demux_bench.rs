use std::{hint::black_box, io};

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use sweepraw_core::{
    encode_header, plan_sweep, BlockDemuxer, OutputSink, StopSignal, SweepState, Timestamper,
    TransferProcessor,
};
use sweepraw_types::{
    StopPolicy, Timestamp, BYTES_PER_BLOCK, BYTES_PER_TRANSFER, DEFAULT_SAMPLE_RATE_HZ,
    SAMPLES_PER_BLOCK, TUNE_STEP_MHZ, TUNING_OFFSET_HZ,
};

/// Transfer, в котором каждый четвёртый блок несёт заголовок.
fn make_transfer(frequencies: &[u64]) -> Vec<u8> {
    let mut buf = vec![0u8; BYTES_PER_TRANSFER];

    for (i, block) in buf.chunks_exact_mut(BYTES_PER_BLOCK).enumerate() {
        for (j, b) in block.iter_mut().enumerate() {
            *b = ((i * 31 + j) % 200) as u8 ^ 0x80;
        }
        if i % 4 == 0 {
            encode_header(block, frequencies[(i / 4) % frequencies.len()]);
        }
    }

    buf
}

fn benchmark(c: &mut Criterion) {
    let table = plan_sweep(&[(0, 6_000)], TUNE_STEP_MHZ).unwrap();
    // Без начальной частоты: трекер не стартует, политика не срабатывает
    let frequencies: Vec<u64> = table
        .tuning_frequencies(TUNING_OFFSET_HZ)
        .skip(1)
        .take(8)
        .collect();
    let transfer = make_transfer(&frequencies);

    let mut group = c.benchmark_group("transfer");
    group.throughput(Throughput::Bytes(BYTES_PER_TRANSFER as u64));

    group.bench_function("demux", |b| {
        let mut demuxer = BlockDemuxer::default();
        b.iter(|| {
            demuxer
                .demux(black_box(&transfer))
                .filter(|(_, segment)| segment.is_some())
                .count()
        })
    });

    group.bench_function("process", |b| {
        let mut processor = TransferProcessor::for_sweep(
            &table,
            TUNING_OFFSET_HZ,
            StopPolicy::Unbounded,
            Timestamper::for_sweep(SAMPLES_PER_BLOCK, DEFAULT_SAMPLE_RATE_HZ),
            SweepState::new(),
            StopSignal::new(),
        );
        let arrival = Timestamp::now();
        b.iter(|| {
            processor.process(black_box(&transfer), transfer.len(), arrival, |segment| {
                black_box(segment.payload.len());
                true
            })
        })
    });

    group.bench_function("process+format", |b| {
        let mut processor = TransferProcessor::for_sweep(
            &table,
            TUNING_OFFSET_HZ,
            StopPolicy::Unbounded,
            Timestamper::for_sweep(SAMPLES_PER_BLOCK, DEFAULT_SAMPLE_RATE_HZ),
            SweepState::new(),
            StopSignal::new(),
        );
        let mut sink = OutputSink::new(io::sink());
        let arrival = Timestamp::now();
        b.iter(|| {
            processor.process(&transfer, transfer.len(), arrival, |segment| {
                sink.write_segment(&segment).is_ok()
            })
        })
    });

    group.finish();
}

criterion_group!(benches, benchmark);
criterion_main!(benches);
