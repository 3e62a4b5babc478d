use sweepraw_core::{
    encode_header, plan_sweep, CallbackAction, OutputSink, StopReason, StopSignal, SweepState,
    Timestamper, TransferProcessor,
};
use sweepraw_types::{
    StopPolicy, SweepTable, Timestamp, BLOCKS_PER_TRANSFER, BLOCK_HEADER_SIZE, BYTES_PER_BLOCK,
    DEFAULT_SAMPLE_RATE_HZ, TUNE_STEP_MHZ, TUNING_OFFSET_HZ,
};

// ===========================================================================
// Helpers: детерминированный поток блоков
// ===========================================================================

/// Блок с детерминированным пилообразным IQ в диапазоне -32..32 (без 0x7F).
fn payload_block(seed: u8) -> Vec<u8> {
    (0..BYTES_PER_BLOCK)
        .map(|i| ((((i as u8).wrapping_add(seed) & 0x3F) as i8) - 32) as u8)
        .collect()
}

/// Бесконечный поток блоков: на каждую частоту один блок с маркером и
/// `extra` блоков без маркера.
fn block_stream(
    table: &SweepTable,
    extra: usize,
) -> impl Iterator<Item = Vec<u8>> + '_ {
    let freqs: Vec<u64> = table.tuning_frequencies(TUNING_OFFSET_HZ).collect();

    freqs.into_iter().cycle().flat_map(move |f| {
        let mut tagged = payload_block(1);
        encode_header(&mut tagged, f);
        std::iter::once(tagged).chain((0..extra).map(|i| payload_block(i as u8)))
    })
}

fn transfers(
    table: &SweepTable,
    extra: usize,
) -> impl Iterator<Item = Vec<u8>> + '_ {
    let mut blocks = block_stream(table, extra);
    std::iter::from_fn(move || {
        let t: Vec<u8> = (0..BLOCKS_PER_TRANSFER)
            .filter_map(|_| blocks.next())
            .flatten()
            .collect();
        Some(t)
    })
}

struct Run {
    output: String,
    sentinel_sightings: usize,
    transfers: usize,
}

fn run_until_stop(
    table: &SweepTable,
    policy: StopPolicy,
    extra: usize,
) -> (Run, std::sync::Arc<SweepState>, std::sync::Arc<StopSignal>) {
    let state = SweepState::new();
    let stop = StopSignal::new();
    let mut processor = TransferProcessor::for_sweep(
        table,
        TUNING_OFFSET_HZ,
        policy,
        Timestamper::for_sweep(8_192 * (extra as u32 + 1), DEFAULT_SAMPLE_RATE_HZ),
        state.clone(),
        stop.clone(),
    );
    let sentinel = table.sentinel_hz(TUNING_OFFSET_HZ);

    let mut sink = OutputSink::new(Vec::new());
    let mut sightings = 0usize;
    let mut count = 0usize;

    for transfer in transfers(table, extra).take(1_000) {
        count += 1;
        let outcome = processor.process(
            &transfer,
            transfer.len(),
            Timestamp::new(1_704_067_200, 0),
            |segment| {
                if segment.tagged && segment.frequency == sentinel {
                    sightings += 1;
                }
                sink.write_segment(&segment).is_ok()
            },
        );

        if outcome.action == CallbackAction::Stop {
            break;
        }
    }

    let output = String::from_utf8(sink.into_inner().unwrap()).unwrap();
    (
        Run {
            output,
            sentinel_sightings: sightings,
            transfers: count,
        },
        state,
        stop,
    )
}

// ===========================================================================
// Tests
// ===========================================================================

#[test]
fn test_two_range_fixed_count_sweep() {
    let table = plan_sweep(&[(0, 20), (100, 120)], TUNE_STEP_MHZ).unwrap();
    let (run, state, stop) = run_until_stop(&table, StopPolicy::FixedCount(2), 1);

    assert_eq!(run.sentinel_sightings, 3, "start + two completed sweeps");
    assert_eq!(run.transfers, 1, "sentinel #3 is block 8 of the first transfer");
    assert_eq!(state.sweep_count(), 2);
    assert_eq!(stop.reason(), Some(StopReason::SweepsComplete));

    let freq_lines: Vec<&str> = run
        .output
        .lines()
        .filter(|l| l.starts_with("freq="))
        .collect();
    assert_eq!(
        freq_lines,
        vec![
            "freq=7500000",
            "freq=107500000",
            "freq=7500000",
            "freq=107500000",
            "freq=7500000",
        ]
    );

    // 5 блоков с маркером + 4 без маркера между ними
    let tagged_pairs = (BYTES_PER_BLOCK - BLOCK_HEADER_SIZE) / 2;
    let untagged_pairs = BYTES_PER_BLOCK / 2;
    let sample_lines = run.output.lines().count() - freq_lines.len();
    assert_eq!(sample_lines, 5 * tagged_pairs + 4 * untagged_pairs);
}

#[test]
fn test_one_shot_across_transfers() {
    // 0:100 → 5 шагов, по 4 блока на частоту → 20 блоков на проход
    let table = plan_sweep(&[(0, 100)], TUNE_STEP_MHZ).unwrap();
    let (run, state, _) = run_until_stop(&table, StopPolicy::OneShot, 3);

    assert_eq!(run.sentinel_sightings, 2);
    assert_eq!(run.transfers, 2);
    assert_eq!(state.sweep_count(), 1);
    assert!(state.last_timestamp() >= state.sweep_start());
}

#[test]
fn test_output_lines_are_signed_pairs() {
    let table = plan_sweep(&[(0, 20)], TUNE_STEP_MHZ).unwrap();
    let (run, _, _) = run_until_stop(&table, StopPolicy::OneShot, 0);

    for line in run.output.lines().filter(|l| !l.starts_with("freq=")) {
        let parts: Vec<i8> = line
            .split(' ')
            .map(|v| v.parse::<i8>().expect("signed 8-bit value"))
            .collect();
        assert_eq!(parts.len(), 2, "line {line:?}");
    }
}

#[test]
fn test_leading_untagged_blocks_dropped() {
    let table = plan_sweep(&[(0, 20)], TUNE_STEP_MHZ).unwrap();
    let state = SweepState::new();
    let stop = StopSignal::new();
    let mut processor = TransferProcessor::for_sweep(
        &table,
        TUNING_OFFSET_HZ,
        StopPolicy::Unbounded,
        Timestamper::for_sweep(8_192, DEFAULT_SAMPLE_RATE_HZ),
        state,
        stop,
    );

    let transfer: Vec<u8> = (0..BLOCKS_PER_TRANSFER)
        .flat_map(|i| payload_block(i as u8))
        .collect();
    let mut emitted = 0;
    let outcome = processor.process(&transfer, transfer.len(), Timestamp::now(), |_| {
        emitted += 1;
        true
    });

    assert_eq!(emitted, 0);
    assert_eq!(outcome.dropped as usize, BLOCKS_PER_TRANSFER);
}
