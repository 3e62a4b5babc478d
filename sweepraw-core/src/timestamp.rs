use std::time::Duration;

use sweepraw_types::{Timestamp, SAMPLES_PER_BLOCK, THROWAWAY_BLOCKS};

/// Восстанавливает время захвата блока внутри transfer.
///
/// Предполагается, что блоки одного transfer выдаются с постоянным темпом:
/// на каждую частоту уходит `samples_per_frequency` полезных выборок плюс
/// выброшенные прошивкой после перестройки.
#[derive(Debug, Clone, Copy)]
pub struct Timestamper {
    block_duration_ns: u64,
}

impl Timestamper {
    pub fn new(
        samples_per_frequency: u32,
        throwaway_samples: u32,
        sample_rate_hz: u32,
    ) -> Self {
        let samples = samples_per_frequency as u128 + throwaway_samples as u128;
        let block_duration_ns = samples * 1_000_000_000 / sample_rate_hz.max(1) as u128;

        Self {
            block_duration_ns: block_duration_ns as u64,
        }
    }

    /// Параметры HackRF: к каждой частоте добавляются `THROWAWAY_BLOCKS` блоков.
    pub fn for_sweep(
        samples_per_frequency: u32,
        sample_rate_hz: u32,
    ) -> Self {
        Self::new(
            samples_per_frequency,
            THROWAWAY_BLOCKS * SAMPLES_PER_BLOCK,
            sample_rate_hz,
        )
    }

    pub fn block_duration(&self) -> Duration {
        Duration::from_nanos(self.block_duration_ns)
    }

    /// Время блока `index` в transfer, пришедшем в момент `arrival`.
    pub fn block_time(
        &self,
        arrival: Timestamp,
        index: usize,
    ) -> Timestamp {
        arrival.add_nanos(self.block_duration_ns * index as u64)
    }
}
