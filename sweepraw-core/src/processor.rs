use std::sync::Arc;

use log::{debug, info};
use sweepraw_types::{StopPolicy, SweepTable, Timestamp};

use crate::{
    demux::{Block, BlockDemuxer, BlockLayout, Segment},
    state::{StopReason, StopSignal, SweepState},
    timestamp::Timestamper,
    tracker::{SweepTracker, TrackerEvent},
};

/// Ответ callback'а драйверу.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    Continue,
    Stop,
}

/// Итог обработки одного transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferOutcome {
    pub action: CallbackAction,
    /// Обработано блоков (до остановки)
    pub blocks: u32,
    pub tagged: u32,
    pub untagged: u32,
    /// Блоки без маркера до первого маркера сессии
    pub dropped: u32,
    /// Байты неполного последнего блока
    pub trailing_bytes: usize,
}

/// Тело callback'а: разбор блоков, учёт проходов, метки времени.
///
/// Живёт в потоке драйвера. Сам ничего не пишет: каждый сегмент отдаётся
/// вызывающему через `emit`.
pub struct TransferProcessor {
    demuxer: BlockDemuxer,
    tracker: SweepTracker,
    timestamper: Timestamper,
    state: Arc<SweepState>,
    stop: Arc<StopSignal>,
}

impl TransferOutcome {
    fn new(trailing_bytes: usize) -> Self {
        Self {
            action: CallbackAction::Continue,
            blocks: 0,
            tagged: 0,
            untagged: 0,
            dropped: 0,
            trailing_bytes,
        }
    }

    fn stop(mut self) -> Self {
        self.action = CallbackAction::Stop;
        self
    }
}

impl TransferProcessor {
    pub fn new(
        layout: BlockLayout,
        tracker: SweepTracker,
        timestamper: Timestamper,
        state: Arc<SweepState>,
        stop: Arc<StopSignal>,
    ) -> Self {
        Self {
            demuxer: BlockDemuxer::new(layout),
            tracker,
            timestamper,
            state,
            stop,
        }
    }

    /// Процессор для таблицы sweep с раскладкой HackRF.
    pub fn for_sweep(
        table: &SweepTable,
        tuning_offset_hz: u64,
        policy: StopPolicy,
        timestamper: Timestamper,
        state: Arc<SweepState>,
        stop: Arc<StopSignal>,
    ) -> Self {
        Self::new(
            BlockLayout::HACKRF,
            SweepTracker::for_table(table, tuning_offset_hz, policy),
            timestamper,
            state,
            stop,
        )
    }

    pub fn tracker(&self) -> &SweepTracker {
        &self.tracker
    }

    /// Обрабатывает transfer, пришедший в момент `arrival`.
    ///
    /// `emit` получает сегменты строго по порядку; `false` означает, что
    /// получатель закрыт, и захват останавливается с `OutputFailed`.
    pub fn process<F>(
        &mut self,
        buffer: &[u8],
        valid_length: usize,
        arrival: Timestamp,
        mut emit: F,
    ) -> TransferOutcome
    where
        F: FnMut(Segment<'_>) -> bool,
    {
        let valid = &buffer[..valid_length.min(buffer.len())];
        let layout = self.demuxer.layout();
        let mut outcome = TransferOutcome::new(layout.trailing_bytes(valid.len()));

        self.state.add_bytes(valid.len() as u64);

        for (index, raw) in layout.blocks(valid).enumerate() {
            if self.stop.is_set() {
                return outcome.stop();
            }

            let block = Block::parse(raw);
            outcome.blocks += 1;

            match self.demuxer.resolve(block) {
                Some(segment) => {
                    if segment.tagged {
                        outcome.tagged += 1;
                    } else {
                        outcome.untagged += 1;
                    }

                    if !emit(segment) {
                        self.stop.request(StopReason::OutputFailed);
                        return outcome.stop();
                    }
                }
                None => outcome.dropped += 1,
            }

            let Some(frequency) = block.frequency() else {
                continue;
            };

            match self.tracker.observe(frequency) {
                TrackerEvent::None => {}
                TrackerEvent::SweepStarted => {
                    let at = self.timestamper.block_time(arrival, index);
                    self.state.mark_started(at);
                    debug!("First sweep started at {at}");
                }
                TrackerEvent::SweepCompleted { count } => {
                    let at = self.timestamper.block_time(arrival, index);
                    self.state.mark_sweep(count, at);
                    debug!("Sweep {count} completed at {at}");
                }
                TrackerEvent::Done { count } => {
                    let at = self.timestamper.block_time(arrival, index);
                    self.state.mark_sweep(count, at);
                    info!("Sweep {count} completed at {at}, stop policy satisfied");
                    self.stop.request(StopReason::SweepsComplete);
                    return outcome.stop();
                }
            }
        }

        outcome
    }
}
