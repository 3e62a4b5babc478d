use std::{
    path::Path,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Instant,
};

use serde::Serialize;
use sweepraw_core::{StopSignal, SweepState, TransferOutcome};
use sweepraw_types::Timestamp;

use crate::RecorderResult;

/// Метрики, обновляемые lock-free из нескольких потоков.
#[derive(Debug, Default)]
pub struct SweepMetrics {
    pub transfers: AtomicU64,
    pub bytes_received: AtomicU64,
    pub blocks_tagged: AtomicU64,
    pub blocks_untagged: AtomicU64,
    pub blocks_dropped: AtomicU64,
    pub partial_bytes: AtomicU64,
    pub samples_written: AtomicU64,
    pub freq_lines_written: AtomicU64,
    pub backpressure_events: AtomicU64,
}

/// Snapshot метрик для отображения и записи в JSON.
#[derive(Debug, Clone, Serialize)]
pub struct SweepSummary {
    pub duration_secs: f64,
    pub total_sweeps: u64,
    pub sweep_rate: f64,
    pub stop_reason: Option<String>,
    pub first_sweep_at: Option<Timestamp>,
    pub last_sweep_at: Option<Timestamp>,
    pub transfers: u64,
    pub bytes_received: u64,
    pub blocks_tagged: u64,
    pub blocks_untagged: u64,
    pub blocks_dropped: u64,
    pub partial_bytes: u64,
    pub samples_written: u64,
    pub freq_lines_written: u64,
    pub backpressure_events: u64,
}

impl SweepMetrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Учитывает результат одного вызова callback.
    pub fn record_transfer(
        &self,
        bytes: u64,
        outcome: &TransferOutcome,
    ) {
        self.transfers.fetch_add(1, Ordering::Relaxed);
        self.bytes_received.fetch_add(bytes, Ordering::Relaxed);
        self.blocks_tagged
            .fetch_add(outcome.tagged as u64, Ordering::Relaxed);
        self.blocks_untagged
            .fetch_add(outcome.untagged as u64, Ordering::Relaxed);
        self.blocks_dropped
            .fetch_add(outcome.dropped as u64, Ordering::Relaxed);
        self.partial_bytes
            .fetch_add(outcome.trailing_bytes as u64, Ordering::Relaxed);
    }

    /// Итоговая сводка для вывода в конце сессии.
    pub fn summary(
        &self,
        elapsed: &Instant,
        state: &SweepState,
        stop: &StopSignal,
    ) -> SweepSummary {
        let duration_secs = elapsed.elapsed().as_secs_f64();
        let total_sweeps = state.sweep_count();

        SweepSummary {
            duration_secs,
            total_sweeps,
            sweep_rate: if duration_secs < 1e-9 {
                0.0
            } else {
                total_sweeps as f64 / duration_secs
            },
            stop_reason: stop.reason().map(|r| r.to_string()),
            first_sweep_at: state.sweep_start(),
            last_sweep_at: state.last_timestamp(),
            transfers: self.transfers.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            blocks_tagged: self.blocks_tagged.load(Ordering::Relaxed),
            blocks_untagged: self.blocks_untagged.load(Ordering::Relaxed),
            blocks_dropped: self.blocks_dropped.load(Ordering::Relaxed),
            partial_bytes: self.partial_bytes.load(Ordering::Relaxed),
            samples_written: self.samples_written.load(Ordering::Relaxed),
            freq_lines_written: self.freq_lines_written.load(Ordering::Relaxed),
            backpressure_events: self.backpressure_events.load(Ordering::Relaxed),
        }
    }
}

impl SweepSummary {
    /// Записывает сводку в JSON файл.
    pub fn write_json(
        &self,
        path: &Path,
    ) -> RecorderResult<()> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }
}

impl std::fmt::Display for SweepSummary {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        writeln!(f, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
        writeln!(
            f,
            "  Total sweeps  : {} in {:.5}s ({:.2} sweeps/second)",
            self.total_sweeps, self.duration_secs, self.sweep_rate
        )?;
        if let Some(reason) = &self.stop_reason {
            writeln!(f, "  Stopped       : {reason}")?;
        }
        writeln!(f, "  Transfers     : {}", self.transfers)?;
        writeln!(
            f,
            "  Received      : {:.1} MB",
            self.bytes_received as f64 / 1e6
        )?;
        writeln!(
            f,
            "  Blocks        : {} tagged, {} carried, {} dropped",
            self.blocks_tagged, self.blocks_untagged, self.blocks_dropped
        )?;
        writeln!(f, "  Samples out   : {}", self.samples_written)?;
        writeln!(f, "  Backpressure  : {}", self.backpressure_events)?;
        write!(f, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")
    }
}
