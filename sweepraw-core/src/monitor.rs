use std::time::{Duration, Instant};

use thiserror::Error;

use crate::state::SweepState;

/// Интервал мониторинга по умолчанию.
pub const DEFAULT_MONITOR_INTERVAL: Duration = Duration::from_secs(1);

/// За целый интервал не пришло ни одного байта.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("couldn't transfer any data for {:.1} seconds ({total_sweeps} sweeps completed)", .elapsed.as_secs_f64())]
pub struct DataStall {
    pub elapsed: Duration,
    pub total_sweeps: u64,
}

/// Отчёт за один интервал мониторинга.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateReport {
    /// Всего завершённых проходов
    pub total_sweeps: u64,
    /// Проходов в секунду за этот интервал
    pub sweep_rate: f64,
    /// Проходов в секунду с начала сессии
    pub average_rate: f64,
    /// Байт получено за интервал
    pub bytes: u64,
    /// Длительность интервала
    pub elapsed: Duration,
}

/// Периодический подсчёт скорости проходов и детектор остановки данных.
#[derive(Debug)]
pub struct RateMonitor {
    interval: Duration,
    session_start: Instant,
    last_tick: Instant,
    last_sweep_count: u64,
}

impl RateMonitor {
    pub fn new(
        interval: Duration,
        now: Instant,
    ) -> Self {
        Self {
            interval,
            session_start: now,
            last_tick: now,
            last_sweep_count: 0,
        }
    }

    /// Вызывается из управляющего цикла. До истечения интервала возвращает
    /// `Ok(None)`; по истечении забирает счётчик байт из `state`.
    pub fn poll(
        &mut self,
        now: Instant,
        state: &SweepState,
    ) -> Result<Option<RateReport>, DataStall> {
        let elapsed = now.saturating_duration_since(self.last_tick);
        if elapsed < self.interval {
            return Ok(None);
        }

        let bytes = state.take_byte_count();
        let total_sweeps = state.sweep_count();
        let secs = elapsed.as_secs_f64();
        let since_start = now.saturating_duration_since(self.session_start).as_secs_f64();

        let report = RateReport {
            total_sweeps,
            sweep_rate: total_sweeps.saturating_sub(self.last_sweep_count) as f64 / secs,
            average_rate: if since_start > 0.0 {
                total_sweeps as f64 / since_start
            } else {
                0.0
            },
            bytes,
            elapsed,
        };

        self.last_tick = now;
        self.last_sweep_count = total_sweeps;

        if bytes == 0 {
            return Err(DataStall {
                elapsed,
                total_sweeps,
            });
        }

        Ok(Some(report))
    }
}

impl RateReport {
    /// Скорость данных за интервал (МБ/с).
    pub fn throughput_mbps(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();

        if secs < 1e-9 {
            return 0.0;
        }

        self.bytes as f64 / secs / 1_000_000.0
    }
}
