use std::sync::{
    atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering},
    Arc, Mutex,
};

use sweepraw_types::Timestamp;

/// Разделяемое состояние сессии sweep.
///
/// Пишется только потоком callback'а драйвера, читается управляющим потоком.
#[derive(Debug, Default)]
pub struct SweepState {
    started: AtomicBool,
    sweep_count: AtomicU64,
    byte_count: AtomicU64,
    sweep_start: Mutex<Option<Timestamp>>,
    last_timestamp: Mutex<Option<Timestamp>>,
}

/// Причина остановки захвата.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum StopReason {
    /// Ctrl+C / SIGTERM
    Interrupted = 1,
    /// Политика остановки выполнена
    SweepsComplete = 2,
    /// За интервал мониторинга не пришло ни одного байта
    DataStall = 3,
    /// Ошибка записи выходного потока
    OutputFailed = 4,
    /// Устройство перестало стримить само
    DeviceStopped = 5,
}

/// Единственный флаг остановки и его причина (побеждает первый).
#[derive(Debug, Default)]
pub struct StopSignal {
    flag: AtomicBool,
    reason: AtomicU8,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl SweepState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    pub fn sweep_count(&self) -> u64 {
        self.sweep_count.load(Ordering::Acquire)
    }

    /// Учитывает байты, пришедшие в transfer.
    pub fn add_bytes(
        &self,
        n: u64,
    ) {
        self.byte_count.fetch_add(n, Ordering::Relaxed);
    }

    /// Забирает счётчик байт за прошедший интервал и обнуляет его.
    pub fn take_byte_count(&self) -> u64 {
        self.byte_count.swap(0, Ordering::Relaxed)
    }

    /// Первая встреча начальной частоты.
    pub fn mark_started(
        &self,
        at: Timestamp,
    ) {
        if let Ok(mut start) = self.sweep_start.lock() {
            start.get_or_insert(at);
        }
        self.set_last_timestamp(at);
        self.started.store(true, Ordering::Release);
    }

    /// Завершение прохода номер `count`.
    pub fn mark_sweep(
        &self,
        count: u64,
        at: Timestamp,
    ) {
        self.set_last_timestamp(at);
        self.sweep_count.store(count, Ordering::Release);
    }

    pub fn sweep_start(&self) -> Option<Timestamp> {
        self.sweep_start.lock().ok().and_then(|t| *t)
    }

    pub fn last_timestamp(&self) -> Option<Timestamp> {
        self.last_timestamp.lock().ok().and_then(|t| *t)
    }

    fn set_last_timestamp(
        &self,
        at: Timestamp,
    ) {
        if let Ok(mut last) = self.last_timestamp.lock() {
            *last = Some(at);
        }
    }
}

impl StopReason {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            1 => Some(StopReason::Interrupted),
            2 => Some(StopReason::SweepsComplete),
            3 => Some(StopReason::DataStall),
            4 => Some(StopReason::OutputFailed),
            5 => Some(StopReason::DeviceStopped),
            _ => None,
        }
    }

    pub fn as_u8(&self) -> u8 {
        *self as u8
    }
}

impl StopSignal {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Запрашивает остановку. Возвращает `true`, если запрос первый.
    pub fn request(
        &self,
        reason: StopReason,
    ) -> bool {
        let first = self
            .reason
            .compare_exchange(0, reason.as_u8(), Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        self.flag.store(true, Ordering::Release);
        first
    }

    pub fn is_set(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    pub fn reason(&self) -> Option<StopReason> {
        StopReason::from_u8(self.reason.load(Ordering::Acquire))
    }
}

impl std::fmt::Display for StopReason {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            StopReason::Interrupted => write!(f, "interrupted"),
            StopReason::SweepsComplete => write!(f, "sweeps complete"),
            StopReason::DataStall => write!(f, "data stall"),
            StopReason::OutputFailed => write!(f, "output failed"),
            StopReason::DeviceStopped => write!(f, "device stopped streaming"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn test_first_stop_reason_wins() {
        let stop = StopSignal::new();
        assert!(!stop.is_set());
        assert_eq!(stop.reason(), None);

        assert!(stop.request(StopReason::SweepsComplete));
        assert!(!stop.request(StopReason::Interrupted));

        assert!(stop.is_set());
        assert_eq!(stop.reason(), Some(StopReason::SweepsComplete));
    }

    #[test]
    fn test_byte_count_swap() {
        let state = SweepState::new();
        state.add_bytes(100);
        state.add_bytes(28);

        assert_eq!(state.take_byte_count(), 128);
        assert_eq!(state.take_byte_count(), 0);
    }

    #[test]
    fn test_sweep_start_recorded_once() {
        let state = SweepState::new();
        state.mark_started(Timestamp::new(10, 0));
        state.mark_started(Timestamp::new(20, 0));
        state.mark_sweep(1, Timestamp::new(30, 0));

        assert!(state.is_started());
        assert_eq!(state.sweep_count(), 1);
        assert_eq!(state.sweep_start(), Some(Timestamp::new(10, 0)));
        assert_eq!(state.last_timestamp(), Some(Timestamp::new(30, 0)));
    }

    #[test]
    fn test_concurrent_stop_requests() {
        let stop = StopSignal::new();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let s = stop.clone();
                thread::spawn(move || s.request(StopReason::DataStall))
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|first| *first)
            .count();

        assert_eq!(winners, 1);
        assert!(stop.is_set());
    }
}
