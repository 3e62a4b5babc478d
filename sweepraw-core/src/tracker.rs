use sweepraw_types::{StopPolicy, SweepTable};

/// Состояние отслеживания проходов.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerState {
    /// Начальная частота ещё не встречалась
    NotStarted,
    /// Идёт захват, проходы считаются
    Running,
    /// Политика остановки выполнена (терминальное состояние)
    Done,
}

/// Что произошло после очередной частоты из заголовка.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerEvent {
    /// Частота не является границей прохода
    None,
    /// Первая встреча начальной частоты: отсчёт проходов начат
    SweepStarted,
    /// Завершён очередной проход
    SweepCompleted { count: u64 },
    /// Завершён последний проход по политике
    Done { count: u64 },
}

/// Автомат границ прохода: `NotStarted -> Running -> Done`.
///
/// Граница прохода: частота начала первого диапазона плюс смещение. Таблица
/// без пересечений гарантирует, что такая частота в проходе одна.
#[derive(Debug, Clone)]
pub struct SweepTracker {
    sentinel_hz: u64,
    policy: StopPolicy,
    state: TrackerState,
    sweep_count: u64,
}

impl SweepTracker {
    pub fn new(
        sentinel_hz: u64,
        policy: StopPolicy,
    ) -> Self {
        Self {
            sentinel_hz,
            policy,
            state: TrackerState::NotStarted,
            sweep_count: 0,
        }
    }

    pub fn for_table(
        table: &SweepTable,
        tuning_offset_hz: u64,
        policy: StopPolicy,
    ) -> Self {
        Self::new(table.sentinel_hz(tuning_offset_hz), policy)
    }

    pub fn state(&self) -> TrackerState {
        self.state
    }

    pub fn sweep_count(&self) -> u64 {
        self.sweep_count
    }

    pub fn sentinel_hz(&self) -> u64 {
        self.sentinel_hz
    }

    pub fn is_done(&self) -> bool {
        self.state == TrackerState::Done
    }

    /// Обрабатывает частоту блока с маркером.
    pub fn observe(
        &mut self,
        frequency: u64,
    ) -> TrackerEvent {
        if frequency != self.sentinel_hz {
            return TrackerEvent::None;
        }

        match self.state {
            TrackerState::NotStarted => {
                self.state = TrackerState::Running;
                TrackerEvent::SweepStarted
            }
            TrackerState::Running => {
                self.sweep_count += 1;

                if self.policy.is_satisfied(self.sweep_count) {
                    self.state = TrackerState::Done;
                    TrackerEvent::Done {
                        count: self.sweep_count,
                    }
                } else {
                    TrackerEvent::SweepCompleted {
                        count: self.sweep_count,
                    }
                }
            }
            TrackerState::Done => TrackerEvent::None,
        }
    }
}
