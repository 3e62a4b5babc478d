use serde::Serialize;

use crate::FREQ_ONE_MHZ;

/// Диапазон частот в МГц, `[start_mhz, end_mhz)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FrequencyRange {
    pub start_mhz: u32,
    pub end_mhz: u32,
}

/// Упорядоченная таблица диапазонов. Порядок = порядок обхода при sweep.
///
/// Строится только планировщиком; после построения неизменяема и
/// разделяется между потоками через `Arc`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SweepTable {
    ranges: Vec<FrequencyRange>,
    step_mhz: u32,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl FrequencyRange {
    pub fn new(
        start_mhz: u32,
        end_mhz: u32,
    ) -> Self {
        Self { start_mhz, end_mhz }
    }

    /// Ширина диапазона (МГц).
    pub fn width_mhz(&self) -> u32 {
        self.end_mhz - self.start_mhz
    }

    /// Количество шагов перестройки внутри диапазона.
    pub fn step_count(
        &self,
        step_mhz: u32,
    ) -> u32 {
        self.width_mhz() / step_mhz
    }

    /// `true`, если диапазоны имеют общий участок.
    pub fn overlaps(
        &self,
        other: &FrequencyRange,
    ) -> bool {
        self.start_mhz < other.end_mhz && other.start_mhz < self.end_mhz
    }
}

impl SweepTable {
    /// Вызывается планировщиком, который уже проверил инварианты.
    pub fn from_planned(
        ranges: Vec<FrequencyRange>,
        step_mhz: u32,
    ) -> Self {
        Self { ranges, step_mhz }
    }

    pub fn ranges(&self) -> &[FrequencyRange] {
        &self.ranges
    }

    pub fn step_mhz(&self) -> u32 {
        self.step_mhz
    }

    pub fn step_hz(&self) -> u64 {
        self.step_mhz as u64 * FREQ_ONE_MHZ
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Частота, с которой начинается каждый проход: начало первого диапазона
    /// плюс смещение настройки.
    pub fn sentinel_hz(
        &self,
        tuning_offset_hz: u64,
    ) -> u64 {
        let start = self.ranges.first().map_or(0, |r| r.start_mhz);
        start as u64 * FREQ_ONE_MHZ + tuning_offset_hz
    }

    /// Общее количество перестроек за один проход.
    pub fn total_steps(&self) -> u64 {
        self.ranges
            .iter()
            .map(|r| r.step_count(self.step_mhz) as u64)
            .sum()
    }

    /// Частоты настройки (Гц) одного прохода в порядке обхода.
    pub fn tuning_frequencies(
        &self,
        tuning_offset_hz: u64,
    ) -> impl Iterator<Item = u64> + '_ {
        let step_hz = self.step_hz();
        self.ranges.iter().flat_map(move |r| {
            let base = r.start_mhz as u64 * FREQ_ONE_MHZ + tuning_offset_hz;
            (0..r.step_count(self.step_mhz) as u64).map(move |k| base + k * step_hz)
        })
    }

    /// Таблица в формате инициализатора sweep: `[min, max, min, max, ...]`.
    pub fn device_pairs(&self) -> Vec<u16> {
        self.ranges
            .iter()
            .flat_map(|r| [r.start_mhz as u16, r.end_mhz as u16])
            .collect()
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов
////////////////////////////////////////////////////////////////////////////////

impl std::fmt::Display for FrequencyRange {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "{}:{} MHz", self.start_mhz, self.end_mhz)
    }
}
