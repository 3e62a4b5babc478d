use std::{path::PathBuf, time::Duration};

use sweepraw_core::plan_sweep;
use sweepraw_types::{
    ConfigError, ConfigResult, StopPolicy, SweepTable, DEFAULT_BASEBAND_FILTER_BANDWIDTH_HZ,
    DEFAULT_SAMPLE_RATE_HZ, SAMPLES_PER_BLOCK, TUNE_STEP_MHZ,
};

use crate::device::DeviceSettings;

/// Максимальное усиление LNA (дБ), шаг 8.
pub const LNA_GAIN_MAX: u32 = 40;
pub const LNA_GAIN_STEP: u32 = 8;
/// Максимальное усиление VGA (дБ), шаг 2.
pub const VGA_GAIN_MAX: u32 = 62;
pub const VGA_GAIN_STEP: u32 = 2;

/// Диапазон по умолчанию, если `-f` не задан.
pub const DEFAULT_RANGE_MHZ: (u32, u32) = (0, 6_000);

/// Тип SDR устройства (выбор при старте).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceKind {
    /// Встроенный симулятор sweep (не требует железа).
    Simulated,
    /// HackRF One в режиме sweep.
    HackRf,
}

/// Куда писать IQ выборки.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    Stdout,
    File(PathBuf),
}

/// Полная конфигурация сессии sweep.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// Тип SDR устройства
    pub device: DeviceKind,
    /// Серийный номер устройства
    pub serial: Option<String>,
    /// Диапазоны `(min, max)` в МГц, в порядке обхода
    pub ranges: Vec<(u32, u32)>,
    /// Выборок на одну частоту (кратно 8192)
    pub samples_per_frequency: u32,
    /// Усиление LNA (дБ)
    pub lna_gain: u32,
    /// Усиление VGA (дБ)
    pub vga_gain: u32,
    /// Усилитель RF (None = не трогать)
    pub amp_enable: Option<bool>,
    /// Питание антенны (None = не трогать)
    pub antenna_enable: Option<bool>,
    /// Политика остановки
    pub stop_policy: StopPolicy,
    /// Выходной поток
    pub output: OutputTarget,
    /// Глубина очереди к потоку записи (сегментов)
    pub queue_capacity: usize,
    /// Период опроса управляющего цикла
    pub poll_interval: Duration,
    /// Интервал мониторинга скорости
    pub monitor_interval: Duration,
    /// Куда записать итоговую сводку в JSON
    pub summary_path: Option<PathBuf>,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl SweepConfig {
    /// Проверяет конфигурацию. Возвращает предупреждения, которые не
    /// прерывают запуск.
    pub fn validate(&self) -> ConfigResult<Vec<String>> {
        let mut warnings = Vec::new();

        if self.samples_per_frequency < SAMPLES_PER_BLOCK
            || self.samples_per_frequency % SAMPLES_PER_BLOCK != 0
        {
            return Err(ConfigError::InvalidSampleCount {
                value: self.samples_per_frequency,
                block: SAMPLES_PER_BLOCK,
            });
        }

        check_gain("lna_gain", self.lna_gain, LNA_GAIN_MAX, LNA_GAIN_STEP, &mut warnings)?;
        check_gain("vga_gain", self.vga_gain, VGA_GAIN_MAX, VGA_GAIN_STEP, &mut warnings)?;

        if self.queue_capacity == 0 {
            return Err(ConfigError::InvalidQueueCapacity);
        }

        if let StopPolicy::FixedCount(0) = self.stop_policy {
            return Err(ConfigError::InvalidSweepCount(0));
        }

        Ok(warnings)
    }

    /// Строит таблицу sweep. Без диапазонов используется `0:6000`.
    pub fn plan(&self) -> ConfigResult<SweepTable> {
        if self.ranges.is_empty() {
            plan_sweep(&[DEFAULT_RANGE_MHZ], TUNE_STEP_MHZ)
        } else {
            plan_sweep(&self.ranges, TUNE_STEP_MHZ)
        }
    }

    /// Параметры радиочасти для `SweepDevice::configure`.
    pub fn device_settings(&self) -> DeviceSettings {
        DeviceSettings {
            sample_rate_hz: DEFAULT_SAMPLE_RATE_HZ,
            baseband_filter_hz: DEFAULT_BASEBAND_FILTER_BANDWIDTH_HZ,
            lna_gain: self.lna_gain,
            vga_gain: self.vga_gain,
            amp_enable: self.amp_enable,
            antenna_enable: self.antenna_enable,
        }
    }
}

fn check_gain(
    name: &'static str,
    value: u32,
    max: u32,
    step: u32,
    warnings: &mut Vec<String>,
) -> ConfigResult<()> {
    if value > max {
        return Err(ConfigError::GainOutOfRange { name, value, max });
    }

    if value % step != 0 {
        warnings.push(format!("{name} must be a multiple of {step}, got {value}"));
    }

    Ok(())
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов
////////////////////////////////////////////////////////////////////////////////

impl std::fmt::Display for DeviceKind {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            DeviceKind::Simulated => write!(f, "sim"),
            DeviceKind::HackRf => write!(f, "hackrf"),
        }
    }
}

impl std::str::FromStr for DeviceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sim" | "simulated" => Ok(DeviceKind::Simulated),
            "hackrf" | "hackrf_one" => Ok(DeviceKind::HackRf),
            _ => Err(format!("Unknown device type: '{s}'. Use: sim, hackrf")),
        }
    }
}

impl std::fmt::Display for OutputTarget {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            OutputTarget::Stdout => write!(f, "<stdout>"),
            OutputTarget::File(p) => write!(f, "{}", p.display()),
        }
    }
}

impl std::str::FromStr for OutputTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "-" => Ok(OutputTarget::Stdout),
            path => Ok(OutputTarget::File(PathBuf::from(path))),
        }
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            device: DeviceKind::Simulated,
            serial: None,
            ranges: Vec::new(),
            samples_per_frequency: SAMPLES_PER_BLOCK,
            lna_gain: 16,
            vga_gain: 20,
            amp_enable: None,
            antenna_enable: None,
            stop_policy: StopPolicy::Unbounded,
            output: OutputTarget::Stdout,
            queue_capacity: 1_024, // 1024 * 16 КБ ~ 16 МБ
            poll_interval: Duration::from_millis(50),
            monitor_interval: Duration::from_secs(1),
            summary_path: None,
        }
    }
}

/// Парсит беззнаковое число: десятичное, `0x` hex или `0b` binary.
///
/// # Примеры
/// ```
/// use sweepraw_recorder::config::parse_u32;
/// assert_eq!(parse_u32("8192").unwrap(), 8192);
/// assert_eq!(parse_u32("0x2000").unwrap(), 8192);
/// assert_eq!(parse_u32("0b101").unwrap(), 5);
/// ```
pub fn parse_u32(s: &str) -> ConfigResult<u32> {
    let s = s.trim();

    let (digits, radix) = match s.get(..2) {
        Some("0x" | "0X") if s.len() > 2 => (&s[2..], 16),
        Some("0b" | "0B") if s.len() > 2 => (&s[2..], 2),
        _ => (s, 10),
    };

    u32::from_str_radix(digits, radix).map_err(|_| ConfigError::InvalidNumber(s.to_string()))
}

/// Парсит диапазон `min:max` (МГц).
pub fn parse_range(s: &str) -> ConfigResult<(u32, u32)> {
    let (min, max) = s
        .split_once(':')
        .ok_or_else(|| ConfigError::InvalidRangeSyntax(s.to_string()))?;

    let min = parse_u32(min).map_err(|_| ConfigError::InvalidRangeSyntax(s.to_string()))?;
    let max = parse_u32(max).map_err(|_| ConfigError::InvalidRangeSyntax(s.to_string()))?;

    if min >= max {
        return Err(ConfigError::EmptyRange { min, max });
    }

    Ok((min, max))
}

/// Флаг `0`/`1` из CLI.
pub fn parse_toggle(
    name: &'static str,
    value: u32,
) -> ConfigResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        _ => Err(ConfigError::InvalidToggle { name, value }),
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_u32_radix() {
        assert_eq!(parse_u32("16").unwrap(), 16);
        assert_eq!(parse_u32("0x10").unwrap(), 16);
        assert_eq!(parse_u32("0B10").unwrap(), 2);
        assert!(parse_u32("0x").is_err());
        assert!(parse_u32("12abc").is_err());
        assert!(parse_u32("-1").is_err());
    }

    #[test]
    fn test_parse_range() {
        assert_eq!(parse_range("2400:2500").unwrap(), (2400, 2500));
        assert_eq!(parse_range("0:0x14").unwrap(), (0, 20));
        assert!(matches!(
            parse_range("2500:2400"),
            Err(ConfigError::EmptyRange { .. })
        ));
        assert!(matches!(
            parse_range("2400"),
            Err(ConfigError::InvalidRangeSyntax(_))
        ));
    }

    #[test]
    fn test_parse_toggle() {
        assert!(!parse_toggle("amp_enable", 0).unwrap());
        assert!(parse_toggle("amp_enable", 1).unwrap());
        assert!(parse_toggle("amp_enable", 2).is_err());
    }

    #[test]
    fn test_output_target_fromstr() {
        assert_eq!("-".parse::<OutputTarget>().unwrap(), OutputTarget::Stdout);
        assert_eq!(
            "out.txt".parse::<OutputTarget>().unwrap(),
            OutputTarget::File(PathBuf::from("out.txt"))
        );
    }

    #[test]
    fn test_device_kind_fromstr() {
        assert_eq!("sim".parse::<DeviceKind>().unwrap(), DeviceKind::Simulated);
        assert_eq!("HackRF".parse::<DeviceKind>().unwrap(), DeviceKind::HackRf);
        assert!("pluto".parse::<DeviceKind>().is_err());
    }

    #[test]
    fn test_validate_sample_count() {
        let mut cfg = SweepConfig::default();
        assert!(cfg.validate().unwrap().is_empty());

        cfg.samples_per_frequency = 8_000;
        assert!(cfg.validate().is_err());

        cfg.samples_per_frequency = 8_192 * 3;
        assert!(cfg.validate().is_ok());

        cfg.samples_per_frequency = 8_192 + 1;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_gain_warnings_and_errors() {
        let mut cfg = SweepConfig {
            lna_gain: 10,
            vga_gain: 21,
            ..Default::default()
        };
        assert_eq!(cfg.validate().unwrap().len(), 2);

        cfg.lna_gain = 48;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::GainOutOfRange { name: "lna_gain", .. })
        ));
    }

    #[test]
    fn test_plan_uses_default_range() {
        let table = SweepConfig::default().plan().unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.ranges()[0].end_mhz, 6_000);
    }
}
