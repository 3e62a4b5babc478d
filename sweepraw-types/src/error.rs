use thiserror::Error;

/// Результат для операций конфигурации.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Ошибки конфигурации. Все обнаруживаются до старта стриминга.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Пустой или перевёрнутый диапазон
    #[error("freq_max must be greater than freq_min: {min}:{max} MHz")]
    EmptyRange { min: u32, max: u32 },

    /// Диапазон (после выравнивания по шагу) выходит за предел железа
    #[error("range {min}:{max} MHz exceeds the maximum of {limit} MHz")]
    RangeAboveMaximum { min: u32, max: u32, limit: u32 },

    /// Слишком много диапазонов
    #[error("specify a maximum of {limit} frequency ranges, got {count}")]
    TooManyRanges { count: usize, limit: usize },

    /// Не задано ни одного диапазона
    #[error("at least one frequency range is required")]
    NoRanges,

    /// Нулевой шаг перестройки
    #[error("tuning step must be non-zero")]
    ZeroStep,

    /// Диапазоны пересекаются после выравнивания
    #[error("ranges {first} and {second} overlap")]
    OverlappingRanges { first: String, second: String },

    /// Неверное количество выборок на частоту
    #[error("num_samples must be a non-zero multiple of {block}, got {value}")]
    InvalidSampleCount { value: u32, block: u32 },

    /// Усиление вне допустимого диапазона
    #[error("{name} must be in 0..={max} dB, got {value}")]
    GainOutOfRange {
        name: &'static str,
        value: u32,
        max: u32,
    },

    /// Флаг, который принимает только 0 или 1
    #[error("{name} shall be 0 or 1, got {value}")]
    InvalidToggle { name: &'static str, value: u32 },

    /// Количество проходов должно быть положительным
    #[error("num_sweeps must be at least 1, got {0}")]
    InvalidSweepCount(u32),

    /// Неверная ёмкость очереди записи
    #[error("queue capacity must be at least 1")]
    InvalidQueueCapacity,

    /// Ошибка разбора числа
    #[error("invalid number '{0}'")]
    InvalidNumber(String),

    /// Ошибка разбора диапазона `min:max`
    #[error("invalid frequency range '{0}', expected MIN:MAX in MHz")]
    InvalidRangeSyntax(String),
}
