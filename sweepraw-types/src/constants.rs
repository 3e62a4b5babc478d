//! Аппаратные константы режима sweep (HackRF One).

/// Один мегагерц в герцах.
pub const FREQ_ONE_MHZ: u64 = 1_000_000;

/// Верхняя граница перестройки приёмника (МГц).
pub const FREQ_MAX_MHZ: u32 = 7_250;

/// Частота дискретизации в режиме sweep.
pub const DEFAULT_SAMPLE_RATE_HZ: u32 = 20_000_000;
/// Полоса baseband-фильтра в режиме sweep.
pub const DEFAULT_BASEBAND_FILTER_BANDWIDTH_HZ: u32 = 15_000_000;

/// Шаг перестройки равен полосе дискретизации.
pub const TUNE_STEP_MHZ: u32 = (DEFAULT_SAMPLE_RATE_HZ as u64 / FREQ_ONE_MHZ) as u32;
/// Смещение LO относительно начала шага.
pub const TUNING_OFFSET_HZ: u64 = 7_500_000;

/// Размер одного блока в transfer (байт).
pub const BYTES_PER_BLOCK: usize = 16_384;
/// IQ пар в блоке без заголовка (int8 I + int8 Q).
pub const SAMPLES_PER_BLOCK: u32 = (BYTES_PER_BLOCK / 2) as u32;
/// Блоков в одном transfer.
pub const BLOCKS_PER_TRANSFER: usize = 16;
/// Размер transfer (байт).
pub const BYTES_PER_TRANSFER: usize = BYTES_PER_BLOCK * BLOCKS_PER_TRANSFER;
/// Блоки, которые прошивка выбрасывает после каждой перестройки.
pub const THROWAWAY_BLOCKS: u32 = 2;

/// Максимальное число диапазонов в таблице sweep.
pub const MAX_SWEEP_RANGES: usize = 10;

/// Байт маркера заголовка блока (оба первых байта).
pub const MARKER_BYTE: u8 = 0x7F;
/// Размер заголовка блока: 2 байта маркера + 8 байт частоты.
pub const BLOCK_HEADER_SIZE: usize = 10;
