use byteorder::{ByteOrder, LittleEndian};
use sweepraw_types::{BLOCKS_PER_TRANSFER, BLOCK_HEADER_SIZE, BYTES_PER_BLOCK, MARKER_BYTE};

/// Раскладка transfer на блоки.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockLayout {
    /// Размер блока (байт)
    pub block_size: usize,
    /// Максимум блоков в одном transfer
    pub blocks_per_transfer: usize,
}

/// Один блок transfer после разбора заголовка.
///
/// Формат блока с маркером:
/// ```text
/// [0..2]   MARKER     0x7F 0x7F
/// [2..10]  FREQUENCY  u64 LE, частота настройки (Гц)
/// [10..]   IQ_DATA    int8 I, int8 Q, ...
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Block<'a> {
    Tagged { frequency: u64, payload: &'a [u8] },
    Untagged { payload: &'a [u8] },
}

/// Порция IQ данных с частотой, к которой она отнесена.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    /// Частота (Гц): из заголовка или последняя известная
    pub frequency: u64,
    /// Частота пришла из заголовка этого блока
    pub tagged: bool,
    /// Сырые interleaved int8 IQ байты
    pub payload: &'a [u8],
}

/// Разбирает transfer'ы на блоки и приписывает им частоту.
///
/// Блок без маркера получает последнюю декодированную частоту сессии. До
/// первого маркера такие блоки отбрасываются.
// NOTE: частота переносится через любое количество блоков без маркера, даже
// если между ними мог произойти переход на новую частоту. Если прошивка
// когда-нибудь потеряет маркер при перестройке, выборки уйдут под старой
// частотой.
#[derive(Debug)]
pub struct BlockDemuxer {
    layout: BlockLayout,
    last_frequency: Option<u64>,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl BlockLayout {
    /// Раскладка HackRF в режиме sweep: 16 блоков по 16 КБ.
    pub const HACKRF: BlockLayout = BlockLayout {
        block_size: BYTES_PER_BLOCK,
        blocks_per_transfer: BLOCKS_PER_TRANSFER,
    };

    /// Блоки transfer'а в порядке поступления. Неполный хвост не выдаётся.
    pub fn blocks<'a>(
        &self,
        transfer: &'a [u8],
    ) -> impl Iterator<Item = &'a [u8]> {
        transfer
            .chunks_exact(self.block_size)
            .take(self.blocks_per_transfer)
    }

    /// Количество байт, не попавших ни в один целый блок.
    pub fn trailing_bytes(
        &self,
        transfer_len: usize,
    ) -> usize {
        let whole = (transfer_len / self.block_size).min(self.blocks_per_transfer);
        transfer_len - whole * self.block_size
    }
}

impl Default for BlockLayout {
    fn default() -> Self {
        Self::HACKRF
    }
}

impl<'a> Block<'a> {
    /// Разбирает блок. Маркер: оба первых байта равны `0x7F`.
    pub fn parse(raw: &'a [u8]) -> Self {
        if raw.len() >= BLOCK_HEADER_SIZE && raw[0] == MARKER_BYTE && raw[1] == MARKER_BYTE {
            Block::Tagged {
                frequency: decode_frequency(raw),
                payload: &raw[BLOCK_HEADER_SIZE..],
            }
        } else {
            Block::Untagged { payload: raw }
        }
    }

    pub fn payload(&self) -> &'a [u8] {
        match self {
            Block::Tagged { payload, .. } | Block::Untagged { payload } => payload,
        }
    }

    pub fn frequency(&self) -> Option<u64> {
        match self {
            Block::Tagged { frequency, .. } => Some(*frequency),
            Block::Untagged { .. } => None,
        }
    }
}

/// Частота из заголовка блока: байты 2..=9, little-endian.
pub fn decode_frequency(header: &[u8]) -> u64 {
    LittleEndian::read_u64(&header[2..BLOCK_HEADER_SIZE])
}

/// Записывает заголовок с маркером в начало блока.
pub fn encode_header(
    block: &mut [u8],
    frequency: u64,
) {
    block[0] = MARKER_BYTE;
    block[1] = MARKER_BYTE;
    LittleEndian::write_u64(&mut block[2..BLOCK_HEADER_SIZE], frequency);
}

impl BlockDemuxer {
    pub fn new(layout: BlockLayout) -> Self {
        Self {
            layout,
            last_frequency: None,
        }
    }

    pub fn layout(&self) -> BlockLayout {
        self.layout
    }

    /// Последняя частота, увиденная в заголовке (если была).
    pub fn last_frequency(&self) -> Option<u64> {
        self.last_frequency
    }

    /// Применяет политику переноса частоты к разобранному блоку.
    ///
    /// Возвращает `None`, если блок без маркера пришёл раньше первого маркера.
    pub fn resolve<'a>(
        &mut self,
        block: Block<'a>,
    ) -> Option<Segment<'a>> {
        match block {
            Block::Tagged { frequency, payload } => {
                self.last_frequency = Some(frequency);

                Some(Segment {
                    frequency,
                    tagged: true,
                    payload,
                })
            }
            Block::Untagged { payload } => self.last_frequency.map(|frequency| Segment {
                frequency,
                tagged: false,
                payload,
            }),
        }
    }

    /// Разбирает весь transfer: блок и результат политики для каждого блока.
    pub fn demux<'a>(
        &'a mut self,
        transfer: &'a [u8],
    ) -> impl Iterator<Item = (Block<'a>, Option<Segment<'a>>)> + 'a {
        let layout = self.layout;

        layout.blocks(transfer).map(move |raw| {
            let block = Block::parse(raw);
            (block, self.resolve(block))
        })
    }
}

impl Default for BlockDemuxer {
    fn default() -> Self {
        Self::new(BlockLayout::HACKRF)
    }
}
