//! Ядро sweepraw
//!
//! Потоковый разбор данных приёмника в режиме sweep: планирование таблицы
//! диапазонов, разбор transfer'ов на блоки с маркерами частоты, учёт
//! проходов, метки времени блоков и контроль скорости.
//!
//! # Быстрый старт
//!
//! ```
//! use sweepraw_core::{plan_sweep, Block, BlockDemuxer, encode_header};
//! use sweepraw_types::{BYTES_PER_BLOCK, TUNE_STEP_MHZ};
//!
//! let table = plan_sweep(&[(2400, 2490)], TUNE_STEP_MHZ)?;
//! assert_eq!(table.ranges()[0].end_mhz, 2500);
//!
//! let mut raw = vec![0u8; BYTES_PER_BLOCK];
//! encode_header(&mut raw, 2_407_500_000);
//!
//! let mut demux = BlockDemuxer::default();
//! let segment = demux.resolve(Block::parse(&raw)).unwrap();
//! assert_eq!(segment.frequency, 2_407_500_000);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod demux;
pub mod monitor;
pub mod planner;
pub mod processor;
pub mod sink;
pub mod state;
pub mod timestamp;
pub mod tracker;

pub use demux::*;
pub use monitor::*;
pub use planner::*;
pub use processor::*;
pub use sink::*;
pub use state::*;
pub use timestamp::*;
pub use tracker::*;

/// Версия библиотеки.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
