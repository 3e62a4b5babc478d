use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Время захвата: секунды и наносекунды от Unix epoch.
///
/// Инвариант: `nanos < 1_000_000_000`, переполнение переносится в `secs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct Timestamp {
    pub secs: u64,
    pub nanos: u32,
}

impl Timestamp {
    /// Создаёт метку, нормализуя `nanos`.
    pub fn new(
        secs: u64,
        nanos: u64,
    ) -> Self {
        Self {
            secs: secs + nanos / NANOS_PER_SEC,
            nanos: (nanos % NANOS_PER_SEC) as u32,
        }
    }

    /// Текущее системное время. Время до epoch даёт нулевую метку.
    pub fn now() -> Self {
        Self::from_system_time(SystemTime::now())
    }

    pub fn from_system_time(t: SystemTime) -> Self {
        match t.duration_since(UNIX_EPOCH) {
            Ok(d) => Self::new(d.as_secs(), d.subsec_nanos() as u64),
            Err(_) => Self::default(),
        }
    }

    /// Сдвигает метку вперёд на `nanos` с переносом в секунды.
    pub fn add_nanos(
        self,
        nanos: u64,
    ) -> Self {
        Self::new(self.secs, self.nanos as u64 + nanos)
    }

    pub fn as_nanos(&self) -> u128 {
        self.secs as u128 * NANOS_PER_SEC as u128 + self.nanos as u128
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "{}.{:09}", self.secs, self.nanos)
    }
}
