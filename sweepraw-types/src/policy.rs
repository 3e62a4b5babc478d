use serde::Serialize;

use crate::{ConfigError, ConfigResult};

/// Когда завершать захват.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum StopPolicy {
    /// До Ctrl+C или ошибки.
    #[default]
    Unbounded,
    /// После первого завершённого прохода.
    OneShot,
    /// После `n` завершённых проходов.
    FixedCount(u32),
}

impl StopPolicy {
    /// Собирает политику из флагов CLI. `one_shot` имеет приоритет.
    pub fn from_flags(
        one_shot: bool,
        num_sweeps: Option<u32>,
    ) -> ConfigResult<Self> {
        if one_shot {
            return Ok(StopPolicy::OneShot);
        }

        match num_sweeps {
            None => Ok(StopPolicy::Unbounded),
            Some(0) => Err(ConfigError::InvalidSweepCount(0)),
            Some(n) => Ok(StopPolicy::FixedCount(n)),
        }
    }

    /// `true`, если после `completed` проходов захват должен завершиться.
    pub fn is_satisfied(
        &self,
        completed: u64,
    ) -> bool {
        match self {
            StopPolicy::Unbounded => false,
            StopPolicy::OneShot => completed >= 1,
            StopPolicy::FixedCount(n) => completed == *n as u64,
        }
    }
}

impl std::fmt::Display for StopPolicy {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            StopPolicy::Unbounded => write!(f, "until interrupted"),
            StopPolicy::OneShot => write!(f, "one shot"),
            StopPolicy::FixedCount(n) => write!(f, "{n} sweeps"),
        }
    }
}
