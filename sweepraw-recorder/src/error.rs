use sweepraw_core::DataStall;
use sweepraw_types::ConfigError;
use thiserror::Error;

pub type RecorderResult<T> = std::result::Result<T, RecorderError>;

#[derive(Debug, Error)]
pub enum RecorderError {
    /// Неверная конфигурация (до старта стриминга)
    #[error("argument error: {0}")]
    Config(#[from] ConfigError),

    /// SDR устройство не найдено
    #[error("SDR device not found: {0}")]
    DeviceNotFound(String),

    /// Ошибка вызова драйвера
    #[error("{op}() failed: {message}")]
    Device { op: &'static str, message: String },

    /// Данные перестали поступать
    #[error("{0}")]
    DataStall(#[from] DataStall),

    /// Ошибка записи выходного потока
    #[error("output error: {0}")]
    Output(#[from] std::io::Error),

    /// Ошибка пайплайна (inter-thread)
    #[error("pipeline error: {0}")]
    Pipeline(String),

    /// Ошибка записи итоговой сводки
    #[error("summary error: {0}")]
    Summary(#[from] serde_json::Error),
}

impl RecorderError {
    pub fn device<S: Into<String>>(
        op: &'static str,
        message: S,
    ) -> Self {
        Self::Device {
            op,
            message: message.into(),
        }
    }

    /// Код завершения процесса для этой ошибки.
    pub fn exit_code(&self) -> i32 {
        match self {
            RecorderError::DeviceNotFound(_)
            | RecorderError::Device { .. }
            | RecorderError::Pipeline(_) => 1,
            RecorderError::Config(_) => 2,
            RecorderError::DataStall(_) => 3,
            RecorderError::Output(_) | RecorderError::Summary(_) => 4,
        }
    }
}
