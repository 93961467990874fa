use std::path::PathBuf;

use thiserror::Error;

/// Результат для операций utx
pub type TxResult<T> = std::result::Result<T, TxError>;

/// Типы ошибок передающего тракта.
///
/// Все варианты фатальные: после любой из этих ошибок burst нельзя
/// продолжить, только перезапустить с новой синхронизацией.
#[derive(Debug, Error)]
pub enum TxError {
    /// Некорректная конфигурация (rate/freq не заданы, мусор в опциях)
    #[error("Config error: {0}")]
    Config(String),

    /// Канал вне диапазона устройства
    #[error("Invalid channel {index}: device has {available} TX channel(s)")]
    InvalidChannel { index: usize, available: usize },

    /// Нарушено предусловие синхронизации (например, MIMO не на двух платах)
    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    /// Сенсор захвата (PLL/опорник) сообщил unlocked
    #[error("Hardware not locked: sensor '{0}' reports unlocked")]
    HardwareNotLocked(String),

    /// Входной файл не открылся при старте
    #[error("File unavailable: {path:?}: {source}")]
    FileUnavailable {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Ошибка send в транспорт — не ретраится, burst потерян
    #[error("Transport send failed: {0}")]
    TransportSend(String),

    /// SDR устройство не найдено
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// Ошибки ввода/вывода (автоконвертируются из std::io::Error)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TxError {
    /// Удобные конструкторы
    pub fn config<S: Into<String>>(s: S) -> Self {
        Self::Config(s.into())
    }

    pub fn precondition<S: Into<String>>(s: S) -> Self {
        Self::PreconditionFailed(s.into())
    }

    pub fn transport<S: Into<String>>(s: S) -> Self {
        Self::TransportSend(s.into())
    }
}
