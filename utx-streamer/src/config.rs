use std::path::PathBuf;

use utx_types::{ClockRef, SampleFormat, SyncMode};

/// Полная конфигурация сессии передачи.
#[derive(Debug, Clone)]
pub struct TxConfig {
    /// Адресная строка устройства ("sim", "sim,channels=2", "addr=...")
    pub device_args: String,
    /// Путь к входному файлу с выборками
    pub file: PathBuf,
    /// Формат выборок входного файла
    pub format: SampleFormat,
    /// Выборок в одном буфере (0 = max_num_samps * 10)
    pub spb: usize,
    /// Частота дискретизации (Гц)
    pub rate: f64,
    /// Несущая частота (Гц)
    pub freq: f64,
    /// Смещение LO (Гц)
    pub lo_offset: f64,
    /// Усиление передатчика (дБ)
    pub gain: Option<f64>,
    /// Антенна
    pub antenna: Option<String>,
    /// Спецификация subdevice
    pub subdev: Option<String>,
    /// Полоса аналогового фильтра (Гц)
    pub bandwidth: Option<f64>,
    /// Опорный генератор
    pub clock_ref: ClockRef,
    /// Источник PPS / стратегия синхронизации времени
    pub pps: SyncMode,
    /// Формат выборок «по проводу» (otw)
    pub wire_format: String,
    /// Строка выбора каналов ("0", "0,1", ...)
    pub channels: String,
    /// Подсказка integer-N при перестройке частоты
    pub int_n: bool,
    /// Сколько всего выборок передать (0 = до Ctrl+C)
    pub total_samples: u64,
}

impl Default for TxConfig {
    fn default() -> Self {
        Self {
            device_args: "sim".to_string(),
            file: PathBuf::from("usrp_samples.dat"),
            format: SampleFormat::Int16,
            spb: 0,
            rate: 1_000_000.0,
            freq: 915_000_000.0,
            lo_offset: 0.0,
            gain: None,
            antenna: None,
            subdev: None,
            bandwidth: None,
            clock_ref: ClockRef::Internal,
            pps: SyncMode::None,
            wire_format: "sc16".to_string(),
            channels: "0".to_string(),
            int_n: false,
            total_samples: 0,
        }
    }
}

/// Парсит строку частоты в герцы.
///
/// Поддерживает суффиксы: `GHz`, `MHz`, `kHz`, `Hz` (регистронезависимо).
///
/// # Примеры
/// ```
/// use utx_streamer::config::parse_freq_hz;
/// assert_eq!(parse_freq_hz("915MHz").unwrap(), 915_000_000.0);
/// assert_eq!(parse_freq_hz("2.4GHz").unwrap(), 2_400_000_000.0);
/// assert_eq!(parse_freq_hz("250000").unwrap(), 250_000.0);
/// ```
pub fn parse_freq_hz(s: &str) -> Result<f64, String> {
    let s = s.trim();
    let lower = s.to_lowercase();

    let (num_str, mult) = if let Some(v) = lower.strip_suffix("ghz") {
        (v.trim(), 1_000_000_000_f64)
    } else if let Some(v) = lower.strip_suffix("mhz") {
        (v.trim(), 1_000_000_f64)
    } else if let Some(v) = lower.strip_suffix("khz") {
        (v.trim(), 1_000_f64)
    } else if let Some(v) = lower.strip_suffix("hz") {
        (v.trim(), 1_f64)
    } else {
        // Без суффикса — число в герцах
        return s
            .parse::<f64>()
            .map_err(|e| format!("Invalid frequency '{s}': {e}"));
    };

    let n: f64 = num_str
        .parse()
        .map_err(|e| format!("Invalid frequency value '{num_str}': {e}"))?;

    Ok(n * mult)
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_freq_hz() {
        assert_eq!(parse_freq_hz("915MHz").unwrap(), 915_000_000.0);
        assert_eq!(parse_freq_hz("2.4GHz").unwrap(), 2_400_000_000.0);
        assert_eq!(parse_freq_hz("250kHz").unwrap(), 250_000.0);
        assert_eq!(parse_freq_hz("1000000Hz").unwrap(), 1_000_000.0);
        assert_eq!(parse_freq_hz("1e6").unwrap(), 1_000_000.0);
        assert!(parse_freq_hz("abc").is_err());
    }

    #[test]
    fn test_default_config() {
        let cfg = TxConfig::default();
        assert_eq!(cfg.channels, "0");
        assert_eq!(cfg.wire_format, "sc16");
        assert_eq!(cfg.total_samples, 0);
        assert_eq!(cfg.pps, SyncMode::None);
    }
}
