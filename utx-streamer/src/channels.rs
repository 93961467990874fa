use utx_types::{TxError, TxResult};

/// Проверенный упорядоченный список TX каналов устройства.
///
/// Порядок повторяет порядок появления во входной строке; дубликаты
/// сохраняются — устройство принимает повторённые индексы для
/// реплицированного стриминга.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSet {
    channels: Vec<usize>,
}

impl ChannelSet {
    /// Разбирает строку выбора каналов и валидирует против устройства.
    ///
    /// Разделители: запятая и кавычки (артефакты квотинга шелла).
    /// Любой индекс >= `available` отменяет всю резолюцию целиком,
    /// частичный набор каналов не используется.
    pub fn resolve(
        selection: &str,
        available: usize,
    ) -> TxResult<Self> {
        let mut channels = Vec::new();

        for token in selection.split([',', '"', '\'']) {
            let token = token.trim();

            // Пустые токены от кавычек/двойных запятых пропускаем
            if token.is_empty() {
                continue;
            }

            let index: usize = token.parse().map_err(|_| {
                TxError::config(format!(
                    "Invalid channel token '{token}' in channel list '{selection}'"
                ))
            })?;

            if index >= available {
                return Err(TxError::InvalidChannel { index, available });
            }

            channels.push(index);
        }

        Ok(Self { channels })
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Ведущий канал для опроса сенсоров (0, если список пуст).
    pub fn lead(&self) -> usize {
        self.channels.first().copied().unwrap_or(0)
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.channels
    }

    pub fn iter(&self) -> std::slice::Iter<'_, usize> {
        self.channels.iter()
    }
}

impl std::fmt::Display for ChannelSet {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        let s: Vec<String> = self.channels.iter().map(|c| c.to_string()).collect();
        write!(f, "{}", s.join(","))
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
