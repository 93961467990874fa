use crate::TimeSpec;

/// Метаданные одного send: рамки burst-а и стартовое время.
///
/// Инвариант потока: ровно один пакет с `start_of_burst` (первый, он же
/// единственный с `has_time_spec`) и ровно один пакет нулевой длины с
/// `end_of_burst` (последний).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TxMetadata {
    pub start_of_burst: bool,
    pub end_of_burst: bool,
    pub has_time_spec: bool,
    pub time_spec: TimeSpec,
}

impl TxMetadata {
    /// Первый пакет burst-а: открывает рамку и несёт общее время старта.
    pub fn start_burst(at: TimeSpec) -> Self {
        Self {
            start_of_burst: true,
            end_of_burst: false,
            has_time_spec: true,
            time_spec: at,
        }
    }

    /// Любой пакет между первым и последним.
    pub fn in_burst() -> Self {
        Self {
            start_of_burst: false,
            end_of_burst: false,
            has_time_spec: false,
            time_spec: TimeSpec::ZERO,
        }
    }

    /// Закрывающий пакет нулевой длины.
    pub fn end_burst() -> Self {
        Self {
            start_of_burst: false,
            end_of_burst: true,
            has_time_spec: false,
            time_spec: TimeSpec::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_framing_flags() {
        let first = TxMetadata::start_burst(TimeSpec::from_secs(0.1));
        assert!(first.start_of_burst && first.has_time_spec && !first.end_of_burst);

        let mid = TxMetadata::in_burst();
        assert!(!mid.start_of_burst && !mid.has_time_spec && !mid.end_of_burst);

        let last = TxMetadata::end_burst();
        assert!(!last.start_of_burst && !last.has_time_spec && last.end_of_burst);
    }
}
