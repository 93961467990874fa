use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Instant,
};

/// Счётчики сессии передачи, lock-free.
#[derive(Debug, Default)]
pub struct TxMetrics {
    pub samples_sent: AtomicU64,
    pub packets_sent: AtomicU64,
    pub bytes_read: AtomicU64,
    pub short_reads: AtomicU64,
}

/// Snapshot метрик для отображения / тестирования.
#[derive(Debug, Clone)]
pub struct MetricsSummary {
    pub duration_secs: f64,
    pub samples_sent: u64,
    pub packets_sent: u64,
    pub bytes_read: u64,
    pub short_reads: u64,
    pub throughput_msps: f64,
}

impl TxMetrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn throughput_msps(
        &self,
        elapsed: &Instant,
    ) -> f64 {
        let secs = elapsed.elapsed().as_secs_f64();

        if secs < 1e-9 {
            return 0.0;
        }

        self.samples_sent.load(Ordering::Relaxed) as f64 / secs / 1_000_000.0
    }

    /// Итоговая сводка для вывода в конце сессии.
    pub fn summary(
        &self,
        elapsed: &Instant,
    ) -> MetricsSummary {
        MetricsSummary {
            duration_secs: elapsed.elapsed().as_secs_f64(),
            samples_sent: self.samples_sent.load(Ordering::Relaxed),
            packets_sent: self.packets_sent.load(Ordering::Relaxed),
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
            short_reads: self.short_reads.load(Ordering::Relaxed),
            throughput_msps: self.throughput_msps(elapsed),
        }
    }
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        writeln!(f, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
        writeln!(f, "  Duration      : {:.1}s", self.duration_secs)?;
        writeln!(f, "  Samples sent  : {}", self.samples_sent)?;
        writeln!(f, "  Packets sent  : {}", self.packets_sent)?;
        writeln!(f, "  Bytes read    : {:.1} MB", self.bytes_read as f64 / 1e6)?;
        writeln!(f, "  Short reads   : {}", self.short_reads)?;
        writeln!(f, "  Throughput    : {:.3} Msps", self.throughput_msps)?;
        write!(f, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
