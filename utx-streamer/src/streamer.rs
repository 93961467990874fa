use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use log::info;

use utx_types::{TimeSpec, TxMetadata, TxResult};

use crate::{
    device::TxStream,
    metrics::TxMetrics,
    source::{SampleBlock, SampleSource},
};

/// Бюджет передачи: сколько выборок уже ушло и сколько нужно всего.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransmitBudget {
    pub accumulated: u64,
    /// 0 = без ограничения (до отмены)
    pub target: u64,
}

impl TransmitBudget {
    pub fn new(target: u64) -> Self {
        Self {
            accumulated: 0,
            target,
        }
    }

    pub fn add(
        &mut self,
        samples: u64,
    ) {
        self.accumulated += samples;
    }

    pub fn reached(&self) -> bool {
        self.target > 0 && self.accumulated >= self.target
    }
}

/// Чем закончился цикл передачи.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Оператор прервал (Ctrl+C)
    Cancelled,
    /// Набрали целевое количество выборок
    BudgetReached,
}

/// Горячий цикл: файл → транспорт, с рамками burst-а.
///
/// Единственная точка блокировки — send транспорта: он может висеть, пока
/// у устройства нет места в буфере, и это штатный backpressure. Чтение
/// файла никогда не убегает вперёд того, что устройство способно принять.
/// Внутри цикла нет ни аллокаций, ни локов: буфер один и перезаписывается
/// на месте, флаг отмены — атомик с единственным писателем.
pub struct BurstStreamer {
    metrics: Arc<TxMetrics>,
}

impl BurstStreamer {
    pub fn new(metrics: Arc<TxMetrics>) -> Self {
        Self { metrics }
    }

    /// Гонит выборки до отмены или исчерпания бюджета.
    ///
    /// Первый пакет открывает burst и несёт общее время старта; после
    /// выхода из цикла по любой из двух причин уходит ровно один
    /// закрывающий пакет нулевой длины. Ошибка send фатальна сразу:
    /// закрывающий пакет при ней НЕ отправляется, состояние устройства
    /// в момент сбоя неизвестно.
    pub fn run(
        &self,
        source: &mut SampleSource,
        stream: &mut dyn TxStream,
        block: &mut SampleBlock,
        budget: &mut TransmitBudget,
        cancel: &AtomicBool,
        start_time: TimeSpec,
    ) -> TxResult<StopReason> {
        let metrics = &self.metrics;

        // Первичное наполнение буфера: первый send уже несёт данные файла
        let n = source.fill(block)?;
        metrics.bytes_read.fetch_add(n as u64, Ordering::Relaxed);

        if n < block.len_bytes() {
            metrics.short_reads.fetch_add(1, Ordering::Relaxed);
        }

        let mut md = TxMetadata::start_burst(start_time);

        let reason = loop {
            // Отмена проверяется только на верху цикла: send в полёте
            // не прерывается
            if cancel.load(Ordering::Relaxed) {
                break StopReason::Cancelled;
            }

            if budget.reached() {
                break StopReason::BudgetReached;
            }

            // Весь буфер одним мультиканальным вызовом; может блокироваться
            let sent = stream.send(block.as_bytes(), block.num_samps(), &md)?;

            budget.add(sent as u64);
            metrics.samples_sent.fetch_add(sent as u64, Ordering::Relaxed);
            metrics.packets_sent.fetch_add(1, Ordering::Relaxed);

            // Перезаписываем тот же буфер; короткое чтение у EOF — не
            // ошибка, хвост остаётся от прошлой итерации
            let n = source.fill(block)?;
            metrics.bytes_read.fetch_add(n as u64, Ordering::Relaxed);

            if n < block.len_bytes() {
                metrics.short_reads.fetch_add(1, Ordering::Relaxed);
            }

            // Рамка и временная метка — только на самом первом пакете
            md = TxMetadata::in_burst();
        };

        // Закрывающий пакет: даёт транспорту сбросить буферы и чисто
        // закрыть burst
        stream.send(&[], 0, &TxMetadata::end_burst())?;
        metrics.packets_sent.fetch_add(1, Ordering::Relaxed);

        info!(
            "Streaming stopped: {:?}, {} samples sent",
            reason, budget.accumulated
        );

        Ok(reason)
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
