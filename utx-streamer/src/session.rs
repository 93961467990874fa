use std::{
    sync::{atomic::AtomicBool, Arc},
    thread,
    time::Duration,
};

use log::info;

use utx_types::{TimeSpec, TxError, TxResult};

use crate::{
    channels::ChannelSet,
    config::TxConfig,
    device::{StreamArgs, TuneRequest, TxDevice},
    metrics::TxMetrics,
    source::{SampleBlock, SampleSource},
    streamer::{BurstStreamer, StopReason, TransmitBudget},
    sync::{check_locks, synchronize},
};

/// Запас между «сейчас» и временем первой выборки: всем синхронизированным
/// каналам нужно успеть взвестись.
pub const START_LEAD: TimeSpec = TimeSpec::from_secs(0.1);

/// Пауза после настройки RF тракта перед открытием потока.
pub const SETUP_SETTLE: Duration = Duration::from_secs(1);

/// Сессия передачи (single-threaded): конфигурация → синхронизация → burst.
pub struct TxSession {
    config: TxConfig,
    metrics: Arc<TxMetrics>,
    stop_flag: Arc<AtomicBool>,
}

impl TxSession {
    /// Создаёт сессию, проверяя конфигурацию.
    pub fn new(config: TxConfig) -> TxResult<Self> {
        if config.rate <= 0.0 {
            return Err(TxError::config("rate must be > 0"));
        }

        Ok(Self {
            config,
            metrics: TxMetrics::new(),
            stop_flag: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Флаг остановки. Устанавливается в `true` для закрытия burst-а.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.stop_flag.clone()
    }

    pub fn metrics(&self) -> Arc<TxMetrics> {
        self.metrics.clone()
    }

    /// Настраивает устройство и гонит выборки. Блокирует до отмены,
    /// исчерпания бюджета или фатальной ошибки.
    pub fn run(
        self,
        device: &mut dyn TxDevice,
    ) -> TxResult<StopReason> {
        let cfg = &self.config;

        // Subdevice первым — маппинг каналов влияет на остальные настройки
        if let Some(subdev) = &cfg.subdev {
            device.set_tx_subdev_spec(subdev)?;
        }

        let channels = ChannelSet::resolve(&cfg.channels, device.tx_channel_count())?;

        device.set_clock_source(cfg.clock_ref.as_str())?;

        info!("Using device: {}", device.name());

        info!("Setting TX Rate: {:.6} Msps...", cfg.rate / 1e6);
        device.set_tx_rate(cfg.rate)?;
        info!("Actual TX Rate: {:.6} Msps", device.get_tx_rate() / 1e6);

        let request = TuneRequest {
            target_freq: cfg.freq,
            lo_offset: cfg.lo_offset,
            integer_n: cfg.int_n,
        };

        for &chan in channels.iter() {
            info!(
                "Setting TX Freq: {:.6} MHz (channel {chan})...",
                cfg.freq / 1e6
            );
            device.set_tx_freq(&request, chan)?;
            info!("Actual TX Freq: {:.6} MHz", device.get_tx_freq(chan) / 1e6);

            if let Some(gain) = cfg.gain {
                device.set_tx_gain(gain, chan)?;
                info!("Actual TX Gain: {:.2} dB", device.get_tx_gain(chan));
            }

            if let Some(bw) = cfg.bandwidth {
                device.set_tx_bandwidth(bw, chan)?;
                info!(
                    "Actual TX Bandwidth: {:.3} MHz",
                    device.get_tx_bandwidth(chan) / 1e6
                );
            }

            if let Some(ant) = &cfg.antenna {
                device.set_tx_antenna(ant, chan)?;
            }
        }

        // Даём тракту устаканиться после настройки
        thread::sleep(SETUP_SETTLE);

        let stream_args = StreamArgs {
            cpu_format: cfg.format,
            wire_format: cfg.wire_format.clone(),
            channels: channels.as_slice().to_vec(),
        };

        let mut stream = device.tx_stream(&stream_args)?;

        let spb = if cfg.spb == 0 {
            stream.max_num_samps() * 10
        } else {
            cfg.spb
        };

        let mut source = SampleSource::open(&cfg.file)?;

        synchronize(device, &channels, cfg.pps)?;
        check_locks(device, &channels, cfg.clock_ref)?;

        // Стартуем немного в будущем, чтобы все каналы успели взвестись
        let start_time = device.get_time_now() + START_LEAD;
        info!("First sample scheduled at {start_time}");

        let mut block = SampleBlock::new(spb, cfg.format);
        let mut budget = TransmitBudget::new(cfg.total_samples);

        let streamer = BurstStreamer::new(self.metrics.clone());

        streamer.run(
            &mut source,
            stream.as_mut(),
            &mut block,
            &mut budget,
            &self.stop_flag,
            start_time,
        )
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
