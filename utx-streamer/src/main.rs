use std::{
    path::PathBuf,
    process,
    sync::atomic::Ordering,
    time::Instant,
};

use clap::Parser;
use log::{error, info, warn};
use utx_streamer::{create_device, parse_freq_hz, TxConfig, TxSession};
use utx_types::{ClockRef, SampleFormat, SyncMode};

#[derive(Parser, Debug)]
#[command(
    name = "utx-streamer",
    version = env!("CARGO_PKG_VERSION"),
    about = "Stream samples from a binary file to a USRP TX front end",
    long_about = None,
)]
struct Cli {
    /// Адресная строка устройства: sim, sim,channels=2, addr=...
    #[arg(long, default_value = "sim")]
    args: String,
    /// Файл с выборками для передачи
    #[arg(long, default_value = "usrp_samples.dat")]
    file: PathBuf,
    /// Тип выборок файла: short, float, double
    #[arg(long = "type", default_value = "short")]
    sample_type: String,
    /// Выборок в буфере (0 = max_num_samps * 10)
    #[arg(long, default_value = "0")]
    spb: usize,
    /// Частота дискретизации (250kHz, 1MHz, 1000000)
    #[arg(long)]
    rate: Option<String>,
    /// Несущая частота (915MHz, 2.4GHz)
    #[arg(long)]
    freq: Option<String>,
    /// Смещение LO (Гц)
    #[arg(long = "lo-offset", default_value = "0")]
    lo_offset: String,
    /// Усиление RF тракта, дБ
    #[arg(long)]
    gain: Option<f64>,
    /// Антенна
    #[arg(long)]
    ant: Option<String>,
    /// Спецификация subdevice
    #[arg(long)]
    subdev: Option<String>,
    /// Полоса аналогового фильтра (Гц)
    #[arg(long)]
    bw: Option<f64>,
    /// Опорный генератор: internal, external, mimo, gpsdo
    #[arg(long = "ref", default_value = "internal")]
    clock_ref: String,
    /// Источник PPS: none, internal, external, gpsdo, mimo
    #[arg(long, default_value = "none")]
    pps: String,
    /// Формат выборок по проводу (sc16, sc8)
    #[arg(long, default_value = "sc16")]
    otw: String,
    /// Каналы: "0", "1", "0,1"
    #[arg(long, default_value = "0")]
    channels: String,
    /// Integer-N тюнинг (меньше спуров на низких частотах)
    #[arg(long = "int-n")]
    int_n: bool,
    /// Сколько всего выборок передать (0 = до Ctrl+C)
    #[arg(long, default_value = "0")]
    nsamps: u64,
    /// Тихий режим (только ошибки)
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    /// Собирает конфигурацию сессии из аргументов. Любая ошибка парсинга —
    /// до того, как трогать устройство.
    fn into_config(self) -> Result<TxConfig, String> {
        let rate = match &self.rate {
            Some(s) => parse_freq_hz(s).map_err(|e| format!("--rate: {e}"))?,
            None => return Err("Please specify the sample rate with --rate".to_string()),
        };
        if rate <= 0.0 {
            return Err("--rate must be > 0".to_string());
        }

        let freq = match &self.freq {
            Some(s) => parse_freq_hz(s).map_err(|e| format!("--freq: {e}"))?,
            None => return Err("Please specify the center frequency with --freq".to_string()),
        };

        let lo_offset = parse_freq_hz(&self.lo_offset).map_err(|e| format!("--lo-offset: {e}"))?;

        let format: SampleFormat = self.sample_type.parse().map_err(|e| format!("--type: {e}"))?;
        let clock_ref: ClockRef = self.clock_ref.parse().map_err(|e| format!("--ref: {e}"))?;
        let pps: SyncMode = self.pps.parse().map_err(|e| format!("--pps: {e}"))?;

        Ok(TxConfig {
            device_args: self.args,
            file: self.file,
            format,
            spb: self.spb,
            rate,
            freq,
            lo_offset,
            gain: self.gain,
            antenna: self.ant,
            subdev: self.subdev,
            bandwidth: self.bw,
            clock_ref,
            pps,
            wire_format: self.otw,
            channels: self.channels,
            int_n: self.int_n,
            total_samples: self.nsamps,
        })
    }
}

fn main() {
    let cli = Cli::parse();
    let level = if cli.quiet { "error" } else { "info" };

    env_logger::Builder::new()
        .filter_level(level.parse().unwrap())
        .format_target(false)
        .format_timestamp_secs()
        .init();

    let config = match cli.into_config() {
        Ok(c) => c,
        Err(e) => {
            error!("{e}");
            process::exit(1);
        }
    };

    info!("Creating the device with: {}...", config.device_args);

    let mut device = match create_device(&config.device_args) {
        Ok(d) => d,
        Err(e) => {
            error!("Failed to open device: {e}");
            process::exit(1);
        }
    };

    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("  File          : {:?}", config.file);
    info!(
        "  Sample type   : {} ({} B/sample)",
        config.format,
        config.format.sample_size()
    );
    info!("  Wire format   : {}", config.wire_format);
    info!("  Channels      : {}", config.channels);
    info!("  Rate          : {:.3} Msps", config.rate / 1e6);
    info!("  Center freq   : {:.3} MHz", config.freq / 1e6);
    info!("  Clock ref     : {}", config.clock_ref);
    info!("  PPS source    : {}", config.pps);
    if config.spb == 0 {
        info!("  Buffer        : auto (max_num_samps * 10)");
    } else {
        info!("  Buffer        : {} samples", config.spb);
    }
    info!("  Total samples : {}", config.total_samples);
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let session = match TxSession::new(config) {
        Ok(s) => s,
        Err(e) => {
            error!("{e}");
            process::exit(1);
        }
    };

    let metrics = session.metrics();
    let stop_ctrlc = session.stop_flag();

    if let Err(e) = ctrlc::set_handler(move || {
        if stop_ctrlc.swap(true, Ordering::SeqCst) {
            // Второй Ctrl+C — принудительный выход
            warn!("Force exit");
            process::exit(130);
        }
        warn!("Ctrl+C received — closing burst...");
    }) {
        warn!("Failed to set Ctrl+C handler: {e}");
    }

    info!("Press Ctrl+C to stop streaming...");

    let session_start = Instant::now();

    if let Err(e) = session.run(device.as_mut()) {
        error!("Streaming failed: {e}");
        process::exit(1);
    }

    // --- Итоговая статистика ---
    let summary = metrics.summary(&session_start);
    info!("\n{summary}");

    if metrics.short_reads.load(Ordering::Relaxed) > 0 {
        warn!(
            "⚠ {} short reads: file ended before the budget, tail of the buffer \
             was re-sent with stale contents",
            metrics.short_reads.load(Ordering::Relaxed)
        );
    }

    info!("✓ Done");
}
