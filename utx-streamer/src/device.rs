// Сим-устройство воспроизводит поверхность multi_usrp, которой пользуется
// стример: каналы, платы, часы, сенсоры захвата и TX-поток.
// Каждый send уходит в crossbeam-канал, так что тесты видят точную
// последовательность пакетов с их метаданными.
// Бэкенд для настоящего железа подключается отдельной фичей.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use crossbeam_channel::{Receiver, Sender};
use utx_types::{SampleFormat, TimeSpec, TxError, TxMetadata, TxResult};

/// Запрос перестройки частоты с опциональной подсказкой integer-N.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TuneRequest {
    /// Целевая несущая (Гц)
    pub target_freq: f64,
    /// Смещение LO (Гц)
    pub lo_offset: f64,
    /// Подсказка integer-N тюнинга (меньше спуров на низких частотах)
    pub integer_n: bool,
}

/// Дескриптор TX потока: формат в памяти, формат по проводу, каналы.
#[derive(Debug, Clone)]
pub struct StreamArgs {
    pub cpu_format: SampleFormat,
    pub wire_format: String,
    pub channels: Vec<usize>,
}

/// Показание именованного сенсора (lock-detect).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorValue {
    pub name: String,
    pub locked: bool,
}

impl SensorValue {
    pub fn to_bool(&self) -> bool {
        self.locked
    }
}

impl std::fmt::Display for SensorValue {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(
            f,
            "{}: {}",
            self.name,
            if self.locked { "locked" } else { "unlocked" }
        )
    }
}

/// TX транспорт устройства.
///
/// `send` может блокироваться, пока во внутреннем буфере устройства нет
/// места — это и есть backpressure всего тракта. Таймаутов нет намеренно.
pub trait TxStream: Send {
    /// Отправляет `nsamps` выборок из `data` (один мультиканальный вызов,
    /// одинаковые данные на все каналы потока). Возвращает сколько выборок
    /// устройство реально приняло.
    fn send(
        &mut self,
        data: &[u8],
        nsamps: usize,
        md: &TxMetadata,
    ) -> TxResult<usize>;

    /// Максимум выборок на один вызов send (подсказка для размера буфера)
    fn max_num_samps(&self) -> usize;
}

/// Абстракция TX стороны USRP-подобного устройства.
// Реализация: [`SimulatedUsrp`], и в будущем обвязка libuhd за фичей `uhd`.
pub trait TxDevice: Send {
    /// Человекочитаемое описание устройства
    fn name(&self) -> String;

    fn tx_channel_count(&self) -> usize;
    fn num_mboards(&self) -> usize;

    fn set_tx_subdev_spec(
        &mut self,
        spec: &str,
    ) -> TxResult<()>;

    fn set_clock_source(
        &mut self,
        source: &str,
    ) -> TxResult<()>;

    /// Источник времени; `mboard = None` — на всех платах сразу.
    fn set_time_source(
        &mut self,
        source: &str,
        mboard: Option<usize>,
    ) -> TxResult<()>;

    /// Немедленно выставляет часы платы.
    fn set_time_now(
        &mut self,
        time: TimeSpec,
        mboard: usize,
    ) -> TxResult<()>;

    /// Выставляет часы всех плат на ближайшем фронте PPS.
    fn set_time_unknown_pps(
        &mut self,
        time: TimeSpec,
    ) -> TxResult<()>;

    fn get_time_now(&self) -> TimeSpec;

    fn set_tx_rate(
        &mut self,
        rate: f64,
    ) -> TxResult<()>;
    fn get_tx_rate(&self) -> f64;

    fn set_tx_freq(
        &mut self,
        request: &TuneRequest,
        chan: usize,
    ) -> TxResult<()>;
    fn get_tx_freq(
        &self,
        chan: usize,
    ) -> f64;

    fn set_tx_gain(
        &mut self,
        gain: f64,
        chan: usize,
    ) -> TxResult<()>;
    fn get_tx_gain(
        &self,
        chan: usize,
    ) -> f64;

    fn set_tx_bandwidth(
        &mut self,
        bw: f64,
        chan: usize,
    ) -> TxResult<()>;
    fn get_tx_bandwidth(
        &self,
        chan: usize,
    ) -> f64;

    fn set_tx_antenna(
        &mut self,
        antenna: &str,
        chan: usize,
    ) -> TxResult<()>;

    fn tx_sensor_names(
        &self,
        chan: usize,
    ) -> Vec<String>;
    fn get_tx_sensor(
        &self,
        name: &str,
        chan: usize,
    ) -> TxResult<SensorValue>;

    fn mboard_sensor_names(
        &self,
        mboard: usize,
    ) -> Vec<String>;
    fn get_mboard_sensor(
        &self,
        name: &str,
        mboard: usize,
    ) -> TxResult<SensorValue>;

    /// Открывает TX поток по дескриптору.
    fn tx_stream(
        &mut self,
        args: &StreamArgs,
    ) -> TxResult<Box<dyn TxStream>>;
}

/// Пакет, принятый сим-потоком (для проверок в тестах).
#[derive(Debug, Clone)]
pub struct SentPacket {
    pub nsamps: usize,
    pub md: TxMetadata,
    pub data: Vec<u8>,
}

/// Симулятор USRP для тестов и прогона без железа.
pub struct SimulatedUsrp {
    channels: usize,
    mboards: usize,
    max_samps: usize,
    time: f64,
    tx_sensors: HashMap<String, bool>,
    mboard_sensors: HashMap<String, bool>,
    tx_rate: f64,
    tx_freqs: HashMap<usize, f64>,
    tx_gains: HashMap<usize, f64>,
    tx_bandwidths: HashMap<usize, f64>,
    fail_on_send: Option<u64>,
    cancel_after: Option<(u64, Arc<AtomicBool>)>,
    sent_tx: Sender<SentPacket>,
    sent_rx: Receiver<SentPacket>,
    /// Журнал вызовов-сеттеров, в порядке применения
    pub calls: Vec<String>,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl SimulatedUsrp {
    pub fn new(
        channels: usize,
        mboards: usize,
    ) -> Self {
        let (sent_tx, sent_rx) = crossbeam_channel::unbounded();

        Self {
            channels,
            mboards,
            max_samps: 1_024,
            time: 0.0,
            tx_sensors: HashMap::new(),
            mboard_sensors: HashMap::new(),
            tx_rate: 0.0,
            tx_freqs: HashMap::new(),
            tx_gains: HashMap::new(),
            tx_bandwidths: HashMap::new(),
            fail_on_send: None,
            cancel_after: None,
            sent_tx,
            sent_rx,
            calls: Vec::new(),
        }
    }

    pub fn with_max_samps(
        mut self,
        max_samps: usize,
    ) -> Self {
        self.max_samps = max_samps;
        self
    }

    pub fn with_tx_sensor(
        mut self,
        name: &str,
        locked: bool,
    ) -> Self {
        self.tx_sensors.insert(name.to_string(), locked);
        self
    }

    pub fn with_mboard_sensor(
        mut self,
        name: &str,
        locked: bool,
    ) -> Self {
        self.mboard_sensors.insert(name.to_string(), locked);
        self
    }

    /// k-й по счёту send (1-based) вернёт TransportSend.
    pub fn fail_on_send(
        mut self,
        k: u64,
    ) -> Self {
        self.fail_on_send = Some(k);
        self
    }

    /// После n-го пакета с данными поток взведёт флаг отмены.
    pub fn cancel_after(
        mut self,
        n: u64,
        flag: Arc<AtomicBool>,
    ) -> Self {
        self.cancel_after = Some((n, flag));
        self
    }

    /// Приёмная сторона журнала отправленных пакетов.
    pub fn sent_packets(&self) -> Receiver<SentPacket> {
        self.sent_rx.clone()
    }
}

impl TxDevice for SimulatedUsrp {
    fn name(&self) -> String {
        format!(
            "Simulated USRP ({} ch, {} mboard)",
            self.channels, self.mboards
        )
    }

    fn tx_channel_count(&self) -> usize {
        self.channels
    }

    fn num_mboards(&self) -> usize {
        self.mboards
    }

    fn set_tx_subdev_spec(
        &mut self,
        spec: &str,
    ) -> TxResult<()> {
        self.calls.push(format!("subdev={spec}"));
        Ok(())
    }

    fn set_clock_source(
        &mut self,
        source: &str,
    ) -> TxResult<()> {
        self.calls.push(format!("clock_source={source}"));
        Ok(())
    }

    fn set_time_source(
        &mut self,
        source: &str,
        mboard: Option<usize>,
    ) -> TxResult<()> {
        match mboard {
            Some(m) => self.calls.push(format!("time_source[{m}]={source}")),
            None => self.calls.push(format!("time_source[*]={source}")),
        }
        Ok(())
    }

    fn set_time_now(
        &mut self,
        time: TimeSpec,
        mboard: usize,
    ) -> TxResult<()> {
        self.time = time.as_secs();
        self.calls
            .push(format!("time_now[{mboard}]={}", time.as_secs()));
        Ok(())
    }

    fn set_time_unknown_pps(
        &mut self,
        time: TimeSpec,
    ) -> TxResult<()> {
        self.time = time.as_secs();
        self.calls
            .push(format!("time_unknown_pps={}", time.as_secs()));
        Ok(())
    }

    fn get_time_now(&self) -> TimeSpec {
        TimeSpec::from_secs(self.time)
    }

    fn set_tx_rate(
        &mut self,
        rate: f64,
    ) -> TxResult<()> {
        self.tx_rate = rate;
        self.calls.push(format!("tx_rate={rate}"));
        Ok(())
    }

    fn get_tx_rate(&self) -> f64 {
        self.tx_rate
    }

    fn set_tx_freq(
        &mut self,
        request: &TuneRequest,
        chan: usize,
    ) -> TxResult<()> {
        self.tx_freqs.insert(chan, request.target_freq);
        self.calls.push(format!(
            "tx_freq[{chan}]={} lo={} int_n={}",
            request.target_freq, request.lo_offset, request.integer_n
        ));
        Ok(())
    }

    fn get_tx_freq(
        &self,
        chan: usize,
    ) -> f64 {
        self.tx_freqs.get(&chan).copied().unwrap_or(0.0)
    }

    fn set_tx_gain(
        &mut self,
        gain: f64,
        chan: usize,
    ) -> TxResult<()> {
        self.tx_gains.insert(chan, gain);
        self.calls.push(format!("tx_gain[{chan}]={gain}"));
        Ok(())
    }

    fn get_tx_gain(
        &self,
        chan: usize,
    ) -> f64 {
        self.tx_gains.get(&chan).copied().unwrap_or(0.0)
    }

    fn set_tx_bandwidth(
        &mut self,
        bw: f64,
        chan: usize,
    ) -> TxResult<()> {
        self.tx_bandwidths.insert(chan, bw);
        self.calls.push(format!("tx_bw[{chan}]={bw}"));
        Ok(())
    }

    fn get_tx_bandwidth(
        &self,
        chan: usize,
    ) -> f64 {
        self.tx_bandwidths.get(&chan).copied().unwrap_or(0.0)
    }

    fn set_tx_antenna(
        &mut self,
        antenna: &str,
        chan: usize,
    ) -> TxResult<()> {
        self.calls.push(format!("tx_ant[{chan}]={antenna}"));
        Ok(())
    }

    fn tx_sensor_names(
        &self,
        _chan: usize,
    ) -> Vec<String> {
        self.tx_sensors.keys().cloned().collect()
    }

    fn get_tx_sensor(
        &self,
        name: &str,
        _chan: usize,
    ) -> TxResult<SensorValue> {
        match self.tx_sensors.get(name) {
            Some(locked) => Ok(SensorValue {
                name: name.to_string(),
                locked: *locked,
            }),
            None => Err(TxError::config(format!("No TX sensor '{name}'"))),
        }
    }

    fn mboard_sensor_names(
        &self,
        _mboard: usize,
    ) -> Vec<String> {
        self.mboard_sensors.keys().cloned().collect()
    }

    fn get_mboard_sensor(
        &self,
        name: &str,
        _mboard: usize,
    ) -> TxResult<SensorValue> {
        match self.mboard_sensors.get(name) {
            Some(locked) => Ok(SensorValue {
                name: name.to_string(),
                locked: *locked,
            }),
            None => Err(TxError::config(format!("No mboard sensor '{name}'"))),
        }
    }

    fn tx_stream(
        &mut self,
        args: &StreamArgs,
    ) -> TxResult<Box<dyn TxStream>> {
        for &chan in &args.channels {
            if chan >= self.channels {
                return Err(TxError::InvalidChannel {
                    index: chan,
                    available: self.channels,
                });
            }
        }

        self.calls.push(format!(
            "tx_stream cpu={} otw={} channels={:?}",
            args.cpu_format.cpu_format(),
            args.wire_format,
            args.channels
        ));

        Ok(Box::new(SimulatedTxStream {
            max_samps: self.max_samps,
            sends: 0,
            data_sends: 0,
            fail_on_send: self.fail_on_send,
            cancel_after: self.cancel_after.clone(),
            tx: self.sent_tx.clone(),
        }))
    }
}

/// TX поток симулятора: принимает всё и протоколирует каждый send.
pub struct SimulatedTxStream {
    max_samps: usize,
    sends: u64,
    data_sends: u64,
    fail_on_send: Option<u64>,
    cancel_after: Option<(u64, Arc<AtomicBool>)>,
    tx: Sender<SentPacket>,
}

impl TxStream for SimulatedTxStream {
    fn send(
        &mut self,
        data: &[u8],
        nsamps: usize,
        md: &TxMetadata,
    ) -> TxResult<usize> {
        self.sends += 1;

        if self.fail_on_send == Some(self.sends) {
            return Err(TxError::transport(format!(
                "simulated device rejected send #{}",
                self.sends
            )));
        }

        // Канал unbounded: сим-поток никогда не блокируется
        let _ = self.tx.send(SentPacket {
            nsamps,
            md: *md,
            data: data.to_vec(),
        });

        if nsamps > 0 {
            self.data_sends += 1;

            if let Some((n, flag)) = &self.cancel_after {
                if self.data_sends == *n {
                    flag.store(true, Ordering::Relaxed);
                }
            }
        }

        Ok(nsamps)
    }

    fn max_num_samps(&self) -> usize {
        self.max_samps
    }
}

/// Создаёт устройство по адресной строке.
///
/// `"sim"` (с опциями `sim,channels=2,mboards=2,max_samps=512`) — встроенный
/// симулятор. Всё остальное требует бэкенда libuhd.
pub fn create_device(args: &str) -> TxResult<Box<dyn TxDevice>> {
    let args = args.trim();

    if args.is_empty() || args == "sim" || args.starts_with("sim,") {
        let mut channels = 1usize;
        let mut mboards = 1usize;
        let mut max_samps = 1_024usize;

        for opt in args.split(',').skip(1) {
            let (key, value) = opt
                .split_once('=')
                .ok_or_else(|| TxError::config(format!("Bad sim option '{opt}'")))?;

            let parsed: usize = value
                .parse()
                .map_err(|_| TxError::config(format!("Bad sim option value '{opt}'")))?;

            match key {
                "channels" => channels = parsed,
                "mboards" => mboards = parsed,
                "max_samps" => max_samps = parsed,
                _ => return Err(TxError::config(format!("Unknown sim option '{key}'"))),
            }
        }

        // Симулятору даём идеальные сенсоры, как у настроенной платы
        return Ok(Box::new(
            SimulatedUsrp::new(channels, mboards)
                .with_max_samps(max_samps)
                .with_tx_sensor("lo_locked", true)
                .with_mboard_sensor("ref_locked", true),
        ));
    }

    #[cfg(feature = "uhd")]
    {
        return Err(TxError::DeviceNotFound(
            "UHD support compiled in but not yet implemented".to_string(),
        ));
    }
    #[cfg(not(feature = "uhd"))]
    Err(TxError::DeviceNotFound(format!(
        "No backend for device args '{args}'. \
         Compiled without UHD support; rebuild with: cargo build --features uhd"
    )))
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use utx_types::SampleFormat;

    use super::*;

    fn stream_args(channels: Vec<usize>) -> StreamArgs {
        StreamArgs {
            cpu_format: SampleFormat::Int16,
            wire_format: "sc16".to_string(),
            channels,
        }
    }

    #[test]
    fn test_create_device_sim() {
        let dev = create_device("sim").unwrap();
        assert_eq!(dev.tx_channel_count(), 1);
        assert_eq!(dev.num_mboards(), 1);
    }

    #[test]
    fn test_create_device_sim_options() {
        let dev = create_device("sim,channels=2,mboards=2,max_samps=512").unwrap();
        assert_eq!(dev.tx_channel_count(), 2);
        assert_eq!(dev.num_mboards(), 2);
    }

    #[test]
    fn test_create_device_bad_option() {
        assert!(matches!(
            create_device("sim,chans=2"),
            Err(TxError::Config(_))
        ));
    }

    #[test]
    fn test_create_device_no_backend() {
        assert!(matches!(
            create_device("addr=192.168.10.2"),
            Err(TxError::DeviceNotFound(_))
        ));
    }

    #[test]
    fn test_sim_stream_records_sends() {
        let mut dev = SimulatedUsrp::new(1, 1);
        let rx = dev.sent_packets();
        let mut stream = dev.tx_stream(&stream_args(vec![0])).unwrap();

        let md = TxMetadata::in_burst();
        let sent = stream.send(&[1, 2, 3, 4], 1, &md).unwrap();
        assert_eq!(sent, 1);

        let pkt = rx.try_recv().unwrap();
        assert_eq!(pkt.nsamps, 1);
        assert_eq!(pkt.data, vec![1, 2, 3, 4]);
        assert_eq!(pkt.md, md);
    }

    #[test]
    fn test_sim_stream_rejects_bad_channel() {
        let mut dev = SimulatedUsrp::new(1, 1);
        assert!(matches!(
            dev.tx_stream(&stream_args(vec![0, 1])),
            Err(TxError::InvalidChannel { index: 1, .. })
        ));
    }

    #[test]
    fn test_sim_stream_fail_on_send() {
        let mut dev = SimulatedUsrp::new(1, 1).fail_on_send(2);
        let mut stream = dev.tx_stream(&stream_args(vec![0])).unwrap();

        let md = TxMetadata::in_burst();
        assert!(stream.send(&[0; 4], 1, &md).is_ok());
        assert!(matches!(
            stream.send(&[0; 4], 1, &md),
            Err(TxError::TransportSend(_))
        ));
    }

    #[test]
    fn test_sim_device_time() {
        let mut dev = SimulatedUsrp::new(1, 1);
        assert_eq!(dev.get_time_now().as_secs(), 0.0);

        dev.set_time_now(TimeSpec::from_secs(5.0), 0).unwrap();
        assert_eq!(dev.get_time_now().as_secs(), 5.0);
    }

    #[test]
    fn test_sim_sensors() {
        let dev = SimulatedUsrp::new(1, 1)
            .with_tx_sensor("lo_locked", true)
            .with_mboard_sensor("ref_locked", false);

        assert!(dev.get_tx_sensor("lo_locked", 0).unwrap().to_bool());
        assert!(!dev.get_mboard_sensor("ref_locked", 0).unwrap().to_bool());
        assert!(dev.get_tx_sensor("temp", 0).is_err());
    }
}
