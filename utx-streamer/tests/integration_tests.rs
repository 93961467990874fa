// Сквозные сценарии: конфигурация → синхронизация → burst, всё против
// симулятора устройства.

use std::{
    io::Write,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use tempfile::NamedTempFile;
use utx_streamer::{
    check_locks, synchronize, BurstStreamer, ChannelSet, SampleBlock, SampleSource, SentPacket,
    SimulatedUsrp, StreamArgs, TransmitBudget, TuneRequest, TxDevice, TxMetrics,
};
use utx_types::{ClockRef, SampleFormat, SyncMode, TimeSpec, TxError};

fn sample_file(n_samples: usize, format: SampleFormat) -> NamedTempFile {
    let mut tmp = NamedTempFile::new().unwrap();
    let bytes: Vec<u8> = (0..n_samples * format.sample_size())
        .map(|i| (i % 251) as u8)
        .collect();
    tmp.write_all(&bytes).unwrap();
    tmp.flush().unwrap();
    tmp
}

fn stream_args(channels: &ChannelSet) -> StreamArgs {
    StreamArgs {
        cpu_format: SampleFormat::Int16,
        wire_format: "sc16".to_string(),
        channels: channels.as_slice().to_vec(),
    }
}

#[test]
fn test_full_two_channel_session() {
    // Двухканальная сессия через MIMO-кабель: настройка, синхронизация,
    // burst с бюджетом, проверка рамок
    let tmp = sample_file(32, SampleFormat::Int16);

    let mut dev = SimulatedUsrp::new(2, 2)
        .with_tx_sensor("lo_locked", true)
        .with_mboard_sensor("mimo_locked", true);
    let rx = dev.sent_packets();

    let channels = ChannelSet::resolve("0,1", dev.tx_channel_count()).unwrap();
    assert_eq!(channels.len(), 2);

    dev.set_tx_rate(1_000_000.0).unwrap();
    let request = TuneRequest {
        target_freq: 915_000_000.0,
        lo_offset: 0.0,
        integer_n: false,
    };
    for &chan in channels.iter() {
        dev.set_tx_freq(&request, chan).unwrap();
        dev.set_tx_gain(20.0, chan).unwrap();
    }

    let mut stream = dev.tx_stream(&stream_args(&channels)).unwrap();

    synchronize(&mut dev, &channels, SyncMode::MimoCable).unwrap();
    check_locks(&dev, &channels, ClockRef::Mimo).unwrap();

    let start_time = dev.get_time_now() + TimeSpec::from_secs(0.1);

    let mut source = SampleSource::open(tmp.path()).unwrap();
    let mut block = SampleBlock::new(8, SampleFormat::Int16);
    let mut budget = TransmitBudget::new(32);
    let cancel = AtomicBool::new(false);

    let streamer = BurstStreamer::new(TxMetrics::new());
    streamer
        .run(
            &mut source,
            stream.as_mut(),
            &mut block,
            &mut budget,
            &cancel,
            start_time,
        )
        .unwrap();

    assert_eq!(budget.accumulated, 32);

    let packets: Vec<SentPacket> = rx.try_iter().collect();
    assert_eq!(packets.len(), 5, "4 data sends of 8 samples + closing");

    assert!(packets[0].md.start_of_burst && packets[0].md.has_time_spec);
    assert_eq!(packets[0].md.time_spec, TimeSpec::from_secs(0.1));
    assert_eq!(packets[0].data.len(), 8 * 4);

    for p in &packets[1..4] {
        assert!(!p.md.start_of_burst && !p.md.has_time_spec && !p.md.end_of_burst);
    }

    let last = packets.last().unwrap();
    assert!(last.md.end_of_burst);
    assert_eq!(last.nsamps, 0);
    assert!(last.data.is_empty());

    // Синхронизация шла в правильном порядке: slave → master
    assert!(dev
        .calls
        .windows(2)
        .any(|w| w[0] == "time_source[1]=mimo" && w[1] == "time_now[0]=0"));
}

#[test]
fn test_invalid_channel_aborts_before_configuration() {
    // "0,1" на одноканальном устройстве: ошибка называет индекс 1,
    // устройство не тронуто
    let dev = SimulatedUsrp::new(1, 1);

    let err = ChannelSet::resolve("0,1", dev.tx_channel_count()).unwrap_err();
    match err {
        TxError::InvalidChannel { index, available } => {
            assert_eq!(index, 1);
            assert_eq!(available, 1);
        }
        other => panic!("expecting InvalidChannel, got {other:?}"),
    }

    assert!(dev.calls.is_empty(), "no device configuration performed");
}

#[test]
fn test_missing_file_fails_before_streaming() {
    let err = SampleSource::open("/definitely/not/here.dat").unwrap_err();
    assert!(matches!(err, TxError::FileUnavailable { .. }));
}

#[test]
fn test_unlocked_sensor_aborts_session() {
    let mut dev = SimulatedUsrp::new(2, 2)
        .with_tx_sensor("lo_locked", true)
        .with_mboard_sensor("mimo_locked", false);

    let channels = ChannelSet::resolve("0,1", 2).unwrap();
    synchronize(&mut dev, &channels, SyncMode::MimoCable).unwrap();

    let err = check_locks(&dev, &channels, ClockRef::Mimo).unwrap_err();
    assert!(matches!(err, TxError::HardwareNotLocked(ref s) if s == "mimo_locked"));
}

#[test]
fn test_cancel_mid_stream_closes_burst() {
    // Отмена после третьего пакета: burst всё равно закрыт ровно одним EOB
    let tmp = sample_file(4, SampleFormat::Int16);
    let cancel = Arc::new(AtomicBool::new(false));

    let mut dev = SimulatedUsrp::new(1, 1).cancel_after(3, cancel.clone());
    let rx = dev.sent_packets();

    let channels = ChannelSet::resolve("0", 1).unwrap();
    let mut stream = dev.tx_stream(&stream_args(&channels)).unwrap();

    synchronize(&mut dev, &channels, SyncMode::None).unwrap();

    let metrics = TxMetrics::new();
    let mut source = SampleSource::open(tmp.path()).unwrap();
    let mut block = SampleBlock::new(4, SampleFormat::Int16);
    let mut budget = TransmitBudget::new(0); // без ограничения

    let streamer = BurstStreamer::new(metrics.clone());
    streamer
        .run(
            &mut source,
            stream.as_mut(),
            &mut block,
            &mut budget,
            &cancel,
            TimeSpec::ZERO,
        )
        .unwrap();

    let packets: Vec<SentPacket> = rx.try_iter().collect();
    assert_eq!(packets.len(), 4, "3 data + 1 closing");

    let eob: Vec<_> = packets.iter().filter(|p| p.md.end_of_burst).collect();
    assert_eq!(eob.len(), 1);
    assert_eq!(metrics.packets_sent.load(Ordering::Relaxed), 4);
    assert_eq!(metrics.samples_sent.load(Ordering::Relaxed), 12);
}

#[test]
fn test_short_file_streams_stale_tail_until_budget() {
    // Файл на полторы длины буфера: второй fill короткий, цикл не падает
    // и досылает полный буфер до бюджета
    let tmp = sample_file(6, SampleFormat::Int16); // 24 байта
    let mut dev = SimulatedUsrp::new(1, 1);
    let rx = dev.sent_packets();

    let channels = ChannelSet::resolve("0", 1).unwrap();
    let mut stream = dev.tx_stream(&stream_args(&channels)).unwrap();

    let metrics = TxMetrics::new();
    let mut source = SampleSource::open(tmp.path()).unwrap();
    let mut block = SampleBlock::new(4, SampleFormat::Int16); // 16 байт
    let mut budget = TransmitBudget::new(12);
    let cancel = AtomicBool::new(false);

    let streamer = BurstStreamer::new(metrics.clone());
    streamer
        .run(
            &mut source,
            stream.as_mut(),
            &mut block,
            &mut budget,
            &cancel,
            TimeSpec::ZERO,
        )
        .unwrap();

    let packets: Vec<SentPacket> = rx.try_iter().collect();
    assert_eq!(packets.len(), 4, "3 полных пакета + закрывающий");

    for p in &packets[..3] {
        assert_eq!(p.nsamps, 4);
    }

    // Второй пакет: первые 8 байт — хвост файла, дальше лежит хвост от
    // первого наполнения (легаси-поведение оригинального тракта)
    assert_eq!(&packets[1].data[8..], &packets[0].data[8..]);
    // Третий fill читает 0 байт: буфер уходит как есть
    assert_eq!(packets[2].data, packets[1].data);

    assert!(metrics.short_reads.load(Ordering::Relaxed) >= 1);
    assert_eq!(metrics.bytes_read.load(Ordering::Relaxed), 24);
}
