use std::{thread, time::Duration};

use log::info;

use utx_types::{ClockRef, SyncMode, TimeSpec, TxError, TxResult};

use crate::{channels::ChannelSet, device::TxDevice};

/// Пауза после назначения slave-платы: её PLL физически доводит часы до
/// master по MIMO-кабелю. Это требование корректности, не настройка.
pub const MIMO_SETTLE: Duration = Duration::from_millis(100);

/// Пауза после взвода часов «на следующем PPS»: гарантирует, что фронт
/// секунды прошёл и все платы на общем опорнике стоят на известном
/// значении. Тоже требование корректности.
pub const PPS_SETTLE: Duration = Duration::from_secs(1);

/// Выравнивает часы всех задействованных плат на общий ноль.
///
/// Фазокогерентная многоканальная передача имеет смысл только если первая
/// выборка каждого канала уходит в точно согласованное время устройства.
/// Любая ошибка здесь — до отправки выборок; частично синхронизированное
/// состояние непригодно для стриминга.
pub fn synchronize(
    device: &mut dyn TxDevice,
    channels: &ChannelSet,
    mode: SyncMode,
) -> TxResult<()> {
    info!("Setting device timestamp to 0...");

    if channels.len() > 1 {
        match mode {
            SyncMode::MimoCable => {
                let mboards = device.num_mboards();

                if mboards != 2 {
                    return Err(TxError::precondition(format!(
                        "MIMO cable sync requires exactly 2 mboards, device has {mboards}"
                    )));
                }

                // Плата 1 — slave: берёт время с MIMO-кабеля
                device.set_time_source("mimo", Some(1))?;

                // Плата 0 — master: часы в ноль немедленно
                device.set_time_now(TimeSpec::ZERO, 0)?;

                // Ждём, пока slave захватит время master-а
                thread::sleep(MIMO_SETTLE);
            }
            _ => {
                // PPS-режимы; SyncMode::None сеттер источника пропускает,
                // но взвод по фронту всё равно выполняется
                if let Some(source) = mode.time_source() {
                    device.set_time_source(source, None)?;
                }

                device.set_time_unknown_pps(TimeSpec::ZERO)?;

                // Ждём фронт секунды
                thread::sleep(PPS_SETTLE);
            }
        }
    } else {
        // Один канал: межплатное рукопожатие не нужно
        device.set_time_now(TimeSpec::ZERO, 0)?;
    }

    Ok(())
}

/// Проверяет сенсоры захвата после синхронизации.
///
/// Проверка best-effort: сенсор, которого железка не экспонирует, молча
/// пропускается; ошибкой считается только явный unlocked.
pub fn check_locks(
    device: &dyn TxDevice,
    channels: &ChannelSet,
    clock_ref: ClockRef,
) -> TxResult<()> {
    let lead = channels.lead();

    let tx_names = device.tx_sensor_names(lead);
    if tx_names.iter().any(|n| n == "lo_locked") {
        let sensor = device.get_tx_sensor("lo_locked", lead)?;
        info!("Checking TX: {sensor} ...");

        if !sensor.to_bool() {
            return Err(TxError::HardwareNotLocked("lo_locked".to_string()));
        }
    }

    // Сенсоры плат опрашиваются на mboard 0
    let mb_names = device.mboard_sensor_names(0);

    if clock_ref == ClockRef::Mimo && mb_names.iter().any(|n| n == "mimo_locked") {
        let sensor = device.get_mboard_sensor("mimo_locked", 0)?;
        info!("Checking TX: {sensor} ...");

        if !sensor.to_bool() {
            return Err(TxError::HardwareNotLocked("mimo_locked".to_string()));
        }
    }

    if clock_ref == ClockRef::External && mb_names.iter().any(|n| n == "ref_locked") {
        let sensor = device.get_mboard_sensor("ref_locked", 0)?;
        info!("Checking TX: {sensor} ...");

        if !sensor.to_bool() {
            return Err(TxError::HardwareNotLocked("ref_locked".to_string()));
        }
    }

    Ok(())
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
