//! ESP-IDF peripheral initialisation and raw access helpers.
//!
//! Owns the ADC oneshot unit shared by the analog sensors and the DHT22
//! single-wire transaction. Everything here is espidf-only; host builds
//! use the drivers' simulation backends instead.

use core::sync::atomic::{AtomicI32, Ordering};

use embedded_hal::delay::DelayNs;
use esp_idf_hal::delay::Ets;
use esp_idf_svc::sys::*;
use log::warn;

use crate::pins;

/// ADC1 channel of the soil-moisture probe (GPIO 34).
pub const ADC1_CH_SOIL: adc_channel_t = adc_channel_t_ADC_CHANNEL_6;
/// ADC1 channel of the light divider (GPIO 35).
pub const ADC1_CH_LIGHT: adc_channel_t = adc_channel_t_ADC_CHANNEL_7;

static ADC1_HANDLE: AtomicI32 = AtomicI32::new(0);

/// Initialise the shared ADC1 oneshot unit and configure both analog
/// channels. Call once from main before the first sampling tick.
pub fn init_peripherals() -> Result<(), crate::error::Error> {
    let unit_cfg = adc_oneshot_unit_init_cfg_t {
        unit_id: adc_unit_t_ADC_UNIT_1,
        ..Default::default()
    };
    let mut handle: adc_oneshot_unit_handle_t = core::ptr::null_mut();
    // SAFETY: single-threaded init path; the handle outlives the process.
    let ret = unsafe { adc_oneshot_new_unit(&unit_cfg, &mut handle) };
    if ret != ESP_OK {
        return Err(crate::error::Error::Init("adc_oneshot_new_unit failed"));
    }

    let chan_cfg = adc_oneshot_chan_cfg_t {
        atten: pins::SENSOR_ADC_ATTEN,
        bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
    };
    for channel in [ADC1_CH_SOIL, ADC1_CH_LIGHT] {
        let ret = unsafe { adc_oneshot_config_channel(handle, channel, &chan_cfg) };
        if ret != ESP_OK {
            return Err(crate::error::Error::Init("adc_oneshot_config_channel failed"));
        }
    }

    ADC1_HANDLE.store(handle as i32, Ordering::Release);
    Ok(())
}

/// One raw ADC1 conversion. Returns 0 (a rail value — reads as invalid)
/// when the unit is uninitialised or the conversion fails.
pub fn adc1_read(channel: adc_channel_t) -> u16 {
    let handle = ADC1_HANDLE.load(Ordering::Acquire) as adc_oneshot_unit_handle_t;
    if handle.is_null() {
        return 0;
    }
    let mut raw: i32 = 0;
    // SAFETY: handle was created by init_peripherals and is never freed.
    let ret = unsafe { adc_oneshot_read(handle, channel, &mut raw) };
    if ret != ESP_OK {
        warn!("adc1_read: conversion failed on channel {channel}");
        return 0;
    }
    raw.clamp(0, 4095) as u16
}

/// One DHT22 single-wire transaction: 40 data bits after the host start
/// pulse, checksummed. Returns `(temperature_c, humidity_pct)` or `None`
/// on a bus timeout or checksum mismatch.
pub fn dht22_read(gpio: i32) -> Option<(f32, f32)> {
    let mut delay = Ets;

    // Host start pulse: pull low ≥ 1 ms, then release.
    unsafe {
        gpio_set_direction(gpio, gpio_mode_t_GPIO_MODE_OUTPUT);
        gpio_set_level(gpio, 0);
    }
    delay.delay_us(1100);
    unsafe {
        gpio_set_level(gpio, 1);
        gpio_set_direction(gpio, gpio_mode_t_GPIO_MODE_INPUT);
    }

    // Sensor response: ~80 µs low, ~80 µs high, then 40 bits.
    wait_level(gpio, 0, 100)?;
    wait_level(gpio, 1, 100)?;
    wait_level(gpio, 0, 100)?;

    let mut bytes = [0u8; 5];
    for byte in &mut bytes {
        for _ in 0..8 {
            wait_level(gpio, 1, 80)?;
            let high_us = pulse_width(gpio, 1, 100)?;
            *byte <<= 1;
            // ~28 µs high = 0, ~70 µs high = 1.
            if high_us > 48 {
                *byte |= 1;
            }
        }
    }

    let sum = bytes[0]
        .wrapping_add(bytes[1])
        .wrapping_add(bytes[2])
        .wrapping_add(bytes[3]);
    if sum != bytes[4] {
        warn!("dht22: checksum mismatch");
        return None;
    }

    let humidity = f32::from(u16::from_be_bytes([bytes[0], bytes[1]])) / 10.0;
    let raw_temp = u16::from_be_bytes([bytes[2], bytes[3]]);
    let temperature = if raw_temp & 0x8000 != 0 {
        -f32::from(raw_temp & 0x7FFF) / 10.0
    } else {
        f32::from(raw_temp) / 10.0
    };
    Some((temperature, humidity))
}

/// Busy-wait until the pin reads `level`, bounded by `timeout_us`.
fn wait_level(gpio: i32, level: u32, timeout_us: u32) -> Option<()> {
    let mut delay = Ets;
    for _ in 0..timeout_us {
        if unsafe { gpio_get_level(gpio) } as u32 == level {
            return Some(());
        }
        delay.delay_us(1);
    }
    None
}

/// Measure how long the pin holds `level`, bounded by `timeout_us`.
fn pulse_width(gpio: i32, level: u32, timeout_us: u32) -> Option<u32> {
    let mut delay = Ets;
    for elapsed in 0..timeout_us {
        if unsafe { gpio_get_level(gpio) } as u32 != level {
            return Some(elapsed);
        }
        delay.delay_us(1);
    }
    None
}
