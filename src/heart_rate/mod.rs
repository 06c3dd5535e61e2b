//! 心率服务 (0x180D)：合成的心率值，按固定间隔通过 indicate 推送。

use std::sync::{ Arc, Mutex };
use crate::ble::Subscription;

mod service;
pub use service::*;

pub const HEART_RATE_SERVICE_UUID: u16 = 0x180d;
pub const HEART_RATE_MEASUREMENT_UUID: u16 = 0x2a37;
/// Generic Heart Rate Sensor
pub const APPEARANCE_HEART_RATE_SENSOR: u16 = 0x0340;

pub const MIN_BPM: u8 = 60;
pub const BPM_SPREAD: u32 = 21;

/// 合成传感器，随机数源由调用方注入（目标上是 `esp_random`）
pub struct HeartRateSensor<R> {
    rng: R,
    bpm: u8,
}

impl<R: FnMut() -> u32> HeartRateSensor<R> {
    pub fn new(rng: R) -> Self {
        Self { rng, bpm: 0 }
    }

    /// 新值总是落在 60..=80
    pub fn update(&mut self) -> u8 {
        self.bpm = MIN_BPM + (((self.rng)() % BPM_SPREAD) as u8);
        self.bpm
    }

    pub fn bpm(&self) -> u8 {
        self.bpm
    }
}

/// Heart Rate Measurement：标志字节 0 表示 uint8 格式，后面是心率
pub fn measurement(bpm: u8) -> [u8; 2] {
    [0x00, bpm]
}

#[derive(Debug, Default)]
pub struct HeartRateState {
    pub bpm: u8,
    pub subscription: Subscription,
}

pub type SharedHeartRate = Arc<Mutex<HeartRateState>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sensor_stays_in_range() {
        let mut next = 0u32;
        let mut sensor = HeartRateSensor::new(|| {
            next = next.wrapping_add(7919);
            next
        });
        for _ in 0..200 {
            let bpm = sensor.update();
            assert!((60..=80).contains(&bpm), "bpm {bpm} out of range");
            assert_eq!(sensor.bpm(), bpm);
        }
    }

    #[test]
    fn sensor_bounds() {
        assert_eq!(HeartRateSensor::new(|| 0).update(), 60);
        assert_eq!(HeartRateSensor::new(|| 20).update(), 80);
        assert_eq!(HeartRateSensor::new(|| 21).update(), 60);
        assert_eq!(HeartRateSensor::new(|| u32::MAX).update(), 60 + ((u32::MAX % 21) as u8));
    }

    #[test]
    fn measurement_uses_uint8_format() {
        assert_eq!(measurement(72), [0x00, 72]);
    }
}
