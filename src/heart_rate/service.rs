use std::sync::{ Arc, Mutex };

use enumset::enum_set;

use super::{
    measurement,
    HeartRateSensor,
    HeartRateState,
    SharedHeartRate,
    APPEARANCE_HEART_RATE_SENSOR,
    HEART_RATE_MEASUREMENT_UUID,
    HEART_RATE_SERVICE_UUID,
};
use crate::ble::{
    lock,
    AttError,
    BLEApp,
    CharacteristicDef,
    CharacteristicExt,
    Notifier,
    NotifyExt,
    Property,
    ReadExt,
    Service,
    SubscribeEvent,
};

#[derive(Debug, Clone, Default)]
pub struct HeartRateMeasurement;

impl CharacteristicExt for HeartRateMeasurement {
    fn characteristic(&self) -> CharacteristicDef {
        CharacteristicDef::new(HEART_RATE_MEASUREMENT_UUID, enum_set!(Property::Read | Property::Indicate))
    }
}

impl ReadExt for HeartRateMeasurement {
    type State = SharedHeartRate;
    fn on_read(&self, state: Self::State) -> Result<Vec<u8>, AttError> {
        Ok(measurement(lock(&state).bpm).to_vec())
    }
}

impl NotifyExt for HeartRateMeasurement {
    type State = SharedHeartRate;
    fn on_subscribe(&self, state: Self::State, event: SubscribeEvent) {
        lock(&state).subscription.on_subscribe(event);
    }

    fn on_disconnect(&self, state: Self::State, conn_handle: u16) {
        lock(&state).subscription.on_disconnect(conn_handle);
    }
}

pub fn service() -> Service<SharedHeartRate> {
    let mut service = Service::new(HEART_RATE_SERVICE_UUID);
    service.add_read_characteristic(Arc::new(HeartRateMeasurement));
    service.add_notify_characteristic(Arc::new(HeartRateMeasurement));
    service
}

pub fn app(device_name: &str, bonding: bool) -> anyhow::Result<BLEApp<SharedHeartRate>> {
    let mut app = BLEApp::builder()
        .device_name(device_name)
        .appearance(APPEARANCE_HEART_RATE_SENSOR)
        .bonding(bonding)
        .state(Arc::new(Mutex::new(HeartRateState::default())))
        .build()?;
    app.add_service(service());
    Ok(app)
}

/// 周期任务：更新心率，有订阅时发送 indication
pub struct HeartRateTask<R> {
    sensor: HeartRateSensor<R>,
    state: SharedHeartRate,
}

impl<R: FnMut() -> u32> HeartRateTask<R> {
    pub fn new(rng: R, state: SharedHeartRate) -> Self {
        Self { sensor: HeartRateSensor::new(rng), state }
    }

    /// 返回这一轮是否发出了 indication
    pub fn tick(&mut self, notifier: &impl Notifier) -> anyhow::Result<bool> {
        let bpm = self.sensor.update();
        let target = {
            let mut state = lock(&self.state);
            state.bpm = bpm;
            state.subscription.can_indicate()
        };
        log::info!("heart rate updated to {bpm}");

        let Some(conn_handle) = target else {
            return Ok(false);
        };
        notifier.indicate(HEART_RATE_MEASUREMENT_UUID, &measurement(bpm))?;
        log::info!("heart rate indication sent to conn_handle={conn_handle}");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_returns_latest_measurement() {
        let app = app("HR", false).unwrap();
        lock(&app.state).bpm = 75;
        assert_eq!(app.on_read(HEART_RATE_MEASUREMENT_UUID), Ok(vec![0x00, 75]));
    }

    #[test]
    fn measurement_is_read_only() {
        let app = app("HR", false).unwrap();
        assert_eq!(app.on_write(HEART_RATE_MEASUREMENT_UUID, &[1]), Err(AttError::WriteNotPermitted));
    }

    #[test]
    fn attribute_table_lists_measurement_once() {
        let app = app("HR", false).unwrap();
        assert_eq!(app.services[0].attributes.len(), 1);
        let table = app.attribute_table();
        assert_eq!(table.len(), 2);
        assert_eq!(table[0], "service 0x180d");
        assert!(table[1].starts_with("  characteristic 0x2a37"));
    }
}
