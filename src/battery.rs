use std::{ marker::PhantomData, sync::Arc };

use enumset::enum_set;

use crate::ble::{ AttError, CharacteristicDef, CharacteristicExt, Property, ReadExt, Service };

pub const BATTERY_SERVICE_UUID: u16 = 0x180f;
pub const BATTERY_LEVEL_UUID: u16 = 0x2a19;

/// 固定的电量百分比，板子上没有电量计
#[derive(Debug, Clone)]
pub struct BatteryLevel<State> {
    level: u8,
    _p: PhantomData<fn() -> State>,
}

impl<State> BatteryLevel<State> {
    pub fn new(level: u8) -> Self {
        Self { level: level.min(100), _p: PhantomData }
    }

    pub fn level(&self) -> u8 {
        self.level
    }
}

impl<State: std::fmt::Debug> CharacteristicExt for BatteryLevel<State> {
    fn characteristic(&self) -> CharacteristicDef {
        CharacteristicDef::new(BATTERY_LEVEL_UUID, enum_set!(Property::Read))
    }
}

impl<State: std::fmt::Debug + Sync + Send + Clone> ReadExt for BatteryLevel<State> {
    type State = State;
    fn on_read(&self, _state: Self::State) -> Result<Vec<u8>, AttError> {
        Ok(vec![self.level])
    }
}

pub fn service<State: std::fmt::Debug + Sync + Send + Clone + 'static>(level: u8) -> Service<State> {
    let mut service = Service::new(BATTERY_SERVICE_UUID);
    service.add_read_characteristic(Arc::new(BatteryLevel::new(level)));
    service
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_is_clamped_to_percent() {
        assert_eq!(BatteryLevel::<()>::new(250).level(), 100);
        assert_eq!(BatteryLevel::<()>::new(42).level(), 42);
    }

    #[test]
    fn reads_level() {
        let service = service::<()>(80);
        assert_eq!(service.read_characteristics[0].on_read(()), Ok(vec![80]));
        assert_eq!(service.attributes[0].characteristic.uuid, BATTERY_LEVEL_UUID);
    }
}
