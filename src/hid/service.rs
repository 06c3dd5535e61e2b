use std::sync::{ Arc, Mutex };

use enumset::enum_set;

use super::{
    HidState,
    ProtocolMode,
    SharedHid,
    APPEARANCE_KEYBOARD,
    BOOT_KEYBOARD_INPUT_UUID,
    BOOT_KEYBOARD_OUTPUT_UUID,
    BOOT_KEYBOARD_REPORT_MAP,
    HID_CONTROL_POINT_UUID,
    HID_INFORMATION,
    HID_INFORMATION_UUID,
    HID_SERVICE_UUID,
    INPUT_REPORT_REFERENCE,
    PROTOCOL_MODE_UUID,
    REPORT_MAP_UUID,
    REPORT_REFERENCE_UUID,
    REPORT_UUID,
};
use crate::battery;
use crate::ble::{
    att::expect_len,
    lock,
    AttError,
    BLEApp,
    CharacteristicDef,
    CharacteristicExt,
    DescriptorDef,
    NotifyExt,
    Property,
    ReadExt,
    Service,
    SubscribeEvent,
    WriteExt,
};

#[derive(Debug, Clone, Default)]
pub struct HidInformation;

impl CharacteristicExt for HidInformation {
    fn characteristic(&self) -> CharacteristicDef {
        CharacteristicDef::new(HID_INFORMATION_UUID, enum_set!(Property::Read))
    }
}

impl ReadExt for HidInformation {
    type State = SharedHid;
    fn on_read(&self, _state: Self::State) -> Result<Vec<u8>, AttError> {
        Ok(HID_INFORMATION.to_vec())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReportMap;

impl CharacteristicExt for ReportMap {
    fn characteristic(&self) -> CharacteristicDef {
        CharacteristicDef::new(REPORT_MAP_UUID, enum_set!(Property::Read))
    }
}

impl ReadExt for ReportMap {
    type State = SharedHid;
    fn on_read(&self, _state: Self::State) -> Result<Vec<u8>, AttError> {
        Ok(BOOT_KEYBOARD_REPORT_MAP.to_vec())
    }
}

#[derive(Debug, Clone, Default)]
pub struct HidControlPoint;

impl CharacteristicExt for HidControlPoint {
    fn characteristic(&self) -> CharacteristicDef {
        CharacteristicDef::new(HID_CONTROL_POINT_UUID, enum_set!(Property::WriteNoRsp))
    }
}

impl WriteExt for HidControlPoint {
    type State = SharedHid;
    fn on_write(&self, state: Self::State, data: &[u8]) -> Result<(), AttError> {
        expect_len(data, 1)?;
        let mut state = lock(&state);
        match data[0] {
            0x00 => {
                log::info!("host suspended");
                state.suspended = true;
            }
            0x01 => {
                log::info!("host exited suspend");
                state.suspended = false;
            }
            other => log::warn!("unknown HID control point command {other:#04x}"),
        }
        Ok(())
    }
}

/// 输入报告 (Report 模式)
#[derive(Debug, Clone, Default)]
pub struct InputReport;

impl CharacteristicExt for InputReport {
    fn characteristic(&self) -> CharacteristicDef {
        CharacteristicDef::new(
            REPORT_UUID,
            enum_set!(
                Property::Read |
                    Property::Write |
                    Property::WriteNoRsp |
                    Property::Notify |
                    Property::Indicate
            )
        )
    }

    fn descriptors(&self) -> Vec<DescriptorDef> {
        vec![DescriptorDef {
            uuid: REPORT_REFERENCE_UUID,
            value: INPUT_REPORT_REFERENCE.to_vec(),
        }]
    }
}

impl ReadExt for InputReport {
    type State = SharedHid;
    fn on_read(&self, state: Self::State) -> Result<Vec<u8>, AttError> {
        Ok(lock(&state).report.to_bytes().to_vec())
    }
}

impl WriteExt for InputReport {
    type State = SharedHid;
    fn on_write(&self, _state: Self::State, data: &[u8]) -> Result<(), AttError> {
        log::warn!("HID output features not supported, ignoring {data:02x?}");
        Ok(())
    }
}

impl NotifyExt for InputReport {
    type State = SharedHid;
    fn on_subscribe(&self, state: Self::State, event: SubscribeEvent) {
        lock(&state).report_subscription.on_subscribe(event);
    }

    fn on_disconnect(&self, state: Self::State, conn_handle: u16) {
        lock(&state).report_subscription.on_disconnect(conn_handle);
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProtocolModeCharacteristic;

impl CharacteristicExt for ProtocolModeCharacteristic {
    fn characteristic(&self) -> CharacteristicDef {
        CharacteristicDef::new(PROTOCOL_MODE_UUID, enum_set!(Property::Read | Property::WriteNoRsp))
    }
}

impl ReadExt for ProtocolModeCharacteristic {
    type State = SharedHid;
    fn on_read(&self, state: Self::State) -> Result<Vec<u8>, AttError> {
        Ok(vec![lock(&state).protocol_mode as u8])
    }
}

impl WriteExt for ProtocolModeCharacteristic {
    type State = SharedHid;
    fn on_write(&self, state: Self::State, data: &[u8]) -> Result<(), AttError> {
        expect_len(data, 1)?;
        let mode = ProtocolMode::try_from(data[0])?;
        log::info!("switching to {mode:?} protocol mode");
        lock(&state).protocol_mode = mode;
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct BootKeyboardInput;

impl CharacteristicExt for BootKeyboardInput {
    fn characteristic(&self) -> CharacteristicDef {
        CharacteristicDef::new(BOOT_KEYBOARD_INPUT_UUID, enum_set!(Property::Read | Property::Notify))
    }
}

impl ReadExt for BootKeyboardInput {
    type State = SharedHid;
    fn on_read(&self, state: Self::State) -> Result<Vec<u8>, AttError> {
        Ok(lock(&state).report.to_bytes().to_vec())
    }
}

impl NotifyExt for BootKeyboardInput {
    type State = SharedHid;
    fn on_subscribe(&self, state: Self::State, event: SubscribeEvent) {
        lock(&state).boot_subscription.on_subscribe(event);
    }

    fn on_disconnect(&self, state: Self::State, conn_handle: u16) {
        lock(&state).boot_subscription.on_disconnect(conn_handle);
    }
}

/// LED 输出报告
#[derive(Debug, Clone, Default)]
pub struct BootKeyboardOutput;

impl CharacteristicExt for BootKeyboardOutput {
    fn characteristic(&self) -> CharacteristicDef {
        CharacteristicDef::new(
            BOOT_KEYBOARD_OUTPUT_UUID,
            enum_set!(Property::Read | Property::Write | Property::WriteNoRsp)
        )
    }
}

impl ReadExt for BootKeyboardOutput {
    type State = SharedHid;
    fn on_read(&self, state: Self::State) -> Result<Vec<u8>, AttError> {
        Ok(vec![lock(&state).leds])
    }
}

impl WriteExt for BootKeyboardOutput {
    type State = SharedHid;
    fn on_write(&self, state: Self::State, data: &[u8]) -> Result<(), AttError> {
        expect_len(data, 1)?;
        log::info!("keyboard LEDs set to {:#010b}", data[0]);
        lock(&state).leds = data[0];
        Ok(())
    }
}

pub fn service() -> Service<SharedHid> {
    let mut service = Service::new(HID_SERVICE_UUID);
    service.add_read_characteristic(Arc::new(HidInformation));
    service.add_read_characteristic(Arc::new(ReportMap));
    service.add_write_characteristic(Arc::new(HidControlPoint));

    service.add_read_characteristic(Arc::new(InputReport));
    service.add_write_characteristic(Arc::new(InputReport));
    service.add_notify_characteristic(Arc::new(InputReport));

    service.add_read_characteristic(Arc::new(ProtocolModeCharacteristic));
    service.add_write_characteristic(Arc::new(ProtocolModeCharacteristic));

    service.add_read_characteristic(Arc::new(BootKeyboardInput));
    service.add_notify_characteristic(Arc::new(BootKeyboardInput));

    service.add_read_characteristic(Arc::new(BootKeyboardOutput));
    service.add_write_characteristic(Arc::new(BootKeyboardOutput));
    service
}

/// HID 服务加上电池服务，Windows 等主机要求两者都在
pub fn app(device_name: &str, bonding: bool, battery_level: u8) -> anyhow::Result<BLEApp<SharedHid>> {
    let mut app = BLEApp::builder()
        .device_name(device_name)
        .appearance(APPEARANCE_KEYBOARD)
        .bonding(bonding)
        .state(Arc::new(Mutex::new(HidState::default())))
        .build()?;
    app.add_service(service());
    app.add_service(battery::service(battery_level));
    Ok(app)
}
