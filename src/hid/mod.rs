//! HID over GATT (HOGP) 键盘。

use std::sync::{ Arc, Mutex };
use crate::ble::{ AttError, Subscription };

pub mod keyboard;
mod report_map;
mod service;
mod typist;
pub use keyboard::KeyboardReport;
pub use report_map::BOOT_KEYBOARD_REPORT_MAP;
pub use service::*;
pub use typist::{ Keyboard, Typist };

pub const HID_SERVICE_UUID: u16 = 0x1812;
pub const HID_INFORMATION_UUID: u16 = 0x2a4a;
pub const REPORT_MAP_UUID: u16 = 0x2a4b;
pub const HID_CONTROL_POINT_UUID: u16 = 0x2a4c;
pub const REPORT_UUID: u16 = 0x2a4d;
pub const PROTOCOL_MODE_UUID: u16 = 0x2a4e;
pub const BOOT_KEYBOARD_INPUT_UUID: u16 = 0x2a22;
pub const BOOT_KEYBOARD_OUTPUT_UUID: u16 = 0x2a32;
pub const REPORT_REFERENCE_UUID: u16 = 0x2908;

pub const APPEARANCE_KEYBOARD: u16 = 0x03c1;

/// bcdHID 1.11，国家码 0，标志: 可正常连接
pub const HID_INFORMATION: [u8; 4] = [0x11, 0x01, 0x00, 0x02];
/// 报告 ID 0，类型 Input
pub const INPUT_REPORT_REFERENCE: [u8; 2] = [0x00, 0x01];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolMode {
    Boot = 0x00,
    Report = 0x01,
}

impl TryFrom<u8> for ProtocolMode {
    type Error = AttError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(ProtocolMode::Boot),
            0x01 => Ok(ProtocolMode::Report),
            _ => Err(AttError::ValueNotAllowed),
        }
    }
}

#[derive(Debug)]
pub struct HidState {
    pub report: KeyboardReport,
    pub protocol_mode: ProtocolMode,
    pub suspended: bool,
    /// 主机写来的 LED 位图 (Num Lock, Caps Lock, ...)
    pub leds: u8,
    pub report_subscription: Subscription,
    pub boot_subscription: Subscription,
}

impl Default for HidState {
    fn default() -> Self {
        Self {
            report: KeyboardReport::default(),
            protocol_mode: ProtocolMode::Report,
            suspended: false,
            leds: 0,
            report_subscription: Subscription::default(),
            boot_subscription: Subscription::default(),
        }
    }
}

pub type SharedHid = Arc<Mutex<HidState>>;
