/// 与 boot 协议兼容的键盘报告描述符，输入报告 8 字节，输出报告 1 字节 (LED)
pub const BOOT_KEYBOARD_REPORT_MAP: [u8; 67] = [
    0x05, 0x01, // Usage Page (Generic Desktop Ctrls)
    0x09, 0x06, // Usage (Keyboard)
    0xa1, 0x01, // Collection (Application)
    0x05, 0x07, //   Usage Page (Kbrd/Keypad)
    0x19, 0xe0, //   Usage Minimum (0xE0)
    0x29, 0xe7, //   Usage Maximum (0xE7)
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x01, //   Logical Maximum (1)
    0x95, 0x08, //   Report Count (8)
    0x75, 0x01, //   Report Size (1)
    0x81, 0x02, //   Input (Data,Var,Abs) 修饰键
    0x95, 0x01, //   Report Count (1)
    0x75, 0x08, //   Report Size (8)
    0x81, 0x03, //   Input (Const,Var,Abs) 保留字节
    0x95, 0x06, //   Report Count (6)
    0x75, 0x08, //   Report Size (8)
    0x15, 0x00, //   Logical Minimum (0)
    0x26, 0xff, 0x00, //   Logical Maximum (255)
    0x05, 0x07, //   Usage Page (Kbrd/Keypad)
    0x19, 0x00, //   Usage Minimum (0x00)
    0x2a, 0xff, 0x00, //   Usage Maximum (0xFF)
    0x81, 0x00, //   Input (Data,Array,Abs) 6 个按键
    0x25, 0x01, //   Logical Maximum (1)
    0x95, 0x05, //   Report Count (5)
    0x75, 0x01, //   Report Size (1)
    0x05, 0x08, //   Usage Page (LEDs)
    0x19, 0x01, //   Usage Minimum (Num Lock)
    0x29, 0x05, //   Usage Maximum (Kana)
    0x91, 0x02, //   Output (Data,Var,Abs) LED
    0x95, 0x01, //   Report Count (1)
    0x75, 0x03, //   Report Size (3)
    0x91, 0x03, //   Output (Const,Var,Abs) 填充
    0xc0, // End Collection
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_is_closed() {
        assert_eq!(BOOT_KEYBOARD_REPORT_MAP[4..6], [0xa1, 0x01]);
        assert_eq!(BOOT_KEYBOARD_REPORT_MAP.last(), Some(&0xc0));
    }
}
