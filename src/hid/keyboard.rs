//! 键盘输入报告与 ASCII 到 HID usage 的映射。
//!
//! 报告格式 (8 字节):
//! ```text
//! Byte 0: 修饰键位图 (bit0 LCtrl, bit1 LShift, bit2 LAlt, bit3 LGUI, bit4..7 右侧同理)
//! Byte 1: 保留，总是 0
//! Byte 2-7: 最多 6 个同时按下的按键
//! ```

pub const REPORT_LEN: usize = 8;
pub const MAX_KEYS: usize = 6;

pub const MOD_LEFT_SHIFT: u8 = 0x02;

pub const KEY_A: u8 = 0x04;
pub const KEY_1: u8 = 0x1e;
pub const KEY_0: u8 = 0x27;
pub const KEY_ENTER: u8 = 0x28;
pub const KEY_TAB: u8 = 0x2b;
pub const KEY_SPACE: u8 = 0x2c;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyboardReport {
    pub modifiers: u8,
    pub keys: heapless::Vec<u8, MAX_KEYS>,
}

impl KeyboardReport {
    pub fn to_bytes(&self) -> [u8; REPORT_LEN] {
        let mut bytes = [0u8; REPORT_LEN];
        bytes[0] = self.modifiers;
        bytes[2..2 + self.keys.len()].copy_from_slice(&self.keys);
        bytes
    }

    /// 已经按下的键不会重复出现；超过 6 个键返回 false
    pub fn press(&mut self, key: u8) -> bool {
        if self.keys.contains(&key) {
            return true;
        }
        self.keys.push(key).is_ok()
    }

    pub fn release_all(&mut self) {
        self.modifiers = 0;
        self.keys.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.modifiers == 0 && self.keys.is_empty()
    }
}

/// 美式键盘布局下的 (修饰键, usage)，没有映射的字符返回 None
pub fn ascii_to_key(c: char) -> Option<(u8, u8)> {
    let key = match c {
        'a'..='z' => (0, KEY_A + (c as u8 - b'a')),
        'A'..='Z' => (MOD_LEFT_SHIFT, KEY_A + (c as u8 - b'A')),
        '1'..='9' => (0, KEY_1 + (c as u8 - b'1')),
        '0' => (0, KEY_0),
        '\n' => (0, KEY_ENTER),
        '\t' => (0, KEY_TAB),
        ' ' => (0, KEY_SPACE),
        '!' => (MOD_LEFT_SHIFT, KEY_1),
        '@' => (MOD_LEFT_SHIFT, 0x1f),
        '#' => (MOD_LEFT_SHIFT, 0x20),
        '$' => (MOD_LEFT_SHIFT, 0x21),
        '%' => (MOD_LEFT_SHIFT, 0x22),
        '^' => (MOD_LEFT_SHIFT, 0x23),
        '&' => (MOD_LEFT_SHIFT, 0x24),
        '*' => (MOD_LEFT_SHIFT, 0x25),
        '(' => (MOD_LEFT_SHIFT, 0x26),
        ')' => (MOD_LEFT_SHIFT, KEY_0),
        '-' => (0, 0x2d),
        '_' => (MOD_LEFT_SHIFT, 0x2d),
        '=' => (0, 0x2e),
        '+' => (MOD_LEFT_SHIFT, 0x2e),
        '[' => (0, 0x2f),
        '{' => (MOD_LEFT_SHIFT, 0x2f),
        ']' => (0, 0x30),
        '}' => (MOD_LEFT_SHIFT, 0x30),
        '\\' => (0, 0x31),
        '|' => (MOD_LEFT_SHIFT, 0x31),
        ';' => (0, 0x33),
        ':' => (MOD_LEFT_SHIFT, 0x33),
        '\'' => (0, 0x34),
        '"' => (MOD_LEFT_SHIFT, 0x34),
        '`' => (0, 0x35),
        '~' => (MOD_LEFT_SHIFT, 0x35),
        ',' => (0, 0x36),
        '<' => (MOD_LEFT_SHIFT, 0x36),
        '.' => (0, 0x37),
        '>' => (MOD_LEFT_SHIFT, 0x37),
        '/' => (0, 0x38),
        '?' => (MOD_LEFT_SHIFT, 0x38),
        _ => {
            return None;
        }
    };
    Some(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_report_is_all_zero() {
        let report = KeyboardReport::default();
        assert!(report.is_empty());
        assert_eq!(report.to_bytes(), [0; REPORT_LEN]);
    }

    #[test]
    fn pressed_keys_fill_slots_in_order() {
        let mut report = KeyboardReport::default();
        report.modifiers = MOD_LEFT_SHIFT;
        assert!(report.press(KEY_A));
        assert!(report.press(KEY_ENTER));
        assert!(report.press(KEY_A));
        assert_eq!(report.to_bytes(), [0x02, 0x00, 0x04, 0x28, 0, 0, 0, 0]);
    }

    #[test]
    fn seventh_key_is_rejected() {
        let mut report = KeyboardReport::default();
        for key in KEY_A..KEY_A + 6 {
            assert!(report.press(key));
        }
        assert!(!report.press(KEY_SPACE));
        assert_eq!(report.keys.len(), MAX_KEYS);

        report.release_all();
        assert!(report.is_empty());
    }

    #[test]
    fn ascii_mapping() {
        assert_eq!(ascii_to_key('a'), Some((0, 0x04)));
        assert_eq!(ascii_to_key('z'), Some((0, 0x1d)));
        assert_eq!(ascii_to_key('H'), Some((MOD_LEFT_SHIFT, 0x0b)));
        assert_eq!(ascii_to_key('1'), Some((0, 0x1e)));
        assert_eq!(ascii_to_key('9'), Some((0, 0x26)));
        assert_eq!(ascii_to_key('0'), Some((0, 0x27)));
        assert_eq!(ascii_to_key('\n'), Some((0, KEY_ENTER)));
        assert_eq!(ascii_to_key('?'), Some((MOD_LEFT_SHIFT, 0x38)));
        assert_eq!(ascii_to_key('é'), None);
    }
}
