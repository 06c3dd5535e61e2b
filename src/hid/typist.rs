use super::{
    keyboard::ascii_to_key,
    ProtocolMode,
    SharedHid,
    BOOT_KEYBOARD_INPUT_UUID,
    REPORT_UUID,
};
use crate::ble::{ lock, Notifier };

/// 把键盘状态推给主机
#[derive(Debug, Clone)]
pub struct Keyboard {
    state: SharedHid,
}

impl Keyboard {
    pub fn new(state: SharedHid) -> Self {
        Self { state }
    }

    /// 发送当前报告，走与协议模式对应的特征；没人订阅或主机挂起时不发
    pub fn send_report(&self, notifier: &impl Notifier) -> anyhow::Result<bool> {
        let (uuid, target, suspended, report) = {
            let state = lock(&self.state);
            let (uuid, subscription) = match state.protocol_mode {
                ProtocolMode::Report => (REPORT_UUID, &state.report_subscription),
                ProtocolMode::Boot => (BOOT_KEYBOARD_INPUT_UUID, &state.boot_subscription),
            };
            (uuid, subscription.can_notify(), state.suspended, state.report.to_bytes())
        };
        log::info!("notifications on: {}, conn_handle={target:?}", target.is_some());

        if suspended {
            log::debug!("host suspended, report not sent");
            return Ok(false);
        }
        let Some(_conn_handle) = target else {
            return Ok(false);
        };
        notifier.notify(uuid, &report)?;
        Ok(true)
    }

    /// 第一个按键槽位写入 `key` 并发送
    pub fn send_key(&self, key: u8, notifier: &impl Notifier) -> anyhow::Result<bool> {
        {
            let mut state = lock(&self.state);
            state.report.keys.clear();
            if key != 0 {
                state.report.press(key);
            }
        }
        self.send_report(notifier)
    }

    pub fn press(&self, modifiers: u8, key: u8, notifier: &impl Notifier) -> anyhow::Result<bool> {
        {
            let mut state = lock(&self.state);
            state.report.modifiers = modifiers;
            if !state.report.press(key) {
                log::warn!("key rollover, {key:#04x} dropped");
            }
        }
        self.send_report(notifier)
    }

    pub fn release_all(&self, notifier: &impl Notifier) -> anyhow::Result<bool> {
        lock(&self.state).report.release_all();
        self.send_report(notifier)
    }
}

/// 演示任务：每个 tick 敲出一段文本里的下一个字符（按下再松开）
pub struct Typist {
    keyboard: Keyboard,
    keys: Vec<(char, u8, u8)>,
    position: usize,
    // 按下已送达但松开没发出去，主机那边按键还按着
    release_pending: bool,
}

impl Typist {
    pub fn new(text: &str, keyboard: Keyboard) -> Self {
        let keys = text
            .chars()
            .filter_map(|c| {
                let key = ascii_to_key(c);
                if key.is_none() {
                    log::warn!("no key for {c:?}, skipped");
                }
                key.map(|(modifiers, usage)| (c, modifiers, usage))
            })
            .collect();
        Self { keyboard, keys, position: 0, release_pending: false }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn release_pending(&self) -> bool {
        self.release_pending
    }

    /// 主机收到按下事件才前进，没有连接时停在原处。
    /// 上一次的松开没发出去时先补发松开，成功后才按下一个键。
    pub fn tick(&mut self, notifier: &impl Notifier) -> anyhow::Result<Option<char>> {
        if self.release_pending {
            self.keyboard.release_all(notifier)?;
            self.release_pending = false;
        }
        let Some(&(c, modifiers, usage)) = self.keys.get(self.position) else {
            return Ok(None);
        };
        match self.keyboard.press(modifiers, usage, notifier) {
            Ok(true) => {}
            // 没送达的按键不能留在报告里
            Ok(false) => {
                lock(&self.keyboard.state).report.release_all();
                return Ok(None);
            }
            Err(e) => {
                lock(&self.keyboard.state).report.release_all();
                return Err(e);
            }
        }
        // 按下已经送达，这个字符算敲出去了
        self.position = (self.position + 1) % self.keys.len();
        if let Err(e) = self.keyboard.release_all(notifier) {
            self.release_pending = true;
            return Err(e);
        }
        log::info!("typed {c:?}");
        Ok(Some(c))
    }
}
