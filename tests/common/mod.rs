#![allow(dead_code)]

use std::sync::Mutex;

use esp_ble_peripheral::ble::Notifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Notify,
    Indicate,
}

/// 记录所有发出去的通知/指示
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(Kind, u16, Vec<u8>)>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<(Kind, u16, Vec<u8>)> {
        self.sent.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, uuid: u16, value: &[u8]) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push((Kind::Notify, uuid, value.to_vec()));
        Ok(())
    }

    fn indicate(&self, uuid: u16, value: &[u8]) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push((Kind::Indicate, uuid, value.to_vec()));
        Ok(())
    }
}

/// 总是发送失败，模拟协议栈缓冲区耗尽
pub struct FailingNotifier;

impl Notifier for FailingNotifier {
    fn notify(&self, _uuid: u16, _value: &[u8]) -> anyhow::Result<()> {
        anyhow::bail!("no mbufs")
    }

    fn indicate(&self, _uuid: u16, _value: &[u8]) -> anyhow::Result<()> {
        anyhow::bail!("no mbufs")
    }
}

/// 前 `budget` 次发送成功并记录，之后全部失败
pub struct FlakyNotifier {
    pub inner: RecordingNotifier,
    budget: Mutex<usize>,
}

impl FlakyNotifier {
    pub fn new(budget: usize) -> Self {
        Self { inner: RecordingNotifier::default(), budget: Mutex::new(budget) }
    }

    fn spend(&self) -> anyhow::Result<()> {
        let mut budget = self.budget.lock().unwrap();
        if *budget == 0 {
            anyhow::bail!("no mbufs");
        }
        *budget -= 1;
        Ok(())
    }
}

impl Notifier for FlakyNotifier {
    fn notify(&self, uuid: u16, value: &[u8]) -> anyhow::Result<()> {
        self.spend()?;
        self.inner.notify(uuid, value)
    }

    fn indicate(&self, uuid: u16, value: &[u8]) -> anyhow::Result<()> {
        self.spend()?;
        self.inner.indicate(uuid, value)
    }
}
