use enumset::{ EnumSet, EnumSetType };
use std::{ fmt::Debug, sync::{ Mutex, MutexGuard, PoisonError } };
mod service;
mod app;
mod app_builder;
pub mod adv;
pub mod att;
pub mod subscription;
#[cfg(target_os = "espidf")]
mod nimble;
pub use service::{ Attribute, Service };
pub use app::*;
pub use app_builder::BLEAppBuilder;
pub use att::AttError;
pub use subscription::{ is_stack_handle, SubscribeEvent, Subscription, CONN_HANDLE_NONE };
#[cfg(target_os = "espidf")]
pub use nimble::{ start, NimbleNotifier };

/// 特征属性，映射到 NimBLE 的 `NimbleProperties`
#[derive(EnumSetType, Debug)]
pub enum Property {
    Read,
    Write,
    WriteNoRsp,
    Notify,
    Indicate,
    ReadEnc,
    WriteEnc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacteristicDef {
    pub uuid: u16,
    pub properties: EnumSet<Property>,
}

impl CharacteristicDef {
    pub fn new(uuid: u16, properties: EnumSet<Property>) -> Self {
        Self { uuid, properties }
    }
}

/// 只读的静态描述符，例如 HID 的 Report Reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorDef {
    pub uuid: u16,
    pub value: Vec<u8>,
}

pub trait CharacteristicExt: Debug + Sync + Send {
    fn characteristic(&self) -> CharacteristicDef;
    fn descriptors(&self) -> Vec<DescriptorDef> {
        vec![]
    }
}

pub trait ReadExt: CharacteristicExt {
    type State: Sync + Send + Clone;
    fn on_read(&self, state: Self::State) -> Result<Vec<u8>, AttError>;
}

pub trait WriteExt: CharacteristicExt {
    type State: Sync + Send + Clone;
    fn on_write(&self, state: Self::State, data: &[u8]) -> Result<(), AttError>;
}

pub trait NotifyExt: CharacteristicExt {
    type State: Sync + Send + Clone;
    fn on_subscribe(&self, state: Self::State, event: SubscribeEvent);
    fn on_disconnect(&self, state: Self::State, conn_handle: u16);
}

/// 把值推给已订阅的对端，目标上由协议栈实现
pub trait Notifier {
    fn notify(&self, uuid: u16, value: &[u8]) -> anyhow::Result<()>;
    fn indicate(&self, uuid: u16, value: &[u8]) -> anyhow::Result<()>;
}

/// 回调里不能因为锁中毒就 panic，直接拿回里面的数据
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
