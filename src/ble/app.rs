use std::{ collections::HashMap, sync::Arc };
use super::{
    adv::{ self, AdvData, BdAddr },
    app_builder::BLEAppBuilder,
    AttError,
    NotifyExt,
    ReadExt,
    Service,
    SubscribeEvent,
    WriteExt,
};

/// 外设应用：设备信息、服务表以及按特征 UUID 分发的回调。
///
/// 特征 UUID 在整个应用里必须唯一，协议栈回调只带着 UUID 回来。
#[derive(Clone)]
pub struct BLEApp<State: Sync + Send + Clone = ()> {
    pub device_name: String,
    pub appearance: u16,
    pub tx_power: i8,
    pub bonding: bool,
    pub state: State,
    pub services: Vec<Service<State>>,
    pub read_characteristics: HashMap<u16, Arc<dyn ReadExt<State = State>>>,
    pub write_characteristics: HashMap<u16, Arc<dyn WriteExt<State = State>>>,
    pub notify_characteristics: HashMap<u16, Arc<dyn NotifyExt<State = State>>>,
}

impl<T: Sync + Send + Clone> BLEApp<T> {
    pub fn builder() -> BLEAppBuilder<T> {
        BLEAppBuilder::new()
    }

    pub fn new(device_name: String, appearance: u16, tx_power: i8, bonding: bool, state: T) -> Self {
        Self {
            device_name,
            appearance,
            tx_power,
            bonding,
            state,
            services: Vec::new(),
            read_characteristics: HashMap::new(),
            write_characteristics: HashMap::new(),
            notify_characteristics: HashMap::new(),
        }
    }

    pub fn add_service(&mut self, service: Service<T>) {
        for attribute in &service.attributes {
            let uuid = attribute.characteristic.uuid;
            if self.has_characteristic(uuid) {
                log::warn!("characteristic {uuid:#06x} already registered, later handlers win");
            }
        }
        service.read_characteristics.iter().for_each(|i| {
            self.read_characteristics.insert(i.characteristic().uuid, i.clone());
        });
        service.write_characteristics.iter().for_each(|i| {
            self.write_characteristics.insert(i.characteristic().uuid, i.clone());
        });
        service.notify_characteristics.iter().for_each(|i| {
            self.notify_characteristics.insert(i.characteristic().uuid, i.clone());
        });
        self.services.push(service);
    }

    /// 属性表里是否有这个特征
    pub fn has_characteristic(&self, uuid: u16) -> bool {
        self.services
            .iter()
            .any(|s| s.attributes.iter().any(|a| a.characteristic.uuid == uuid))
    }

    // 不认识的 UUID 回 Unlikely，认识但不支持该操作回 Not Permitted
    fn unsupported(&self, uuid: u16, permission: AttError) -> AttError {
        if self.has_characteristic(uuid) { permission } else { AttError::Unlikely }
    }

    pub fn on_read(&self, uuid: u16) -> Result<Vec<u8>, AttError> {
        let Some(characteristic) = self.read_characteristics.get(&uuid) else {
            log::error!("unexpected read of characteristic {uuid:#06x}");
            return Err(self.unsupported(uuid, AttError::ReadNotPermitted));
        };
        characteristic.on_read(self.state.clone())
    }

    pub fn on_write(&self, uuid: u16, data: &[u8]) -> Result<(), AttError> {
        let Some(characteristic) = self.write_characteristics.get(&uuid) else {
            log::error!("unexpected write of characteristic {uuid:#06x}");
            return Err(self.unsupported(uuid, AttError::WriteNotPermitted));
        };
        characteristic.on_write(self.state.clone(), data)
    }

    pub fn on_subscribe(&self, uuid: u16, event: SubscribeEvent) {
        match self.notify_characteristics.get(&uuid) {
            Some(characteristic) => characteristic.on_subscribe(self.state.clone(), event),
            None => log::warn!("subscribe to characteristic {uuid:#06x} without handler"),
        }
    }

    pub fn on_disconnect(&self, conn_handle: u16) {
        for characteristic in self.notify_characteristics.values() {
            characteristic.on_disconnect(self.state.clone(), conn_handle);
        }
    }

    pub fn service_uuids(&self) -> Vec<u16> {
        self.services.iter().map(|s| s.uuid).collect()
    }

    pub fn advertisement(&self) -> anyhow::Result<AdvData> {
        adv::advertisement(self.appearance, self.tx_power, &self.service_uuids(), &self.device_name)
    }

    pub fn scan_response(&self, addr: &BdAddr) -> anyhow::Result<AdvData> {
        adv::scan_response(addr, &self.device_name)
    }

    /// 属性表的可读描述，启动时打到 debug 日志里
    pub fn attribute_table(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for service in &self.services {
            lines.push(format!("service {:#06x}", service.uuid));
            for attribute in &service.attributes {
                lines.push(
                    format!(
                        "  characteristic {:#06x} {:?}",
                        attribute.characteristic.uuid,
                        attribute.characteristic.properties
                    )
                );
                for descriptor in &attribute.descriptors {
                    lines.push(format!("    descriptor {:#06x} {:02x?}", descriptor.uuid, descriptor.value));
                }
            }
        }
        lines
    }
}
