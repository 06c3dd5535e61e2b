use std::sync::Arc;
use super::{ CharacteristicDef, DescriptorDef, NotifyExt, ReadExt, WriteExt };

/// 服务里的一个特征及其描述符，按添加顺序生成属性表
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub characteristic: CharacteristicDef,
    pub descriptors: Vec<DescriptorDef>,
}

#[derive(Debug, Clone)]
pub struct Service<State: Sync + Send + Clone = ()> {
    pub uuid: u16,
    pub attributes: Vec<Attribute>,
    pub read_characteristics: Vec<Arc<dyn ReadExt<State = State>>>,
    pub write_characteristics: Vec<Arc<dyn WriteExt<State = State>>>,
    pub notify_characteristics: Vec<Arc<dyn NotifyExt<State = State>>>,
}

impl<T: Sync + Send + Clone> Service<T> {
    pub fn new(uuid: u16) -> Self {
        Self {
            uuid,
            attributes: Vec::new(),
            read_characteristics: Vec::new(),
            write_characteristics: Vec::new(),
            notify_characteristics: Vec::new(),
        }
    }

    // 同一个特征可能同时以读、写、通知注册，属性表里只出现一次
    fn add_attribute(&mut self, characteristic: CharacteristicDef, descriptors: Vec<DescriptorDef>) {
        if self.attributes.iter().all(|i| i.characteristic.uuid != characteristic.uuid) {
            self.attributes.push(Attribute { characteristic, descriptors });
        }
    }

    pub fn add_read_characteristic(&mut self, characteristic: Arc<dyn ReadExt<State = T>>) {
        self.add_attribute(characteristic.characteristic(), characteristic.descriptors());
        self.read_characteristics.push(characteristic);
    }

    pub fn add_write_characteristic(&mut self, characteristic: Arc<dyn WriteExt<State = T>>) {
        self.add_attribute(characteristic.characteristic(), characteristic.descriptors());
        self.write_characteristics.push(characteristic);
    }

    pub fn add_notify_characteristic(&mut self, characteristic: Arc<dyn NotifyExt<State = T>>) {
        self.add_attribute(characteristic.characteristic(), characteristic.descriptors());
        self.notify_characteristics.push(characteristic);
    }
}
