//! 把 `BLEApp` 注册到 NimBLE (esp32-nimble)，协议栈回调都转发给 `BLEApp` 分发。

use std::{ collections::HashMap, sync::Arc };

use anyhow::bail;
use enumset::EnumSet;
use esp32_nimble::{
    enums::{ AuthReq, ConnMode, DiscMode, SecurityIOCap },
    utilities::{ mutex::Mutex, BleUuid },
    BLECharacteristic,
    BLEDevice,
    DescriptorProperties,
    NimbleProperties,
    NimbleSub,
};
use esp_idf_svc::sys;

use super::{ adv::BdAddr, is_stack_handle, BLEApp, Notifier, Property, SubscribeEvent };

type Characteristics = HashMap<u16, Arc<Mutex<BLECharacteristic>>>;

/// 通过 NimBLE 特征发送通知/指示
#[derive(Clone)]
pub struct NimbleNotifier {
    characteristics: Arc<Characteristics>,
}

impl NimbleNotifier {
    fn send(&self, uuid: u16, value: &[u8]) -> anyhow::Result<()> {
        let Some(characteristic) = self.characteristics.get(&uuid) else {
            bail!("characteristic {uuid:#06x} not registered");
        };
        // 对端写 CCCD 时选了 notify 还是 indicate，NimBLE 会按订阅类型发送
        characteristic.lock().set_value(value).notify();
        Ok(())
    }
}

impl Notifier for NimbleNotifier {
    fn notify(&self, uuid: u16, value: &[u8]) -> anyhow::Result<()> {
        self.send(uuid, value)
    }

    fn indicate(&self, uuid: u16, value: &[u8]) -> anyhow::Result<()> {
        self.send(uuid, value)
    }
}

fn nimble_properties(properties: EnumSet<Property>) -> NimbleProperties {
    properties.iter().fold(NimbleProperties::empty(), |acc, property| {
        acc |
            (match property {
                Property::Read => NimbleProperties::READ,
                Property::Write => NimbleProperties::WRITE,
                Property::WriteNoRsp => NimbleProperties::WRITE_NO_RSP,
                Property::Notify => NimbleProperties::NOTIFY,
                Property::Indicate => NimbleProperties::INDICATE,
                Property::ReadEnc => NimbleProperties::READ_ENC,
                Property::WriteEnc => NimbleProperties::WRITE_ENC,
            })
    })
}

fn check_rc(rc: i32, what: &str) -> anyhow::Result<()> {
    if rc == 0 {
        Ok(())
    } else {
        bail!("failed to {what}, error code: {rc}")
    }
}

/// 协议栈同步后才能调用
fn own_address() -> anyhow::Result<BdAddr> {
    let mut addr_type = 0u8;
    check_rc(unsafe { sys::ble_hs_id_infer_auto(0, &mut addr_type) }, "infer address type")?;
    let mut val = [0u8; 6];
    check_rc(
        unsafe { sys::ble_hs_id_copy_addr(addr_type, val.as_mut_ptr(), std::ptr::null_mut()) },
        "copy address"
    )?;
    Ok(BdAddr { val, addr_type })
}

/// 注册服务、回调和广播，返回用于推送数据的 `NimbleNotifier`
pub fn start<State: Send + Sync + Clone + 'static>(
    ble_app: BLEApp<State>
) -> anyhow::Result<NimbleNotifier> {
    let device = BLEDevice::take();
    let app = Arc::new(ble_app);

    BLEDevice::set_device_name(&app.device_name)?;
    log::info!("Setting name to {}", app.device_name);
    // GAP 服务里的 Appearance 特征，HID 主机靠它识别设备类型
    check_rc(
        unsafe { sys::ble_svc_gap_device_appearance_set(app.appearance) },
        "set device appearance"
    )?;

    if app.bonding {
        device
            .security()
            .set_auth(AuthReq::Bond | AuthReq::Sc)
            .set_io_cap(SecurityIOCap::NoInputNoOutput)
            .resolve_rpa();
    }

    let addr = own_address()?;
    log::info!("address: {addr}");

    let advertising = device.get_advertising();
    let server = device.get_server();

    server.on_connect(move |server, desc| {
        log::info!("on_connect: conn_handle={} peer={:?}", desc.conn_handle(), desc.address());
        if let Err(e) = server.update_conn_params(desc.conn_handle(), 24, 48, 0, 60) {
            log::warn!("Failed to update connection params: {:?}", e);
        }
        if server.connected_count() < (sys::CONFIG_BT_NIMBLE_MAX_CONNECTIONS as _) {
            if let Err(e) = advertising.lock().start() {
                log::error!("Failed to restart advertising: {:?}", e);
            }
        }
    });

    let disconnect_app = app.clone();
    server.on_disconnect(move |desc, reason| {
        log::warn!("on_disconnect: conn_handle={}, reason: {:?}", desc.conn_handle(), reason);
        disconnect_app.on_disconnect(desc.conn_handle());
    });

    server.on_authentication_complete(|desc, result| {
        log::info!("authentication complete ({:?}): conn_handle={}", result, desc.conn_handle());
    });

    for line in app.attribute_table() {
        log::debug!("{line}");
    }

    let mut characteristics = Characteristics::new();
    for service in &app.services {
        let nimble_service = server.create_service(BleUuid::from_uuid16(service.uuid));
        for attribute in &service.attributes {
            let uuid = attribute.characteristic.uuid;
            let properties = attribute.characteristic.properties;
            let characteristic = nimble_service
                .lock()
                .create_characteristic(BleUuid::from_uuid16(uuid), nimble_properties(properties));

            for descriptor in &attribute.descriptors {
                characteristic
                    .lock()
                    .create_descriptor(BleUuid::from_uuid16(descriptor.uuid), DescriptorProperties::READ)
                    .lock()
                    .set_value(&descriptor.value);
            }

            if properties.contains(Property::Read) {
                // 先放一份初始值，协议栈自己读时也有数据
                match app.on_read(uuid) {
                    Ok(value) => {
                        characteristic.lock().set_value(&value);
                    }
                    Err(e) => log::warn!("no initial value for {uuid:#06x}: {e}"),
                }
                let read_app = app.clone();
                characteristic.lock().on_read(move |value, desc| {
                    if is_stack_handle(desc.conn_handle()) {
                        log::info!("characteristic {uuid:#06x} read by nimble stack");
                    } else {
                        log::info!("characteristic {uuid:#06x} read; conn_handle={}", desc.conn_handle());
                    }
                    match read_app.on_read(uuid) {
                        Ok(data) => value.set_value(&data),
                        Err(e) => log::error!("read of {uuid:#06x} failed: {e}"),
                    }
                });
            }

            if properties.contains(Property::Write) || properties.contains(Property::WriteNoRsp) {
                let write_app = app.clone();
                characteristic.lock().on_write(move |args| {
                    log::info!(
                        "characteristic {uuid:#06x} write; conn_handle={} value={:02x?}",
                        args.desc().conn_handle(),
                        args.recv_data()
                    );
                    if let Err(e) = write_app.on_write(uuid, args.recv_data()) {
                        log::error!("write of {uuid:#06x} rejected: {e}");
                        args.reject_with_error_code(e.code());
                    }
                });
            }

            if properties.contains(Property::Notify) || properties.contains(Property::Indicate) {
                let subscribe_app = app.clone();
                characteristic.lock().on_subscribe(move |_, desc, sub| {
                    subscribe_app.on_subscribe(uuid, SubscribeEvent {
                        conn_handle: desc.conn_handle(),
                        notify: sub.contains(NimbleSub::NOTIFY),
                        indicate: sub.contains(NimbleSub::INDICATE),
                    });
                });
            }

            characteristics.insert(uuid, characteristic);
        }
    }

    let advertisement = app.advertisement()?;
    let scan_response = app.scan_response(&addr)?;
    {
        let mut advertising = advertising.lock();
        advertising.advertisement_type(ConnMode::Und).disc_mode(DiscMode::Gen).scan_response(true);
        advertising.set_raw_data(&advertisement)?;
        advertising.set_raw_scan_response_data(&scan_response)?;
        advertising.start()?;
    }
    log::info!("Advertising started!");

    // 打印蓝牙服务相关日志
    server.ble_gatts_show_local();

    Ok(NimbleNotifier { characteristics: Arc::new(characteristics) })
}
